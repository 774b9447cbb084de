//! Shared test doubles: a scripted document, scoring clients, and a failing
//! cache.

use crate::dom::ListingIndicator;
use crate::dom::PageDom;
use crate::dom::SearchListing;
use crate::orchestrator::AnalysisOrchestrator;
use crate::widget::WidgetState;
use el_cache::CacheStore;
use el_core::EngineError;
use el_core::EngineResult;
use el_score::AnalysisRequest;
use el_score::AnalysisResult;
use el_score::ScoredAnalysis;
use el_score::ScoringClient;
use std::collections::BTreeMap;
use std::collections::HashMap;
use std::collections::VecDeque;
use std::sync::Mutex;
use std::sync::atomic::AtomicUsize;
use std::sync::atomic::Ordering;
use std::sync::mpsc;
use std::time::Duration;
use std::time::Instant;

/// In-memory document that records what the engine does to it.
#[derive(Debug, Default)]
pub(crate) struct FakeDom {
    pub(crate) url: String,
    pub(crate) anchors: Vec<String>,
    pub(crate) widget: WidgetState,
    pub(crate) widget_replacements: usize,
    pub(crate) listings: Vec<SearchListing>,
    pub(crate) annotations: Vec<(String, ListingIndicator)>,
}

impl FakeDom {
    pub(crate) fn product_page(url: &str) -> Self {
        Self {
            url: url.to_owned(),
            anchors: vec!["#centerCol".to_owned()],
            ..Self::default()
        }
    }

    pub(crate) fn search_page(url: &str, listings: Vec<SearchListing>) -> Self {
        Self {
            url: url.to_owned(),
            listings,
            ..Self::default()
        }
    }
}

impl PageDom for FakeDom {
    fn current_url(&self) -> String {
        self.url.clone()
    }

    fn anchor_exists(&self, selector: &str) -> bool {
        self.anchors.iter().any(|anchor| anchor == selector)
    }

    fn replace_widget(&mut self, widget: WidgetState) {
        self.widget_replacements += 1;
        self.widget = widget;
    }

    fn widget_present(&self) -> bool {
        self.widget.is_present()
    }

    fn search_listings(&self) -> Vec<SearchListing> {
        self.listings.clone()
    }

    fn annotate_listing(&mut self, element_id: &str, indicator: ListingIndicator) {
        self.annotations.push((element_id.to_owned(), indicator));
    }
}

/// Scoring client answering from a scripted queue of outcomes.
pub(crate) struct StubScoringClient {
    outcomes: Mutex<VecDeque<EngineResult<ScoredAnalysis>>>,
    calls: AtomicUsize,
}

impl StubScoringClient {
    pub(crate) fn with_outcomes(outcomes: Vec<EngineResult<ScoredAnalysis>>) -> Self {
        Self {
            outcomes: Mutex::new(outcomes.into()),
            calls: AtomicUsize::new(0),
        }
    }

    pub(crate) fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl ScoringClient for StubScoringClient {
    fn analyze(&self, _request: &AnalysisRequest) -> EngineResult<ScoredAnalysis> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.outcomes
            .lock()
            .ok()
            .and_then(|mut outcomes| outcomes.pop_front())
            .unwrap_or_else(|| {
                Err(EngineError::new(
                    "test.unscripted_call",
                    "no scripted outcome left for this request",
                ))
            })
    }
}

/// Scoring client that blocks each request on a per-URL gate, so tests
/// control exactly when each response completes.
pub(crate) struct GatedScoringClient {
    gates: Mutex<HashMap<String, mpsc::Receiver<EngineResult<ScoredAnalysis>>>>,
}

impl GatedScoringClient {
    pub(crate) fn new() -> Self {
        Self {
            gates: Mutex::new(HashMap::new()),
        }
    }

    /// Registers a gate for `url`; the matching request blocks until the
    /// returned sender delivers its outcome.
    pub(crate) fn gate(&self, url: &str) -> mpsc::Sender<EngineResult<ScoredAnalysis>> {
        let (tx, rx) = mpsc::channel();
        match self.gates.lock() {
            Ok(mut gates) => {
                gates.insert(url.to_owned(), rx);
            }
            Err(error) => panic!("gate mutex poisoned: {error}"),
        }
        tx
    }
}

impl ScoringClient for GatedScoringClient {
    fn analyze(&self, request: &AnalysisRequest) -> EngineResult<ScoredAnalysis> {
        let receiver = self
            .gates
            .lock()
            .ok()
            .and_then(|mut gates| gates.remove(&request.url));

        match receiver {
            Some(receiver) => receiver.recv().unwrap_or_else(|_| {
                Err(EngineError::new(
                    "test.gate_closed",
                    "gate sender dropped before releasing the response",
                ))
            }),
            None => Err(EngineError::new(
                "test.unscripted_url",
                format!("no gate registered for `{}`", request.url),
            )),
        }
    }
}

/// Cache whose every operation fails, for degradation paths.
pub(crate) struct FailingCacheStore;

impl CacheStore for FailingCacheStore {
    fn get(&self, _key: &str) -> EngineResult<Option<String>> {
        Err(EngineError::new("cache.read_failed", "cache is offline"))
    }

    fn get_many(&self, _keys: &[String]) -> EngineResult<BTreeMap<String, String>> {
        Err(EngineError::new("cache.read_failed", "cache is offline"))
    }

    fn set(&self, _entries: BTreeMap<String, String>) -> EngineResult<()> {
        Err(EngineError::new("cache.write_failed", "cache is offline"))
    }
}

/// Canonical service body used across tests, parameterized by overall score.
pub(crate) fn sample_body(overall_eco_score: f64) -> String {
    format!(
        concat!(
            "{{\"environmental_score\":{{\"co2_total_kg\":12.3,",
            "\"water_usage_liters\":40.0,\"recyclability_score\":60.0,",
            "\"overall_eco_score\":{},\"confidence_level\":90.0}},",
            "\"recommendations\":[\"Buy refurbished\"]}}"
        ),
        overall_eco_score
    )
}

pub(crate) fn sample_scored(overall_eco_score: f64) -> ScoredAnalysis {
    let raw_body = sample_body(overall_eco_score);
    match AnalysisResult::from_json(&raw_body) {
        Ok(result) => ScoredAnalysis { result, raw_body },
        Err(error) => panic!("{error}"),
    }
}

/// Polls the orchestrator until its in-flight request resolves.
pub(crate) fn drain_reports(orchestrator: &mut AnalysisOrchestrator, dom: &mut FakeDom) {
    let deadline = Instant::now() + Duration::from_secs(5);
    loop {
        orchestrator.poll(dom);
        if !orchestrator.is_loading() {
            return;
        }
        if Instant::now() > deadline {
            panic!("analysis report did not arrive within the test deadline");
        }
        std::thread::sleep(Duration::from_millis(5));
    }
}
