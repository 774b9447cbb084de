//! Engine facade wiring watcher, orchestrator, annotator, and responder.

use crate::annotator::SearchResultAnnotator;
use crate::dom::PageDom;
use crate::orchestrator::ActiveAnalysis;
use crate::orchestrator::AnalysisOrchestrator;
use crate::responder::ExternalMessageResponder;
use crate::watcher::DEFAULT_QUIET_PERIOD;
use crate::watcher::NavigationWatcher;
use el_cache::CacheStore;
use el_core::EngineError;
use el_core::EngineResult;
use el_page::PageKind;
use el_score::ScoringClient;
use std::sync::Arc;
use std::time::Instant;

/// Engine tuning knobs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineConfig {
    /// Known widget insertion points, highest priority first.
    pub anchor_candidates: Vec<String>,
    /// Quiet period after the last URL change before a settle event fires.
    pub quiet_period: std::time::Duration,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            anchor_candidates: vec![
                "#centerCol".to_owned(),
                "#rightCol".to_owned(),
                "#ppd".to_owned(),
                "#dp-container".to_owned(),
            ],
            quiet_period: DEFAULT_QUIET_PERIOD,
        }
    }
}

impl EngineConfig {
    pub fn validate(&self) -> EngineResult<()> {
        if self.anchor_candidates.is_empty() {
            return Err(EngineError::new(
                "engine.anchor_candidates_empty",
                "at least one widget insertion anchor is required",
            ));
        }

        if self.quiet_period.is_zero() {
            return Err(EngineError::new(
                "engine.quiet_period_zero",
                "navigation quiet period must be greater than zero",
            ));
        }

        Ok(())
    }
}

/// One engine per document. There is no global state: tests and hosts build
/// and discard instances freely.
pub struct Engine {
    watcher: NavigationWatcher,
    orchestrator: AnalysisOrchestrator,
    annotator: SearchResultAnnotator,
    responder: ExternalMessageResponder,
}

impl Engine {
    pub fn new(
        config: EngineConfig,
        client: Arc<dyn ScoringClient>,
        cache: Arc<dyn CacheStore>,
    ) -> EngineResult<Self> {
        config.validate()?;

        Ok(Self {
            watcher: NavigationWatcher::new("", config.quiet_period),
            orchestrator: AnalysisOrchestrator::new(
                client,
                Arc::clone(&cache),
                config.anchor_candidates,
            ),
            annotator: SearchResultAnnotator::new(cache),
            responder: ExternalMessageResponder::new(),
        })
    }

    /// Runs the pipeline once for the document's current URL and baselines
    /// the watcher. Call once after construction.
    pub fn startup(&mut self, dom: &mut dyn PageDom) {
        let url = dom.current_url();
        self.watcher.reset(&url);
        self.run_pipeline(dom, &url);
    }

    /// Feed one observed mutation batch.
    pub fn observe_mutation(&mut self, dom: &dyn PageDom, now: Instant) {
        self.watcher.observe_mutation(&dom.current_url(), now);
    }

    /// Fires a due settle event and drains completed analysis reports.
    pub fn poll(&mut self, dom: &mut dyn PageDom, now: Instant) {
        if let Some(url) = self.watcher.poll_settled(now) {
            self.run_pipeline(dom, &url);
        }

        self.orchestrator.poll(dom);
    }

    pub fn handle_message(&self, dom: &dyn PageDom, raw: &str) -> Option<String> {
        self.responder.respond(dom, raw)
    }

    pub fn is_loading(&self) -> bool {
        self.orchestrator.is_loading()
    }

    pub fn active_analysis(&self) -> Option<&ActiveAnalysis> {
        self.orchestrator.active_analysis()
    }

    /// Both branches guard their own page kind; a settle on any other page
    /// leaves widget and listings untouched.
    fn run_pipeline(&mut self, dom: &mut dyn PageDom, url: &str) {
        tracing::debug!(
            url,
            kind = PageKind::classify_str(url).as_str(),
            "navigation settled"
        );
        self.orchestrator.trigger(dom, url);
        self.annotator.annotate(dom);
    }
}
