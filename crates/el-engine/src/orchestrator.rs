//! Per-page analysis pipeline: the core state machine.
//!
//! Each trigger unconditionally restarts the widget lifecycle at `Loading`.
//! A running remote request is never cancelled, only disowned: its report is
//! stamped with a request id and the URL it was issued for, and `poll`
//! discards any report whose id has been superseded or whose URL no longer
//! matches what the document shows.

use crate::display::DisplayModel;
use crate::dom::PageDom;
use crate::widget::WidgetState;
use el_cache::CacheStore;
use el_core::EngineResult;
use el_page::PageKind;
use el_score::AnalysisRequest;
use el_score::AnalysisResult;
use el_score::ScoredAnalysis;
use el_score::ScoringClient;
use std::collections::BTreeMap;
use std::sync::Arc;
use std::sync::mpsc;
use std::thread;

struct AnalysisReport {
    request_id: u64,
    url: String,
    outcome: EngineResult<ScoredAnalysis>,
}

/// The last analysis that completed for the current page context; widget
/// interaction callbacks (find-alternatives, view-details) bind to this.
#[derive(Debug, Clone, PartialEq)]
pub struct ActiveAnalysis {
    pub url: String,
    pub result: AnalysisResult,
}

/// Drives the widget lifecycle and owns the one in-flight remote request.
pub struct AnalysisOrchestrator {
    client: Arc<dyn ScoringClient>,
    cache: Arc<dyn CacheStore>,
    anchor_candidates: Vec<String>,
    next_request_id: u64,
    inflight_request_id: Option<u64>,
    report_receiver: Option<mpsc::Receiver<AnalysisReport>>,
    active: Option<ActiveAnalysis>,
}

impl AnalysisOrchestrator {
    pub fn new(
        client: Arc<dyn ScoringClient>,
        cache: Arc<dyn CacheStore>,
        anchor_candidates: Vec<String>,
    ) -> Self {
        Self {
            client,
            cache,
            anchor_candidates,
            next_request_id: 1,
            inflight_request_id: None,
            report_receiver: None,
            active: None,
        }
    }

    pub fn is_loading(&self) -> bool {
        self.inflight_request_id.is_some()
    }

    pub fn active_analysis(&self) -> Option<&ActiveAnalysis> {
        self.active.as_ref()
    }

    /// Starts a fresh analysis for `url`. Non-product URLs are a no-op that
    /// leaves any existing widget alone; so is a layout with no insertion
    /// anchor.
    pub fn trigger(&mut self, dom: &mut dyn PageDom, url: &str) {
        if PageKind::classify_str(url) != PageKind::Product {
            tracing::debug!(url, "not a product page, leaving widget untouched");
            return;
        }

        let Some(anchor) = self.locate_anchor(dom) else {
            tracing::debug!(url, "no widget insertion point in this layout");
            return;
        };
        tracing::debug!(url, anchor = anchor.as_str(), "starting analysis");

        dom.replace_widget(WidgetState::Loading);
        self.active = None;

        let request_id = self.next_request_id;
        self.next_request_id = self.next_request_id.saturating_add(1);
        self.inflight_request_id = Some(request_id);

        // Snapshot of the settled URL; never re-read once the request exists.
        let request = AnalysisRequest::for_page(url);
        let request_url = url.to_owned();
        let client = Arc::clone(&self.client);
        let (tx, rx) = mpsc::channel();
        self.report_receiver = Some(rx);

        let analysis_job = move || {
            let outcome = client.analyze(&request);
            let _ = tx.send(AnalysisReport {
                request_id,
                url: request_url,
                outcome,
            });
        };

        if thread::Builder::new()
            .name("ecolens-analysis".to_owned())
            .spawn(analysis_job)
            .is_err()
        {
            self.inflight_request_id = None;
            self.report_receiver = None;
            dom.replace_widget(WidgetState::service_error());
            tracing::warn!(url, "failed to spawn analysis worker");
        }
    }

    /// Drains completed reports. Stale reports (superseded id, or a document
    /// that has navigated away) are discarded without touching widget or
    /// cache.
    pub fn poll(&mut self, dom: &mut dyn PageDom) {
        loop {
            let report = self
                .report_receiver
                .as_ref()
                .and_then(|receiver| receiver.try_recv().ok());

            let Some(report) = report else {
                break;
            };

            if Some(report.request_id) != self.inflight_request_id {
                continue;
            }

            self.inflight_request_id = None;
            self.report_receiver = None;

            if report.url != dom.current_url() {
                tracing::debug!(
                    url = report.url.as_str(),
                    "discarding stale analysis response"
                );
                continue;
            }

            match report.outcome {
                Ok(scored) => self.complete_success(dom, report.url, scored),
                Err(error) => {
                    tracing::warn!(url = report.url.as_str(), %error, "analysis failed");
                    dom.replace_widget(WidgetState::service_error());
                }
            }
        }
    }

    fn complete_success(&mut self, dom: &mut dyn PageDom, url: String, scored: ScoredAnalysis) {
        let model = DisplayModel::from_result(&scored.result);
        dom.replace_widget(WidgetState::Success(model));

        let mut entries = BTreeMap::new();
        entries.insert(url.clone(), scored.raw_body);
        if let Err(error) = self.cache.set(entries) {
            tracing::warn!(url = url.as_str(), %error, "failed to persist analysis result");
        }

        self.active = Some(ActiveAnalysis {
            url,
            result: scored.result,
        });
    }

    fn locate_anchor(&self, dom: &dyn PageDom) -> Option<String> {
        self.anchor_candidates
            .iter()
            .find(|candidate| dom.anchor_exists(candidate))
            .cloned()
    }
}
