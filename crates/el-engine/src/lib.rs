//! Page-state detection and analysis-orchestration engine.
//!
//! The engine watches a single-page document for in-page navigation, decides
//! what kind of page it landed on, drives the environmental-impact widget
//! through its loading/success/error lifecycle, and feeds a shared result
//! cache that the search-listing annotator reads back.

pub mod annotator;
pub mod display;
pub mod dom;
pub mod engine;
pub mod orchestrator;
pub mod responder;
pub mod watcher;
pub mod widget;

#[cfg(test)]
pub(crate) mod test_support;

pub use annotator::SearchResultAnnotator;
pub use display::DisplayModel;
pub use display::ScoreTier;
pub use dom::ListingIndicator;
pub use dom::PageDom;
pub use dom::SearchListing;
pub use engine::Engine;
pub use engine::EngineConfig;
pub use orchestrator::ActiveAnalysis;
pub use orchestrator::AnalysisOrchestrator;
pub use responder::ExternalMessageResponder;
pub use watcher::NavigationWatcher;
pub use widget::WidgetState;
