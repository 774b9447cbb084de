//! Remote scoring service: wire contracts and blocking HTTP client.

pub mod client;
#[cfg(feature = "tls-rustls")]
pub(crate) mod tls;
pub mod wire;

pub use client::HttpScoringClient;
pub use client::ScoringClient;
pub use wire::AnalysisRequest;
pub use wire::AnalysisResult;
pub use wire::EnvironmentalScore;
pub use wire::ScoredAnalysis;
