//! Remote analyzer: endpoint resolution, HTTP client and response normalization.

mod client;
pub mod endpoint;
pub mod normalize;
mod settings;

pub use client::RemoteAnalyzer;
pub use endpoint::{EndpointResolver, DEFAULT_ANALYZER_ENDPOINT};
pub use settings::AnalyzerSettings;
