use repolens_api::TransportError;
use thiserror::Error;

/// Everything that can go wrong before or inside an aggregation run
///
/// None of these escape `InsightAggregator::fetch_insights` - they surface at
/// construction time or get logged and turned into an empty result.
#[derive(Error, Debug)]
pub enum Error {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("HTTP client error: {0}")]
    TransportError(#[from] TransportError),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] toml::ser::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Background task failed: {0}")]
    TaskFailed(String),
}
