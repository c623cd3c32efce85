// Core logic: list a user's repositories, pull one JSON file from each, merge and sort
pub mod aggregator;
pub mod config;
pub mod error;
pub mod files;
pub mod lister;
pub mod models;
pub mod providers;
pub mod source;

pub use aggregator::{sort_newest_first, InsightAggregator};
pub use config::{GitHubConfig, InsightsConfig, SortBy};
pub use error::Error;
pub use files::FileFetcher;
pub use lister::RepositoryLister;
pub use models::{AggregatedResult, Insight, RepositoryInfo, RepositorySummary};
pub use providers::GitHubProvider;
pub use source::RepositorySource;

// Handy for callers wiring hooks and retry settings
pub use repolens_api::{EventHook, FetchEvent, RateLimitConfig, RetryConfig};

/// Result type alias because typing Result<T, Error> everywhere is tedious
pub type Result<T> = std::result::Result<T, Error>;
