// GitHub access layer: one GET primitive, a retrying fetcher on top, endpoints on top of that
pub mod events;
pub mod fetch;
pub mod github;
pub mod retry;
pub mod transport;

// Re-export common types
pub use events::{EventHook, FetchEvent};
pub use fetch::{FetchOutcome, RateLimitedFetcher};
pub use github::{GitHubClient, GitHubEndpoints, GitHubRepo};
pub use retry::{is_retryable_status, RateLimitConfig, RetryConfig};
pub use transport::{HttpRequest, HttpResponse, ReqwestTransport, Transport, TransportError};

#[cfg(any(test, feature = "mock"))]
pub use transport::MockTransport;
