// Diagnostics for fetches that otherwise fail silently
use std::sync::Arc;
use std::time::Duration;

use reqwest::StatusCode;

/// Something worth knowing happened while fetching `url`
///
/// The fetch contract only ever reports presence or absence. These events are
/// how callers find out *why* something went missing.
#[derive(Debug, Clone, PartialEq)]
pub enum FetchEvent {
    /// Hit the rate limit, sleeping until the window resets
    RateLimited { url: String, wait: Duration },
    /// Attempt failed, backing off before the next one
    Backoff {
        url: String,
        attempt: u32,
        status: Option<StatusCode>,
        wait: Duration,
    },
    /// Non-retryable status, no point asking again
    Rejected { url: String, status: StatusCode },
    /// Retry budget (or rate-limit wait ceiling) spent
    GaveUp { url: String, attempts: u32 },
    /// No response at all
    TransportFailed {
        url: String,
        attempt: u32,
        message: String,
    },
    /// 2xx but the body wasn't the JSON we wanted
    MalformedBody { url: String, message: String },
    Succeeded { url: String, attempts: u32 },
}

impl FetchEvent {
    pub fn url(&self) -> &str {
        match self {
            FetchEvent::RateLimited { url, .. }
            | FetchEvent::Backoff { url, .. }
            | FetchEvent::Rejected { url, .. }
            | FetchEvent::GaveUp { url, .. }
            | FetchEvent::TransportFailed { url, .. }
            | FetchEvent::MalformedBody { url, .. }
            | FetchEvent::Succeeded { url, .. } => url,
        }
    }
}

/// Callback that receives every [`FetchEvent`]
pub type EventHook = Arc<dyn Fn(&FetchEvent) + Send + Sync>;
