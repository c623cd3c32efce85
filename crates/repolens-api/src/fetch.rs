// Rate-limit-aware JSON fetch
//
// Two failure modes, two remedies: a rate limit means "come back at reset
// time", anything else means "try again a bit later, and less often".
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use reqwest::header::{HeaderValue, AUTHORIZATION};
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use tokio::time::sleep;
use tracing::{debug, warn};

use crate::events::{EventHook, FetchEvent};
use crate::retry::{RateLimitConfig, RetryConfig};
use crate::transport::{HttpRequest, Transport, TransportError};

/// Either the parsed payload or nothing
///
/// "Not found", "server kept failing" and "body was garbage" all look the same
/// from here. The [`FetchEvent`] stream is where the difference shows up.
pub type FetchOutcome<T> = Option<T>;

pub struct RateLimitedFetcher {
    transport: Arc<dyn Transport>,
    token: Option<String>,
    retry: RetryConfig,
    rate_limit: RateLimitConfig,
    hook: Option<EventHook>,
}

impl RateLimitedFetcher {
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        Self {
            transport,
            token: None,
            retry: RetryConfig::default(),
            rate_limit: RateLimitConfig::default(),
            hook: None,
        }
    }

    /// Blank tokens count as no token - sending `Bearer ` upsets GitHub
    pub fn with_token(mut self, token: Option<String>) -> Self {
        self.token = token.filter(|t| !t.trim().is_empty());
        self
    }

    pub fn with_retry_config(mut self, retry: RetryConfig) -> Self {
        self.retry = retry;
        self
    }

    pub fn with_rate_limit_config(mut self, rate_limit: RateLimitConfig) -> Self {
        self.rate_limit = rate_limit;
        self
    }

    pub fn with_event_hook(mut self, hook: EventHook) -> Self {
        self.hook = Some(hook);
        self
    }

    pub fn has_token(&self) -> bool {
        self.token.is_some()
    }

    fn build_request(&self, url: &str) -> Result<HttpRequest, TransportError> {
        let mut request = HttpRequest::get(url);

        if let Some(token) = &self.token {
            let mut value = HeaderValue::from_str(&format!("Bearer {}", token.trim()))?;
            value.set_sensitive(true);
            request.headers.insert(AUTHORIZATION, value);
        }

        Ok(request)
    }

    fn emit(&self, event: FetchEvent) {
        if let Some(hook) = &self.hook {
            hook(&event);
        }
    }

    /// GET `url` and parse the body as `T`
    ///
    /// Rate-limit waits don't consume attempts, so only the wait ceilings in
    /// [`RateLimitConfig`] bound how long this can take when GitHub keeps
    /// saying no.
    pub async fn fetch_json<T: DeserializeOwned>(&self, url: &str) -> FetchOutcome<T> {
        let request = match self.build_request(url) {
            Ok(request) => request,
            Err(err) => {
                warn!(url, error = %err, "Could not build request");
                self.emit(FetchEvent::TransportFailed {
                    url: url.to_string(),
                    attempt: 0,
                    message: err.to_string(),
                });
                return None;
            }
        };

        let mut attempt: u32 = 1;
        let mut rate_limit_waited = Duration::ZERO;

        loop {
            match self.transport.get(&request).await {
                Ok(response) => {
                    let rate_limited =
                        self.rate_limit
                            .rate_limit_wait(response.status, &response.headers, Utc::now());
                    if let Some(wait) = rate_limited {
                        if let Some(max_total) = self.rate_limit.max_total_wait_secs {
                            if rate_limit_waited + wait > Duration::from_secs(max_total) {
                                let waited_secs = rate_limit_waited.as_secs();
                                warn!(url, waited_secs, "Rate limit wait ceiling reached, giving up");
                                self.emit(FetchEvent::GaveUp {
                                    url: url.to_string(),
                                    attempts: attempt,
                                });
                                return None;
                            }
                        }

                        let wait_secs = wait.as_secs();
                        warn!(url, wait_secs, "Rate limited, waiting for reset");
                        self.emit(FetchEvent::RateLimited {
                            url: url.to_string(),
                            wait,
                        });
                        sleep(wait).await;
                        rate_limit_waited += wait;
                        continue;
                    }

                    if response.is_success() {
                        return match serde_json::from_str::<T>(&response.body) {
                            Ok(parsed) => {
                                if attempt > 1 {
                                    debug!(url, attempt, "Request succeeded after retries");
                                }
                                self.emit(FetchEvent::Succeeded {
                                    url: url.to_string(),
                                    attempts: attempt,
                                });
                                Some(parsed)
                            }
                            Err(err) => {
                                warn!(url, error = %err, "Response body is not the expected JSON");
                                self.emit(FetchEvent::MalformedBody {
                                    url: url.to_string(),
                                    message: err.to_string(),
                                });
                                None
                            }
                        };
                    }

                    debug!(url, attempt, status = %response.status, "Request failed");
                    if !self.backoff(url, attempt, Some(response.status)).await {
                        return None;
                    }
                }
                Err(err) => {
                    warn!(url, attempt, error = %err, "Request did not complete");
                    self.emit(FetchEvent::TransportFailed {
                        url: url.to_string(),
                        attempt,
                        message: err.to_string(),
                    });
                    if !self.backoff(url, attempt, None).await {
                        return None;
                    }
                }
            }

            attempt += 1;
        }
    }

    /// Sleep before the next attempt, or report why there won't be one
    async fn backoff(&self, url: &str, attempt: u32, status: Option<StatusCode>) -> bool {
        if self.retry.allows_retry(attempt, status) {
            let wait = self.retry.backoff_delay(attempt);
            let wait_secs = wait.as_secs_f64();
            warn!(
                url,
                attempt,
                max_attempts = self.retry.max_attempts,
                wait_secs,
                "Retrying after backoff"
            );
            self.emit(FetchEvent::Backoff {
                url: url.to_string(),
                attempt,
                status,
                wait,
            });
            sleep(wait).await;
            return true;
        }

        let budget_left = self.retry.enabled && attempt < self.retry.max_attempts;
        match status {
            Some(status) if budget_left => {
                debug!(url, %status, "Status is not retryable");
                self.emit(FetchEvent::Rejected {
                    url: url.to_string(),
                    status,
                });
            }
            _ => {
                warn!(url, attempts = attempt, "Request failed, giving up");
                self.emit(FetchEvent::GaveUp {
                    url: url.to_string(),
                    attempts: attempt,
                });
            }
        }
        false
    }
}
