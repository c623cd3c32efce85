// Retry policy: exponential backoff for flaky responses, fixed waits for rate limits
use std::time::Duration;

use chrono::{DateTime, Utc};
use reqwest::header::HeaderMap;
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};

pub const RATE_LIMIT_RESET: &str = "x-ratelimit-reset";
pub const RATE_LIMIT_REMAINING: &str = "x-ratelimit-remaining";
pub const RETRY_AFTER: &str = "retry-after";

/// Generic retry configuration
///
/// Attempts are counted from 1. With the defaults a permanently failing URL
/// is tried 5 times with 2, 4, 8 and 16 seconds between attempts.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryConfig {
    /// Turning this off means the first failure is final
    pub enabled: bool,
    /// Total attempts including the first one
    pub max_attempts: u32,
    pub initial_delay_ms: u64,
    pub max_delay_ms: u64,
    pub backoff_multiplier: f64,
    /// Retry 404s and friends too. GitHub's raw host answers 404 for a
    /// missing branch, which is sometimes a replication blip.
    pub retry_client_errors: bool,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            max_attempts: 5,
            initial_delay_ms: 2000, // 2^1 seconds
            max_delay_ms: 60_000,
            backoff_multiplier: 2.0,
            retry_client_errors: true,
        }
    }
}

impl RetryConfig {
    /// No retries at all - handy for tests and one-shot checks
    pub fn disabled() -> Self {
        Self {
            enabled: false,
            ..Self::default()
        }
    }

    /// Delay to wait after failed attempt number `attempt` (1-based)
    pub fn backoff_delay(&self, attempt: u32) -> Duration {
        let exponent = attempt.saturating_sub(1).min(i32::MAX as u32) as i32;
        let delay_ms = (self.initial_delay_ms as f64) * self.backoff_multiplier.powi(exponent);
        let capped = delay_ms.min(self.max_delay_ms as f64).max(0.0);
        Duration::from_millis(capped as u64)
    }

    /// Whether another attempt is allowed after attempt number `attempt` failed
    pub fn allows_retry(&self, attempt: u32, status: Option<StatusCode>) -> bool {
        if !self.enabled || attempt >= self.max_attempts {
            return false;
        }

        match status {
            // No response at all: network trouble, always worth another go
            None => true,
            Some(status) => self.retry_client_errors || is_retryable_status(status),
        }
    }
}

/// How to behave when GitHub says "slow down"
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RateLimitConfig {
    /// Off means a rate-limited 403 is just another failure
    pub enabled: bool,
    /// Ceiling on a single wait, in case the reset header points to next week
    pub max_wait_secs: u64,
    /// Floor on a single wait, so a reset in the past doesn't spin
    pub min_wait_secs: u64,
    /// Ceiling on all rate-limit waits for one URL. None keeps waiting forever.
    pub max_total_wait_secs: Option<u64>,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            max_wait_secs: 3600, // GitHub windows are an hour long
            min_wait_secs: 1,
            max_total_wait_secs: None,
        }
    }
}

impl RateLimitConfig {
    /// Work out how long to wait if `status`/`headers` describe a rate limit
    ///
    /// Returns `None` when the response is not a rate-limit rejection. A 403
    /// with `X-RateLimit-Remaining` above zero is a real permission error and
    /// is left to the generic retry path.
    pub fn rate_limit_wait(
        &self,
        status: StatusCode,
        headers: &HeaderMap,
        now: DateTime<Utc>,
    ) -> Option<Duration> {
        if !self.enabled {
            return None;
        }

        if status != StatusCode::FORBIDDEN && status != StatusCode::TOO_MANY_REQUESTS {
            return None;
        }

        if let Some(remaining) = header_u64(headers, RATE_LIMIT_REMAINING) {
            if remaining > 0 {
                return None;
            }
        }

        let wait_ms = if let Some(reset) = header_i64(headers, RATE_LIMIT_RESET) {
            reset
                .saturating_mul(1000)
                .saturating_sub(now.timestamp_millis())
                .max(0) as u64
        } else if let Some(retry_after) = header_u64(headers, RETRY_AFTER) {
            // Secondary rate limits only send Retry-After
            retry_after.saturating_mul(1000)
        } else {
            return None;
        };

        let floor = self.min_wait_secs.saturating_mul(1000);
        let ceiling = self.max_wait_secs.saturating_mul(1000).max(floor);
        Some(Duration::from_millis(wait_ms.clamp(floor, ceiling)))
    }
}

/// Check if an HTTP status code is worth retrying even when client errors aren't
pub fn is_retryable_status(status: StatusCode) -> bool {
    status.is_server_error()
        || status == StatusCode::TOO_MANY_REQUESTS
        || status == StatusCode::REQUEST_TIMEOUT
}

fn header_str<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers.get(name)?.to_str().ok().map(str::trim)
}

fn header_i64(headers: &HeaderMap, name: &str) -> Option<i64> {
    header_str(headers, name)?.parse().ok()
}

fn header_u64(headers: &HeaderMap, name: &str) -> Option<u64> {
    header_str(headers, name)?.parse().ok()
}
