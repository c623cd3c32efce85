// Single GET primitive - everything above it decides what a status code means
use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, USER_AGENT};
use reqwest::StatusCode;
use thiserror::Error;

pub const DEFAULT_USER_AGENT: &str = "RepoLens/0.1.0";

#[derive(Error, Debug)]
pub enum TransportError {
    #[error("Network error: {0}")]
    NetworkError(#[from] reqwest::Error),

    #[error("Invalid header value: {0}")]
    InvalidHeader(#[from] reqwest::header::InvalidHeaderValue),

    #[error("Failed to build HTTP client: {0}")]
    ClientBuild(String),
}

/// A GET request, already carrying whatever headers the caller decided on
#[derive(Debug, Clone)]
pub struct HttpRequest {
    pub url: String,
    pub headers: HeaderMap,
}

impl HttpRequest {
    pub fn get(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            headers: HeaderMap::new(),
        }
    }
}

/// Whatever came back. A 404 is still a response, not an error.
#[derive(Debug, Clone)]
pub struct HttpResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: String,
}

impl HttpResponse {
    pub fn new(status: StatusCode, body: impl Into<String>) -> Self {
        Self {
            status,
            headers: HeaderMap::new(),
            body: body.into(),
        }
    }

    pub fn with_header(mut self, name: &'static str, value: &str) -> Self {
        if let Ok(value) = HeaderValue::from_str(value) {
            self.headers.insert(name, value);
        }
        self
    }

    pub fn is_success(&self) -> bool {
        self.status.is_success()
    }
}

/// The seam between retry logic and the network
///
/// Implementations return `Err` only when no response was received at all
/// (DNS, TLS, timeouts). Any status code, including 4xx/5xx, is `Ok`.
#[cfg_attr(any(test, feature = "mock"), mockall::automock)]
#[async_trait]
pub trait Transport: Send + Sync {
    async fn get(&self, request: &HttpRequest) -> Result<HttpResponse, TransportError>;
}

/// reqwest-backed transport used outside of tests
pub struct ReqwestTransport {
    client: reqwest::Client,
}

impl ReqwestTransport {
    pub fn new(user_agent: &str, timeout: Duration) -> Result<Self, TransportError> {
        let mut headers = HeaderMap::new();
        headers.insert(USER_AGENT, HeaderValue::from_str(user_agent)?);

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(timeout)
            .build()
            .map_err(|e| TransportError::ClientBuild(e.to_string()))?;

        Ok(Self { client })
    }
}

#[async_trait]
impl Transport for ReqwestTransport {
    async fn get(&self, request: &HttpRequest) -> Result<HttpResponse, TransportError> {
        let response = self
            .client
            .get(&request.url)
            .headers(request.headers.clone())
            .send()
            .await?;

        let status = response.status();
        let headers = response.headers().clone();
        let body = response.text().await?;

        Ok(HttpResponse {
            status,
            headers,
            body,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_response_helpers() {
        let response = HttpResponse::new(StatusCode::FORBIDDEN, "{}")
            .with_header("x-ratelimit-reset", "1700000000");

        assert!(!response.is_success());
        assert_eq!(
            response.headers.get("x-ratelimit-reset").unwrap(),
            "1700000000"
        );
        assert!(HttpResponse::new(StatusCode::OK, "[]").is_success());
    }

    #[test]
    fn test_request_starts_without_headers() {
        let request = HttpRequest::get("https://api.github.com/users/alice/repos");
        assert!(request.headers.is_empty());
        assert_eq!(request.url, "https://api.github.com/users/alice/repos");
    }

    #[test]
    fn test_reqwest_transport_builds() {
        assert!(ReqwestTransport::new(DEFAULT_USER_AGENT, Duration::from_secs(5)).is_ok());
    }

    #[test]
    fn test_reqwest_transport_rejects_bad_user_agent() {
        let result = ReqwestTransport::new("bad\nagent", Duration::from_secs(5));
        assert!(matches!(result, Err(TransportError::InvalidHeader(_))));
    }
}
