use std::path::Path;
use std::time::Duration;

use repolens_api::github::{GITHUB_API_BASE, GITHUB_RAW_BASE, GITHUB_WEB_BASE};
use repolens_api::transport::DEFAULT_USER_AGENT;
use repolens_api::{GitHubEndpoints, RateLimitConfig, RetryConfig};
use serde::{Deserialize, Serialize};

use crate::Error;

/// Everything an aggregation run needs, fixed at construction
///
/// Build it in code with [`InsightsConfig::new`] and the `with_*` helpers, or
/// load it from TOML:
///
/// ```toml
/// username = "alice"
/// filename = "portfolio.json"
/// sort_by = "updated"
///
/// [retry]
/// max_attempts = 3
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InsightsConfig {
    /// GitHub user whose repositories are scanned
    pub username: String,

    /// File fetched from each repository. Empty or missing means metadata only.
    #[serde(default)]
    pub filename: Option<String>,

    /// Only look at this repository (single-repository mode)
    #[serde(default)]
    pub repository: Option<String>,

    /// Personal access token - raises the rate limit from 60 to 5000 req/h
    #[serde(default)]
    pub token: Option<String>,

    /// Branch the file is read from
    #[serde(default = "default_branch")]
    pub branch: String,

    /// Second branch to try when the file isn't on `branch`
    #[serde(default)]
    pub fallback_branch: Option<String>,

    /// Prefer the default branch the listing reports over `branch`
    #[serde(default = "default_use_default_branch")]
    pub use_default_branch: bool,

    #[serde(default)]
    pub sort_by: SortBy,

    /// In single-repository mode, also fetch full repository metadata
    #[serde(default)]
    pub single_repo_details: bool,

    #[serde(default)]
    pub github: GitHubConfig,

    #[serde(default)]
    pub retry: RetryConfig,

    #[serde(default)]
    pub rate_limit: RateLimitConfig,
}

fn default_branch() -> String {
    "main".to_string()
}

fn default_use_default_branch() -> bool {
    true
}

impl InsightsConfig {
    pub fn new(username: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            filename: None,
            repository: None,
            token: None,
            branch: default_branch(),
            fallback_branch: None,
            use_default_branch: default_use_default_branch(),
            sort_by: SortBy::default(),
            single_repo_details: false,
            github: GitHubConfig::default(),
            retry: RetryConfig::default(),
            rate_limit: RateLimitConfig::default(),
        }
    }

    pub fn with_filename(mut self, filename: impl Into<String>) -> Self {
        self.filename = Some(filename.into());
        self
    }

    pub fn with_repository(mut self, repository: impl Into<String>) -> Self {
        self.repository = Some(repository.into());
        self
    }

    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    pub fn with_branch(mut self, branch: impl Into<String>) -> Self {
        self.branch = branch.into();
        self
    }

    pub fn with_fallback_branch(mut self, branch: impl Into<String>) -> Self {
        self.fallback_branch = Some(branch.into());
        self
    }

    pub fn with_sort_by(mut self, sort_by: SortBy) -> Self {
        self.sort_by = sort_by;
        self
    }

    pub fn with_retry(mut self, retry: RetryConfig) -> Self {
        self.retry = retry;
        self
    }

    pub fn with_rate_limit(mut self, rate_limit: RateLimitConfig) -> Self {
        self.rate_limit = rate_limit;
        self
    }

    pub fn with_github(mut self, github: GitHubConfig) -> Self {
        self.github = github;
        self
    }

    /// Filename to fetch, with blank values treated as "no file"
    pub fn filename(&self) -> Option<&str> {
        non_blank(&self.filename)
    }

    /// Repository for single-repository mode, if any
    pub fn repository(&self) -> Option<&str> {
        non_blank(&self.repository)
    }

    pub fn token(&self) -> Option<&str> {
        non_blank(&self.token)
    }

    pub fn fallback_branch(&self) -> Option<&str> {
        non_blank(&self.fallback_branch)
    }

    pub fn from_toml_str(contents: &str) -> crate::Result<Self> {
        let config: InsightsConfig = toml::from_str(contents)
            .map_err(|e| Error::ConfigError(format!("Failed to parse config: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: impl AsRef<Path>) -> crate::Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_toml_str(&contents)
    }

    pub fn to_toml_string(&self) -> crate::Result<String> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Catch the mistakes that would otherwise show up as mysteriously empty results
    pub fn validate(&self) -> crate::Result<()> {
        if self.username.trim().is_empty() {
            return Err(Error::ConfigError("username must not be empty".into()));
        }

        if self.branch.trim().is_empty() {
            return Err(Error::ConfigError("branch must not be empty".into()));
        }

        if matches!(&self.fallback_branch, Some(b) if b.trim().is_empty()) {
            return Err(Error::ConfigError("fallback_branch must not be blank".into()));
        }

        if self.retry.max_attempts == 0 {
            return Err(Error::ConfigError("retry.max_attempts must be at least 1".into()));
        }

        if !(self.retry.backoff_multiplier >= 1.0) {
            return Err(Error::ConfigError(
                "retry.backoff_multiplier must be at least 1.0".into(),
            ));
        }

        if self.github.request_timeout_secs == 0 {
            return Err(Error::ConfigError(
                "github.request_timeout_secs must be positive".into(),
            ));
        }

        for (name, url) in [
            ("api_url", &self.github.api_url),
            ("raw_url", &self.github.raw_url),
            ("web_url", &self.github.web_url),
        ] {
            if !(url.starts_with("https://") || url.starts_with("http://")) {
                return Err(Error::ConfigError(format!(
                    "github.{} must be an http(s) URL, got {:?}",
                    name, url
                )));
            }
        }

        Ok(())
    }
}

fn non_blank(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

/// Which timestamp puts the newest repositories first
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum SortBy {
    #[default]
    Created,
    Updated,
    /// Keep the order the API returned
    #[serde(rename = "none")]
    Unsorted,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GitHubConfig {
    /// REST API (GitHub Enterprise: https://HOST/api/v3)
    #[serde(default = "default_api_url")]
    pub api_url: String,

    /// Raw file host
    #[serde(default = "default_raw_url")]
    pub raw_url: String,

    /// Browser host, used to build repository links
    #[serde(default = "default_web_url")]
    pub web_url: String,

    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,

    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

fn default_api_url() -> String {
    GITHUB_API_BASE.to_string()
}

fn default_raw_url() -> String {
    GITHUB_RAW_BASE.to_string()
}

fn default_web_url() -> String {
    GITHUB_WEB_BASE.to_string()
}

fn default_request_timeout() -> u64 {
    30
}

fn default_user_agent() -> String {
    DEFAULT_USER_AGENT.to_string()
}

impl Default for GitHubConfig {
    fn default() -> Self {
        Self {
            api_url: default_api_url(),
            raw_url: default_raw_url(),
            web_url: default_web_url(),
            request_timeout_secs: default_request_timeout(),
            user_agent: default_user_agent(),
        }
    }
}

impl GitHubConfig {
    pub fn endpoints(&self) -> GitHubEndpoints {
        GitHubEndpoints {
            api_url: self.api_url.clone(),
            raw_url: self.raw_url.clone(),
            web_url: self.web_url.clone(),
        }
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}
