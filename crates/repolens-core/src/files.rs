use std::sync::Arc;

use repolens_api::FetchOutcome;
use serde_json::Value;
use tracing::debug;

use crate::{config::InsightsConfig, source::RepositorySource};

/// Fetches the configured file from one repository at a time
///
/// Cheap to clone, so every fan-out task gets its own copy.
#[derive(Clone)]
pub struct FileFetcher {
    source: Arc<dyn RepositorySource>,
    owner: String,
    file_path: String,
    branch: String,
    fallback_branch: Option<String>,
}

impl FileFetcher {
    /// `None` when the config has no filename - nothing to fetch
    pub fn from_config(source: Arc<dyn RepositorySource>, config: &InsightsConfig) -> Option<Self> {
        let file_path = config.filename()?;
        Some(Self {
            source,
            owner: config.username.trim().to_string(),
            file_path: file_path.to_string(),
            branch: config.branch.trim().to_string(),
            fallback_branch: config.fallback_branch().map(str::to_string),
        })
    }

    pub fn file_path(&self) -> &str {
        &self.file_path
    }

    /// Content of the file in `repo`
    ///
    /// Reads from `preferred_branch` when given, otherwise the configured
    /// branch, then once from the fallback branch if that differs.
    pub async fn fetch(&self, repo: &str, preferred_branch: Option<&str>) -> FetchOutcome<Value> {
        let primary = preferred_branch.unwrap_or(&self.branch);

        if let Some(content) = self
            .source
            .fetch_file(&self.owner, repo, primary, &self.file_path)
            .await
        {
            return Some(content);
        }

        match self.fallback_branch.as_deref() {
            Some(fallback) if fallback != primary => {
                debug!(repo, primary, fallback, file = %self.file_path, "Trying fallback branch");
                self.source
                    .fetch_file(&self.owner, repo, fallback, &self.file_path)
                    .await
            }
            _ => {
                debug!(repo, branch = primary, file = %self.file_path, "File not available");
                None
            }
        }
    }
}
