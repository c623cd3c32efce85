// Orchestration: list, fan out file fetches, merge, sort
use std::sync::Arc;

use chrono::{DateTime, Utc};
use repolens_api::{EventHook, Transport};
use serde_json::Value;
use tokio::task::JoinSet;
use tracing::{debug, error, info, warn};

use crate::{
    config::{InsightsConfig, SortBy},
    files::FileFetcher,
    lister::RepositoryLister,
    models::{AggregatedResult, Insight, RepositoryInfo},
    providers::GitHubProvider,
    source::RepositorySource,
    Error, Result,
};

/// The entry point: everything is configured up front, then `fetch_insights`
///
/// With `repository` set it runs in single-repository mode, otherwise it
/// scans every repository of `username`.
pub struct InsightAggregator {
    config: InsightsConfig,
    source: Arc<dyn RepositorySource>,
}

impl InsightAggregator {
    pub fn new(config: InsightsConfig) -> Result<Self> {
        config.validate()?;
        let provider = GitHubProvider::from_config(&config, None)?;
        Ok(Self::build(config, Arc::new(provider)))
    }

    /// Like [`InsightAggregator::new`], reporting fetch diagnostics to `hook`
    pub fn new_with_hook(config: InsightsConfig, hook: EventHook) -> Result<Self> {
        config.validate()?;
        let provider = GitHubProvider::from_config(&config, Some(hook))?;
        Ok(Self::build(config, Arc::new(provider)))
    }

    /// GitHub wiring over a custom transport
    pub fn with_transport(
        config: InsightsConfig,
        transport: Arc<dyn Transport>,
        hook: Option<EventHook>,
    ) -> Result<Self> {
        config.validate()?;
        let provider = GitHubProvider::with_transport(&config, transport, hook);
        Ok(Self::build(config, Arc::new(provider)))
    }

    /// Skip GitHub entirely and read from `source`
    pub fn with_source(config: InsightsConfig, source: Arc<dyn RepositorySource>) -> Result<Self> {
        config.validate()?;
        Ok(Self::build(config, source))
    }

    fn build(config: InsightsConfig, source: Arc<dyn RepositorySource>) -> Self {
        Self { config, source }
    }

    pub fn config(&self) -> &InsightsConfig {
        &self.config
    }

    fn owner(&self) -> &str {
        self.config.username.trim()
    }

    /// Run the whole thing
    ///
    /// Never fails: a repository whose file can't be fetched is left out, and
    /// anything worse yields an empty list (check the logs).
    pub async fn fetch_insights(&self) -> Vec<Insight> {
        match self.try_fetch_insights().await {
            Ok(insights) => insights,
            Err(err) => {
                error!(owner = self.owner(), error = %err, "Aggregation failed, returning no results");
                Vec::new()
            }
        }
    }

    async fn try_fetch_insights(&self) -> Result<Vec<Insight>> {
        match self.config.repository() {
            Some(repo) => self.fetch_single(repo).await,
            None => self.fetch_all().await,
        }
    }

    /// Single-repository mode: file content or nothing
    async fn fetch_single(&self, repo: &str) -> Result<Vec<Insight>> {
        let Some(files) = FileFetcher::from_config(self.source.clone(), &self.config) else {
            warn!(repo, "Single-repository mode needs a filename, nothing to fetch");
            return Ok(Vec::new());
        };

        let Some(content) = files.fetch(repo, None).await else {
            info!(repo, file = files.file_path(), "File not found, no result");
            return Ok(Vec::new());
        };

        let info = if self.config.single_repo_details {
            match self.source.get_repository(self.owner(), repo).await {
                Some(summary) => RepositoryInfo::Full(summary),
                None => {
                    debug!(repo, "Repository details unavailable, using name and URL only");
                    self.reduced_info(repo)
                }
            }
        } else {
            self.reduced_info(repo)
        };

        Ok(vec![Insight::Merged(AggregatedResult::merge(content, info))])
    }

    fn reduced_info(&self, repo: &str) -> RepositoryInfo {
        RepositoryInfo::Reduced {
            name: repo.to_string(),
            url: self.source.repository_url(self.owner(), repo),
        }
    }

    /// All-repositories mode
    async fn fetch_all(&self) -> Result<Vec<Insight>> {
        let summaries = RepositoryLister::new(self.source.clone())
            .list(self.owner())
            .await;

        let Some(files) = FileFetcher::from_config(self.source.clone(), &self.config) else {
            // Metadata only, in listing order
            return Ok(summaries.into_iter().map(Insight::Metadata).collect());
        };

        // Dropping the set aborts whatever is still running, so a caller
        // that stops waiting doesn't leave fetches retrying in the background
        let mut tasks = JoinSet::new();
        for (index, summary) in summaries.iter().enumerate() {
            let files = files.clone();
            let repo = summary.name.clone();
            let branch = if self.config.use_default_branch {
                summary.default_branch.clone()
            } else {
                None
            };
            tasks.spawn(async move { (index, files.fetch(&repo, branch.as_deref()).await) });
        }

        // Settle-all: every task finishes before anything is merged
        let mut contents: Vec<Option<Value>> = vec![None; summaries.len()];
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok((index, content)) => {
                    if let Some(slot) = contents.get_mut(index) {
                        *slot = content;
                    }
                }
                Err(err) if err.is_cancelled() => {
                    // Runtime is going away, a partial answer would be misleading
                    return Err(Error::TaskFailed(format!("file fetch was cancelled: {}", err)));
                }
                Err(err) => warn!(error = %err, "File fetch task panicked, skipping"),
            }
        }

        let requested = summaries.len();
        let mut merged = Vec::with_capacity(requested);
        for (summary, content) in summaries.into_iter().zip(contents) {
            match content {
                Some(content) => {
                    merged.push(AggregatedResult::merge(content, RepositoryInfo::Full(summary)));
                }
                None => debug!(repo = %summary.name, "No file content, skipping"),
            }
        }

        sort_newest_first(&mut merged, self.config.sort_by, |result, sort_by| {
            result
                .repository_info
                .summary()
                .and_then(|s| s.timestamp(sort_by))
        });

        info!(
            owner = self.owner(),
            requested,
            found = merged.len(),
            "Aggregated repository files"
        );

        Ok(merged.into_iter().map(Insight::Merged).collect())
    }
}

/// Stable sort, newest first; items without a timestamp go last
pub fn sort_newest_first<T, F>(items: &mut [T], sort_by: SortBy, timestamp_of: F)
where
    F: Fn(&T, SortBy) -> Option<DateTime<Utc>>,
{
    if sort_by == SortBy::Unsorted {
        return;
    }
    items.sort_by(|a, b| timestamp_of(b, sort_by).cmp(&timestamp_of(a, sort_by)));
}
