// GitHub provider implementation - bridges API client with RepositorySource trait
use std::sync::Arc;

use async_trait::async_trait;
use repolens_api::{
    EventHook, FetchOutcome, GitHubClient, GitHubRepo, RateLimitedFetcher, ReqwestTransport,
    Transport,
};
use serde_json::Value;

use crate::{config::InsightsConfig, models::RepositorySummary, source::RepositorySource, Result};

/// Wrapper around GitHubClient that implements RepositorySource
pub struct GitHubProvider {
    client: GitHubClient,
}

impl GitHubProvider {
    /// Real network client built from `config`
    pub fn from_config(config: &InsightsConfig, hook: Option<EventHook>) -> Result<Self> {
        let transport = ReqwestTransport::new(
            &config.github.user_agent,
            config.github.request_timeout(),
        )?;
        Ok(Self::with_transport(config, Arc::new(transport), hook))
    }

    /// Same wiring over any transport (tests use a mock)
    pub fn with_transport(
        config: &InsightsConfig,
        transport: Arc<dyn Transport>,
        hook: Option<EventHook>,
    ) -> Self {
        let mut fetcher = RateLimitedFetcher::new(transport)
            .with_token(config.token().map(str::to_string))
            .with_retry_config(config.retry.clone())
            .with_rate_limit_config(config.rate_limit.clone());

        if let Some(hook) = hook {
            fetcher = fetcher.with_event_hook(hook);
        }

        Self {
            client: GitHubClient::with_endpoints(fetcher, config.github.endpoints()),
        }
    }
}

#[async_trait]
impl RepositorySource for GitHubProvider {
    async fn list_repositories(&self, owner: &str) -> FetchOutcome<Vec<RepositorySummary>> {
        let repos = self.client.list_user_repos(owner).await?;
        Some(repos.into_iter().map(github_to_summary).collect())
    }

    async fn get_repository(&self, owner: &str, name: &str) -> FetchOutcome<RepositorySummary> {
        self.client
            .get_repository(owner, name)
            .await
            .map(github_to_summary)
    }

    async fn fetch_file(
        &self,
        owner: &str,
        repo: &str,
        branch: &str,
        file_path: &str,
    ) -> FetchOutcome<Value> {
        self.client.get_raw_file(owner, repo, branch, file_path).await
    }

    fn repository_url(&self, owner: &str, name: &str) -> String {
        self.client.repository_web_url(owner, name)
    }
}

/// Convert GitHub API repo to our RepositorySummary
pub fn github_to_summary(gh: GitHubRepo) -> RepositorySummary {
    RepositorySummary {
        name: gh.name,
        description: gh.description,
        topics: gh.topics,
        primary_language: gh.language,
        repo_url: non_empty(gh.html_url),
        // GitHub sends "" for a cleared homepage
        live_url: non_empty(gh.homepage),
        star_count: gh.stargazers_count,
        fork_count: gh.forks_count,
        created_at: gh.created_at,
        updated_at: gh.updated_at,
        default_branch: non_empty(gh.default_branch),
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}
