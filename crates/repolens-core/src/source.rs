use repolens_api::FetchOutcome;
use serde_json::Value;

use crate::models::RepositorySummary;

/// Where repositories and their files come from
///
/// GitHub is the only implementation today; the trait keeps the aggregator
/// testable without a network and leaves room for other hosts.
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait RepositorySource: Send + Sync {
    /// All repositories of `owner` (one API page)
    async fn list_repositories(&self, owner: &str) -> FetchOutcome<Vec<RepositorySummary>>;

    async fn get_repository(&self, owner: &str, name: &str) -> FetchOutcome<RepositorySummary>;

    /// Parsed JSON content of `file_path` on `branch`
    async fn fetch_file(
        &self,
        owner: &str,
        repo: &str,
        branch: &str,
        file_path: &str,
    ) -> FetchOutcome<Value>;

    /// Canonical browser URL of a repository
    fn repository_url(&self, owner: &str, name: &str) -> String;
}
