use std::sync::Arc;

use tracing::{info, warn};

use crate::{models::RepositorySummary, source::RepositorySource};

/// Turns "list this user's repos" into a plain Vec
///
/// A failed listing and a user without repositories both come back empty;
/// the fetch events are the only way to tell them apart.
pub struct RepositoryLister {
    source: Arc<dyn RepositorySource>,
}

impl RepositoryLister {
    pub fn new(source: Arc<dyn RepositorySource>) -> Self {
        Self { source }
    }

    pub async fn list(&self, owner: &str) -> Vec<RepositorySummary> {
        match self.source.list_repositories(owner).await {
            Some(repos) => {
                let total = repos.len();
                // Nameless records can't be turned into URLs
                let repos: Vec<_> = repos
                    .into_iter()
                    .filter(|r| !r.name.trim().is_empty())
                    .collect();
                let count = repos.len();
                if count < total {
                    let skipped = total - count;
                    warn!(owner, skipped, "Dropped repositories without a name");
                }
                info!(owner, count, "Listed repositories");
                repos
            }
            None => {
                warn!(owner, "Repository listing unavailable, treating as empty");
                Vec::new()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::MockRepositorySource;
    use chrono::{TimeZone, Utc};

    fn summary(name: &str) -> RepositorySummary {
        RepositorySummary {
            name: name.to_string(),
            description: None,
            topics: vec![],
            primary_language: None,
            repo_url: None,
            live_url: None,
            star_count: 0,
            fork_count: 0,
            created_at: Utc.with_ymd_and_hms(2023, 1, 1, 0, 0, 0).unwrap(),
            updated_at: Utc.with_ymd_and_hms(2023, 1, 1, 0, 0, 0).unwrap(),
            default_branch: None,
        }
    }

    #[tokio::test]
    async fn test_list_keeps_api_order() {
        let mut source = MockRepositorySource::new();
        source
            .expect_list_repositories()
            .withf(|owner| owner == "alice")
            .times(1)
            .returning(|_| Some(vec![summary("zeta"), summary("alpha")]));

        let lister = RepositoryLister::new(Arc::new(source));
        let names: Vec<String> = lister.list("alice").await.into_iter().map(|r| r.name).collect();
        assert_eq!(names, vec!["zeta", "alpha"]);
    }

    #[tokio::test]
    async fn test_absent_listing_is_empty() {
        let mut source = MockRepositorySource::new();
        source
            .expect_list_repositories()
            .times(1)
            .returning(|_| None);

        let lister = RepositoryLister::new(Arc::new(source));
        assert!(lister.list("alice").await.is_empty());
    }

    #[tokio::test]
    async fn test_nameless_records_are_dropped() {
        let mut source = MockRepositorySource::new();
        source
            .expect_list_repositories()
            .returning(|_| Some(vec![summary(""), summary("proj-a")]));

        let lister = RepositoryLister::new(Arc::new(source));
        let repos = lister.list("alice").await;
        assert_eq!(repos.len(), 1);
        assert_eq!(repos[0].name, "proj-a");
    }
}
