// GitHub endpoints: repo listing, repo details, raw file content
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use crate::fetch::{FetchOutcome, RateLimitedFetcher};

pub const GITHUB_API_BASE: &str = "https://api.github.com";
pub const GITHUB_RAW_BASE: &str = "https://raw.githubusercontent.com";
pub const GITHUB_WEB_BASE: &str = "https://github.com";

/// Where the three GitHub hosts live - overridable for Enterprise or tests
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GitHubEndpoints {
    pub api_url: String,
    pub raw_url: String,
    pub web_url: String,
}

impl Default for GitHubEndpoints {
    fn default() -> Self {
        Self {
            api_url: GITHUB_API_BASE.to_string(),
            raw_url: GITHUB_RAW_BASE.to_string(),
            web_url: GITHUB_WEB_BASE.to_string(),
        }
    }
}

pub struct GitHubClient {
    fetcher: RateLimitedFetcher,
    endpoints: GitHubEndpoints,
}

impl GitHubClient {
    pub fn new(fetcher: RateLimitedFetcher) -> Self {
        Self::with_endpoints(fetcher, GitHubEndpoints::default())
    }

    pub fn with_endpoints(fetcher: RateLimitedFetcher, endpoints: GitHubEndpoints) -> Self {
        Self {
            fetcher,
            endpoints: GitHubEndpoints {
                api_url: trim_base(&endpoints.api_url),
                raw_url: trim_base(&endpoints.raw_url),
                web_url: trim_base(&endpoints.web_url),
            },
        }
    }

    pub fn endpoints(&self) -> &GitHubEndpoints {
        &self.endpoints
    }

    /// One page of a user's public repositories (GitHub's default page size)
    pub async fn list_user_repos(&self, username: &str) -> FetchOutcome<Vec<GitHubRepo>> {
        let url = format!(
            "{}/users/{}/repos",
            self.endpoints.api_url,
            urlencoding::encode(username)
        );
        debug!(username, "Listing repositories");
        self.fetcher.fetch_json(&url).await
    }

    /// Metadata for a single repository
    pub async fn get_repository(&self, owner: &str, repo: &str) -> FetchOutcome<GitHubRepo> {
        let url = format!(
            "{}/repos/{}/{}",
            self.endpoints.api_url,
            urlencoding::encode(owner),
            urlencoding::encode(repo)
        );
        self.fetcher.fetch_json(&url).await
    }

    /// A JSON file from `branch`, parsed into whatever shape its owner chose
    pub async fn get_raw_file(
        &self,
        owner: &str,
        repo: &str,
        branch: &str,
        file_path: &str,
    ) -> FetchOutcome<Value> {
        let url = self.raw_file_url(owner, repo, branch, file_path);
        debug!(repo, branch, file_path, "Fetching raw file");
        self.fetcher.fetch_json(&url).await
    }

    pub fn raw_file_url(&self, owner: &str, repo: &str, branch: &str, file_path: &str) -> String {
        format!(
            "{}/{}/{}/{}/{}",
            self.endpoints.raw_url,
            urlencoding::encode(owner),
            urlencoding::encode(repo),
            encode_path(branch),
            encode_path(file_path)
        )
    }

    /// Browser URL of a repository
    pub fn repository_web_url(&self, owner: &str, repo: &str) -> String {
        format!("{}/{}/{}", self.endpoints.web_url, owner, repo)
    }
}

fn trim_base(url: &str) -> String {
    url.trim_end_matches('/').to_string()
}

/// Encode each segment but keep the slashes - `docs/site.json` stays a path
fn encode_path(path: &str) -> String {
    path.trim_matches('/')
        .split('/')
        .map(|segment| urlencoding::encode(segment).into_owned())
        .collect::<Vec<_>>()
        .join("/")
}

/// Repository record as the GitHub REST API returns it (the fields we read)
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GitHubRepo {
    pub name: String,
    pub description: Option<String>,
    #[serde(default)]
    pub topics: Vec<String>,
    pub language: Option<String>,
    pub html_url: Option<String>,
    pub homepage: Option<String>,
    #[serde(default)]
    pub stargazers_count: u32,
    #[serde(default)]
    pub forks_count: u32,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub updated_at: chrono::DateTime<chrono::Utc>,
    pub default_branch: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::retry::RetryConfig;
    use crate::transport::{HttpResponse, MockTransport};
    use reqwest::StatusCode;
    use std::sync::Arc;

    const REPOS: &str = r#"[
        {
            "name": "proj-a",
            "description": "First",
            "topics": ["rust", "cli"],
            "language": "Rust",
            "html_url": "https://github.com/alice/proj-a",
            "homepage": "https://proj-a.dev",
            "stargazers_count": 12,
            "forks_count": 3,
            "created_at": "2023-01-01T00:00:00Z",
            "updated_at": "2024-02-01T10:00:00Z",
            "default_branch": "main",
            "private": false
        },
        {
            "name": "proj-b",
            "description": null,
            "language": null,
            "html_url": "https://github.com/alice/proj-b",
            "homepage": null,
            "created_at": "2024-06-01T00:00:00Z",
            "updated_at": "2024-06-02T00:00:00Z"
        }
    ]"#;

    fn client_expecting(url: &'static str, response: HttpResponse) -> GitHubClient {
        let mut transport = MockTransport::new();
        transport
            .expect_get()
            .withf(move |req| req.url == url)
            .times(1)
            .returning(move |_| Ok(response.clone()));

        let fetcher = RateLimitedFetcher::new(Arc::new(transport))
            .with_retry_config(RetryConfig::disabled());
        GitHubClient::new(fetcher)
    }

    #[tokio::test]
    async fn test_list_user_repos() {
        let client = client_expecting(
            "https://api.github.com/users/alice/repos",
            HttpResponse::new(StatusCode::OK, REPOS),
        );

        let repos = client.list_user_repos("alice").await.unwrap();
        assert_eq!(repos.len(), 2);
        assert_eq!(repos[0].name, "proj-a");
        assert_eq!(repos[0].topics, vec!["rust", "cli"]);
        assert_eq!(repos[0].stargazers_count, 12);
        assert!(repos[1].topics.is_empty());
        assert_eq!(repos[1].forks_count, 0);
        assert_eq!(repos[1].default_branch, None);
    }

    #[tokio::test]
    async fn test_list_user_repos_failure_is_absence() {
        let client = client_expecting(
            "https://api.github.com/users/ghost/repos",
            HttpResponse::new(StatusCode::NOT_FOUND, r#"{"message":"Not Found"}"#),
        );

        assert!(client.list_user_repos("ghost").await.is_none());
    }

    #[tokio::test]
    async fn test_get_repository() {
        let body = r#"{
            "name": "proj-a",
            "created_at": "2023-01-01T00:00:00Z",
            "updated_at": "2023-01-02T00:00:00Z"
        }"#;
        let client = client_expecting(
            "https://api.github.com/repos/alice/proj-a",
            HttpResponse::new(StatusCode::OK, body),
        );

        let repo = client.get_repository("alice", "proj-a").await.unwrap();
        assert_eq!(repo.name, "proj-a");
    }

    #[tokio::test]
    async fn test_get_raw_file() {
        let client = client_expecting(
            "https://raw.githubusercontent.com/alice/proj-a/main/portfolio.json",
            HttpResponse::new(StatusCode::OK, r#"{"title":"Project A"}"#),
        );

        let content = client
            .get_raw_file("alice", "proj-a", "main", "portfolio.json")
            .await
            .unwrap();
        assert_eq!(content["title"], "Project A");
    }

    #[test]
    fn test_raw_url_keeps_nested_paths() {
        let fetcher = RateLimitedFetcher::new(Arc::new(MockTransport::new()));
        let client = GitHubClient::with_endpoints(
            fetcher,
            GitHubEndpoints {
                raw_url: "http://localhost:8080/raw/".to_string(),
                ..GitHubEndpoints::default()
            },
        );

        assert_eq!(
            client.raw_file_url("alice", "my repo", "main", "/docs/site info.json"),
            "http://localhost:8080/raw/alice/my%20repo/main/docs/site%20info.json"
        );
        assert_eq!(
            client.repository_web_url("alice", "proj-a"),
            "https://github.com/alice/proj-a"
        );
    }
}
