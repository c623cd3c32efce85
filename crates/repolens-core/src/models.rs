use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::config::SortBy;

/// Key the repository metadata is stored under in a merged result
pub const REPOSITORY_INFO_KEY: &str = "repositoryInfo";

/// Key non-object file content is stored under
pub const CONTENT_KEY: &str = "content";

/// Minimal repository metadata, renamed from GitHub's field names
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RepositorySummary {
    pub name: String,
    pub description: Option<String>,
    pub topics: Vec<String>,
    pub primary_language: Option<String>,
    pub repo_url: Option<String>,
    pub live_url: Option<String>,
    pub star_count: u32,
    pub fork_count: u32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_branch: Option<String>,
}

impl RepositorySummary {
    /// Timestamp used for "newest first" ordering
    pub fn timestamp(&self, sort_by: SortBy) -> Option<DateTime<Utc>> {
        match sort_by {
            SortBy::Created => Some(self.created_at),
            SortBy::Updated => Some(self.updated_at),
            SortBy::Unsorted => None,
        }
    }
}

/// Metadata attached to a merged result
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RepositoryInfo {
    Full(RepositorySummary),
    /// Single-repository mode only knows the name and where it lives
    Reduced { name: String, url: String },
}

impl RepositoryInfo {
    pub fn name(&self) -> &str {
        match self {
            RepositoryInfo::Full(summary) => &summary.name,
            RepositoryInfo::Reduced { name, .. } => name,
        }
    }

    pub fn summary(&self) -> Option<&RepositorySummary> {
        match self {
            RepositoryInfo::Full(summary) => Some(summary),
            RepositoryInfo::Reduced { .. } => None,
        }
    }
}

/// File content from one repository with its metadata folded in
///
/// Serializes as the file's own fields plus a `repositoryInfo` entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AggregatedResult {
    #[serde(flatten)]
    pub content: Map<String, Value>,
    #[serde(rename = "repositoryInfo")]
    pub repository_info: RepositoryInfo,
}

impl AggregatedResult {
    /// Merge `content` with `info`
    ///
    /// Objects are merged field by field. Anything else (arrays, strings) ends
    /// up under `content`. A `repositoryInfo` field in the file loses to ours.
    pub fn merge(content: Value, info: RepositoryInfo) -> Self {
        let mut fields = match content {
            Value::Object(fields) => fields,
            other => {
                let mut wrapped = Map::new();
                wrapped.insert(CONTENT_KEY.to_string(), other);
                wrapped
            }
        };
        fields.remove(REPOSITORY_INFO_KEY);

        Self {
            content: fields,
            repository_info: info,
        }
    }

    pub fn name(&self) -> &str {
        self.repository_info.name()
    }

    pub fn get(&self, field: &str) -> Option<&Value> {
        self.content.get(field)
    }
}

/// One entry of the aggregated output
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Insight {
    Merged(AggregatedResult),
    /// No filename configured - just the metadata
    Metadata(RepositorySummary),
}

impl Insight {
    pub fn name(&self) -> &str {
        match self {
            Insight::Merged(result) => result.name(),
            Insight::Metadata(summary) => &summary.name,
        }
    }

    pub fn summary(&self) -> Option<&RepositorySummary> {
        match self {
            Insight::Merged(result) => result.repository_info.summary(),
            Insight::Metadata(summary) => Some(summary),
        }
    }

    pub fn as_merged(&self) -> Option<&AggregatedResult> {
        match self {
            Insight::Merged(result) => Some(result),
            Insight::Metadata(_) => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use serde_json::json;

    fn summary(name: &str) -> RepositorySummary {
        RepositorySummary {
            name: name.to_string(),
            description: Some("demo".to_string()),
            topics: vec!["rust".to_string()],
            primary_language: Some("Rust".to_string()),
            repo_url: Some(format!("https://github.com/alice/{}", name)),
            live_url: None,
            star_count: 7,
            fork_count: 1,
            created_at: Utc.with_ymd_and_hms(2023, 1, 1, 0, 0, 0).unwrap(),
            updated_at: Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap(),
            default_branch: None,
        }
    }

    #[test]
    fn test_summary_serializes_camel_case() {
        let value = serde_json::to_value(summary("proj-a")).unwrap();
        assert_eq!(value["primaryLanguage"], "Rust");
        assert_eq!(value["starCount"], 7);
        assert_eq!(value["forkCount"], 1);
        assert_eq!(value["repoUrl"], "https://github.com/alice/proj-a");
        assert_eq!(value["liveUrl"], Value::Null);
        assert_eq!(value["createdAt"], "2023-01-01T00:00:00Z");
        assert!(value.get("defaultBranch").is_none());
    }

    #[test]
    fn test_merge_flattens_object_content() {
        let merged = AggregatedResult::merge(
            json!({"title": "Project A", "tags": ["web"]}),
            RepositoryInfo::Full(summary("proj-a")),
        );

        let value = serde_json::to_value(&merged).unwrap();
        assert_eq!(value["title"], "Project A");
        assert_eq!(value["repositoryInfo"]["name"], "proj-a");
        assert_eq!(value["repositoryInfo"]["starCount"], 7);
        assert_eq!(merged.name(), "proj-a");
    }

    #[test]
    fn test_merge_wraps_non_object_content() {
        let merged = AggregatedResult::merge(
            json!(["a", "b"]),
            RepositoryInfo::Reduced {
                name: "proj-a".into(),
                url: "https://github.com/alice/proj-a".into(),
            },
        );

        assert_eq!(merged.get("content"), Some(&json!(["a", "b"])));
        let value = serde_json::to_value(&merged).unwrap();
        assert_eq!(
            value["repositoryInfo"],
            json!({"name": "proj-a", "url": "https://github.com/alice/proj-a"})
        );
    }

    #[test]
    fn test_merge_replaces_repository_info_from_file() {
        let merged = AggregatedResult::merge(
            json!({"repositoryInfo": "spoofed", "title": "x"}),
            RepositoryInfo::Full(summary("proj-a")),
        );

        let value = serde_json::to_value(&merged).unwrap();
        assert_eq!(value["repositoryInfo"]["name"], "proj-a");
        assert_eq!(value.as_object().unwrap().len(), 2);
    }

    #[test]
    fn test_insight_accessors() {
        let metadata = Insight::Metadata(summary("proj-a"));
        assert_eq!(metadata.name(), "proj-a");
        assert!(metadata.as_merged().is_none());

        let merged = Insight::Merged(AggregatedResult::merge(
            json!({}),
            RepositoryInfo::Reduced {
                name: "proj-b".into(),
                url: "u".into(),
            },
        ));
        assert_eq!(merged.name(), "proj-b");
        assert!(merged.summary().is_none());
    }
}
