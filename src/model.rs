//! Issue snapshot types and decoding of GraphQL responses into them.
//!
//! The remote system owns issues; a run only ever holds the read-only
//! snapshot decoded here.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{Result, StaleBotError};
use crate::query::operation;

/// A repository label.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Label {
    /// Node id, needed by mutations that take labels.
    pub id: String,
    pub name: String,
}

/// Open or closed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum IssueState {
    Open,
    Closed,
}

/// A comment's timestamps.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Comment {
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

impl Comment {
    /// When the comment last changed.
    #[must_use]
    pub fn activity_at(&self) -> DateTime<Utc> {
        self.updated_at
            .map_or(self.created_at, |updated| updated.max(self.created_at))
    }
}

/// An issue as seen at the start of a run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Issue {
    pub id: String,
    pub number: u64,
    pub title: String,
    pub url: String,
    pub created_at: DateTime<Utc>,
    pub state: IssueState,
    pub labels: Vec<Label>,
    /// Labels the issue carries on the server. Larger than `labels.len()`
    /// when the read query did not return all of them.
    #[serde(default)]
    pub label_count: Option<u64>,
    /// Oldest first. The read query only asks for the latest one.
    pub comments: Vec<Comment>,
}

impl Issue {
    /// Whether the issue carries a label, compared case-insensitively as
    /// GitHub does.
    #[must_use]
    pub fn has_label(&self, name: &str) -> bool {
        self.labels
            .iter()
            .any(|label| label.name.eq_ignore_ascii_case(name))
    }

    /// Whether `labels` holds every label the issue carries.
    #[must_use]
    pub fn has_all_labels(&self) -> bool {
        self.label_count
            .is_none_or(|total| total <= self.labels.len() as u64)
    }

    /// Most recent comment activity, or creation time when there are no
    /// comments.
    #[must_use]
    pub fn last_activity(&self) -> DateTime<Utc> {
        self.comments
            .iter()
            .map(Comment::activity_at)
            .max()
            .unwrap_or(self.created_at)
    }
}

/// Decoded result of the read query.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct IssueSnapshot {
    pub issues: Vec<Issue>,
    /// Matching issues on the server, including ones past the first page.
    pub total_count: u64,
    pub has_next_page: bool,
}

impl IssueSnapshot {
    /// Whether some matching issues were not returned.
    #[must_use]
    pub fn is_truncated(&self) -> bool {
        self.has_next_page || self.total_count > self.issues.len() as u64
    }
}

// Wire shapes. Kept private so the rest of the crate only sees the
// snapshot types above.

#[derive(Deserialize)]
struct Connection<T> {
    nodes: Vec<T>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct LabelConnection {
    #[serde(default)]
    total_count: Option<u64>,
    nodes: Vec<Label>,
}

#[derive(Deserialize)]
struct LabelLookupData {
    repository: Option<LabelLookupRepository>,
}

#[derive(Deserialize)]
struct LabelLookupRepository {
    label: Option<Label>,
}

#[derive(Deserialize)]
struct IssuesData {
    repository: Option<IssuesRepository>,
}

#[derive(Deserialize)]
struct IssuesRepository {
    issues: IssueConnection,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct IssueConnection {
    total_count: u64,
    page_info: PageInfo,
    nodes: Vec<IssueNode>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct PageInfo {
    has_next_page: bool,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct IssueNode {
    id: String,
    number: u64,
    title: String,
    url: String,
    created_at: DateTime<Utc>,
    state: IssueState,
    labels: Option<LabelConnection>,
    comments: Connection<Comment>,
}

impl From<IssueNode> for Issue {
    fn from(node: IssueNode) -> Self {
        let (labels, label_count) = node
            .labels
            .map_or((Vec::new(), None), |c| (c.nodes, c.total_count));
        Self {
            id: node.id,
            number: node.number,
            title: node.title,
            url: node.url,
            created_at: node.created_at,
            state: node.state,
            labels,
            label_count,
            comments: node.comments.nodes,
        }
    }
}

/// Decode the label lookup response. `Ok(None)` means the repository has
/// no label with that name.
pub fn decode_label(data: Value) -> Result<Option<Label>> {
    let data: LabelLookupData = serde_json::from_value(data)
        .map_err(|e| StaleBotError::malformed(operation::LABEL_LOOKUP, e.to_string()))?;
    let repository = data.repository.ok_or_else(|| {
        StaleBotError::malformed(operation::LABEL_LOOKUP, "repository is null")
    })?;
    Ok(repository.label)
}

/// Decode the read query response into a snapshot.
pub fn decode_issues(data: Value) -> Result<IssueSnapshot> {
    let data: IssuesData = serde_json::from_value(data)
        .map_err(|e| StaleBotError::malformed(operation::STALE_CANDIDATES, e.to_string()))?;
    let connection = data
        .repository
        .ok_or_else(|| {
            StaleBotError::malformed(operation::STALE_CANDIDATES, "repository is null")
        })?
        .issues;

    Ok(IssueSnapshot {
        total_count: connection.total_count,
        has_next_page: connection.page_info.has_next_page,
        issues: connection.nodes.into_iter().map(Issue::from).collect(),
    })
}
