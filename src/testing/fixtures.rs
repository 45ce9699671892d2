//! Test data builders.
//!
//! Provides issue snapshots and GraphQL response bodies shaped like the
//! real API's, for consistent testing.

use chrono::{DateTime, Duration, TimeZone, Utc};
use serde_json::{json, Value};

use crate::classifier::StaleIssueRecord;
use crate::model::{Comment, Issue, IssueState, Label};

/// Creation time used when a test does not set one.
#[must_use]
pub fn default_created_at() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0)
        .single()
        .unwrap_or_default()
}

/// Builder for [`Issue`] snapshots.
///
/// # Example
///
/// ```rust,ignore
/// let issue = IssueBuilder::new("I_1", 1)
///     .comment_at(now - Duration::minutes(10))
///     .label("pending-update")
///     .build();
/// ```
#[derive(Debug, Clone)]
pub struct IssueBuilder {
    issue: Issue,
}

impl IssueBuilder {
    #[must_use]
    pub fn new(id: &str, number: u64) -> Self {
        Self {
            issue: Issue {
                id: id.to_string(),
                number,
                title: format!("Issue {number}"),
                url: format!("https://github.com/octo/widgets/issues/{number}"),
                created_at: default_created_at(),
                state: IssueState::Open,
                labels: Vec::new(),
                label_count: None,
                comments: Vec::new(),
            },
        }
    }

    #[must_use]
    pub fn title(mut self, title: &str) -> Self {
        self.issue.title = title.to_string();
        self
    }

    #[must_use]
    pub fn created_at(mut self, at: DateTime<Utc>) -> Self {
        self.issue.created_at = at;
        self
    }

    /// Add a never-edited comment.
    #[must_use]
    pub fn comment_at(mut self, at: DateTime<Utc>) -> Self {
        self.issue.comments.push(Comment {
            created_at: at,
            updated_at: None,
        });
        self
    }

    /// Add a comment created at one time and edited at another.
    #[must_use]
    pub fn edited_comment(mut self, created: DateTime<Utc>, updated: DateTime<Utc>) -> Self {
        self.issue.comments.push(Comment {
            created_at: created,
            updated_at: Some(updated),
        });
        self
    }

    /// Add a label; its id is derived from the name.
    #[must_use]
    pub fn label(mut self, name: &str) -> Self {
        self.issue.labels.push(Label {
            id: format!("LA_{name}"),
            name: name.to_string(),
        });
        self
    }

    /// Claim the issue carries `total` labels on the server, more than
    /// the ones added with [`IssueBuilder::label`] when a read was capped.
    #[must_use]
    pub fn label_count(mut self, total: u64) -> Self {
        self.issue.label_count = Some(total);
        self
    }

    /// Finish the issue. Unless set, the label count matches the labels
    /// added, as for a complete read.
    #[must_use]
    pub fn build(mut self) -> Issue {
        if self.issue.label_count.is_none() {
            self.issue.label_count = Some(self.issue.labels.len() as u64);
        }
        self.issue
    }
}

/// A stale record with a fixed age of three days.
#[must_use]
pub fn stale_record(issue_id: &str, number: u64) -> StaleIssueRecord {
    StaleIssueRecord {
        issue_id: issue_id.to_string(),
        number,
        title: format!("Stale issue {number}"),
        url: format!("https://github.com/octo/widgets/issues/{number}"),
        last_activity: default_created_at(),
        elapsed: Duration::days(3),
    }
}

/// `data` for the label lookup query.
#[must_use]
pub fn label_response(label: Option<(&str, &str)>) -> Value {
    let label = label.map(|(id, name)| json!({ "id": id, "name": name }));
    json!({ "repository": { "label": label } })
}

/// `data` for the issue query, in the API's connection shape.
#[must_use]
pub fn issues_response(issues: &[Issue], total_count: u64, has_next_page: bool) -> Value {
    let nodes: Vec<Value> = issues
        .iter()
        .map(|issue| {
            json!({
                "id": issue.id,
                "number": issue.number,
                "title": issue.title,
                "url": issue.url,
                "createdAt": issue.created_at,
                "state": issue.state,
                "labels": {
                    "totalCount": issue.label_count.unwrap_or(issue.labels.len() as u64),
                    "nodes": issue.labels,
                },
                "comments": { "nodes": issue.comments },
            })
        })
        .collect();

    json!({
        "repository": {
            "issues": {
                "totalCount": total_count,
                "pageInfo": { "hasNextPage": has_next_page },
                "nodes": nodes,
            }
        }
    })
}
