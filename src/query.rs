//! GraphQL request construction.
//!
//! Every request is a static query document plus a JSON `variables`
//! object. Repository coordinates, label names, node ids and comment bodies
//! only ever travel as variables, so user-controlled text cannot change the
//! shape of a query.
//!
//! # Example
//!
//! ```
//! use stalebot::query::IssueQuery;
//!
//! let request = IssueQuery::new("octo", "widgets", "pending-update")
//!     .page_size(50)
//!     .build();
//! assert_eq!(request.operation_name, "StaleCandidates");
//! assert_eq!(request.variables["first"], 50);
//! ```

use serde::Serialize;
use serde_json::{json, Value};

use crate::config::MAX_PAGE_SIZE;

/// Labels fetched per issue. GitHub caps a connection page at 100; issues
/// with more labels than this are never classified.
pub const LABELS_PER_ISSUE: u32 = 100;

/// Operation names, also used to tell requests apart in logs and mocks.
pub mod operation {
    pub const LABEL_LOOKUP: &str = "TrackingLabel";
    pub const STALE_CANDIDATES: &str = "StaleCandidates";
    pub const ADD_COMMENT: &str = "AddComment";
    pub const REMOVE_LABEL: &str = "RemoveLabel";
    pub const CLOSE_ISSUE: &str = "CloseIssue";
}

const LABEL_LOOKUP_QUERY: &str = r"
    query TrackingLabel($owner: String!, $repo: String!, $label: String!) {
        repository(owner: $owner, name: $repo) {
            label(name: $label) {
                id
                name
            }
        }
    }
";

const STALE_CANDIDATES_QUERY: &str = r"
    query StaleCandidates($owner: String!, $repo: String!, $labels: [String!], $first: Int!, $labelsPerIssue: Int!) {
        repository(owner: $owner, name: $repo) {
            issues(first: $first, labels: $labels, states: [OPEN], orderBy: {field: UPDATED_AT, direction: ASC}) {
                totalCount
                pageInfo {
                    hasNextPage
                }
                nodes {
                    id
                    number
                    title
                    url
                    createdAt
                    state
                    labels(first: $labelsPerIssue) {
                        totalCount
                        nodes {
                            id
                            name
                        }
                    }
                    comments(last: 1) {
                        nodes {
                            createdAt
                            updatedAt
                        }
                    }
                }
            }
        }
    }
";

const ADD_COMMENT_MUTATION: &str = r"
    mutation AddComment($subjectId: ID!, $body: String!) {
        addComment(input: {subjectId: $subjectId, body: $body}) {
            clientMutationId
        }
    }
";

const REMOVE_LABEL_MUTATION: &str = r"
    mutation RemoveLabel($labelableId: ID!, $labelIds: [ID!]!) {
        removeLabelsFromLabelable(input: {labelableId: $labelableId, labelIds: $labelIds}) {
            clientMutationId
        }
    }
";

const CLOSE_ISSUE_MUTATION: &str = r"
    mutation CloseIssue($issueId: ID!) {
        closeIssue(input: {issueId: $issueId}) {
            issue {
                id
            }
        }
    }
";

/// A GraphQL request body.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GraphQLRequest {
    pub operation_name: &'static str,
    pub query: &'static str,
    pub variables: Value,
}

impl GraphQLRequest {
    /// Whether this request changes remote state.
    #[must_use]
    pub fn is_mutation(&self) -> bool {
        self.query.trim_start().starts_with("mutation")
    }

    /// The issue node id a mutation targets, if any.
    #[must_use]
    pub fn subject_id(&self) -> Option<&str> {
        ["subjectId", "labelableId", "issueId"]
            .iter()
            .find_map(|key| self.variables.get(key).and_then(Value::as_str))
    }
}

/// Request resolving the tracking label to its node id.
#[must_use]
pub fn label_lookup(owner: &str, repo: &str, label: &str) -> GraphQLRequest {
    GraphQLRequest {
        operation_name: operation::LABEL_LOOKUP,
        query: LABEL_LOOKUP_QUERY,
        variables: json!({
            "owner": owner,
            "repo": repo,
            "label": label,
        }),
    }
}

/// Builder for the single read request of a run.
///
/// Only the first page is requested. The response carries `totalCount`
/// and `hasNextPage` so callers can tell when issues were left out.
#[derive(Debug, Clone)]
pub struct IssueQuery {
    owner: String,
    repo: String,
    labels: Vec<String>,
    page_size: u32,
}

impl IssueQuery {
    #[must_use]
    pub fn new(owner: &str, repo: &str, label: &str) -> Self {
        Self {
            owner: owner.to_string(),
            repo: repo.to_string(),
            labels: vec![label.to_string()],
            page_size: MAX_PAGE_SIZE,
        }
    }

    /// Also require another label. GitHub matches issues carrying any of
    /// the listed labels.
    #[must_use]
    pub fn with_label(mut self, label: &str) -> Self {
        self.labels.push(label.to_string());
        self
    }

    /// Set the page size, clamped to `1..=100`.
    #[must_use]
    pub fn page_size(mut self, page_size: u32) -> Self {
        self.page_size = page_size.clamp(1, MAX_PAGE_SIZE);
        self
    }

    #[must_use]
    pub fn build(&self) -> GraphQLRequest {
        GraphQLRequest {
            operation_name: operation::STALE_CANDIDATES,
            query: STALE_CANDIDATES_QUERY,
            variables: json!({
                "owner": self.owner,
                "repo": self.repo,
                "labels": self.labels,
                "first": self.page_size,
                "labelsPerIssue": LABELS_PER_ISSUE,
            }),
        }
    }
}

/// Mutation posting a comment on an issue.
#[must_use]
pub fn add_comment(issue_id: &str, body: &str) -> GraphQLRequest {
    GraphQLRequest {
        operation_name: operation::ADD_COMMENT,
        query: ADD_COMMENT_MUTATION,
        variables: json!({
            "subjectId": issue_id,
            "body": body,
        }),
    }
}

/// Mutation removing one label from an issue.
#[must_use]
pub fn remove_label(issue_id: &str, label_id: &str) -> GraphQLRequest {
    GraphQLRequest {
        operation_name: operation::REMOVE_LABEL,
        query: REMOVE_LABEL_MUTATION,
        variables: json!({
            "labelableId": issue_id,
            "labelIds": [label_id],
        }),
    }
}

/// Mutation closing an issue.
#[must_use]
pub fn close_issue(issue_id: &str) -> GraphQLRequest {
    GraphQLRequest {
        operation_name: operation::CLOSE_ISSUE,
        query: CLOSE_ISSUE_MUTATION,
        variables: json!({
            "issueId": issue_id,
        }),
    }
}
