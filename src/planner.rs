//! Remediation planning.
//!
//! Turns stale records into the ordered action list the executor runs:
//! comment first so the explanation is on the issue before anything
//! changes, then drop the tracking label, then close.

use std::sync::OnceLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::classifier::StaleIssueRecord;
use crate::config::format_duration;

/// Placeholders a closing comment may use.
pub const KNOWN_PLACEHOLDERS: &[&str] = &["threshold", "label", "fresh_label"];

fn placeholder_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\{([A-Za-z_][A-Za-z0-9_]*)\}").expect("valid placeholder regex"))
}

/// A closing comment with `{placeholder}` slots.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommentTemplate {
    source: String,
}

impl CommentTemplate {
    #[must_use]
    pub fn new(source: impl Into<String>) -> Self {
        Self {
            source: source.into(),
        }
    }

    #[must_use]
    pub fn is_blank(&self) -> bool {
        self.source.trim().is_empty()
    }

    /// Placeholder names in order of appearance, without duplicates.
    #[must_use]
    pub fn placeholders(&self) -> Vec<String> {
        let mut names: Vec<String> = Vec::new();
        for caps in placeholder_regex().captures_iter(&self.source) {
            let name = caps[1].to_string();
            if !names.contains(&name) {
                names.push(name);
            }
        }
        names
    }

    /// Substitute known placeholders. Unknown ones are left as written.
    #[must_use]
    pub fn render(&self, values: &TemplateValues<'_>) -> String {
        placeholder_regex()
            .replace_all(&self.source, |caps: &regex::Captures<'_>| {
                match &caps[1] {
                    "threshold" => values.threshold.to_string(),
                    "label" => values.label.to_string(),
                    "fresh_label" => values.fresh_label.unwrap_or_default().to_string(),
                    _ => caps[0].to_string(),
                }
            })
            .into_owned()
    }
}

/// Values substituted into a [`CommentTemplate`].
#[derive(Debug, Clone, Copy)]
pub struct TemplateValues<'a> {
    pub threshold: &'a str,
    pub label: &'a str,
    pub fresh_label: Option<&'a str>,
}

/// One remote change applied to a stale issue.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum RemediationAction {
    AddComment { body: String },
    RemoveLabel { label_id: String },
    CloseIssue,
}

impl RemediationAction {
    /// Short name for logs.
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::AddComment { .. } => "add_comment",
            Self::RemoveLabel { .. } => "remove_label",
            Self::CloseIssue => "close_issue",
        }
    }
}

/// Ordered actions for a single stale issue.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemediationPlan {
    pub record: StaleIssueRecord,
    pub actions: Vec<RemediationAction>,
}

/// Builds plans from run-wide inputs resolved once per run.
#[derive(Debug, Clone)]
pub struct RemediationPlanner {
    comment: String,
    tracking_label_id: String,
}

impl RemediationPlanner {
    /// Render the comment once; it is the same for every issue in a run.
    #[must_use]
    pub fn new(
        template: &CommentTemplate,
        tracking_label_id: impl Into<String>,
        threshold: std::time::Duration,
        tracking_label: &str,
        fresh_label: Option<&str>,
    ) -> Self {
        let threshold = format_duration(threshold);
        let comment = template.render(&TemplateValues {
            threshold: &threshold,
            label: tracking_label,
            fresh_label,
        });
        Self {
            comment,
            tracking_label_id: tracking_label_id.into(),
        }
    }

    /// The rendered closing comment.
    #[must_use]
    pub fn comment(&self) -> &str {
        &self.comment
    }

    #[must_use]
    pub fn plan(&self, record: StaleIssueRecord) -> RemediationPlan {
        RemediationPlan {
            record,
            actions: vec![
                RemediationAction::AddComment {
                    body: self.comment.clone(),
                },
                RemediationAction::RemoveLabel {
                    label_id: self.tracking_label_id.clone(),
                },
                RemediationAction::CloseIssue,
            ],
        }
    }

    #[must_use]
    pub fn plan_all(&self, records: Vec<StaleIssueRecord>) -> Vec<RemediationPlan> {
        records.into_iter().map(|record| self.plan(record)).collect()
    }
}
