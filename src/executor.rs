//! Remediation execution.
//!
//! Each plan walks `Planned -> Commenting -> Unlabeling -> Closing -> Done`.
//! The first failing request stops that issue at the stage it was in and
//! the executor moves on to the next issue. Nothing is retried; the next
//! scheduled run picks the issue up again since it still carries the
//! tracking label (unless the label removal itself went through).

use std::fmt;

use futures::stream::{self, StreamExt};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument, warn};

use crate::planner::{RemediationAction, RemediationPlan};
use crate::query::{self, GraphQLRequest};
use crate::reporter::Reporter;
use crate::transport::GraphQLTransport;

/// Where an issue's remediation is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RemediationStage {
    Planned,
    Commenting,
    Unlabeling,
    Closing,
    Done,
}

impl RemediationStage {
    /// The stage that follows this one, `None` once done.
    #[must_use]
    pub fn next(self) -> Option<Self> {
        match self {
            Self::Planned => Some(Self::Commenting),
            Self::Commenting => Some(Self::Unlabeling),
            Self::Unlabeling => Some(Self::Closing),
            Self::Closing => Some(Self::Done),
            Self::Done => None,
        }
    }

    /// The stage an action runs in.
    #[must_use]
    pub fn for_action(action: &RemediationAction) -> Self {
        match action {
            RemediationAction::AddComment { .. } => Self::Commenting,
            RemediationAction::RemoveLabel { .. } => Self::Unlabeling,
            RemediationAction::CloseIssue => Self::Closing,
        }
    }
}

impl fmt::Display for RemediationStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Planned => "planned",
            Self::Commenting => "commenting",
            Self::Unlabeling => "unlabeling",
            Self::Closing => "closing",
            Self::Done => "done",
        };
        write!(f, "{s}")
    }
}

/// Terminal state of one issue's remediation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum RemediationStatus {
    Succeeded,
    Failed {
        stage: RemediationStage,
        error: String,
    },
}

/// What happened to one stale issue.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemediationOutcome {
    pub issue_id: String,
    pub number: u64,
    pub title: String,
    #[serde(flatten)]
    pub status: RemediationStatus,
}

impl RemediationOutcome {
    #[must_use]
    pub fn succeeded(&self) -> bool {
        matches!(self.status, RemediationStatus::Succeeded)
    }

    /// Stage the remediation stopped at, if it failed.
    #[must_use]
    pub fn failed_stage(&self) -> Option<RemediationStage> {
        match &self.status {
            RemediationStatus::Failed { stage, .. } => Some(*stage),
            RemediationStatus::Succeeded => None,
        }
    }
}

/// Build the mutation for an action on an issue.
#[must_use]
pub fn request_for(issue_id: &str, action: &RemediationAction) -> GraphQLRequest {
    match action {
        RemediationAction::AddComment { body } => query::add_comment(issue_id, body),
        RemediationAction::RemoveLabel { label_id } => query::remove_label(issue_id, label_id),
        RemediationAction::CloseIssue => query::close_issue(issue_id),
    }
}

/// Runs remediation plans against the remote system.
pub struct RemediationExecutor<'a> {
    transport: &'a dyn GraphQLTransport,
    concurrency: usize,
}

impl<'a> RemediationExecutor<'a> {
    #[must_use]
    pub fn new(transport: &'a dyn GraphQLTransport) -> Self {
        Self {
            transport,
            concurrency: 1,
        }
    }

    /// Remediate up to `concurrency` issues at once. Each issue's own
    /// actions stay sequential.
    #[must_use]
    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.max(1);
        self
    }

    /// Execute every plan, reporting each outcome as it completes.
    ///
    /// Outcomes are returned in plan order.
    pub async fn execute(
        &self,
        plans: Vec<RemediationPlan>,
        reporter: &dyn Reporter,
    ) -> Vec<RemediationOutcome> {
        info!(
            "Remediating {} stale issue(s), concurrency {}",
            plans.len(),
            self.concurrency
        );

        stream::iter(plans)
            .map(|plan| self.remediate(plan))
            .buffered(self.concurrency)
            .inspect(|outcome| reporter.remediation_finished(outcome))
            .collect()
            .await
    }

    /// Execute one plan.
    #[instrument(skip(self, plan), fields(issue = %plan.record.issue_id, number = plan.record.number))]
    pub async fn remediate(&self, plan: RemediationPlan) -> RemediationOutcome {
        let record = plan.record;
        let mut stage = RemediationStage::Planned;

        for action in &plan.actions {
            let next = RemediationStage::for_action(action);
            if stage.next() != Some(next) {
                warn!("Refusing out-of-order action {} at stage {}", action.name(), stage);
                return outcome(
                    &record.issue_id,
                    record.number,
                    &record.title,
                    RemediationStatus::Failed {
                        stage,
                        error: format!("action {} is out of order", action.name()),
                    },
                );
            }
            stage = next;

            debug!("Running {} on #{}", action.name(), record.number);
            let request = request_for(&record.issue_id, action);
            if let Err(e) = self.transport.execute(&request).await {
                warn!("#{} failed while {}: {}", record.number, stage, e);
                return outcome(
                    &record.issue_id,
                    record.number,
                    &record.title,
                    RemediationStatus::Failed {
                        stage,
                        error: e.to_string(),
                    },
                );
            }
        }

        if stage.next() != Some(RemediationStage::Done) {
            return outcome(
                &record.issue_id,
                record.number,
                &record.title,
                RemediationStatus::Failed {
                    stage,
                    error: "plan ended before the issue was closed".to_string(),
                },
            );
        }

        info!("Closed stale issue #{} ({})", record.number, record.title);
        outcome(
            &record.issue_id,
            record.number,
            &record.title,
            RemediationStatus::Succeeded,
        )
    }
}

fn outcome(issue_id: &str, number: u64, title: &str, status: RemediationStatus) -> RemediationOutcome {
    RemediationOutcome {
        issue_id: issue_id.to_string(),
        number,
        title: title.to_string(),
        status,
    }
}
