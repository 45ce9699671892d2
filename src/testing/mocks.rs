//! Mock implementations of the run's collaborators.
//!
//! These mocks provide controllable test doubles for the GraphQL
//! transport, the clock and the reporter, enabling deterministic tests of
//! the whole pipeline without a network.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::{json, Value};

use super::fixtures::{issues_response, label_response};
use crate::classifier::StaleIssueRecord;
use crate::clock::Clock;
use crate::error::{Result, StaleBotError};
use crate::executor::RemediationOutcome;
use crate::model::Issue;
use crate::query::{operation, GraphQLRequest};
use crate::reporter::{Reporter, RunInfo, RunSummary};
use crate::transport::GraphQLTransport;

#[derive(Debug, Clone)]
struct Failure {
    operation: &'static str,
    issue_id: Option<String>,
    message: String,
}

/// Scripted GraphQL transport.
///
/// Responses are keyed by operation name. Mutations succeed with an empty
/// payload unless a failure is injected. Every request is recorded.
///
/// # Example
///
/// ```rust,ignore
/// let transport = MockTransport::new()
///     .with_label("LA_1", "pending-update")
///     .with_issues(vec![issue])
///     .fail_on(operation::CLOSE_ISSUE, Some("I_1"), "forbidden");
/// ```
#[derive(Debug, Default)]
pub struct MockTransport {
    responses: HashMap<&'static str, Value>,
    failures: Vec<Failure>,
    requests: Mutex<Vec<GraphQLRequest>>,
}

impl MockTransport {
    /// Create a mock with no scripted reads.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Answer the label lookup with this label.
    #[must_use]
    pub fn with_label(self, id: &str, name: &str) -> Self {
        self.with_response(operation::LABEL_LOOKUP, label_response(Some((id, name))))
    }

    /// Answer the label lookup with "no such label".
    #[must_use]
    pub fn without_label(self) -> Self {
        self.with_response(operation::LABEL_LOOKUP, label_response(None))
    }

    /// Answer the issue query with a single complete page.
    #[must_use]
    pub fn with_issues(self, issues: Vec<Issue>) -> Self {
        let total = issues.len() as u64;
        self.with_issue_page(issues, total, false)
    }

    /// Answer the issue query with a page that may be partial.
    #[must_use]
    pub fn with_issue_page(self, issues: Vec<Issue>, total_count: u64, has_next_page: bool) -> Self {
        self.with_response(
            operation::STALE_CANDIDATES,
            issues_response(&issues, total_count, has_next_page),
        )
    }

    /// Answer an operation with raw `data`.
    #[must_use]
    pub fn with_response(mut self, operation: &'static str, data: Value) -> Self {
        self.responses.insert(operation, data);
        self
    }

    /// Fail an operation, for one issue or (with `None`) for all.
    #[must_use]
    pub fn fail_on(mut self, operation: &'static str, issue_id: Option<&str>, message: &str) -> Self {
        self.failures.push(Failure {
            operation,
            issue_id: issue_id.map(str::to_string),
            message: message.to_string(),
        });
        self
    }

    /// All requests received, in order.
    pub fn requests(&self) -> Vec<GraphQLRequest> {
        self.requests.lock().expect("mock transport lock").clone()
    }

    /// Operation names received, in order.
    pub fn operations(&self) -> Vec<&'static str> {
        self.requests()
            .iter()
            .map(|request| request.operation_name)
            .collect()
    }

    /// Mutations received, in order.
    pub fn mutations(&self) -> Vec<GraphQLRequest> {
        self.requests()
            .into_iter()
            .filter(GraphQLRequest::is_mutation)
            .collect()
    }

    /// Mutation names sent for one issue, in order.
    pub fn mutations_for(&self, issue_id: &str) -> Vec<&'static str> {
        self.mutations()
            .iter()
            .filter(|request| request.subject_id() == Some(issue_id))
            .map(|request| request.operation_name)
            .collect()
    }

    fn failure_for(&self, request: &GraphQLRequest) -> Option<&Failure> {
        self.failures.iter().find(|failure| {
            failure.operation == request.operation_name
                && failure
                    .issue_id
                    .as_deref()
                    .is_none_or(|id| request.subject_id() == Some(id))
        })
    }
}

#[async_trait]
impl GraphQLTransport for MockTransport {
    async fn execute(&self, request: &GraphQLRequest) -> Result<Value> {
        self.requests
            .lock()
            .expect("mock transport lock")
            .push(request.clone());

        if let Some(failure) = self.failure_for(request) {
            return Err(StaleBotError::transport(
                request.operation_name,
                failure.message.clone(),
            ));
        }

        match self.responses.get(request.operation_name) {
            Some(data) => Ok(data.clone()),
            None if request.is_mutation() => Ok(json!({})),
            None => Err(StaleBotError::malformed(
                request.operation_name,
                "no scripted response",
            )),
        }
    }
}

/// Clock pinned to one instant.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock {
    now: DateTime<Utc>,
}

impl FixedClock {
    #[must_use]
    pub fn new(now: DateTime<Utc>) -> Self {
        Self { now }
    }
}

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.now
    }
}

/// An event captured by [`MemoryReporter`].
#[derive(Debug, Clone, PartialEq)]
pub enum ReportEntry {
    Started(RunInfo),
    Stale(usize, StaleIssueRecord),
    Outcome(RemediationOutcome),
    Failed(String),
    Finished(RunSummary),
}

/// Reporter that keeps every event in memory.
#[derive(Debug, Default)]
pub struct MemoryReporter {
    entries: Mutex<Vec<ReportEntry>>,
}

impl MemoryReporter {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn entries(&self) -> Vec<ReportEntry> {
        self.entries.lock().expect("memory reporter lock").clone()
    }

    pub fn stale(&self) -> Vec<StaleIssueRecord> {
        self.entries()
            .into_iter()
            .filter_map(|entry| match entry {
                ReportEntry::Stale(_, record) => Some(record),
                _ => None,
            })
            .collect()
    }

    pub fn outcomes(&self) -> Vec<RemediationOutcome> {
        self.entries()
            .into_iter()
            .filter_map(|entry| match entry {
                ReportEntry::Outcome(outcome) => Some(outcome),
                _ => None,
            })
            .collect()
    }

    pub fn failures(&self) -> Vec<String> {
        self.entries()
            .into_iter()
            .filter_map(|entry| match entry {
                ReportEntry::Failed(message) => Some(message),
                _ => None,
            })
            .collect()
    }

    pub fn finished(&self) -> Option<RunSummary> {
        self.entries().into_iter().find_map(|entry| match entry {
            ReportEntry::Finished(summary) => Some(summary),
            _ => None,
        })
    }

    fn push(&self, entry: ReportEntry) {
        self.entries.lock().expect("memory reporter lock").push(entry);
    }
}

impl Reporter for MemoryReporter {
    fn run_started(&self, run: &RunInfo) {
        self.push(ReportEntry::Started(run.clone()));
    }

    fn stale_found(&self, index: usize, record: &StaleIssueRecord) {
        self.push(ReportEntry::Stale(index, record.clone()));
    }

    fn remediation_finished(&self, outcome: &RemediationOutcome) {
        self.push(ReportEntry::Outcome(outcome.clone()));
    }

    fn run_failed(&self, error: &StaleBotError) {
        self.push(ReportEntry::Failed(error.to_string()));
    }

    fn run_finished(&self, summary: &RunSummary) {
        self.push(ReportEntry::Finished(summary.clone()));
    }
}
