//! Custom assertions for domain-specific testing.
//!
//! Provides expressive assertions about what a run sent to the remote
//! system.

use super::mocks::MockTransport;
use crate::executor::{RemediationOutcome, RemediationStage};
use crate::query::operation;

/// Assert that an issue received the full remediation, in order.
///
/// # Panics
///
/// Panics if the mutations sent for the issue differ from comment,
/// unlabel, close.
///
/// # Example
///
/// ```rust,ignore
/// let summary = run.run().await?;
/// assert_fully_remediated(&transport, "I_1");
/// ```
pub fn assert_fully_remediated(transport: &MockTransport, issue_id: &str) {
    let sent = transport.mutations_for(issue_id);
    assert_eq!(
        sent,
        vec![
            operation::ADD_COMMENT,
            operation::REMOVE_LABEL,
            operation::CLOSE_ISSUE
        ],
        "Expected full remediation of {issue_id}, but sent {sent:?}"
    );
}

/// Assert that no mutation was sent at all.
///
/// # Panics
///
/// Panics if any write request was recorded.
pub fn assert_no_mutations(transport: &MockTransport) {
    let mutations: Vec<_> = transport
        .mutations()
        .iter()
        .map(|request| request.operation_name)
        .collect();
    assert!(
        mutations.is_empty(),
        "Expected no write requests, but got {mutations:?}"
    );
}

/// Assert that an outcome failed at a given stage.
///
/// # Panics
///
/// Panics if the outcome succeeded or failed elsewhere.
pub fn assert_failed_at(outcome: &RemediationOutcome, stage: RemediationStage) {
    assert_eq!(
        outcome.failed_stage(),
        Some(stage),
        "Expected #{} to fail while {stage}, but got {:?}",
        outcome.number,
        outcome.status
    );
}
