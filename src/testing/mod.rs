//! Testing infrastructure for stalebot.
//!
//! This module provides mocks, fixtures, and assertions for testing the
//! pipeline without a network or a real clock.
//!
//! # Architecture
//!
//! - **Mocks**: a scripted GraphQL transport, a fixed clock and an
//!   in-memory reporter
//! - **Fixtures**: issue builders and response bodies in the API's shape
//! - **Assertions**: checks on what a run sent to the remote system
//!
//! # Example
//!
//! ```rust,ignore
//! use stalebot::testing::{FixedClock, IssueBuilder, MemoryReporter, MockTransport};
//!
//! let transport = MockTransport::new()
//!     .with_label("LA_1", "pending-update")
//!     .with_issues(vec![IssueBuilder::new("I_1", 1).build()]);
//! let clock = FixedClock::new(now);
//! let reporter = MemoryReporter::new();
//! ```

pub mod assertions;
pub mod fixtures;
pub mod mocks;

// Re-export commonly used types
pub use assertions::*;
pub use fixtures::*;
pub use mocks::*;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::Clock;
    use crate::query::{self, operation};
    use crate::transport::GraphQLTransport;
    use chrono::{TimeZone, Utc};

    // =========================================================================
    // Mock Transport Tests
    // =========================================================================

    #[tokio::test]
    async fn test_mock_transport_records_requests() {
        let transport = MockTransport::new().with_label("LA_1", "pending-update");
        let request = query::label_lookup("octo", "widgets", "pending-update");

        let data = transport.execute(&request).await.unwrap();

        assert_eq!(data["repository"]["label"]["id"], "LA_1");
        assert_eq!(transport.operations(), vec![operation::LABEL_LOOKUP]);
    }

    #[tokio::test]
    async fn test_mock_transport_mutations_succeed_by_default() {
        let transport = MockTransport::new();
        assert!(transport.execute(&query::close_issue("I_1")).await.is_ok());
        assert_eq!(transport.mutations_for("I_1"), vec![operation::CLOSE_ISSUE]);
    }

    #[tokio::test]
    async fn test_mock_transport_unscripted_query_is_malformed() {
        let transport = MockTransport::new();
        let err = transport
            .execute(&query::label_lookup("o", "r", "l"))
            .await
            .unwrap_err();
        assert_eq!(err.exit_code(), 5);
    }

    #[tokio::test]
    async fn test_mock_transport_targeted_failure() {
        let transport = MockTransport::new().fail_on(operation::ADD_COMMENT, Some("I_2"), "nope");

        assert!(transport.execute(&query::add_comment("I_1", "x")).await.is_ok());
        let err = transport
            .execute(&query::add_comment("I_2", "x"))
            .await
            .unwrap_err();
        assert!(err.to_string().contains("nope"));
    }

    #[tokio::test]
    async fn test_mock_transport_blanket_failure() {
        let transport = MockTransport::new().fail_on(operation::STALE_CANDIDATES, None, "502");
        let request = query::IssueQuery::new("o", "r", "l").build();
        assert!(transport.execute(&request).await.is_err());
    }

    // =========================================================================
    // Clock and Reporter Tests
    // =========================================================================

    #[test]
    fn test_fixed_clock() {
        let at = Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap();
        assert_eq!(FixedClock::new(at).now(), at);
    }

    #[test]
    fn test_memory_reporter_collects() {
        use crate::reporter::Reporter;

        let reporter = MemoryReporter::new();
        reporter.stale_found(1, &stale_record("I_1", 1));
        reporter.run_failed(&crate::error::StaleBotError::config("x"));

        assert_eq!(reporter.stale().len(), 1);
        assert_eq!(reporter.failures().len(), 1);
        assert!(reporter.finished().is_none());
    }
}
