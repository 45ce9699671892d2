//! Staleness classification.
//!
//! Pure decision logic: an issue is stale when it lacks the fresh label
//! and its last activity is at least `threshold` before `now`. Nothing in
//! here reads the clock or talks to the network, so the same snapshot and
//! `now` always give the same answer.
//!
//! # Example
//!
//! ```rust,ignore
//! use stalebot::classifier::{classify_all, StalenessPolicy};
//!
//! let policy = StalenessPolicy::new(chrono::Duration::hours(48))
//!     .with_fresh_label("customer-replied-to");
//! let stale = classify_all(&snapshot.issues, &policy, clock.now());
//! ```

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::model::Issue;

/// Threshold and override label for one run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StalenessPolicy {
    pub threshold: Duration,
    pub fresh_label: Option<String>,
}

impl StalenessPolicy {
    #[must_use]
    pub fn new(threshold: Duration) -> Self {
        Self {
            threshold,
            fresh_label: None,
        }
    }

    #[must_use]
    pub fn with_fresh_label(mut self, label: impl Into<String>) -> Self {
        self.fresh_label = Some(label.into());
        self
    }
}

/// An issue that went quiet for at least the threshold.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StaleIssueRecord {
    pub issue_id: String,
    pub number: u64,
    pub title: String,
    pub url: String,
    pub last_activity: DateTime<Utc>,
    /// Time between the last activity and `now`.
    #[serde(with = "elapsed_seconds")]
    pub elapsed: Duration,
}

/// Why an issue was left alone.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FreshReason {
    /// A person marked the issue as answered.
    FreshLabel,
    /// Activity is more recent than the threshold.
    RecentActivity { elapsed: Duration },
    /// Not every label was read, so the fresh label may be among the
    /// missing ones.
    LabelsTruncated { fetched: usize, total: u64 },
}

/// Outcome of classifying one issue.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Classification {
    Stale(StaleIssueRecord),
    Fresh(FreshReason),
}

impl Classification {
    #[must_use]
    pub fn is_stale(&self) -> bool {
        matches!(self, Self::Stale(_))
    }

    #[must_use]
    pub fn into_record(self) -> Option<StaleIssueRecord> {
        match self {
            Self::Stale(record) => Some(record),
            Self::Fresh(_) => None,
        }
    }
}

/// Classify a single issue.
#[must_use]
pub fn classify(issue: &Issue, policy: &StalenessPolicy, now: DateTime<Utc>) -> Classification {
    if let Some(fresh) = policy.fresh_label.as_deref() {
        if issue.has_label(fresh) {
            return Classification::Fresh(FreshReason::FreshLabel);
        }
        if !issue.has_all_labels() {
            let total = issue.label_count.unwrap_or_default();
            warn!(
                "Skipping #{}: only {} of its {} labels were read",
                issue.number,
                issue.labels.len(),
                total
            );
            return Classification::Fresh(FreshReason::LabelsTruncated {
                fetched: issue.labels.len(),
                total,
            });
        }
    }

    let last_activity = issue.last_activity();
    let elapsed = now - last_activity;

    // Inclusive: exactly at the threshold counts as stale.
    if elapsed >= policy.threshold {
        Classification::Stale(StaleIssueRecord {
            issue_id: issue.id.clone(),
            number: issue.number,
            title: issue.title.clone(),
            url: issue.url.clone(),
            last_activity,
            elapsed,
        })
    } else {
        Classification::Fresh(FreshReason::RecentActivity { elapsed })
    }
}

/// Classify a batch, returning the stale records in input order.
#[must_use]
pub fn classify_all(
    issues: &[Issue],
    policy: &StalenessPolicy,
    now: DateTime<Utc>,
) -> Vec<StaleIssueRecord> {
    issues
        .iter()
        .filter_map(|issue| classify(issue, policy, now).into_record())
        .collect()
}

mod elapsed_seconds {
    use chrono::Duration;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_i64(value.num_seconds())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        i64::deserialize(deserializer).map(Duration::seconds)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::fixtures::IssueBuilder;
    use chrono::TimeZone;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap()
    }

    fn policy() -> StalenessPolicy {
        StalenessPolicy::new(Duration::minutes(5)).with_fresh_label("customer-replied-to")
    }

    #[test]
    fn test_old_comment_is_stale() {
        let issue = IssueBuilder::new("I_1", 1)
            .created_at(now() - Duration::days(3))
            .comment_at(now() - Duration::minutes(10))
            .build();

        match classify(&issue, &policy(), now()) {
            Classification::Stale(record) => {
                assert_eq!(record.issue_id, "I_1");
                assert_eq!(record.elapsed, Duration::minutes(10));
                assert_eq!(record.last_activity, now() - Duration::minutes(10));
            }
            other => panic!("expected stale, got {other:?}"),
        }
    }

    #[test]
    fn test_recent_comment_is_fresh() {
        let issue = IssueBuilder::new("I_1", 1)
            .comment_at(now() - Duration::minutes(2))
            .build();

        assert_eq!(
            classify(&issue, &policy(), now()),
            Classification::Fresh(FreshReason::RecentActivity {
                elapsed: Duration::minutes(2)
            })
        );
    }

    #[test]
    fn test_exact_threshold_is_stale() {
        let issue = IssueBuilder::new("I_1", 1)
            .comment_at(now() - Duration::minutes(5))
            .build();
        assert!(classify(&issue, &policy(), now()).is_stale());

        let just_under = IssueBuilder::new("I_2", 2)
            .comment_at(now() - Duration::minutes(5) + Duration::seconds(1))
            .build();
        assert!(!classify(&just_under, &policy(), now()).is_stale());
    }

    #[test]
    fn test_fresh_label_overrides_any_age() {
        let issue = IssueBuilder::new("I_1", 1)
            .created_at(now() - Duration::days(400))
            .comment_at(now() - Duration::days(30))
            .label("customer-replied-to")
            .build();

        assert_eq!(
            classify(&issue, &policy(), now()),
            Classification::Fresh(FreshReason::FreshLabel)
        );
    }

    #[test]
    fn test_partial_label_set_is_never_stale() {
        let mut builder = IssueBuilder::new("I_1", 1)
            .comment_at(now() - Duration::days(30))
            .label("pending-update");
        for n in 0..19 {
            builder = builder.label(&format!("area-{n}"));
        }
        // The fresh label sits past the labels that were returned.
        let issue = builder.label_count(25).build();

        assert_eq!(
            classify(&issue, &policy(), now()),
            Classification::Fresh(FreshReason::LabelsTruncated {
                fetched: 20,
                total: 25
            })
        );
        assert!(classify_all(&[issue], &policy(), now()).is_empty());
    }

    #[test]
    fn test_partial_label_set_still_honors_visible_fresh_label() {
        let issue = IssueBuilder::new("I_1", 1)
            .comment_at(now() - Duration::days(30))
            .label("customer-replied-to")
            .label_count(150)
            .build();
        assert_eq!(
            classify(&issue, &policy(), now()),
            Classification::Fresh(FreshReason::FreshLabel)
        );
    }

    #[test]
    fn test_partial_label_set_without_fresh_policy_uses_age() {
        let issue = IssueBuilder::new("I_1", 1)
            .comment_at(now() - Duration::days(30))
            .label("pending-update")
            .label_count(150)
            .build();
        let policy = StalenessPolicy::new(Duration::minutes(5));
        assert!(classify(&issue, &policy, now()).is_stale());
    }

    #[test]
    fn test_without_fresh_label_policy_labels_are_ignored() {
        let issue = IssueBuilder::new("I_1", 1)
            .comment_at(now() - Duration::days(30))
            .label("customer-replied-to")
            .build();
        let policy = StalenessPolicy::new(Duration::minutes(5));
        assert!(classify(&issue, &policy, now()).is_stale());
    }

    #[test]
    fn test_latest_comment_wins_over_older_ones() {
        let issue = IssueBuilder::new("I_1", 1)
            .created_at(now() - Duration::days(10))
            .comment_at(now() - Duration::days(9))
            .comment_at(now() - Duration::minutes(1))
            .build();
        assert!(!classify(&issue, &policy(), now()).is_stale());
    }

    #[test]
    fn test_no_comments_uses_creation_time() {
        let old = IssueBuilder::new("I_1", 1)
            .created_at(now() - Duration::hours(1))
            .build();
        assert!(classify(&old, &policy(), now()).is_stale());

        let new = IssueBuilder::new("I_2", 2)
            .created_at(now() - Duration::minutes(1))
            .build();
        assert!(!classify(&new, &policy(), now()).is_stale());
    }

    #[test]
    fn test_future_activity_is_fresh() {
        let issue = IssueBuilder::new("I_1", 1)
            .comment_at(now() + Duration::minutes(3))
            .build();
        assert!(!classify(&issue, &policy(), now()).is_stale());
    }

    #[test]
    fn test_classify_all_keeps_order_and_filters() {
        let issues = vec![
            IssueBuilder::new("I_1", 1)
                .comment_at(now() - Duration::hours(1))
                .build(),
            IssueBuilder::new("I_2", 2)
                .comment_at(now() - Duration::minutes(1))
                .build(),
            IssueBuilder::new("I_3", 3)
                .comment_at(now() - Duration::days(1))
                .build(),
        ];

        let ids: Vec<_> = classify_all(&issues, &policy(), now())
            .into_iter()
            .map(|r| r.issue_id)
            .collect();
        assert_eq!(ids, vec!["I_1", "I_3"]);
    }

    #[test]
    fn test_record_serializes_elapsed_as_seconds() {
        let issue = IssueBuilder::new("I_1", 1)
            .comment_at(now() - Duration::minutes(10))
            .build();
        let record = classify(&issue, &policy(), now()).into_record().unwrap();
        let value = serde_json::to_value(&record).unwrap();
        assert_eq!(value["elapsed"], 600);
    }
}
