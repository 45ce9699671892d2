//! One stale-issue run, end to end.
//!
//! Phase one reads and decides: resolve the tracking label, fetch the
//! labeled issues, classify them. Phase two plans and executes the
//! remediation of whatever phase one returned. Nothing from phase one is
//! shared through mutable state; the stale records are passed along as
//! values.
//!
//! # Example
//!
//! ```rust,ignore
//! use stalebot::pipeline::StaleIssueRun;
//!
//! let summary = StaleIssueRun::new(&config, &client, &SystemClock, &reporter)
//!     .dry_run(true)
//!     .run()
//!     .await?;
//! println!("{} stale", summary.stale.len());
//! ```

use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::classifier::{classify_all, StalenessPolicy};
use crate::clock::Clock;
use crate::config::BotConfig;
use crate::error::{Result, StaleBotError};
use crate::executor::RemediationExecutor;
use crate::model::{decode_issues, decode_label, IssueSnapshot, Label};
use crate::planner::{CommentTemplate, RemediationPlanner};
use crate::query::{self, IssueQuery};
use crate::reporter::{Reporter, RunInfo, RunSummary};
use crate::transport::GraphQLTransport;

/// A configured run against one repository.
pub struct StaleIssueRun<'a> {
    config: &'a BotConfig,
    transport: &'a dyn GraphQLTransport,
    clock: &'a dyn Clock,
    reporter: &'a dyn Reporter,
    dry_run: bool,
}

impl<'a> StaleIssueRun<'a> {
    #[must_use]
    pub fn new(
        config: &'a BotConfig,
        transport: &'a dyn GraphQLTransport,
        clock: &'a dyn Clock,
        reporter: &'a dyn Reporter,
    ) -> Self {
        Self {
            config,
            transport,
            clock,
            reporter,
            dry_run: false,
        }
    }

    /// Classify and plan only; no write requests are sent.
    #[must_use]
    pub fn dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    /// Execute the run.
    ///
    /// # Errors
    ///
    /// Configuration, label lookup and read-path errors abort the run and
    /// are reported once through [`Reporter::run_failed`]. Failures while
    /// remediating individual issues are not errors; they show up in the
    /// summary's outcomes.
    pub async fn run(&self) -> Result<RunSummary> {
        let info = RunInfo {
            run_id: Uuid::new_v4(),
            repository: self.config.repository(),
            started_at: self.clock.now(),
            dry_run: self.dry_run,
        };
        self.reporter.run_started(&info);

        match self.execute(&info).await {
            Ok(summary) => {
                self.reporter.run_finished(&summary);
                Ok(summary)
            }
            Err(e) => {
                self.reporter.run_failed(&e);
                Err(e)
            }
        }
    }

    async fn execute(&self, info: &RunInfo) -> Result<RunSummary> {
        let config = self.config;
        config.validate()?;
        let threshold = config.threshold()?;

        let label = self.resolve_tracking_label().await?;
        let snapshot = self.fetch_snapshot(&label).await?;

        let now = self.clock.now();
        let mut policy = StalenessPolicy::new(threshold);
        if let Some(fresh) = config.fresh_label() {
            policy = policy.with_fresh_label(fresh);
        }
        let stale = classify_all(&snapshot.issues, &policy, now);
        info!(
            "{} of {} labeled issue(s) are stale",
            stale.len(),
            snapshot.issues.len()
        );
        for (index, record) in stale.iter().enumerate() {
            self.reporter.stale_found(index + 1, record);
        }

        let planner = RemediationPlanner::new(
            &CommentTemplate::new(&config.comment),
            label.id,
            config.stale_after,
            config.tracking_label(),
            config.fresh_label(),
        );
        let plans = planner.plan_all(stale.clone());

        let outcomes = if self.dry_run {
            info!("Dry run: skipping remediation of {} issue(s)", plans.len());
            Vec::new()
        } else {
            RemediationExecutor::new(self.transport)
                .with_concurrency(config.concurrency)
                .execute(plans, self.reporter)
                .await
        };

        Ok(RunSummary {
            run_id: info.run_id,
            repository: info.repository.clone(),
            started_at: info.started_at,
            finished_at: self.clock.now(),
            dry_run: self.dry_run,
            issues_scanned: snapshot.issues.len(),
            truncated: snapshot.is_truncated(),
            comment: planner.comment().to_string(),
            stale,
            outcomes,
        })
    }

    async fn resolve_tracking_label(&self) -> Result<Label> {
        let config = self.config;
        let request = query::label_lookup(&config.owner, &config.repo, config.tracking_label());
        let data = self.transport.execute(&request).await?;

        let label = decode_label(data)?.ok_or_else(|| StaleBotError::LabelLookup {
            label: config.tracking_label().to_string(),
            repository: config.repository(),
        })?;
        debug!("Tracking label '{}' resolved to {}", label.name, label.id);
        Ok(label)
    }

    async fn fetch_snapshot(&self, label: &Label) -> Result<IssueSnapshot> {
        let config = self.config;
        let request = IssueQuery::new(&config.owner, &config.repo, &label.name)
            .page_size(config.page_size)
            .build();
        let data = self.transport.execute(&request).await?;
        let snapshot = decode_issues(data)?;

        if snapshot.is_truncated() {
            warn!(
                "Only {} of {} issues labeled '{}' were fetched; the rest wait for a later run",
                snapshot.issues.len(),
                snapshot.total_count,
                label.name
            );
        }
        Ok(snapshot)
    }
}
