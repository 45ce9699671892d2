//! Run reporting.
//!
//! A [`Reporter`] receives one event per stale issue found, one per
//! remediation outcome, and either `run_finished` or `run_failed` at the
//! end. Reporters never fail the run: a log file that cannot be written is
//! logged and skipped.
//!
//! # Example
//!
//! ```rust,ignore
//! use stalebot::reporter::{ConsoleReporter, LogFileReporter, MultiReporter, TracingReporter};
//!
//! let reporter = MultiReporter::new()
//!     .with(TracingReporter)
//!     .with(ConsoleReporter::new())
//!     .with(LogFileReporter::new("stale-issues-log.txt"));
//! ```

use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Local, Utc};
use colored::Colorize;
use fs2::FileExt;
use serde::{Deserialize, Serialize};
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::classifier::StaleIssueRecord;
use crate::config::format_duration;
use crate::error::StaleBotError;
use crate::executor::{RemediationOutcome, RemediationStatus};

/// Identity of a run, sent when it starts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunInfo {
    pub run_id: Uuid,
    pub repository: String,
    pub started_at: DateTime<Utc>,
    pub dry_run: bool,
}

/// Everything a finished run found and did.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunSummary {
    pub run_id: Uuid,
    pub repository: String,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub dry_run: bool,
    /// Issues returned by the read query.
    pub issues_scanned: usize,
    /// More issues carried the tracking label than one page holds.
    pub truncated: bool,
    /// Rendered closing comment.
    pub comment: String,
    pub stale: Vec<StaleIssueRecord>,
    /// Empty for dry runs.
    pub outcomes: Vec<RemediationOutcome>,
}

impl RunSummary {
    #[must_use]
    pub fn succeeded(&self) -> usize {
        self.outcomes.iter().filter(|o| o.succeeded()).count()
    }

    #[must_use]
    pub fn failed(&self) -> usize {
        self.outcomes.len() - self.succeeded()
    }
}

/// Receives run events.
pub trait Reporter: Send + Sync {
    fn run_started(&self, _run: &RunInfo) {}

    /// `index` counts stale issues from 1.
    fn stale_found(&self, _index: usize, _record: &StaleIssueRecord) {}

    fn remediation_finished(&self, _outcome: &RemediationOutcome) {}

    fn run_failed(&self, _error: &StaleBotError) {}

    fn run_finished(&self, _summary: &RunSummary) {}
}

fn elapsed_text(record: &StaleIssueRecord) -> String {
    format_duration(record.elapsed.to_std().unwrap_or_default())
}

/// Emits structured tracing events.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingReporter;

impl Reporter for TracingReporter {
    fn run_started(&self, run: &RunInfo) {
        info!(
            run_id = %run.run_id,
            repository = %run.repository,
            dry_run = run.dry_run,
            "Run started"
        );
    }

    fn stale_found(&self, _index: usize, record: &StaleIssueRecord) {
        info!(
            issue = %record.issue_id,
            number = record.number,
            elapsed_secs = record.elapsed.num_seconds(),
            "Stale issue: {}",
            record.title
        );
    }

    fn remediation_finished(&self, outcome: &RemediationOutcome) {
        match &outcome.status {
            RemediationStatus::Succeeded => {
                info!(issue = %outcome.issue_id, number = outcome.number, "Remediated");
            }
            RemediationStatus::Failed { stage, error } => {
                warn!(
                    issue = %outcome.issue_id,
                    number = outcome.number,
                    stage = %stage,
                    "Remediation failed: {}",
                    error
                );
            }
        }
    }

    fn run_failed(&self, err: &StaleBotError) {
        error!(exit_code = err.exit_code(), "Run aborted: {}", err);
    }

    fn run_finished(&self, summary: &RunSummary) {
        info!(
            run_id = %summary.run_id,
            scanned = summary.issues_scanned,
            stale = summary.stale.len(),
            succeeded = summary.succeeded(),
            failed = summary.failed(),
            "Run finished"
        );
    }
}

/// Colored terminal output for interactive use.
#[derive(Debug, Clone, Copy, Default)]
pub struct ConsoleReporter;

impl ConsoleReporter {
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl Reporter for ConsoleReporter {
    fn run_started(&self, run: &RunInfo) {
        let mode = if run.dry_run { " (dry run)" } else { "" };
        println!(
            "{} {}{}",
            "Checking".cyan().bold(),
            run.repository,
            mode.dimmed()
        );
    }

    fn stale_found(&self, index: usize, record: &StaleIssueRecord) {
        println!(
            "  {} {}. #{} {} {}",
            "stale".yellow(),
            index,
            record.number,
            record.title,
            format!("(quiet for {})", elapsed_text(record)).dimmed()
        );
    }

    fn remediation_finished(&self, outcome: &RemediationOutcome) {
        match &outcome.status {
            RemediationStatus::Succeeded => {
                println!("  {} closed #{} {}", "\u{2713}".green(), outcome.number, outcome.title);
            }
            RemediationStatus::Failed { stage, error } => {
                println!(
                    "  {} #{} failed while {}: {}",
                    "\u{2717}".red(),
                    outcome.number,
                    stage,
                    error
                );
            }
        }
    }

    fn run_failed(&self, err: &StaleBotError) {
        eprintln!("{} {}", "Error:".red().bold(), err);
    }

    fn run_finished(&self, summary: &RunSummary) {
        if summary.stale.is_empty() {
            println!("{}", "No stale issues were detected.".green());
        } else if summary.dry_run {
            println!(
                "{} {} stale issue(s) would be closed",
                "Dry run:".yellow().bold(),
                summary.stale.len()
            );
        } else {
            let failed = summary.failed();
            let line = format!(
                "{} closed, {} failed, {} scanned",
                summary.succeeded(),
                failed,
                summary.issues_scanned
            );
            if failed == 0 {
                println!("{}", line.green().bold());
            } else {
                println!("{}", line.red().bold());
            }
        }
        if summary.truncated {
            println!(
                "{}",
                "Only the first page of labeled issues was checked.".yellow()
            );
        }
    }
}

/// Append-only text log of every run.
#[derive(Debug, Clone)]
pub struct LogFileReporter {
    path: PathBuf,
}

impl LogFileReporter {
    #[must_use]
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn append(&self, content: &str) {
        if let Err(e) = self.try_append(content) {
            warn!("Error while writing to log {}: {}", self.path.display(), e);
        }
    }

    fn try_append(&self, content: &str) -> std::io::Result<()> {
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        FileExt::lock_exclusive(&file)?;
        let written = file.write_all(content.as_bytes()).and_then(|()| file.flush());
        FileExt::unlock(&file)?;
        written
    }
}

impl Reporter for LogFileReporter {
    fn run_started(&self, run: &RunInfo) {
        let mode = if run.dry_run { " [dry run]" } else { "" };
        self.append(&format!(
            "\n--- START RUN: {} ({}){} ---\n",
            run.started_at
                .with_timezone(&Local)
                .format("%Y-%m-%d %H:%M:%S %:z"),
            run.repository,
            mode
        ));
    }

    fn stale_found(&self, index: usize, record: &StaleIssueRecord) {
        let mut text = String::new();
        if index == 1 {
            text.push_str("\nThe following stale issues were detected:\n");
        }
        text.push_str(&format!(
            "\t{}: {} ({}) - quiet for {}\n",
            index,
            record.title,
            record.url,
            elapsed_text(record)
        ));
        self.append(&text);
    }

    fn remediation_finished(&self, outcome: &RemediationOutcome) {
        let line = match &outcome.status {
            RemediationStatus::Succeeded => {
                format!("\tclosed #{}: {}\n", outcome.number, outcome.title)
            }
            RemediationStatus::Failed { stage, error } => format!(
                "\tFAILED #{} while {}: {}\n",
                outcome.number, stage, error
            ),
        };
        self.append(&line);
    }

    fn run_failed(&self, err: &StaleBotError) {
        self.append(&format!("\n\tRun aborted: {err}\n--- END OF RUN ---\n"));
    }

    fn run_finished(&self, summary: &RunSummary) {
        let mut text = String::new();
        if summary.stale.is_empty() {
            text.push_str("\n\tNo stale issues were detected.\n");
        } else if summary.dry_run {
            text.push_str("\n\tDry run: no issues were changed.\n");
        }
        if summary.truncated {
            text.push_str("\tOnly the first page of labeled issues was checked.\n");
        }
        text.push_str("\n--- END OF RUN ---\n");
        self.append(&text);
    }
}

/// Forwards every event to several reporters, in order.
#[derive(Default)]
pub struct MultiReporter {
    reporters: Vec<Box<dyn Reporter>>,
}

impl MultiReporter {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with(mut self, reporter: impl Reporter + 'static) -> Self {
        self.reporters.push(Box::new(reporter));
        self
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.reporters.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.reporters.is_empty()
    }
}

impl Reporter for MultiReporter {
    fn run_started(&self, run: &RunInfo) {
        self.reporters.iter().for_each(|r| r.run_started(run));
    }

    fn stale_found(&self, index: usize, record: &StaleIssueRecord) {
        self.reporters
            .iter()
            .for_each(|r| r.stale_found(index, record));
    }

    fn remediation_finished(&self, outcome: &RemediationOutcome) {
        self.reporters
            .iter()
            .for_each(|r| r.remediation_finished(outcome));
    }

    fn run_failed(&self, err: &StaleBotError) {
        self.reporters.iter().for_each(|r| r.run_failed(err));
    }

    fn run_finished(&self, summary: &RunSummary) {
        self.reporters.iter().for_each(|r| r.run_finished(summary));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::executor::RemediationStage;
    use crate::testing::fixtures::stale_record;
    use crate::testing::MemoryReporter;
    use tempfile::TempDir;

    fn run_info() -> RunInfo {
        RunInfo {
            run_id: Uuid::nil(),
            repository: "octo/widgets".into(),
            started_at: Utc::now(),
            dry_run: false,
        }
    }

    fn summary(stale: Vec<StaleIssueRecord>, outcomes: Vec<RemediationOutcome>) -> RunSummary {
        RunSummary {
            run_id: Uuid::nil(),
            repository: "octo/widgets".into(),
            started_at: Utc::now(),
            finished_at: Utc::now(),
            dry_run: false,
            issues_scanned: 3,
            truncated: false,
            comment: "bye".into(),
            stale,
            outcomes,
        }
    }

    fn failed_outcome() -> RemediationOutcome {
        RemediationOutcome {
            issue_id: "I_2".into(),
            number: 2,
            title: "Second".into(),
            status: RemediationStatus::Failed {
                stage: RemediationStage::Commenting,
                error: "rate limited".into(),
            },
        }
    }

    #[test]
    fn test_summary_counts() {
        let ok = RemediationOutcome {
            issue_id: "I_1".into(),
            number: 1,
            title: "First".into(),
            status: RemediationStatus::Succeeded,
        };
        let s = summary(vec![], vec![ok, failed_outcome()]);
        assert_eq!(s.succeeded(), 1);
        assert_eq!(s.failed(), 1);
    }

    #[test]
    fn test_log_file_records_run() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("stale.log");
        let reporter = LogFileReporter::new(&path);

        reporter.run_started(&run_info());
        reporter.stale_found(1, &stale_record("I_1", 1));
        reporter.remediation_finished(&failed_outcome());
        reporter.run_finished(&summary(vec![stale_record("I_1", 1)], vec![]));

        let log = std::fs::read_to_string(&path).unwrap();
        assert!(log.contains("--- START RUN:"));
        assert!(log.contains("octo/widgets"));
        assert!(log.contains("The following stale issues were detected:"));
        assert!(log.contains("\t1: Stale issue 1"));
        assert!(log.contains("FAILED #2 while commenting: rate limited"));
        assert!(log.trim_end().ends_with("--- END OF RUN ---"));
    }

    #[test]
    fn test_log_file_appends() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("stale.log");
        std::fs::write(&path, "previous run\n").unwrap();
        let reporter = LogFileReporter::new(&path);

        reporter.run_finished(&summary(vec![], vec![]));

        let log = std::fs::read_to_string(&path).unwrap();
        assert!(log.starts_with("previous run\n"));
        assert!(log.contains("No stale issues were detected."));
    }

    #[test]
    fn test_log_file_write_failure_is_not_fatal() {
        let temp = TempDir::new().unwrap();
        let reporter = LogFileReporter::new(temp.path().join("missing-dir").join("x.log"));
        reporter.run_failed(&StaleBotError::config("bad"));
        assert!(!reporter.path().exists());
    }

    #[test]
    fn test_multi_reporter_fans_out() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("stale.log");
        let multi = MultiReporter::new()
            .with(TracingReporter)
            .with(LogFileReporter::new(&path));
        assert_eq!(multi.len(), 2);

        multi.run_failed(&StaleBotError::config("missing owner"));

        let log = std::fs::read_to_string(&path).unwrap();
        assert!(log.contains("Run aborted: Configuration error: missing owner"));
    }

    #[test]
    fn test_default_methods_are_noops() {
        struct Silent;
        impl Reporter for Silent {}
        Silent.run_started(&run_info());
        Silent.run_finished(&summary(vec![], vec![]));

        let memory = MemoryReporter::new();
        memory.run_started(&run_info());
        assert_eq!(memory.entries().len(), 1);
    }
}
