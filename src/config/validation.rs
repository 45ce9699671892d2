//! Configuration validation for stalebot.
//!
//! Every problem found in a [`BotConfig`] is collected into a
//! [`ValidationReport`] so `stalebot config validate` can show all of them
//! at once. A run only needs the first error, see [`BotConfig::validate`].
//!
//! # Example
//!
//! ```rust,ignore
//! use stalebot::config::{BotConfig, ConfigValidator};
//!
//! let report = ConfigValidator::new(&config).validate();
//! if !report.is_valid() {
//!     eprintln!("{}", report.verbose_report());
//!     std::process::exit(report.exit_code());
//! }
//! ```

use super::{BotConfig, MAX_PAGE_SIZE};
use crate::planner::{CommentTemplate, KNOWN_PLACEHOLDERS};

/// A single validation finding, tied to the config key it concerns.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationIssue {
    /// Config key, in the file's kebab-case spelling.
    pub field: &'static str,
    /// What is wrong with it.
    pub reason: String,
}

impl std::fmt::Display for ValidationIssue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.field, self.reason)
    }
}

/// Result of configuration validation.
///
/// Errors make the configuration unusable; warnings are reported but do
/// not block a run.
#[derive(Debug, Clone, Default)]
pub struct ValidationReport {
    /// Errors that prevent the configuration from being valid.
    pub errors: Vec<ValidationIssue>,
    /// Warnings that don't prevent validity but indicate potential issues.
    pub warnings: Vec<ValidationIssue>,
}

impl ValidationReport {
    /// Create a new empty validation report.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns true if the configuration is valid (no errors).
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    /// Returns 0 if valid, 7 (the configuration exit code) otherwise.
    #[must_use]
    pub fn exit_code(&self) -> i32 {
        if self.is_valid() {
            0
        } else {
            7
        }
    }

    fn error(&mut self, field: &'static str, reason: impl Into<String>) {
        self.errors.push(ValidationIssue {
            field,
            reason: reason.into(),
        });
    }

    fn warning(&mut self, field: &'static str, reason: impl Into<String>) {
        self.warnings.push(ValidationIssue {
            field,
            reason: reason.into(),
        });
    }

    /// Generate a human-readable summary of the validation result.
    #[must_use]
    pub fn summary(&self) -> String {
        if self.is_valid() {
            if self.warnings.is_empty() {
                "Configuration is valid.".to_string()
            } else {
                format!(
                    "Configuration is valid with {} warning(s).",
                    self.warnings.len()
                )
            }
        } else {
            format!(
                "Configuration is invalid with {} error(s).",
                self.errors.len()
            )
        }
    }

    /// Generate a verbose report listing every error and warning.
    #[must_use]
    pub fn verbose_report(&self) -> String {
        let mut lines = vec![
            "Configuration Validation Report".to_string(),
            "\u{2500}".repeat(50),
        ];

        if !self.errors.is_empty() {
            lines.push(String::new());
            lines.push(format!("Errors ({}):", self.errors.len()));
            for error in &self.errors {
                lines.push(format!("  \u{2717} {}", error));
            }
        }

        if !self.warnings.is_empty() {
            lines.push(String::new());
            lines.push(format!("Warnings ({}):", self.warnings.len()));
            for warning in &self.warnings {
                lines.push(format!("  \u{26a0} {}", warning));
            }
        }

        lines.push(String::new());
        lines.push(format!("Status: {}", self.summary()));

        lines.join("\n")
    }
}

/// Checks a [`BotConfig`] for missing or inconsistent values.
pub struct ConfigValidator<'a> {
    config: &'a BotConfig,
}

impl<'a> ConfigValidator<'a> {
    #[must_use]
    pub fn new(config: &'a BotConfig) -> Self {
        Self { config }
    }

    /// Run every check and collect the findings.
    #[must_use]
    pub fn validate(&self) -> ValidationReport {
        let mut report = ValidationReport::new();
        let config = self.config;

        if config.owner.trim().is_empty() {
            report.error("owner", "repository owner is required");
        }
        if config.repo.trim().is_empty() {
            report.error("repo", "repository name is required");
        }
        if config.tracking_label().is_empty() {
            report.error("tracking-label", "tracking label name is required");
        }

        if let Some(fresh) = &config.fresh_label {
            if fresh.trim().is_empty() {
                report.error("fresh-label", "must not be empty when set");
            } else if fresh.trim().eq_ignore_ascii_case(config.tracking_label()) {
                report.error(
                    "fresh-label",
                    "must differ from the tracking label, or no issue could ever go stale",
                );
            }
        }

        if config.stale_after.is_zero() {
            report.error("stale-after", "threshold must be greater than zero");
        } else if chrono::Duration::from_std(config.stale_after).is_err() {
            report.error("stale-after", "threshold is too large");
        }

        if config.page_size == 0 || config.page_size > MAX_PAGE_SIZE {
            report.error(
                "page-size",
                format!("must be between 1 and {MAX_PAGE_SIZE}"),
            );
        }

        if config.concurrency == 0 {
            report.error("concurrency", "must be at least 1");
        }

        if config.api_url.trim().is_empty() {
            report.error("api-url", "must not be empty");
        }

        if config.request_timeout_secs == 0 {
            report.error("request-timeout-secs", "must be at least 1");
        }

        self.check_comment(&mut report);

        report
    }

    fn check_comment(&self, report: &mut ValidationReport) {
        let template = CommentTemplate::new(&self.config.comment);
        if template.is_blank() {
            report.error("comment", "closing comment must not be empty");
            return;
        }

        for placeholder in template.placeholders() {
            if !KNOWN_PLACEHOLDERS.contains(&placeholder.as_str()) {
                report.error(
                    "comment",
                    format!(
                        "unknown placeholder {{{placeholder}}} (known: {})",
                        KNOWN_PLACEHOLDERS.join(", ")
                    ),
                );
            }
        }

        if template.placeholders().iter().any(|p| p == "fresh_label")
            && self.config.fresh_label.is_none()
        {
            report.warning(
                "comment",
                "{fresh_label} is used but no fresh label is configured; it renders empty",
            );
        }

        if !template.placeholders().iter().any(|p| p == "threshold") {
            report.warning(
                "comment",
                "closing comment does not mention the {threshold}",
            );
        }
    }
}
