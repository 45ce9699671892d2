//! Configuration management for stalebot.
//!
//! Settings are layered: built-in defaults, then a TOML file, then
//! overrides from the environment and command line (see
//! [`ConfigOverrides`]).
//!
//! # Example stalebot.toml
//!
//! ```toml
//! owner = "octo"
//! repo = "widgets"
//! tracking-label = "pending-update"
//! fresh-label = "customer-replied-to"
//! stale-after = "2d"
//! comment = "Closing due to inactivity. It's been longer than {threshold} since this issue was marked with the {label} label."
//! log-file = "stale-issues-log.txt"
//! ```

pub mod threshold;
pub mod validation;

pub use threshold::{format_duration, parse_duration};
pub use validation::{ConfigValidator, ValidationIssue, ValidationReport};

use crate::error::{IntoStaleBotError, Result, StaleBotError};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::debug;

/// Upper bound GitHub enforces on items per connection page.
pub const MAX_PAGE_SIZE: u32 = 100;

/// Default GraphQL endpoint.
pub const DEFAULT_API_URL: &str = "https://api.github.com/graphql";

/// File name looked up in the working directory.
pub const CONFIG_FILE_NAME: &str = "stalebot.toml";

/// Comment left on an issue before it is closed.
pub const DEFAULT_COMMENT: &str = "Closing due to inactivity. It's been longer than {threshold} \
since this issue was marked with the `{label}` label. Feel free to re-open the issue.";

/// Everything a run needs to know about the repository and its policy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct BotConfig {
    /// Repository owner (user or organization).
    pub owner: String,

    /// Repository name.
    pub repo: String,

    /// Label that marks an issue for staleness tracking.
    pub tracking_label: String,

    /// Label that overrides staleness when present, typically added when
    /// someone replies.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fresh_label: Option<String>,

    /// How long an issue may stay quiet before it is closed.
    #[serde(with = "threshold::serde_duration")]
    pub stale_after: Duration,

    /// Closing comment template.
    ///
    /// Supports `{threshold}`, `{label}` and `{fresh_label}`.
    pub comment: String,

    /// Number of issues requested in the single read query.
    pub page_size: u32,

    /// Append-only run log.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub log_file: Option<PathBuf>,

    /// GraphQL endpoint.
    pub api_url: String,

    /// Per-request timeout applied by the HTTP transport.
    pub request_timeout_secs: u64,

    /// How many issues are remediated at the same time.
    pub concurrency: usize,
}

impl Default for BotConfig {
    fn default() -> Self {
        Self {
            owner: String::new(),
            repo: String::new(),
            tracking_label: String::new(),
            fresh_label: None,
            stale_after: Duration::from_secs(48 * 60 * 60),
            comment: DEFAULT_COMMENT.to_string(),
            page_size: MAX_PAGE_SIZE,
            log_file: None,
            api_url: DEFAULT_API_URL.to_string(),
            request_timeout_secs: 30,
            concurrency: 1,
        }
    }
}

/// Values that replace file settings when present.
///
/// The CLI fills this from flags and `STALEBOT_*` environment variables.
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub owner: Option<String>,
    pub repo: Option<String>,
    pub tracking_label: Option<String>,
    pub fresh_label: Option<String>,
    pub stale_after: Option<Duration>,
    pub log_file: Option<PathBuf>,
    pub api_url: Option<String>,
    pub concurrency: Option<usize>,
}

impl BotConfig {
    /// Load configuration from a TOML file.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            StaleBotError::config(format!("cannot read {}: {e}", path.display()))
        })?;
        Self::from_toml(&content)
    }

    /// Parse configuration from TOML text.
    pub fn from_toml(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    /// Serialize the configuration as TOML.
    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self).into_config_error()
    }

    /// Find and load the configuration file.
    ///
    /// An explicit path must exist. Without one, `./stalebot.toml` and then
    /// the user config directory are tried; when neither exists the
    /// defaults are returned. The second element is the file that was read.
    pub fn discover(explicit: Option<&Path>) -> Result<(Self, Option<PathBuf>)> {
        if let Some(path) = explicit {
            if !path.exists() {
                return Err(StaleBotError::config(format!(
                    "config file not found: {}",
                    path.display()
                )));
            }
            return Ok((Self::load(path)?, Some(path.to_path_buf())));
        }

        let candidates = [Some(PathBuf::from(CONFIG_FILE_NAME)), Self::user_config_path()];
        for candidate in candidates.into_iter().flatten() {
            if candidate.exists() {
                debug!("Loading configuration from {}", candidate.display());
                return Ok((Self::load(&candidate)?, Some(candidate)));
            }
        }

        debug!("No configuration file found, using defaults");
        Ok((Self::default(), None))
    }

    /// Per-user config file, e.g. `~/.config/stalebot/config.toml`.
    #[must_use]
    pub fn user_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("stalebot").join("config.toml"))
    }

    /// Apply overrides on top of the loaded values.
    pub fn apply_overrides(&mut self, overrides: ConfigOverrides) {
        if let Some(owner) = overrides.owner {
            self.owner = owner;
        }
        if let Some(repo) = overrides.repo {
            self.repo = repo;
        }
        if let Some(label) = overrides.tracking_label {
            self.tracking_label = label;
        }
        if let Some(fresh) = overrides.fresh_label {
            self.fresh_label = Some(fresh);
        }
        if let Some(stale_after) = overrides.stale_after {
            self.stale_after = stale_after;
        }
        if let Some(log_file) = overrides.log_file {
            self.log_file = Some(log_file);
        }
        if let Some(api_url) = overrides.api_url {
            self.api_url = api_url;
        }
        if let Some(concurrency) = overrides.concurrency {
            self.concurrency = concurrency;
        }
    }

    /// `owner/repo`, as shown in logs.
    #[must_use]
    pub fn repository(&self) -> String {
        format!("{}/{}", self.owner, self.repo)
    }

    /// Check the configuration, failing on the first error.
    pub fn validate(&self) -> Result<()> {
        let report = ConfigValidator::new(self).validate();
        match report.errors.into_iter().next() {
            Some(issue) => Err(StaleBotError::invalid_config(issue.field, issue.reason)),
            None => Ok(()),
        }
    }

    /// The threshold as a signed duration for timestamp arithmetic.
    pub fn threshold(&self) -> Result<chrono::Duration> {
        chrono::Duration::from_std(self.stale_after)
            .map_err(|_| StaleBotError::invalid_config("stale-after", "threshold is too large"))
    }

    /// The tracking label without surrounding whitespace.
    #[must_use]
    pub fn tracking_label(&self) -> &str {
        self.tracking_label.trim()
    }

    /// The fresh label, ignoring blank values.
    #[must_use]
    pub fn fresh_label(&self) -> Option<&str> {
        self.fresh_label
            .as_deref()
            .map(str::trim)
            .filter(|l| !l.is_empty())
    }
}
