//! stalebot - closes issues that went quiet
//!
//! Finds open issues carrying a tracking label whose last activity is
//! older than a threshold, leaves an explanatory comment, removes the
//! label and closes them. A "fresh" label, usually added when someone
//! replies, keeps an issue open regardless of age.
//!
//! # Architecture
//!
//! The crate is organized into several modules:
//!
//! - [`query`] - Parameterized GraphQL requests (reads and mutations)
//! - [`model`] - Issue snapshot types and response decoding
//! - [`classifier`] - Pure staleness decisions
//! - [`planner`] - Ordered remediation actions per stale issue
//! - [`executor`] - Runs plans, isolating per-issue failures
//! - [`reporter`] - Run reporting (tracing, console, append-only log file)
//! - [`pipeline`] - One run, end to end
//! - [`transport`] - GraphQL transport trait and the GitHub client
//! - [`config`] - Configuration loading and validation
//! - [`error`] - Custom error types and handling
//! - [`testing`] - Testing infrastructure (mocks, fixtures, assertions)
//!
//! # Example
//!
//! ```rust,ignore
//! use stalebot::{BotConfig, GitHubClient, StaleIssueRun, SystemClock, TracingReporter};
//!
//! let (config, _) = BotConfig::discover(None)?;
//! let client = GitHubClient::new(&token, &config.api_url, Duration::from_secs(30))?;
//! let summary = StaleIssueRun::new(&config, &client, &SystemClock, &TracingReporter)
//!     .run()
//!     .await?;
//! ```

pub mod classifier;
pub mod clock;
pub mod config;
pub mod error;
pub mod executor;
pub mod model;
pub mod pipeline;
pub mod planner;
pub mod query;
pub mod reporter;
pub mod testing;
pub mod transport;

// Re-export commonly used types
pub use error::{IntoStaleBotError, Result, StaleBotError};

pub use classifier::{classify, classify_all, Classification, StaleIssueRecord, StalenessPolicy};
pub use clock::{Clock, SystemClock};
pub use config::{BotConfig, ConfigOverrides, ConfigValidator, ValidationReport};
pub use executor::{RemediationExecutor, RemediationOutcome, RemediationStage, RemediationStatus};
pub use model::{Issue, IssueSnapshot, Label};
pub use pipeline::StaleIssueRun;
pub use planner::{CommentTemplate, RemediationAction, RemediationPlan, RemediationPlanner};
pub use query::{GraphQLRequest, IssueQuery};
pub use reporter::{
    ConsoleReporter, LogFileReporter, MultiReporter, Reporter, RunInfo, RunSummary,
    TracingReporter,
};
pub use transport::{GitHubClient, GraphQLTransport};
