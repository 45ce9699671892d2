//! Custom error types for stalebot.
//!
//! Errors split into two groups. Run-level errors (configuration, label
//! lookup, and anything on the read path) abort the whole run before any
//! remediation starts. Errors raised while remediating a single issue are
//! recovered by the executor and only surface as a failed outcome.

use thiserror::Error;

/// Main error type for stalebot operations
#[derive(Error, Debug)]
pub enum StaleBotError {
    // =========================================================================
    // Configuration Errors
    // =========================================================================
    /// Failed to load configuration
    #[error("Configuration error: {message}")]
    Config { message: String },

    /// Invalid configuration value
    #[error("Invalid configuration: {field} - {reason}")]
    InvalidConfig { field: String, reason: String },

    // =========================================================================
    // Remote Errors
    // =========================================================================
    /// The tracking label does not exist in the repository
    #[error("Tracking label '{label}' not found in {repository}")]
    LabelLookup { label: String, repository: String },

    /// A request failed at the transport layer or was rejected by the API
    #[error("Request '{operation}' failed: {message}")]
    Transport { operation: String, message: String },

    /// The response did not have the expected shape
    #[error("Malformed response to '{operation}': {message}")]
    MalformedResponse { operation: String, message: String },

    // =========================================================================
    // Wrapped Errors
    // =========================================================================
    /// IO error wrapper
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// JSON error wrapper
    #[error(transparent)]
    Json(#[from] serde_json::Error),

    /// TOML parse error wrapper
    #[error(transparent)]
    TomlDe(#[from] toml::de::Error),

    /// Generic error wrapper
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl StaleBotError {
    // =========================================================================
    // Constructor helpers
    // =========================================================================

    /// Create a configuration error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Create an invalid configuration error for a field
    pub fn invalid_config(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidConfig {
            field: field.into(),
            reason: reason.into(),
        }
    }

    /// Create a transport error
    pub fn transport(operation: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Transport {
            operation: operation.into(),
            message: message.into(),
        }
    }

    /// Create a malformed response error
    pub fn malformed(operation: impl Into<String>, message: impl Into<String>) -> Self {
        Self::MalformedResponse {
            operation: operation.into(),
            message: message.into(),
        }
    }

    // =========================================================================
    // Classification helpers
    // =========================================================================

    /// Check if this error came from talking to the remote system
    pub fn is_transport(&self) -> bool {
        matches!(self, Self::Transport { .. } | Self::MalformedResponse { .. })
    }

    /// Check if this error is a configuration problem
    pub fn is_config(&self) -> bool {
        matches!(
            self,
            Self::Config { .. } | Self::InvalidConfig { .. } | Self::TomlDe(_)
        )
    }

    /// Get error code for exit status
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::LabelLookup { .. } => 3,
            Self::Transport { .. } => 4,
            Self::MalformedResponse { .. } => 5,
            Self::Config { .. } | Self::InvalidConfig { .. } | Self::TomlDe(_) => 7,
            _ => 1,
        }
    }
}

/// Type alias for stalebot results
pub type Result<T> = std::result::Result<T, StaleBotError>;

/// Extension trait for converting foreign errors to StaleBotError
pub trait IntoStaleBotError<T> {
    fn into_config_error(self) -> Result<T>;
    fn into_transport_error(self, operation: &str) -> Result<T>;
}

impl<T, E: Into<anyhow::Error>> IntoStaleBotError<T> for std::result::Result<T, E> {
    fn into_config_error(self) -> Result<T> {
        self.map_err(|e| StaleBotError::config(e.into().to_string()))
    }

    fn into_transport_error(self, operation: &str) -> Result<T> {
        self.map_err(|e| StaleBotError::transport(operation, format!("{:#}", e.into())))
    }
}
