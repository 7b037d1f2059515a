//! Unified error types for SubsTrack.

use thiserror::Error;

/// Result type alias using SubsTrackError.
pub type Result<T> = std::result::Result<T, SubsTrackError>;

#[derive(Error, Debug)]
pub enum SubsTrackError {
    // Tick-level failures
    #[error("Config unavailable: {0}")]
    ConfigUnavailable(String),

    #[error("Subscription store unavailable: {0}")]
    StoreUnavailable(String),

    // Channel errors
    #[error("Channel error: {0}")]
    Channel(String),

    /// Display text is fixed; the name travels alongside in results and logs.
    #[error("unknown channel")]
    UnknownChannel(String),

    #[error("Template error: {0}")]
    Template(String),

    // Lifecycle errors
    #[error("Auto-renewal of '{id}' did not catch up after {iterations} periods")]
    RenewalOverflow { id: String, iterations: u32 },

    #[error("Invalid date '{value}': {reason}")]
    InvalidDate { value: String, reason: String },

    // General errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("HTTP error: {0}")]
    Http(String),

    #[error("Timeout: {0}")]
    Timeout(String),

    #[error("{0}")]
    Other(String),
}

impl SubsTrackError {
    pub fn channel(msg: impl Into<String>) -> Self {
        Self::Channel(msg.into())
    }

    pub fn config(msg: impl Into<String>) -> Self {
        Self::ConfigUnavailable(msg.into())
    }

    pub fn store(msg: impl Into<String>) -> Self {
        Self::StoreUnavailable(msg.into())
    }

    pub fn invalid_date(value: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidDate {
            value: value.into(),
            reason: reason.into(),
        }
    }
}
