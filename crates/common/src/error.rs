//! Error types shared across Stream Scribe crates.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Top-level error type for Stream Scribe operations.
#[derive(Debug, thiserror::Error)]
pub enum ScribeError {
    #[error("Capture permission denied: {message}")]
    AcquisitionDenied { message: String },

    #[error("Capture unavailable: {message}")]
    AcquisitionUnavailable { message: String },

    #[error("Join failed: {message}")]
    JoinFailed { message: String },

    #[error("Session busy: {message}")]
    SessionBusy { message: String },

    #[error("Invalid share link: {message}")]
    InvalidLink { message: String },

    #[error("Platform error: {message}")]
    Platform { message: String },

    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Result type alias using ScribeError.
pub type ScribeResult<T> = Result<T, ScribeError>;

impl ScribeError {
    pub fn denied(msg: impl Into<String>) -> Self {
        Self::AcquisitionDenied {
            message: msg.into(),
        }
    }

    pub fn unavailable(msg: impl Into<String>) -> Self {
        Self::AcquisitionUnavailable {
            message: msg.into(),
        }
    }

    pub fn join_failed(msg: impl Into<String>) -> Self {
        Self::JoinFailed {
            message: msg.into(),
        }
    }

    pub fn busy(msg: impl Into<String>) -> Self {
        Self::SessionBusy {
            message: msg.into(),
        }
    }

    pub fn invalid_link(msg: impl Into<String>) -> Self {
        Self::InvalidLink {
            message: msg.into(),
        }
    }

    pub fn platform(msg: impl Into<String>) -> Self {
        Self::Platform {
            message: msg.into(),
        }
    }

    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config {
            message: msg.into(),
        }
    }

    /// Classify this error for storage in session state.
    ///
    /// Anything that is not an explicit denial or join failure is reported
    /// as the capture being unavailable.
    pub fn failure_kind(&self) -> FailureKind {
        match self {
            Self::AcquisitionDenied { .. } => FailureKind::AcquisitionDenied,
            Self::JoinFailed { .. } => FailureKind::JoinFailed,
            _ => FailureKind::AcquisitionUnavailable,
        }
    }
}

/// Category of a failed start or join attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    /// The user or the system refused the capture.
    AcquisitionDenied,
    /// No capturable source, or the environment cannot capture at all.
    AcquisitionUnavailable,
    /// The join path failed.
    JoinFailed,
}

/// Last failure detail kept by a session.
///
/// Unlike [`ScribeError`] this is cheap to clone, so it can travel inside
/// state snapshots.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionFailure {
    pub kind: FailureKind,
    pub message: String,
}

impl From<&ScribeError> for SessionFailure {
    fn from(err: &ScribeError) -> Self {
        Self {
            kind: err.failure_kind(),
            message: err.to_string(),
        }
    }
}

impl fmt::Display for SessionFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn failure_kind_follows_variant() {
        assert_eq!(
            ScribeError::denied("nope").failure_kind(),
            FailureKind::AcquisitionDenied
        );
        assert_eq!(
            ScribeError::join_failed("x").failure_kind(),
            FailureKind::JoinFailed
        );
        assert_eq!(
            ScribeError::platform("no portal").failure_kind(),
            FailureKind::AcquisitionUnavailable
        );
    }

    #[test]
    fn session_failure_keeps_display_message() {
        let err = ScribeError::unavailable("no monitor selected");
        let failure = SessionFailure::from(&err);
        assert_eq!(failure.kind, FailureKind::AcquisitionUnavailable);
        assert_eq!(failure.to_string(), "Capture unavailable: no monitor selected");
    }
}
