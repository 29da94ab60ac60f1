//! Generation error types

use serde::Serialize;
use std::fmt;
use thiserror::Error;

/// Generation error with classification
#[derive(Debug, Clone, Error)]
#[error("{cause}: {message}")]
pub struct GenerationError {
    pub cause: FailureCause,
    pub message: String,
}

impl GenerationError {
    pub fn new(cause: FailureCause, message: impl Into<String>) -> Self {
        Self {
            cause,
            message: message.into(),
        }
    }

    pub fn timeout(message: impl Into<String>) -> Self {
        Self::new(FailureCause::Timeout, message)
    }

    pub fn transport(message: impl Into<String>) -> Self {
        Self::new(FailureCause::Transport, message)
    }

    pub fn rejected(message: impl Into<String>) -> Self {
        Self::new(FailureCause::Rejected, message)
    }

    pub fn malformed(message: impl Into<String>) -> Self {
        Self::new(FailureCause::MalformedOutput, message)
    }
}

/// Why a generation attempt failed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureCause {
    /// No answer within the allotted time
    Timeout,
    /// Connection problems, rate limiting, 5xx
    Transport,
    /// The provider refused the request (auth, bad request)
    Rejected,
    /// The provider answered with something we cannot use
    MalformedOutput,
}

impl FailureCause {
    /// Whether a retry has a reasonable chance of succeeding
    pub fn is_retryable(self) -> bool {
        matches!(self, Self::Timeout | Self::Transport)
    }
}

impl fmt::Display for FailureCause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Timeout => "timeout",
            Self::Transport => "transport",
            Self::Rejected => "rejected",
            Self::MalformedOutput => "malformed_output",
        };
        f.write_str(name)
    }
}
