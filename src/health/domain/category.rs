//! Task failure categories.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Classification attached to every failed task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCategory {
    /// The task exceeded its deadline.
    Timeout,
    /// The advisor answered, but never with a usable strategy.
    UpstreamCallFailure,
    /// The assembled artefact failed a structural check.
    ValidationFailure,
    /// A collaborator could not be reached.
    ConnectivityFailure,
    /// The artefact contained a denied statement.
    PolicyViolation,
    /// Anything else, including panics.
    Unknown,
}

impl ErrorCategory {
    /// Every category, in reporting order.
    pub const ALL: [Self; 6] = [
        Self::Timeout,
        Self::UpstreamCallFailure,
        Self::ValidationFailure,
        Self::ConnectivityFailure,
        Self::PolicyViolation,
        Self::Unknown,
    ];

    /// Returns the canonical string representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Timeout => "timeout",
            Self::UpstreamCallFailure => "upstream_call_failure",
            Self::ValidationFailure => "validation_failure",
            Self::ConnectivityFailure => "connectivity_failure",
            Self::PolicyViolation => "policy_violation",
            Self::Unknown => "unknown",
        }
    }

    /// Returns `true` for failures caused by infrastructure rather than
    /// by the request itself.
    #[must_use]
    pub const fn is_infrastructure(self) -> bool {
        matches!(
            self,
            Self::Timeout | Self::UpstreamCallFailure | Self::ConnectivityFailure
        )
    }
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<&str> for ErrorCategory {
    type Error = ParseErrorCategoryError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        let normalized = value.trim().to_ascii_lowercase();
        Self::ALL
            .into_iter()
            .find(|category| category.as_str() == normalized)
            .ok_or_else(|| ParseErrorCategoryError(value.to_owned()))
    }
}

/// Error returned while parsing an unknown category name.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("unknown error category: {0}")]
pub struct ParseErrorCategoryError(pub String);
