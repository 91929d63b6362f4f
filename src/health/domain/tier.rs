//! Health tier derived from the failure rate.

use serde::{Deserialize, Serialize};
use std::fmt;

const PERMILLE: u64 = 1_000;
const WARNING_PERMILLE: u64 = 50;
const DEGRADED_PERMILLE: u64 = 150;
const CRITICAL_PERMILLE: u64 = 300;

/// Coarse service health.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HealthTier {
    /// Failure rate below 5%.
    Healthy,
    /// Failure rate below 15%.
    Warning,
    /// Failure rate below 30%.
    Degraded,
    /// Failure rate of 30% or more.
    Critical,
}

impl HealthTier {
    /// Returns the canonical string representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Healthy => "healthy",
            Self::Warning => "warning",
            Self::Degraded => "degraded",
            Self::Critical => "critical",
        }
    }

    /// Failure rate over finished tasks, in per-mille.
    ///
    /// Returns zero when nothing has finished yet.
    #[must_use]
    pub fn failure_permille(completed: u64, failed: u64) -> u64 {
        let finished = completed.saturating_add(failed);
        failed
            .saturating_mul(PERMILLE)
            .checked_div(finished)
            .unwrap_or(0)
    }

    /// Assesses health from finished-task counters.
    ///
    /// When the rate already warrants at least a warning and infrastructure
    /// failures make up more than half of all failures, the tier is raised
    /// by one step.
    ///
    /// # Examples
    ///
    /// ```
    /// use sqlagent::health::domain::HealthTier;
    ///
    /// assert_eq!(HealthTier::assess(0, 0, 0), HealthTier::Healthy);
    /// assert_eq!(HealthTier::assess(90, 10, 0), HealthTier::Warning);
    /// assert_eq!(HealthTier::assess(90, 10, 6), HealthTier::Degraded);
    /// ```
    #[must_use]
    pub fn assess(completed: u64, failed: u64, infrastructure_failures: u64) -> Self {
        let base = Self::from_permille(Self::failure_permille(completed, failed));
        if base != Self::Healthy && infrastructure_failures.saturating_mul(2) > failed {
            return base.escalated();
        }
        base
    }

    const fn from_permille(rate: u64) -> Self {
        if rate < WARNING_PERMILLE {
            Self::Healthy
        } else if rate < DEGRADED_PERMILLE {
            Self::Warning
        } else if rate < CRITICAL_PERMILLE {
            Self::Degraded
        } else {
            Self::Critical
        }
    }

    const fn escalated(self) -> Self {
        match self {
            Self::Healthy => Self::Warning,
            Self::Warning => Self::Degraded,
            Self::Degraded | Self::Critical => Self::Critical,
        }
    }
}

impl fmt::Display for HealthTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
