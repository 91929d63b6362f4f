//! Point-in-time metrics report.

use super::{ErrorCategory, HealthTier};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Counters and gauges reported by `get_metrics`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetricsSnapshot {
    /// Submissions accepted since start-up.
    pub submitted: u64,
    /// Submissions rejected for capacity.
    pub rejected: u64,
    /// Tasks finished as done.
    pub completed: u64,
    /// Tasks finished as failed.
    pub failed: u64,
    /// Failed tasks per category.
    pub failures_by_category: BTreeMap<ErrorCategory, u64>,
    /// Tasks currently waiting for a worker.
    pub queued: usize,
    /// Tasks currently executing.
    pub running: usize,
    /// Failure rate over finished tasks, in per-mille.
    pub error_rate_permille: u64,
    /// Health derived from the failure rate.
    pub health: HealthTier,
}

impl MetricsSnapshot {
    /// Returns the number of failures recorded for `category`.
    #[must_use]
    pub fn failures(&self, category: ErrorCategory) -> u64 {
        self.failures_by_category
            .get(&category)
            .copied()
            .unwrap_or(0)
    }
}
