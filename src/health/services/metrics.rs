//! Per-engine outcome counters.

use crate::health::domain::{ErrorCategory, HealthTier, MetricsSnapshot};
use std::collections::BTreeMap;
use std::sync::{PoisonError, RwLock};

#[derive(Debug, Default)]
struct Counters {
    submitted: u64,
    rejected: u64,
    completed: u64,
    failed: u64,
    failures_by_category: BTreeMap<ErrorCategory, u64>,
}

/// Outcome counters owned by one engine instance.
///
/// Counters are plain integers behind a lock; a poisoned lock still yields
/// its data because every update is a single increment.
#[derive(Debug, Default)]
pub struct ErrorMetrics {
    counters: RwLock<Counters>,
}

impl ErrorMetrics {
    /// Creates zeroed counters.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Records an accepted submission.
    pub fn record_submitted(&self) {
        self.update(|counters| counters.submitted = counters.submitted.saturating_add(1));
    }

    /// Records a submission rejected for capacity.
    pub fn record_rejected(&self) {
        self.update(|counters| counters.rejected = counters.rejected.saturating_add(1));
    }

    /// Records a task that finished as done.
    pub fn record_completed(&self) {
        self.update(|counters| counters.completed = counters.completed.saturating_add(1));
    }

    /// Records a task that finished as failed.
    pub fn record_failure(&self, category: ErrorCategory) {
        self.update(|counters| {
            counters.failed = counters.failed.saturating_add(1);
            let slot = counters.failures_by_category.entry(category).or_insert(0);
            *slot = slot.saturating_add(1);
        });
    }

    /// Builds a snapshot, combining counters with live store gauges.
    #[must_use]
    pub fn snapshot(&self, queued: usize, running: usize) -> MetricsSnapshot {
        let counters = self.counters.read().unwrap_or_else(PoisonError::into_inner);
        let infrastructure = counters
            .failures_by_category
            .iter()
            .filter(|(category, _)| category.is_infrastructure())
            .fold(0_u64, |total, (_, count)| total.saturating_add(*count));
        MetricsSnapshot {
            submitted: counters.submitted,
            rejected: counters.rejected,
            completed: counters.completed,
            failed: counters.failed,
            failures_by_category: counters.failures_by_category.clone(),
            queued,
            running,
            error_rate_permille: HealthTier::failure_permille(counters.completed, counters.failed),
            health: HealthTier::assess(counters.completed, counters.failed, infrastructure),
        }
    }

    fn update(&self, apply: impl FnOnce(&mut Counters)) {
        let mut counters = self.counters.write().unwrap_or_else(PoisonError::into_inner);
        apply(&mut counters);
    }
}
