//! Task aggregate root and status machine.

use super::{OptimizationRequest, ParseTaskStatusError, TaskDomainError, TaskId};
use crate::artifact::domain::OptimizationResult;
use crate::health::domain::ErrorCategory;
use chrono::{DateTime, Utc};
use mockable::Clock;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Task lifecycle status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    /// Admitted and waiting for a worker.
    Queued,
    /// Being executed by a worker.
    Running,
    /// Finished with an artefact.
    Done,
    /// Finished with a classified failure.
    Failed,
}

impl TaskStatus {
    /// Returns the canonical representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Queued => "queued",
            Self::Running => "running",
            Self::Done => "done",
            Self::Failed => "failed",
        }
    }

    /// Returns whether the status is final.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Done | Self::Failed)
    }

    /// Returns whether the status may move to `next`.
    #[must_use]
    pub const fn can_transition_to(self, next: Self) -> bool {
        matches!(
            (self, next),
            (Self::Queued, Self::Running) | (Self::Running, Self::Done | Self::Failed)
        )
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<&str> for TaskStatus {
    type Error = ParseTaskStatusError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        let normalized = value.trim().to_ascii_lowercase();
        match normalized.as_str() {
            "queued" => Ok(Self::Queued),
            "running" => Ok(Self::Running),
            "done" => Ok(Self::Done),
            "failed" => Ok(Self::Failed),
            _ => Err(ParseTaskStatusError(value.to_owned())),
        }
    }
}

/// Classified reason a task failed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskFailure {
    /// Failure category.
    pub category: ErrorCategory,
    /// Human-readable detail.
    pub message: String,
}

impl TaskFailure {
    /// Creates a failure record.
    #[must_use]
    pub fn new(category: ErrorCategory, message: impl Into<String>) -> Self {
        Self {
            category,
            message: message.into(),
        }
    }
}

impl fmt::Display for TaskFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.category, self.message)
    }
}

/// Number of stored tasks per status.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskCounts {
    /// Tasks waiting for a worker.
    pub queued: usize,
    /// Tasks being executed.
    pub running: usize,
    /// Tasks finished with an artefact.
    pub done: usize,
    /// Tasks finished with a failure.
    pub failed: usize,
}

impl TaskCounts {
    /// Returns the number of tasks holding an admission slot.
    #[must_use]
    pub const fn in_flight(&self) -> usize {
        self.queued.saturating_add(self.running)
    }

    /// Adds one task with `status`.
    pub const fn record(&mut self, status: TaskStatus) {
        let slot = match status {
            TaskStatus::Queued => &mut self.queued,
            TaskStatus::Running => &mut self.running,
            TaskStatus::Done => &mut self.done,
            TaskStatus::Failed => &mut self.failed,
        };
        *slot = slot.saturating_add(1);
    }
}

/// Task aggregate root.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    id: TaskId,
    request: OptimizationRequest,
    status: TaskStatus,
    submitted_at: DateTime<Utc>,
    started_at: Option<DateTime<Utc>>,
    completed_at: Option<DateTime<Utc>>,
    result: Option<OptimizationResult>,
    failure: Option<TaskFailure>,
}

impl Task {
    /// Creates a queued task for a request.
    #[must_use]
    pub fn new(request: OptimizationRequest, clock: &impl Clock) -> Self {
        Self {
            id: TaskId::new(),
            request,
            status: TaskStatus::Queued,
            submitted_at: clock.utc(),
            started_at: None,
            completed_at: None,
            result: None,
            failure: None,
        }
    }

    /// Returns the task identifier.
    #[must_use]
    pub const fn id(&self) -> TaskId {
        self.id
    }

    /// Returns the request snapshot.
    #[must_use]
    pub const fn request(&self) -> &OptimizationRequest {
        &self.request
    }

    /// Returns the lifecycle status.
    #[must_use]
    pub const fn status(&self) -> TaskStatus {
        self.status
    }

    /// Returns the admission timestamp.
    #[must_use]
    pub const fn submitted_at(&self) -> DateTime<Utc> {
        self.submitted_at
    }

    /// Returns when a worker picked the task up.
    #[must_use]
    pub const fn started_at(&self) -> Option<DateTime<Utc>> {
        self.started_at
    }

    /// Returns when the task finished.
    #[must_use]
    pub const fn completed_at(&self) -> Option<DateTime<Utc>> {
        self.completed_at
    }

    /// Returns the artefact of a done task.
    #[must_use]
    pub const fn result(&self) -> Option<&OptimizationResult> {
        self.result.as_ref()
    }

    /// Returns the failure of a failed task.
    #[must_use]
    pub const fn failure(&self) -> Option<&TaskFailure> {
        self.failure.as_ref()
    }

    /// Returns whether the task finished before `cutoff`.
    #[must_use]
    pub fn finished_before(&self, cutoff: DateTime<Utc>) -> bool {
        self.status.is_terminal() && self.completed_at.is_some_and(|at| at < cutoff)
    }

    /// Marks the task as picked up by a worker.
    ///
    /// # Errors
    ///
    /// Returns [`TaskDomainError::InvalidTransition`] unless the task is
    /// queued.
    pub fn start(&mut self, clock: &impl Clock) -> Result<(), TaskDomainError> {
        self.transition(TaskStatus::Running)?;
        self.started_at = Some(clock.utc());
        Ok(())
    }

    /// Records the artefact of a running task.
    ///
    /// # Errors
    ///
    /// Returns [`TaskDomainError::InvalidTransition`] unless the task is
    /// running.
    pub fn complete(
        &mut self,
        result: OptimizationResult,
        clock: &impl Clock,
    ) -> Result<(), TaskDomainError> {
        self.transition(TaskStatus::Done)?;
        self.result = Some(result);
        self.completed_at = Some(clock.utc());
        Ok(())
    }

    /// Records the failure of a running task.
    ///
    /// # Errors
    ///
    /// Returns [`TaskDomainError::InvalidTransition`] unless the task is
    /// running.
    pub fn fail(&mut self, failure: TaskFailure, clock: &impl Clock) -> Result<(), TaskDomainError> {
        self.transition(TaskStatus::Failed)?;
        self.failure = Some(failure);
        self.completed_at = Some(clock.utc());
        Ok(())
    }

    fn transition(&mut self, next: TaskStatus) -> Result<(), TaskDomainError> {
        if !self.status.can_transition_to(next) {
            return Err(TaskDomainError::InvalidTransition {
                task_id: self.id,
                from: self.status,
                to: next,
            });
        }
        self.status = next;
        Ok(())
    }
}
