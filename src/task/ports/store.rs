//! Store port for task admission, lookup and retention.

use crate::task::domain::{Task, TaskCounts, TaskId};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use thiserror::Error;

/// Result type for task store operations.
pub type TaskStoreResult<T> = Result<T, TaskStoreError>;

/// Task storage contract.
#[async_trait]
pub trait TaskStore: Send + Sync {
    /// Stores a new queued task if fewer than `capacity` tasks are queued
    /// or running.
    ///
    /// The capacity check and the insert are one atomic step.
    ///
    /// # Errors
    ///
    /// Returns [`TaskStoreError::CapacityExceeded`] when the store is full,
    /// in which case nothing is stored, or
    /// [`TaskStoreError::DuplicateTask`] when the id already exists.
    async fn admit(&self, task: &Task, capacity: usize) -> TaskStoreResult<()>;

    /// Replaces a stored task.
    ///
    /// # Errors
    ///
    /// Returns [`TaskStoreError::NotFound`] when the task does not exist.
    async fn update(&self, task: &Task) -> TaskStoreResult<()>;

    /// Finds a task by identifier.
    ///
    /// Returns `None` when the task does not exist or was evicted.
    async fn find_by_id(&self, id: TaskId) -> TaskStoreResult<Option<Task>>;

    /// Removes a task, returning it if it existed.
    async fn remove(&self, id: TaskId) -> TaskStoreResult<Option<Task>>;

    /// Removes finished tasks completed before `cutoff`.
    ///
    /// Returns the number of evicted tasks.
    async fn evict_finished_before(&self, cutoff: DateTime<Utc>) -> TaskStoreResult<usize>;

    /// Counts stored tasks per status.
    async fn counts(&self) -> TaskStoreResult<TaskCounts>;
}

/// Errors returned by task store implementations.
#[derive(Debug, Clone, Error)]
pub enum TaskStoreError {
    /// Admission would exceed the capacity.
    #[error("capacity of {capacity} in-flight tasks exceeded")]
    CapacityExceeded {
        /// Maximum queued plus running tasks.
        capacity: usize,
    },

    /// A task with the same identifier already exists.
    #[error("duplicate task identifier: {0}")]
    DuplicateTask(TaskId),

    /// The task was not found.
    #[error("task not found: {0}")]
    NotFound(TaskId),

    /// Storage-layer failure.
    #[error("persistence error: {0}")]
    Persistence(Arc<dyn std::error::Error + Send + Sync>),
}

impl TaskStoreError {
    /// Wraps a storage error.
    pub fn persistence(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Persistence(Arc::new(err))
    }
}
