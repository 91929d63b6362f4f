//! Error types for task domain transitions and parsing.

use super::{TaskId, TaskStatus};
use thiserror::Error;

/// Errors returned by task state changes.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TaskDomainError {
    /// The requested status change is not allowed.
    #[error("task {task_id} cannot move from {from} to {to}")]
    InvalidTransition {
        /// Task being changed.
        task_id: TaskId,
        /// Current status.
        from: TaskStatus,
        /// Requested status.
        to: TaskStatus,
    },
}

/// Error returned while parsing task statuses.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("unknown task status: {0}")]
pub struct ParseTaskStatusError(pub String);
