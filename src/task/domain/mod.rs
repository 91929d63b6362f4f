//! Domain model for optimisation tasks.
//!
//! A task pairs an immutable request snapshot with a monotonic status and,
//! once finished, either the artefact or one classified failure.

mod error;
mod ids;
mod request;
mod task;

pub use error::{ParseTaskStatusError, TaskDomainError};
pub use ids::TaskId;
pub use request::{DdlStatement, OptimizationRequest, WorkloadQuery};
pub use task::{Task, TaskCounts, TaskFailure, TaskStatus};
