//! Application services for task execution.

mod engine;
mod pipeline;

pub use engine::{EngineError, EngineResult, OptimizationEngine, TaskOutcome};
pub use pipeline::{OptimizationPipeline, PipelineError};
