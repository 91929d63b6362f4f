//! Domain types for the optimisation artefact.

mod error;
mod result;

pub use error::{AssemblyError, DenyRule, Section};
pub use result::{OptimizationResult, RewrittenQuery, SqlStatement};
