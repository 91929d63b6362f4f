//! Domain model for SQL rewriting.
//!
//! Table metadata is built once per task and shared read-only between the
//! query rewrites of that task.

mod error;
mod outcome;
mod table;
mod target;

pub use error::{RewriteDomainError, TierFailure};
pub use outcome::{RewriteNote, RewriteResult, RewriteTier};
pub use table::{ColumnSpec, TableCatalog, TableMetadata, TableName};
pub use target::{OPTIMIZED_SCHEMA_PREFIX, TargetLocation};
