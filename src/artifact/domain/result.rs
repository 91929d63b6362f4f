//! Output artefact of a successful task.

use serde::{Deserialize, Serialize};

/// One SQL statement in the artefact.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SqlStatement {
    /// SQL text.
    pub statement: String,
}

impl SqlStatement {
    /// Wraps SQL text.
    #[must_use]
    pub fn new(statement: impl Into<String>) -> Self {
        Self {
            statement: statement.into(),
        }
    }
}

/// A workload query after rewriting.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RewrittenQuery {
    /// Identifier copied verbatim from the request.
    pub queryid: String,
    /// Rewritten SQL text.
    pub query: String,
}

/// Schema, migration and query statements produced for one request.
///
/// The first DDL statement always creates the target schema.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OptimizationResult {
    /// Schema statements, schema creation first.
    pub ddl: Vec<SqlStatement>,
    /// Data migration statements.
    pub migrations: Vec<SqlStatement>,
    /// Rewritten workload, in request order.
    pub queries: Vec<RewrittenQuery>,
}
