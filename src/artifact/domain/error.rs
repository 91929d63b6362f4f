//! Artefact validation failures.

use crate::health::domain::ErrorCategory;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Part of the artefact a statement belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Section {
    /// Schema statements.
    Ddl,
    /// Migration statements.
    Migrations,
    /// Rewritten queries.
    Queries,
}

impl Section {
    /// Returns the artefact field name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Ddl => "ddl",
            Self::Migrations => "migrations",
            Self::Queries => "queries",
        }
    }
}

impl fmt::Display for Section {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Statement family the artefact must never contain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DenyRule {
    /// `GRANT` and `REVOKE`.
    Authorization,
    /// `CREATE`, `ALTER` or `DROP` of a role or user.
    RoleManagement,
    /// `CREATE MATERIALIZED VIEW`.
    MaterializedView,
}

impl DenyRule {
    /// Returns the canonical rule name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Authorization => "authorization",
            Self::RoleManagement => "role_management",
            Self::MaterializedView => "materialized_view",
        }
    }
}

impl fmt::Display for DenyRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Errors returned while assembling and validating an artefact.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum AssemblyError {
    /// A statement matched the deny-list.
    #[error("{section}[{index}] violates the {rule} policy")]
    PolicyViolation {
        /// Artefact section.
        section: Section,
        /// Position within the section.
        index: usize,
        /// Matching rule.
        rule: DenyRule,
    },

    /// The first DDL statement does not create the target schema.
    #[error("ddl[0] must create schema {expected}")]
    MissingSchemaStatement {
        /// Expected `catalog.schema`.
        expected: String,
    },

    /// A statement writes outside the optimised schema.
    #[error("{section}[{index}] must target {expected}.<table>: {excerpt}")]
    UnqualifiedPath {
        /// Artefact section.
        section: Section,
        /// Position within the section.
        index: usize,
        /// Expected `catalog.schema`.
        expected: String,
        /// Start of the offending statement.
        excerpt: String,
    },

    /// A migration is neither an insert nor a read-only query.
    #[error("migrations[{index}] is neither an INSERT nor a query: {excerpt}")]
    UnexpectedMigration {
        /// Position within the section.
        index: usize,
        /// Start of the offending statement.
        excerpt: String,
    },

    /// Output query ids are not the input ids in order.
    #[error("query ids changed: expected {expected:?}, produced {produced:?}")]
    QueryIdMismatch {
        /// Input ids in order.
        expected: Vec<String>,
        /// Output ids in order.
        produced: Vec<String>,
    },
}

impl AssemblyError {
    /// Returns the task failure category for this error.
    #[must_use]
    pub const fn category(&self) -> ErrorCategory {
        match self {
            Self::PolicyViolation { .. } => ErrorCategory::PolicyViolation,
            Self::MissingSchemaStatement { .. }
            | Self::UnqualifiedPath { .. }
            | Self::UnexpectedMigration { .. }
            | Self::QueryIdMismatch { .. } => ErrorCategory::ValidationFailure,
        }
    }
}
