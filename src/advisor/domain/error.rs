//! Problems found in an advisor answer.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Family of problems a repair prompt addresses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RepairKind {
    /// The answer was not a JSON object.
    JsonSyntax,
    /// The JSON did not describe a usable strategy.
    Schema,
}

/// A single problem with an advisor answer.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum StrategyIssue {
    /// No JSON object was found in the answer.
    #[error("json_not_found: the answer contains no JSON object")]
    JsonNotFound,

    /// A JSON object was found but could not be decoded.
    #[error("json_decode_error: {0}")]
    JsonDecode(String),

    /// The JSON does not have the strategy shape.
    #[error("schema_validation: {0}")]
    Shape(String),

    /// The strategy names a table the request does not define.
    #[error("schema_validation: unknown table '{0}'")]
    UnknownTable(String),

    /// The strategy names the same table twice.
    #[error("schema_validation: table '{0}' appears more than once")]
    DuplicateTable(String),

    /// The strategy names a column the table does not have.
    #[error("schema_validation: table '{table}' has no column '{column}'")]
    UnknownColumn {
        /// Table named by the strategy.
        table: String,
        /// Missing column.
        column: String,
    },

    /// Too many partition columns.
    #[error("schema_validation: table '{table}' has {count} partition columns, at most {limit} allowed")]
    TooManyPartitionColumns {
        /// Table named by the strategy.
        table: String,
        /// Columns proposed.
        count: usize,
        /// Columns allowed.
        limit: usize,
    },

    /// Too many cluster columns.
    #[error("schema_validation: table '{table}' has {count} cluster columns, at most {limit} allowed")]
    TooManyClusterColumns {
        /// Table named by the strategy.
        table: String,
        /// Columns proposed.
        count: usize,
        /// Columns allowed.
        limit: usize,
    },

    /// The compression codec is empty or not supported.
    #[error("schema_validation: table '{table}' has unsupported compression codec '{codec}'")]
    InvalidCompression {
        /// Table named by the strategy.
        table: String,
        /// Proposed codec.
        codec: String,
    },

    /// A proposed migration is not a single parseable statement.
    #[error("schema_validation: migration {index} is not valid SQL: {reason}")]
    MigrationSyntax {
        /// Position of the migration in the answer.
        index: usize,
        /// Parser message.
        reason: String,
    },

    /// A proposed migration writes outside the target schema.
    #[error("schema_validation: migration {index} must insert into {expected}.<table>")]
    MigrationTarget {
        /// Position of the migration in the answer.
        index: usize,
        /// Expected `catalog.schema` prefix.
        expected: String,
    },
}

impl StrategyIssue {
    /// Returns the repair family this issue belongs to.
    #[must_use]
    pub const fn kind(&self) -> RepairKind {
        match self {
            Self::JsonNotFound | Self::JsonDecode(_) => RepairKind::JsonSyntax,
            Self::Shape(_)
            | Self::UnknownTable(_)
            | Self::DuplicateTable(_)
            | Self::UnknownColumn { .. }
            | Self::TooManyPartitionColumns { .. }
            | Self::TooManyClusterColumns { .. }
            | Self::InvalidCompression { .. }
            | Self::MigrationSyntax { .. }
            | Self::MigrationTarget { .. } => RepairKind::Schema,
        }
    }
}
