//! Error types for rewrite domain values and parse tiers.

use thiserror::Error;

/// Errors returned while constructing rewrite domain values.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum RewriteDomainError {
    /// The table name has no parts or an empty part.
    #[error("table name must not be empty")]
    EmptyTableName,

    /// The table name has more parts than `catalog.schema.table`.
    #[error("table name '{0}' has more than three parts")]
    TooManyNameParts(String),
}

/// Reason a parse tier could not handle a statement.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TierFailure {
    /// The SQL parser rejected the text.
    #[error("parser rejected statement: {0}")]
    Parser(String),

    /// The text did not contain exactly one statement.
    #[error("expected exactly one statement, found {0}")]
    StatementCount(usize),

    /// The statement is not a `CREATE TABLE` with a column list.
    #[error("statement is not a CREATE TABLE with columns")]
    NotCreateTable,

    /// No table name could be recognised.
    #[error("table name not recognised")]
    MissingTableName,

    /// The column list is missing or unbalanced.
    #[error("column list missing or unbalanced")]
    MissingColumnList,
}
