//! Location of the optimised schema that rewritten statements point at.

use super::TableName;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Prefix shared by every generated optimised schema name.
pub const OPTIMIZED_SCHEMA_PREFIX: &str = "optimized";

/// Catalog and schema receiving the optimised tables.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TargetLocation {
    catalog: String,
    schema: String,
}

impl TargetLocation {
    /// Creates a target location.
    #[must_use]
    pub fn new(catalog: impl Into<String>, schema: impl Into<String>) -> Self {
        Self {
            catalog: catalog.into(),
            schema: schema.into(),
        }
    }

    /// Returns the target catalog.
    #[must_use]
    pub fn catalog(&self) -> &str {
        &self.catalog
    }

    /// Returns the target schema.
    #[must_use]
    pub fn schema(&self) -> &str {
        &self.schema
    }

    /// Returns `catalog.schema.table` for a bare table name.
    #[must_use]
    pub fn qualify(&self, table: &str) -> TableName {
        TableName::qualified(self.catalog.as_str(), self.schema.as_str(), table)
    }

    /// Returns `true` when a schema name follows the optimised naming
    /// convention (case-insensitive prefix match).
    #[must_use]
    pub fn is_optimized_schema(schema: &str) -> bool {
        schema
            .get(..OPTIMIZED_SCHEMA_PREFIX.len())
            .is_some_and(|prefix| prefix.eq_ignore_ascii_case(OPTIMIZED_SCHEMA_PREFIX))
    }
}

impl fmt::Display for TargetLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.catalog, self.schema)
    }
}
