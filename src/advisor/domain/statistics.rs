//! Live table statistics.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Statistics keyed by lower-cased table name.
pub type StatisticsByTable = BTreeMap<String, TableStatistics>;

/// Optional size and cardinality figures for one table.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableStatistics {
    row_count: Option<u64>,
    size_bytes: Option<u64>,
    distinct_counts: BTreeMap<String, u64>,
}

impl TableStatistics {
    /// Creates empty statistics.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the row count.
    #[must_use]
    pub const fn with_row_count(mut self, rows: u64) -> Self {
        self.row_count = Some(rows);
        self
    }

    /// Sets the on-disk size.
    #[must_use]
    pub const fn with_size_bytes(mut self, bytes: u64) -> Self {
        self.size_bytes = Some(bytes);
        self
    }

    /// Records the number of distinct values of a column.
    #[must_use]
    pub fn with_distinct_count(mut self, column: &str, distinct: u64) -> Self {
        self.distinct_counts
            .insert(column.to_ascii_lowercase(), distinct);
        self
    }

    /// Returns the row count, when known.
    #[must_use]
    pub const fn row_count(&self) -> Option<u64> {
        self.row_count
    }

    /// Returns the on-disk size, when known.
    #[must_use]
    pub const fn size_bytes(&self) -> Option<u64> {
        self.size_bytes
    }

    /// Returns the distinct-value count of a column, when known.
    #[must_use]
    pub fn distinct_count(&self, column: &str) -> Option<u64> {
        self.distinct_counts
            .get(&column.to_ascii_lowercase())
            .copied()
    }
}
