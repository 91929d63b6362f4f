//! Statistics sources that need no database.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use crate::advisor::{
    domain::TableStatistics,
    ports::{StatisticsError, StatisticsResult, StatisticsSource},
};
use crate::rewrite::domain::TableName;

/// Source that never has statistics.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoStatistics;

#[async_trait]
impl StatisticsSource for NoStatistics {
    async fn table_statistics(&self, _table: &TableName) -> StatisticsResult<Option<TableStatistics>> {
        Ok(None)
    }
}

/// Thread-safe source backed by a map keyed on lower-cased table name.
#[derive(Debug, Clone, Default)]
pub struct InMemoryStatisticsSource {
    tables: Arc<RwLock<HashMap<String, TableStatistics>>>,
}

impl InMemoryStatisticsSource {
    /// Creates an empty source.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers statistics for a table, replacing earlier figures.
    ///
    /// # Errors
    ///
    /// Returns [`StatisticsError::Unavailable`] when the lock is poisoned.
    pub fn insert(&self, table: &str, statistics: TableStatistics) -> StatisticsResult<()> {
        let mut tables = self
            .tables
            .write()
            .map_err(|err| StatisticsError::unavailable(std::io::Error::other(err.to_string())))?;
        tables.insert(table.to_ascii_lowercase(), statistics);
        Ok(())
    }
}

#[async_trait]
impl StatisticsSource for InMemoryStatisticsSource {
    async fn table_statistics(&self, table: &TableName) -> StatisticsResult<Option<TableStatistics>> {
        let tables = self
            .tables
            .read()
            .map_err(|err| StatisticsError::unavailable(std::io::Error::other(err.to_string())))?;
        Ok(tables.get(&table.lookup_key()).cloned())
    }
}
