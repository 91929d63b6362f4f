//! Live statistics port.

use crate::advisor::domain::TableStatistics;
use crate::rewrite::domain::TableName;
use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;

/// Result type for statistics lookups.
pub type StatisticsResult<T> = Result<T, StatisticsError>;

/// Optional source of table size and cardinality figures.
#[async_trait]
pub trait StatisticsSource: Send + Sync {
    /// Looks up statistics for one table.
    ///
    /// Returns `None` when the source knows nothing about the table.
    ///
    /// # Errors
    ///
    /// Returns [`StatisticsError`] when the source fails; callers treat
    /// that the same as `None`.
    async fn table_statistics(&self, table: &TableName) -> StatisticsResult<Option<TableStatistics>>;
}

/// Errors returned by statistics sources.
#[derive(Debug, Clone, Error)]
pub enum StatisticsError {
    /// The source could not be reached.
    #[error("statistics source unreachable: {0}")]
    Unavailable(Arc<dyn std::error::Error + Send + Sync>),

    /// The statistics query failed.
    #[error("statistics query failed: {0}")]
    Query(String),
}

impl StatisticsError {
    /// Wraps a transport error.
    pub fn unavailable(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Unavailable(Arc::new(err))
    }
}
