//! Best-effort statistics gathering.

use std::sync::Arc;
use std::time::Duration;

use crate::advisor::{domain::StatisticsByTable, ports::StatisticsSource};
use crate::rewrite::domain::TableCatalog;
use tracing::{debug, warn};

/// Gathers statistics for every catalog table, tolerating failures.
#[derive(Clone)]
pub struct StatisticsCollector<S>
where
    S: StatisticsSource,
{
    source: Arc<S>,
    timeout: Duration,
}

impl<S> StatisticsCollector<S>
where
    S: StatisticsSource,
{
    /// Creates a collector with a per-table deadline.
    #[must_use]
    pub const fn new(source: Arc<S>, timeout: Duration) -> Self {
        Self { source, timeout }
    }

    /// Looks up statistics for each table in turn.
    ///
    /// Failures and timeouts are logged and the table is left out.
    pub async fn collect(&self, catalog: &TableCatalog) -> StatisticsByTable {
        let mut gathered = StatisticsByTable::new();
        for table in catalog.iter() {
            let name = table.name();
            match tokio::time::timeout(self.timeout, self.source.table_statistics(name)).await {
                Ok(Ok(Some(statistics))) => {
                    gathered.insert(name.lookup_key(), statistics);
                }
                Ok(Ok(None)) => debug!(table = %name, "no statistics available"),
                Ok(Err(err)) => {
                    warn!(table = %name, error = %err, "statistics lookup failed; continuing without");
                }
                Err(_) => warn!(
                    table = %name,
                    timeout = ?self.timeout,
                    "statistics lookup timed out; continuing without"
                ),
            }
        }
        gathered
    }
}
