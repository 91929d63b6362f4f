//! Shared fixtures for task tests.

use std::time::Duration;

use crate::advisor::domain::{CancellationSignal, StrategyPrompt, TableStatistics};
use crate::advisor::ports::{AdvisorResult, StatisticsResult, StatisticsSource, StrategyAdvisor};
use crate::rewrite::domain::TableName;
use crate::task::domain::OptimizationRequest;
use async_trait::async_trait;

pub(super) fn request() -> OptimizationRequest {
    OptimizationRequest::new("jdbc:trino://host:8080/hive?user=etl")
        .with_ddl(
            "CREATE TABLE hive.sales.orders (order_id BIGINT, customer_id BIGINT, \
             order_date DATE, status VARCHAR)",
        )
        .with_ddl(
            "CREATE TABLE hive.sales.customers (customer_id BIGINT, region VARCHAR, \
             created_at TIMESTAMP)",
        )
        .with_query("q1", "SELECT * FROM hive.sales.orders", 40)
        .with_query(
            "q2",
            "SELECT COUNT(*) FROM hive.sales.orders WHERE order_date >= '2024-01-01'",
            7,
        )
        .with_query(
            "q3",
            "SELECT o.order_id, c.region FROM hive.sales.orders o \
             JOIN hive.sales.customers c ON o.customer_id = c.customer_id",
            3,
        )
}

/// Advisor that answers only after a delay.
pub(super) struct SlowAdvisor {
    pub(super) delay: Duration,
}

#[async_trait]
impl StrategyAdvisor for SlowAdvisor {
    async fn propose(
        &self,
        _prompt: &StrategyPrompt,
        _cancel: CancellationSignal,
    ) -> AdvisorResult<String> {
        tokio::time::sleep(self.delay).await;
        Ok(r#"{"tables": []}"#.to_owned())
    }
}

/// Advisor whose call panics.
pub(super) struct PanickingAdvisor;

#[async_trait]
impl StrategyAdvisor for PanickingAdvisor {
    async fn propose(
        &self,
        _prompt: &StrategyPrompt,
        _cancel: CancellationSignal,
    ) -> AdvisorResult<String> {
        std::panic::panic_any("advisor exploded")
    }
}

/// Statistics source whose lookup panics inside the pipeline task.
pub(super) struct PanickingStatistics;

#[async_trait]
impl StatisticsSource for PanickingStatistics {
    async fn table_statistics(&self, _table: &TableName) -> StatisticsResult<Option<TableStatistics>> {
        std::panic::panic_any("statistics exploded")
    }
}
