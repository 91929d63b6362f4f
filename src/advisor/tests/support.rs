//! Shared fixtures for advisor tests.

use std::sync::Arc;

use crate::advisor::domain::{StatisticsByTable, StrategyContext};
use crate::advisor::services::summarise_tables;
use crate::rewrite::domain::{TableCatalog, TargetLocation};
use crate::rewrite::services::build_catalog;

pub(super) fn catalog() -> TableCatalog {
    build_catalog([
        "CREATE TABLE hive.sales.orders (order_id BIGINT, customer_id BIGINT, \
         order_date DATE, status VARCHAR, amount DECIMAL(10, 2))",
        "CREATE TABLE hive.sales.customers (customer_id BIGINT, region VARCHAR, \
         created_at TIMESTAMP)",
    ])
    .into_catalog()
}

pub(super) fn target() -> TargetLocation {
    TargetLocation::new("hive", "optimized_test")
}

pub(super) fn context_with(statistics: &StatisticsByTable) -> Arc<StrategyContext> {
    Arc::new(StrategyContext {
        target: target().to_string(),
        tables: summarise_tables(&catalog(), statistics),
        queries: Vec::new(),
    })
}

pub(super) fn context() -> Arc<StrategyContext> {
    context_with(&StatisticsByTable::new())
}

pub(super) const VALID_ANSWER: &str = r#"{
  "tables": [
    {"table_name": "hive.sales.orders", "partition_columns": ["order_date"],
     "cluster_columns": ["customer_id"], "compression": "ZSTD"}
  ]
}"#;
