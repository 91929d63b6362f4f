//! Tests for tiered table metadata extraction.

use crate::rewrite::domain::{RewriteTier, TierFailure};
use crate::rewrite::services::{
    build_catalog, describe_tables, pattern_table_metadata, structural_table_metadata,
};
use rstest::rstest;

const NESTED_TYPES_DDL: &str = "CREATE TABLE hive.sales.events (
    event_id BIGINT NOT NULL,
    attributes MAP(VARCHAR, INT),
    amount DECIMAL(10, 2) DEFAULT 0,
    tags ARRAY<VARCHAR>,
    created_at TIMESTAMP,
    PRIMARY KEY (event_id)
)";

const TRINO_ONLY_DDL: &str = "CREATE TABLE IF NOT EXISTS \"hive\".\"sales\".\"sessions\" (
    session_id VARCHAR COMMENT 'opaque id',
    pages ARRAY(ROW(url VARCHAR, seen_at TIMESTAMP)),
    started_at DATE,
    CONSTRAINT pk_sessions PRIMARY KEY (session_id)
) WITH (format = 'ORC', partitioning = ARRAY['started_at'], sorted_by = ARRAY['session_id'])";

#[rstest]
fn structural_tier_reads_columns_and_layout() {
    let tables = describe_tables(
        "CREATE TABLE hive.sales.orders (order_id BIGINT, order_date DATE) \
         WITH (partitioning = ARRAY['order_date'], clustering = ARRAY['order_id'])",
    )
    .expect("table described");

    let [orders] = tables.as_slice() else {
        panic!("expected one table, got {}", tables.len());
    };
    assert_eq!(orders.tier(), RewriteTier::Structural);
    assert_eq!(orders.name().to_string(), "hive.sales.orders");
    assert_eq!(
        orders.column_names().collect::<Vec<_>>(),
        vec!["order_id", "order_date"]
    );
    assert!(orders.partition_columns().contains("order_date"));
    assert!(orders.cluster_columns().contains("order_id"));
}

#[rstest]
fn both_tiers_agree_on_nested_types() {
    let structural = structural_table_metadata(NESTED_TYPES_DDL).expect("structural parse");
    let pattern = pattern_table_metadata(NESTED_TYPES_DDL).expect("pattern parse");

    let [structural_table] = structural.as_slice() else {
        panic!("expected one structural table");
    };
    let [pattern_table] = pattern.as_slice() else {
        panic!("expected one pattern table");
    };
    assert_eq!(structural_table.columns(), pattern_table.columns());
    assert_eq!(structural_table.name(), pattern_table.name());
    let types: Vec<&str> = pattern_table
        .columns()
        .iter()
        .map(|column| column.data_type())
        .collect();
    assert_eq!(
        types,
        vec![
            "BIGINT",
            "MAP(VARCHAR,INT)",
            "DECIMAL(10,2)",
            "ARRAY<VARCHAR>",
            "TIMESTAMP"
        ]
    );
}

#[rstest]
fn unparseable_ddl_falls_back_to_pattern_tier() {
    let tables = describe_tables(TRINO_ONLY_DDL).expect("pattern tier handles statement");

    let [sessions] = tables.as_slice() else {
        panic!("expected one table");
    };
    assert_eq!(sessions.tier(), RewriteTier::Pattern);
    assert_eq!(sessions.name().to_string(), "hive.sales.sessions");
    assert_eq!(
        sessions.column_names().collect::<Vec<_>>(),
        vec!["session_id", "pages", "started_at"]
    );
    let pages = sessions.columns().get(1).expect("pages column");
    assert_eq!(pages.data_type(), "ARRAY(ROW(URL VARCHAR,SEEN_AT TIMESTAMP))");
    assert!(sessions.partition_columns().contains("started_at"));
    assert!(sessions.cluster_columns().contains("session_id"));
}

#[rstest]
fn comparison_inside_check_does_not_unbalance_column_scan() {
    let tables = pattern_table_metadata(
        "CREATE TABLE t (qty INT CHECK (qty > 0), price DECIMAL(8, 2), note VARCHAR(20))",
    )
    .expect("pattern parse");

    let [table] = tables.as_slice() else {
        panic!("expected one table");
    };
    assert_eq!(
        table.column_names().collect::<Vec<_>>(),
        vec!["qty", "price", "note"]
    );
}

#[rstest]
fn statement_without_table_is_not_retried_by_pattern_tier() {
    let result = describe_tables("CREATE VIEW v AS SELECT 1");

    assert_eq!(result, Err(TierFailure::NotCreateTable));
}

#[rstest]
fn catalog_build_skips_statements_no_tier_understands() {
    let report = build_catalog([
        "CREATE TABLE hive.sales.orders (order_id BIGINT, customer_id BIGINT)",
        "this is not sql at all",
        TRINO_ONLY_DDL,
    ]);

    assert_eq!(report.catalog().len(), 2);
    assert!(report.catalog().get("orders").is_some());
    assert!(report.catalog().get("SESSIONS").is_some());
    assert_eq!(report.degraded(), &[2]);
    let skipped: Vec<usize> = report.skipped().iter().map(|entry| entry.index).collect();
    assert_eq!(skipped, vec![1]);
}
