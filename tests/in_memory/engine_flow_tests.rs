//! End-to-end task flow through the in-memory engine.

use std::sync::Arc;
use std::time::Duration;

use super::helpers::{
    ORDERS_STRATEGY, ScriptedAdvisor, SharedAdvisor, TestEngine, sales_request, start_engine,
    wait_for_terminal,
};
use rstest::rstest;
use sqlagent::{
    advisor::{
        adapters::{HeuristicAdvisor, InMemoryStatisticsSource, NoStatistics},
        domain::TableStatistics,
    },
    artifact::domain::OptimizationResult,
    config::EngineConfig,
    health::domain::{ErrorCategory, HealthTier},
    task::{
        domain::{TaskId, TaskStatus},
        services::TaskOutcome,
    },
};

const WAIT: Duration = Duration::from_secs(10);

async fn finished_result<A, S>(
    engine: &TestEngine<A, S>,
    task_id: TaskId,
) -> Result<OptimizationResult, eyre::Report>
where
    A: sqlagent::advisor::ports::StrategyAdvisor + 'static,
    S: sqlagent::advisor::ports::StatisticsSource + 'static,
{
    let status = wait_for_terminal(engine, task_id, WAIT).await?;
    eyre::ensure!(status == TaskStatus::Done, "expected done, found {status}");
    match engine.get_result(task_id).await? {
        TaskOutcome::Done(result) => Ok(result),
        TaskOutcome::Failed(failure) => Err(eyre::eyre!("task failed: {failure}")),
    }
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn heuristic_run_produces_a_complete_artefact() -> Result<(), eyre::Report> {
    let statistics = InMemoryStatisticsSource::new();
    statistics.insert(
        "orders",
        TableStatistics::new()
            .with_row_count(50_000_000)
            .with_distinct_count("order_date", 900),
    )?;
    let engine = start_engine(HeuristicAdvisor::new(), statistics, EngineConfig::compact())?;

    let task_id = engine.submit(sales_request()).await?;
    let result = finished_result(&engine, task_id).await?;

    let schema = result
        .ddl
        .first()
        .map(|first| first.statement.clone())
        .unwrap_or_default();
    assert!(
        schema.starts_with("CREATE SCHEMA IF NOT EXISTS hive.optimized_"),
        "{schema}"
    );
    assert_eq!(result.ddl.len(), 3);
    assert_eq!(result.migrations.len(), 2);
    let ids: Vec<&str> = result.queries.iter().map(|q| q.queryid.as_str()).collect();
    assert_eq!(ids, vec!["daily", "by_region", "recent"]);
    for query in &result.queries {
        assert!(query.query.contains("hive.optimized_"), "{}", query.query);
        assert!(!query.query.contains("hive.sales."), "{}", query.query);
    }
    engine.shutdown().await;
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn artefact_serialises_with_the_wire_field_names() -> Result<(), eyre::Report> {
    let engine = start_engine(HeuristicAdvisor::new(), NoStatistics, EngineConfig::compact())?;

    let task_id = engine.submit(sales_request()).await?;
    let result = finished_result(&engine, task_id).await?;
    let document = serde_json::to_value(&result)?;

    assert!(document["ddl"][0]["statement"].is_string());
    assert!(document["migrations"][0]["statement"].is_string());
    assert_eq!(document["queries"][1]["queryid"], "by_region");
    assert!(document["queries"][0]["query"].is_string());
    engine.shutdown().await;
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn repaired_advice_shapes_the_target_layout() -> Result<(), eyre::Report> {
    let advisor = Arc::new(ScriptedAdvisor::new([
        "Here is my plan: partition orders by day.",
        ORDERS_STRATEGY,
    ]));
    let engine = start_engine(
        SharedAdvisor(Arc::clone(&advisor)),
        NoStatistics,
        EngineConfig::compact(),
    )?;

    let task_id = engine.submit(sales_request()).await?;
    let result = finished_result(&engine, task_id).await?;

    assert_eq!(advisor.calls(), 2);
    let orders = result
        .ddl
        .iter()
        .find(|item| item.statement.contains(".orders ("))
        .ok_or_else(|| eyre::eyre!("orders table missing from artefact"))?;
    assert!(
        orders.statement.contains("partitioning = ARRAY['order_date']"),
        "{}",
        orders.statement
    );
    assert!(
        orders.statement.contains("compression_codec = 'SNAPPY'"),
        "{}",
        orders.statement
    );
    engine.shutdown().await;
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn identical_requests_share_a_schema_fingerprint() -> Result<(), eyre::Report> {
    let engine = start_engine(HeuristicAdvisor::new(), NoStatistics, EngineConfig::compact())?;

    let first = engine.submit(sales_request()).await?;
    let second = engine.submit(sales_request()).await?;
    let first_result = finished_result(&engine, first).await?;
    let second_result = finished_result(&engine, second).await?;

    let fingerprint = |result: &OptimizationResult| {
        result
            .ddl
            .first()
            .and_then(|schema| schema.statement.rsplit('_').next().map(str::to_owned))
    };
    assert_ne!(first, second);
    assert!(fingerprint(&first_result).is_some());
    assert_eq!(fingerprint(&first_result), fingerprint(&second_result));
    engine.shutdown().await;
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn concurrent_submissions_all_complete() -> Result<(), eyre::Report> {
    let engine = start_engine(HeuristicAdvisor::new(), NoStatistics, EngineConfig::compact())?;

    let mut task_ids = Vec::new();
    for _ in 0..6 {
        task_ids.push(engine.submit(sales_request()).await?);
    }
    for task_id in &task_ids {
        finished_result(&engine, *task_id).await?;
    }

    let metrics = engine.get_metrics().await?;
    assert_eq!(metrics.submitted, 6);
    assert_eq!(metrics.completed, 6);
    assert_eq!(metrics.failed, 0);
    assert_eq!(metrics.queued + metrics.running, 0);
    assert_eq!(metrics.health, HealthTier::Healthy);
    engine.shutdown().await;
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn unusable_advice_fails_as_an_upstream_call() -> Result<(), eyre::Report> {
    let engine = start_engine(
        ScriptedAdvisor::new(["I cannot help with that."]),
        NoStatistics,
        EngineConfig::compact().with_advisor_max_attempts(2),
    )?;

    let task_id = engine.submit(sales_request()).await?;
    let status = wait_for_terminal(&engine, task_id, WAIT).await?;

    assert_eq!(status, TaskStatus::Failed);
    let outcome = engine.get_result(task_id).await?;
    assert!(
        matches!(
            &outcome,
            TaskOutcome::Failed(failure) if failure.category == ErrorCategory::UpstreamCallFailure
        ),
        "{outcome:?}"
    );
    let metrics = engine.get_metrics().await?;
    assert_eq!(metrics.failures(ErrorCategory::UpstreamCallFailure), 1);
    assert_ne!(metrics.health, HealthTier::Healthy);
    engine.shutdown().await;
    Ok(())
}
