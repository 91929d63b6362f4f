//! Result polling, retention and shutdown through the in-memory engine.

use std::time::Duration;

use super::helpers::{sales_request, start_engine, wait_for_terminal};
use rstest::rstest;
use sqlagent::{
    advisor::adapters::{HeuristicAdvisor, NoStatistics},
    config::EngineConfig,
    task::{
        domain::TaskStatus,
        services::{EngineError, TaskOutcome},
    },
};

const WAIT: Duration = Duration::from_secs(10);

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn finished_task_records_its_lifecycle() -> Result<(), eyre::Report> {
    let engine = start_engine(HeuristicAdvisor::new(), NoStatistics, EngineConfig::compact())?;

    let task_id = engine.submit(sales_request()).await?;
    wait_for_terminal(&engine, task_id, WAIT).await?;
    let task = engine.get_task(task_id).await?;

    assert_eq!(task.id(), task_id);
    assert_eq!(task.status(), TaskStatus::Done);
    assert_eq!(task.request().query_ids(), vec!["daily", "by_region", "recent"]);
    let started = task
        .started_at()
        .ok_or_else(|| eyre::eyre!("started_at missing"))?;
    let completed = task
        .completed_at()
        .ok_or_else(|| eyre::eyre!("completed_at missing"))?;
    assert!(task.submitted_at() <= started);
    assert!(started <= completed);
    assert!(task.failure().is_none());
    engine.shutdown().await;
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn results_stay_queryable_within_the_retention_window() -> Result<(), eyre::Report> {
    let engine = start_engine(HeuristicAdvisor::new(), NoStatistics, EngineConfig::compact())?;

    let task_id = engine.submit(sales_request()).await?;
    wait_for_terminal(&engine, task_id, WAIT).await?;

    assert_eq!(engine.evict_expired().await?, 0);
    assert!(matches!(
        engine.get_result(task_id).await?,
        TaskOutcome::Done(_)
    ));
    engine.shutdown().await;
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn background_sweep_evicts_expired_results() -> Result<(), eyre::Report> {
    let engine = start_engine(
        HeuristicAdvisor::new(),
        NoStatistics,
        EngineConfig::compact().with_retention(Duration::ZERO),
    )?;

    let task_id = engine.submit(sales_request()).await?;
    wait_for_terminal(&engine, task_id, WAIT).await?;

    let mut evicted = false;
    for _ in 0..50 {
        if matches!(
            engine.get_status(task_id).await,
            Err(EngineError::NotFound(_))
        ) {
            evicted = true;
            break;
        }
        tokio::time::sleep(Duration::from_millis(100)).await;
    }
    assert!(evicted, "task should be evicted by the background sweep");
    engine.shutdown().await;
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn results_survive_shutdown() -> Result<(), eyre::Report> {
    let engine = start_engine(HeuristicAdvisor::new(), NoStatistics, EngineConfig::compact())?;
    let task_id = engine.submit(sales_request()).await?;
    wait_for_terminal(&engine, task_id, WAIT).await?;

    engine.shutdown().await;

    assert!(matches!(
        engine.get_result(task_id).await?,
        TaskOutcome::Done(_)
    ));
    assert!(matches!(
        engine.submit(sales_request()).await,
        Err(EngineError::ShuttingDown)
    ));
    Ok(())
}
