//! Then steps for optimisation task BDD scenarios.

use super::world::{OptimizationWorld, run_async, wait_for_terminal};
use rstest_bdd_macros::then;
use sqlagent::task::services::{EngineError, TaskOutcome};

#[then(r#"the task finishes with status "{expected}""#)]
fn task_finishes_with_status(
    world: &OptimizationWorld,
    expected: String,
) -> Result<(), eyre::Report> {
    let engine = world.engine()?;
    let task_id = world.first_task()?;
    let status = run_async(wait_for_terminal(engine, task_id))?;

    if status.as_str() != expected {
        return Err(eyre::eyre!("expected status {expected}, found {status}"));
    }
    Ok(())
}

fn outcome(world: &OptimizationWorld) -> Result<TaskOutcome, eyre::Report> {
    let engine = world.engine()?;
    let task_id = world.first_task()?;
    Ok(run_async(engine.get_result(task_id))?)
}

#[then("the artefact starts with a schema statement")]
fn artefact_starts_with_schema(world: &OptimizationWorld) -> Result<(), eyre::Report> {
    let TaskOutcome::Done(result) = outcome(world)? else {
        return Err(eyre::eyre!("expected a finished artefact"));
    };
    let first = result
        .ddl
        .first()
        .ok_or_else(|| eyre::eyre!("artefact has no ddl"))?;
    if !first
        .statement
        .starts_with("CREATE SCHEMA IF NOT EXISTS hive.optimized_")
    {
        return Err(eyre::eyre!("unexpected first statement: {}", first.statement));
    }
    Ok(())
}

#[then("the artefact rewrites every query in request order")]
fn artefact_keeps_query_order(world: &OptimizationWorld) -> Result<(), eyre::Report> {
    let TaskOutcome::Done(result) = outcome(world)? else {
        return Err(eyre::eyre!("expected a finished artefact"));
    };
    let ids: Vec<&str> = result
        .queries
        .iter()
        .map(|query| query.queryid.as_str())
        .collect();
    if ids != ["all_orders", "revenue", "regions"] {
        return Err(eyre::eyre!("unexpected query order: {ids:?}"));
    }
    if let Some(stale) = result
        .queries
        .iter()
        .find(|query| query.query.contains("hive.sales."))
    {
        return Err(eyre::eyre!("query {} still reads the source schema", stale.queryid));
    }
    Ok(())
}

#[then(r#"the failure category is "{expected}""#)]
fn failure_category_is(world: &OptimizationWorld, expected: String) -> Result<(), eyre::Report> {
    let TaskOutcome::Failed(failure) = outcome(world)? else {
        return Err(eyre::eyre!("expected a failed task"));
    };
    if failure.category.as_str() != expected {
        return Err(eyre::eyre!(
            "expected category {expected}, found {}",
            failure.category
        ));
    }
    Ok(())
}

#[then("{admitted:usize} submissions are admitted")]
fn submissions_admitted(world: &OptimizationWorld, admitted: usize) -> Result<(), eyre::Report> {
    let found = world
        .submissions
        .iter()
        .filter(|submission| submission.is_ok())
        .count();
    if found != admitted {
        return Err(eyre::eyre!("expected {admitted} admitted, found {found}"));
    }
    Ok(())
}

#[then("the last submission is rejected for capacity")]
fn last_submission_rejected(world: &OptimizationWorld) -> Result<(), eyre::Report> {
    let last = world
        .submissions
        .last()
        .ok_or_else(|| eyre::eyre!("no submissions in scenario world"))?;
    if !matches!(last, Err(EngineError::CapacityExceeded { .. })) {
        return Err(eyre::eyre!("expected a capacity rejection, got {last:?}"));
    }
    Ok(())
}

#[then("the engine reports {rejected:u64} rejected submission")]
fn engine_reports_rejections(world: &OptimizationWorld, rejected: u64) -> Result<(), eyre::Report> {
    let metrics = run_async(world.engine()?.get_metrics())?;
    if metrics.rejected != rejected {
        return Err(eyre::eyre!(
            "expected {rejected} rejections, found {}",
            metrics.rejected
        ));
    }
    Ok(())
}
