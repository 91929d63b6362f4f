//! When steps for optimisation task BDD scenarios.

use super::world::{OptimizationWorld, run_async};
use rstest_bdd_macros::when;

#[when("the workload is submitted")]
fn submit_workload(world: &mut OptimizationWorld) -> Result<(), eyre::Report> {
    submit_times(world, 1)
}

#[when("the workload is submitted {times:usize} times")]
fn submit_workload_repeatedly(
    world: &mut OptimizationWorld,
    times: usize,
) -> Result<(), eyre::Report> {
    submit_times(world, times)
}

fn submit_times(world: &mut OptimizationWorld, times: usize) -> Result<(), eyre::Report> {
    let request = world
        .pending_request
        .clone()
        .ok_or_else(|| eyre::eyre!("missing pending request in scenario world"))?;
    let mut submissions = Vec::with_capacity(times);
    {
        let engine = world.engine()?;
        for _ in 0..times {
            submissions.push(run_async(engine.submit(request.clone())));
        }
    }
    world.submissions.extend(submissions);
    Ok(())
}
