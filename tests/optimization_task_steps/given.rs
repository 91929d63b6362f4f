//! Given steps for optimisation task BDD scenarios.

use std::time::Duration;

use super::world::{OptimizationWorld, ScenarioAdvisor};
use eyre::WrapErr;
use rstest_bdd_macros::given;
use sqlagent::{config::EngineConfig, task::domain::OptimizationRequest};

#[given("an engine with {workers:usize} workers and capacity {capacity:usize}")]
fn engine_with_capacity(
    world: &mut OptimizationWorld,
    workers: usize,
    capacity: usize,
) -> Result<(), eyre::Report> {
    let config = EngineConfig::compact()
        .with_max_workers(workers)
        .with_queue_capacity(capacity);
    world
        .start_engine(ScenarioAdvisor::Heuristic, config)
        .wrap_err("start engine")
}

#[given("an engine whose advisor never answers and a deadline of {millis:u64} ms")]
fn engine_with_silent_advisor(
    world: &mut OptimizationWorld,
    millis: u64,
) -> Result<(), eyre::Report> {
    let config = EngineConfig::compact().with_task_timeout(Duration::from_millis(millis));
    world
        .start_engine(ScenarioAdvisor::Silent, config)
        .wrap_err("start engine with silent advisor")
}

#[given("a busy engine with {workers:usize} worker and capacity {capacity:usize}")]
fn busy_engine(
    world: &mut OptimizationWorld,
    workers: usize,
    capacity: usize,
) -> Result<(), eyre::Report> {
    let config = EngineConfig::compact()
        .with_max_workers(workers)
        .with_queue_capacity(capacity);
    world
        .start_engine(ScenarioAdvisor::Silent, config)
        .wrap_err("start busy engine")
}

#[given("a sales workload")]
fn sales_workload(world: &mut OptimizationWorld) {
    world.pending_request = Some(
        OptimizationRequest::new("jdbc:trino://warehouse:8080/hive?user=analyst")
            .with_ddl(
                "CREATE TABLE hive.sales.orders (order_id BIGINT, customer_id BIGINT, \
                 order_date DATE, amount DOUBLE)",
            )
            .with_ddl("CREATE TABLE hive.sales.customers (customer_id BIGINT, region VARCHAR)")
            .with_query("all_orders", "SELECT * FROM hive.sales.orders", 50)
            .with_query(
                "revenue",
                "SELECT c.region, SUM(o.amount) FROM hive.sales.orders o \
                 JOIN hive.sales.customers c ON o.customer_id = c.customer_id \
                 GROUP BY c.region",
                10,
            )
            .with_query("regions", "SELECT DISTINCT region FROM hive.sales.customers", 2),
    );
}
