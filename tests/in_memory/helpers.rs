//! Shared test helpers for in-memory engine integration tests.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use async_trait::async_trait;
use mockable::DefaultClock;
use sqlagent::{
    advisor::{
        adapters::NoStatistics,
        domain::{CancellationSignal, StrategyPrompt},
        ports::{AdvisorResult, StatisticsSource, StrategyAdvisor},
    },
    config::EngineConfig,
    task::{
        adapters::memory::InMemoryTaskStore,
        domain::{OptimizationRequest, TaskId, TaskStatus},
        services::{EngineResult, OptimizationEngine},
    },
};

/// Engine wired to the in-memory store and the system clock.
pub type TestEngine<A, S = NoStatistics> =
    OptimizationEngine<InMemoryTaskStore, A, S, DefaultClock>;

/// Strategy answer that partitions orders by date and clusters by customer.
pub const ORDERS_STRATEGY: &str = r#"{
  "tables": [
    {"table_name": "hive.sales.orders", "partition_columns": ["order_date"],
     "cluster_columns": ["customer_id"], "compression": "SNAPPY",
     "rationale": "date range scans dominate"}
  ]
}"#;

/// Starts an engine around the given advisor and statistics source.
///
/// # Errors
///
/// Returns an error if the configuration is rejected.
pub fn start_engine<A, S>(
    advisor: A,
    statistics: S,
    config: EngineConfig,
) -> EngineResult<TestEngine<A, S>>
where
    A: StrategyAdvisor + 'static,
    S: StatisticsSource + 'static,
{
    OptimizationEngine::start(
        Arc::new(InMemoryTaskStore::new()),
        Arc::new(advisor),
        Arc::new(statistics),
        Arc::new(DefaultClock),
        config,
    )
}

/// Builds a two-table sales workload.
#[must_use]
pub fn sales_request() -> OptimizationRequest {
    OptimizationRequest::new("jdbc:trino://warehouse:8080/hive/sales?user=analyst")
        .with_ddl(
            "CREATE TABLE hive.sales.orders (order_id BIGINT, customer_id BIGINT, \
             order_date DATE, status VARCHAR, amount DECIMAL(12, 2))",
        )
        .with_ddl(
            "CREATE TABLE hive.sales.customers (customer_id BIGINT, region VARCHAR, \
             signup_date DATE)",
        )
        .with_query("daily", "SELECT * FROM hive.sales.orders", 120)
        .with_query(
            "by_region",
            "SELECT c.region, SUM(o.amount) FROM hive.sales.orders o \
             JOIN hive.sales.customers c ON o.customer_id = c.customer_id \
             GROUP BY c.region",
            30,
        )
        .with_query(
            "recent",
            "SELECT order_id, status FROM hive.sales.orders \
             WHERE order_date >= DATE '2024-06-01'",
            12,
        )
}

/// Polls until the task reaches a terminal status or the wait runs out.
///
/// # Errors
///
/// Returns an error if the task cannot be found.
pub async fn wait_for_terminal<A, S>(
    engine: &TestEngine<A, S>,
    task_id: TaskId,
    within: Duration,
) -> EngineResult<TaskStatus>
where
    A: StrategyAdvisor + 'static,
    S: StatisticsSource + 'static,
{
    let poll = Duration::from_millis(10);
    let mut waited = Duration::ZERO;
    loop {
        let status = engine.get_status(task_id).await?;
        if status.is_terminal() || waited >= within {
            return Ok(status);
        }
        tokio::time::sleep(poll).await;
        waited = waited.saturating_add(poll);
    }
}

/// Advisor that replays canned answers, repeating the last one.
#[derive(Debug, Default)]
pub struct ScriptedAdvisor {
    answers: Mutex<VecDeque<String>>,
    calls: AtomicU32,
}

impl ScriptedAdvisor {
    /// Creates an advisor that answers with `answers` in order.
    #[must_use]
    pub fn new<I, T>(answers: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<String>,
    {
        Self {
            answers: Mutex::new(answers.into_iter().map(Into::into).collect()),
            calls: AtomicU32::new(0),
        }
    }

    /// Returns how many times the advisor was asked.
    #[must_use]
    pub fn calls(&self) -> u32 {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl StrategyAdvisor for ScriptedAdvisor {
    async fn propose(
        &self,
        _prompt: &StrategyPrompt,
        _cancel: CancellationSignal,
    ) -> AdvisorResult<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let mut answers = self.answers.lock().unwrap_or_else(PoisonError::into_inner);
        let answer = if answers.len() > 1 {
            answers.pop_front()
        } else {
            answers.front().cloned()
        };
        Ok(answer.unwrap_or_default())
    }
}

/// Shared handle so a test can inspect an advisor owned by the engine.
#[derive(Debug, Clone)]
pub struct SharedAdvisor(pub Arc<ScriptedAdvisor>);

#[async_trait]
impl StrategyAdvisor for SharedAdvisor {
    async fn propose(
        &self,
        prompt: &StrategyPrompt,
        cancel: CancellationSignal,
    ) -> AdvisorResult<String> {
        self.0.propose(prompt, cancel).await
    }
}
