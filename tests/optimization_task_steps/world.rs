//! Shared world state for optimisation task BDD scenarios.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use mockable::DefaultClock;
use rstest::fixture;
use sqlagent::{
    advisor::{
        adapters::{HeuristicAdvisor, NoStatistics},
        domain::{CancellationSignal, StrategyPrompt},
        ports::{AdvisorResult, StrategyAdvisor},
    },
    config::EngineConfig,
    task::{
        adapters::memory::InMemoryTaskStore,
        domain::{OptimizationRequest, TaskId, TaskStatus},
        services::{EngineError, EngineResult, OptimizationEngine},
    },
};

/// Advisor behaviour selected by a scenario.
#[derive(Debug, Default)]
pub enum ScenarioAdvisor {
    /// Answers from the built-in heuristics.
    #[default]
    Heuristic,
    /// Never answers in time.
    Silent,
}

#[async_trait]
impl StrategyAdvisor for ScenarioAdvisor {
    async fn propose(
        &self,
        prompt: &StrategyPrompt,
        cancel: CancellationSignal,
    ) -> AdvisorResult<String> {
        match self {
            Self::Heuristic => HeuristicAdvisor::new().propose(prompt, cancel).await,
            Self::Silent => {
                tokio::time::sleep(Duration::from_secs(60)).await;
                Ok(String::new())
            }
        }
    }
}

/// Engine type used by the BDD world.
pub type ScenarioEngine =
    OptimizationEngine<InMemoryTaskStore, ScenarioAdvisor, NoStatistics, DefaultClock>;

/// Scenario world for optimisation task behaviour tests.
#[derive(Default)]
pub struct OptimizationWorld {
    pub engine: Option<ScenarioEngine>,
    pub pending_request: Option<OptimizationRequest>,
    pub submissions: Vec<Result<TaskId, EngineError>>,
}

impl OptimizationWorld {
    /// Starts the scenario engine.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is rejected.
    pub fn start_engine(
        &mut self,
        advisor: ScenarioAdvisor,
        config: EngineConfig,
    ) -> EngineResult<()> {
        self.engine = Some(OptimizationEngine::start(
            Arc::new(InMemoryTaskStore::new()),
            Arc::new(advisor),
            Arc::new(NoStatistics),
            Arc::new(DefaultClock),
            config,
        )?);
        Ok(())
    }

    /// Returns the running engine.
    ///
    /// # Errors
    ///
    /// Returns an error if no engine was started.
    pub fn engine(&self) -> Result<&ScenarioEngine, eyre::Report> {
        self.engine
            .as_ref()
            .ok_or_else(|| eyre::eyre!("missing engine in scenario world"))
    }

    /// Returns the id of the first admitted submission.
    ///
    /// # Errors
    ///
    /// Returns an error if nothing was admitted.
    pub fn first_task(&self) -> Result<TaskId, eyre::Report> {
        self.submissions
            .iter()
            .find_map(|submission| submission.as_ref().ok().copied())
            .ok_or_else(|| eyre::eyre!("no admitted submission in scenario world"))
    }
}

/// Fixture that creates a new scenario world.
#[fixture]
pub fn world() -> OptimizationWorld {
    OptimizationWorld::default()
}

/// Polls a task until it reaches a terminal status or five seconds pass.
///
/// # Errors
///
/// Returns an error if the task cannot be found.
pub async fn wait_for_terminal(engine: &ScenarioEngine, task_id: TaskId) -> EngineResult<TaskStatus> {
    for _ in 0..500 {
        let status = engine.get_status(task_id).await?;
        if status.is_terminal() {
            return Ok(status);
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    engine.get_status(task_id).await
}

/// Runs an async operation within sync step definitions.
pub fn run_async<T>(future: impl std::future::Future<Output = T>) -> T {
    tokio::task::block_in_place(|| tokio::runtime::Handle::current().block_on(future))
}
