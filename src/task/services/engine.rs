//! Bounded task engine: admission, worker pool and retention.

use std::sync::Arc;

use super::{OptimizationPipeline, PipelineError};
use crate::advisor::{
    domain::CancellationHandle,
    ports::{StatisticsSource, StrategyAdvisor},
};
use crate::artifact::domain::OptimizationResult;
use crate::config::{ConfigError, EngineConfig};
use crate::health::{
    domain::{ErrorCategory, MetricsSnapshot},
    services::ErrorMetrics,
};
use crate::task::{
    domain::{
        OptimizationRequest, Task, TaskCounts, TaskDomainError, TaskFailure, TaskId, TaskStatus,
    },
    ports::{TaskStore, TaskStoreError},
};
use chrono::TimeDelta;
use mockable::Clock;
use thiserror::Error;
use tokio::sync::{Mutex, mpsc, watch};
use tokio::task::{JoinError, JoinHandle};
use tokio::time::MissedTickBehavior;
use tracing::{debug, error, info, warn};

/// Errors returned by the engine API.
#[derive(Debug, Clone, Error)]
pub enum EngineError {
    /// Queued plus running tasks already fill the admission capacity.
    #[error("capacity of {capacity} in-flight tasks exceeded")]
    CapacityExceeded {
        /// Configured admission capacity.
        capacity: usize,
    },

    /// No task has the given id, or it was evicted.
    #[error("task not found: {0}")]
    NotFound(TaskId),

    /// The task has not finished yet.
    #[error("task {task_id} is still {status}")]
    NotReady {
        /// Task queried.
        task_id: TaskId,
        /// Current status.
        status: TaskStatus,
    },

    /// The engine no longer accepts work.
    #[error("engine is shutting down")]
    ShuttingDown,

    /// The configuration is unusable.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// A task state change was rejected.
    #[error(transparent)]
    Domain(#[from] TaskDomainError),

    /// The task store failed.
    #[error(transparent)]
    Store(#[from] TaskStoreError),
}

/// Result type for engine operations.
pub type EngineResult<T> = Result<T, EngineError>;

/// Final outcome of a finished task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TaskOutcome {
    /// The task produced an artefact.
    Done(OptimizationResult),
    /// The task failed with a classified reason.
    Failed(TaskFailure),
}

struct EngineShared<T, A, S, C>
where
    T: TaskStore,
    A: StrategyAdvisor + 'static,
    S: StatisticsSource,
    C: Clock + Send + Sync,
{
    store: Arc<T>,
    clock: Arc<C>,
    pipeline: Arc<OptimizationPipeline<A, S>>,
    metrics: ErrorMetrics,
    config: EngineConfig,
}

/// Asynchronous optimisation engine.
///
/// `submit` admits a request into a bounded FIFO queue and returns its id at
/// once. A fixed pool of workers executes admitted tasks, each under the
/// configured deadline, and records either the artefact or a classified
/// failure. Finished tasks stay queryable for the retention window.
pub struct OptimizationEngine<T, A, S, C>
where
    T: TaskStore + 'static,
    A: StrategyAdvisor + 'static,
    S: StatisticsSource + 'static,
    C: Clock + Send + Sync + 'static,
{
    shared: Arc<EngineShared<T, A, S, C>>,
    sender: mpsc::Sender<TaskId>,
    shutdown: watch::Sender<bool>,
    handles: Mutex<Vec<JoinHandle<()>>>,
}

impl<T, A, S, C> OptimizationEngine<T, A, S, C>
where
    T: TaskStore + 'static,
    A: StrategyAdvisor + 'static,
    S: StatisticsSource + 'static,
    C: Clock + Send + Sync + 'static,
{
    /// Validates `config` and starts the worker pool and the eviction loop.
    ///
    /// Must be called from within a Tokio runtime.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::Config`] when the configuration is unusable.
    pub fn start(
        store: Arc<T>,
        advisor: Arc<A>,
        statistics: Arc<S>,
        clock: Arc<C>,
        config: EngineConfig,
    ) -> EngineResult<Self> {
        config.validate()?;
        let (sender, receiver) = mpsc::channel(config.queue_capacity);
        let (shutdown, _) = watch::channel(false);
        let shared = Arc::new(EngineShared {
            store,
            clock,
            pipeline: Arc::new(OptimizationPipeline::new(advisor, statistics, &config)),
            metrics: ErrorMetrics::new(),
            config,
        });

        let receiver = Arc::new(Mutex::new(receiver));
        let mut handles: Vec<JoinHandle<()>> = (0..shared.config.max_workers)
            .map(|worker| {
                tokio::spawn(worker_loop(
                    Arc::clone(&shared),
                    Arc::clone(&receiver),
                    shutdown.subscribe(),
                    worker,
                ))
            })
            .collect();
        handles.push(tokio::spawn(eviction_loop(
            Arc::clone(&shared),
            shutdown.subscribe(),
        )));
        info!(
            workers = shared.config.max_workers,
            capacity = shared.config.queue_capacity,
            "optimisation engine started"
        );

        Ok(Self {
            shared,
            sender,
            shutdown,
            handles: Mutex::new(handles),
        })
    }

    /// Returns the engine configuration.
    #[must_use]
    pub fn config(&self) -> &EngineConfig {
        &self.shared.config
    }

    /// Admits a request and returns its task id without waiting for work.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::CapacityExceeded`] when queued plus running
    /// tasks already reach the capacity; no task is recorded then.
    /// Returns [`EngineError::ShuttingDown`] after [`Self::shutdown`].
    pub async fn submit(&self, request: OptimizationRequest) -> EngineResult<TaskId> {
        if *self.shutdown.borrow() {
            return Err(EngineError::ShuttingDown);
        }
        let queries = request.queries.len();
        let task = Task::new(request, &*self.shared.clock);
        let task_id = task.id();
        let capacity = self.shared.config.queue_capacity;

        match self.shared.store.admit(&task, capacity).await {
            Ok(()) => {}
            Err(TaskStoreError::CapacityExceeded { .. }) => return Err(self.reject(capacity)),
            Err(err) => return Err(err.into()),
        }
        if let Err(err) = self.sender.try_send(task_id) {
            self.shared.store.remove(task_id).await?;
            return Err(match err {
                mpsc::error::TrySendError::Full(_) => self.reject(capacity),
                mpsc::error::TrySendError::Closed(_) => EngineError::ShuttingDown,
            });
        }

        self.shared.metrics.record_submitted();
        info!(task_id = %task_id, queries, "task admitted");
        Ok(task_id)
    }

    fn reject(&self, capacity: usize) -> EngineError {
        self.shared.metrics.record_rejected();
        warn!(capacity, "submission rejected: capacity exceeded");
        EngineError::CapacityExceeded { capacity }
    }

    /// Returns the current status of a task.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::NotFound`] for unknown or evicted ids.
    pub async fn get_status(&self, task_id: TaskId) -> EngineResult<TaskStatus> {
        Ok(self.get_task(task_id).await?.status())
    }

    /// Returns a snapshot of a task.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::NotFound`] for unknown or evicted ids.
    pub async fn get_task(&self, task_id: TaskId) -> EngineResult<Task> {
        self.shared
            .store
            .find_by_id(task_id)
            .await?
            .ok_or(EngineError::NotFound(task_id))
    }

    /// Returns the artefact or failure of a finished task.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::NotFound`] for unknown or evicted ids and
    /// [`EngineError::NotReady`] while the task is queued or running.
    pub async fn get_result(&self, task_id: TaskId) -> EngineResult<TaskOutcome> {
        let task = self.get_task(task_id).await?;
        match (task.status(), task.result(), task.failure()) {
            (TaskStatus::Done, Some(result), _) => Ok(TaskOutcome::Done(result.clone())),
            (TaskStatus::Failed, _, Some(failure)) => Ok(TaskOutcome::Failed(failure.clone())),
            (status, _, _) => Err(EngineError::NotReady { task_id, status }),
        }
    }

    /// Returns outcome counters, live gauges and the health tier.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::Store`] when the store cannot be counted.
    pub async fn get_metrics(&self) -> EngineResult<MetricsSnapshot> {
        let counts = self.shared.store.counts().await?;
        Ok(self.shared.metrics.snapshot(counts.queued, counts.running))
    }

    /// Returns the number of stored tasks per status.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::Store`] when the store cannot be counted.
    pub async fn task_counts(&self) -> EngineResult<TaskCounts> {
        Ok(self.shared.store.counts().await?)
    }

    /// Evicts finished tasks older than the retention window now.
    ///
    /// Returns the number of evicted tasks.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::Store`] when the store fails.
    pub async fn evict_expired(&self) -> EngineResult<usize> {
        self.shared.evict_expired().await
    }

    /// Stops taking work and waits for the workers to finish their
    /// current tasks.
    ///
    /// Tasks still queued stay queued.
    pub async fn shutdown(&self) {
        self.shutdown.send_replace(true);
        let handles = std::mem::take(&mut *self.handles.lock().await);
        for handle in handles {
            if let Err(err) = handle.await {
                warn!(error = %err, "engine loop ended abnormally");
            }
        }
        info!("optimisation engine stopped");
    }
}

impl<T, A, S, C> EngineShared<T, A, S, C>
where
    T: TaskStore + 'static,
    A: StrategyAdvisor + 'static,
    S: StatisticsSource + 'static,
    C: Clock + Send + Sync + 'static,
{
    async fn execute(&self, task_id: TaskId, worker: usize) {
        if let Err(err) = self.try_execute(task_id, worker).await {
            error!(task_id = %task_id, error = %err, "task bookkeeping failed");
        }
    }

    async fn try_execute(&self, task_id: TaskId, worker: usize) -> EngineResult<()> {
        let Some(mut task) = self.store.find_by_id(task_id).await? else {
            warn!(task_id = %task_id, "queued task vanished before execution");
            return Ok(());
        };
        task.start(&*self.clock)?;
        self.store.update(&task).await?;
        info!(task_id = %task_id, worker, "task started");

        match self.run_pipeline(&task).await {
            Ok(result) => {
                info!(
                    task_id = %task_id,
                    ddl = result.ddl.len(),
                    migrations = result.migrations.len(),
                    queries = result.queries.len(),
                    "task completed"
                );
                self.metrics.record_completed();
                task.complete(result, &*self.clock)?;
            }
            Err(failure) => {
                error!(
                    task_id = %task_id,
                    category = %failure.category,
                    error = %failure.message,
                    "task failed"
                );
                self.metrics.record_failure(failure.category);
                task.fail(failure, &*self.clock)?;
            }
        }
        self.store.update(&task).await?;
        Ok(())
    }

    async fn run_pipeline(&self, task: &Task) -> Result<OptimizationResult, TaskFailure> {
        let cancellation = CancellationHandle::new();
        let pipeline = Arc::clone(&self.pipeline);
        let request = task.request().clone();
        let submitted_at = task.submitted_at();
        let signal = cancellation.signal();
        let mut run =
            tokio::spawn(async move { pipeline.run(&request, submitted_at, signal).await });

        let deadline = self.config.task_timeout();
        match tokio::time::timeout(deadline, &mut run).await {
            Ok(Ok(outcome)) => {
                outcome.map_err(|err: PipelineError| TaskFailure::new(err.category(), err.to_string()))
            }
            Ok(Err(join_error)) => Err(classify_join_error(&join_error)),
            Err(_) => {
                cancellation.cancel();
                run.abort();
                Err(TaskFailure::new(
                    ErrorCategory::Timeout,
                    format!("task exceeded its deadline of {deadline:?}"),
                ))
            }
        }
    }

    async fn evict_expired(&self) -> EngineResult<usize> {
        let Ok(window) = TimeDelta::from_std(self.config.retention()) else {
            return Ok(0);
        };
        let Some(cutoff) = self.clock.utc().checked_sub_signed(window) else {
            return Ok(0);
        };
        let evicted = self.store.evict_finished_before(cutoff).await?;
        if evicted > 0 {
            debug!(evicted, "expired tasks evicted");
        }
        Ok(evicted)
    }
}

fn classify_join_error(join_error: &JoinError) -> TaskFailure {
    if join_error.is_panic() {
        TaskFailure::new(ErrorCategory::Unknown, "task pipeline panicked")
    } else {
        TaskFailure::new(ErrorCategory::Unknown, format!("task pipeline stopped: {join_error}"))
    }
}

async fn worker_loop<T, A, S, C>(
    shared: Arc<EngineShared<T, A, S, C>>,
    receiver: Arc<Mutex<mpsc::Receiver<TaskId>>>,
    mut shutdown: watch::Receiver<bool>,
    worker: usize,
) where
    T: TaskStore + 'static,
    A: StrategyAdvisor + 'static,
    S: StatisticsSource + 'static,
    C: Clock + Send + Sync + 'static,
{
    loop {
        let next = {
            let mut queue = receiver.lock().await;
            if *shutdown.borrow_and_update() {
                None
            } else {
                tokio::select! {
                    received = queue.recv() => received,
                    _ = shutdown.changed() => None,
                }
            }
        };
        let Some(task_id) = next else {
            debug!(worker, "worker stopped");
            return;
        };
        shared.execute(task_id, worker).await;
    }
}

async fn eviction_loop<T, A, S, C>(
    shared: Arc<EngineShared<T, A, S, C>>,
    mut shutdown: watch::Receiver<bool>,
) where
    T: TaskStore + 'static,
    A: StrategyAdvisor + 'static,
    S: StatisticsSource + 'static,
    C: Clock + Send + Sync + 'static,
{
    let mut ticker = tokio::time::interval(shared.config.eviction_interval());
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    loop {
        tokio::select! {
            _ = ticker.tick() => {
                if let Err(err) = shared.evict_expired().await {
                    warn!(error = %err, "eviction sweep failed");
                }
            }
            _ = shutdown.changed() => return,
        }
    }
}
