//! In-memory task store.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use crate::task::{
    domain::{Task, TaskCounts, TaskId},
    ports::{TaskStore, TaskStoreError, TaskStoreResult},
};

/// Thread-safe in-memory task store.
#[derive(Debug, Clone, Default)]
pub struct InMemoryTaskStore {
    state: Arc<RwLock<InMemoryTaskState>>,
}

#[derive(Debug, Default)]
struct InMemoryTaskState {
    tasks: HashMap<TaskId, Task>,
}

impl InMemoryTaskState {
    fn counts(&self) -> TaskCounts {
        let mut counts = TaskCounts::default();
        for task in self.tasks.values() {
            counts.record(task.status());
        }
        counts
    }
}

impl InMemoryTaskStore {
    /// Creates an empty in-memory store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

fn poisoned(err: impl ToString) -> TaskStoreError {
    TaskStoreError::persistence(std::io::Error::other(err.to_string()))
}

#[async_trait]
impl TaskStore for InMemoryTaskStore {
    async fn admit(&self, task: &Task, capacity: usize) -> TaskStoreResult<()> {
        let mut state = self.state.write().map_err(poisoned)?;
        if state.tasks.contains_key(&task.id()) {
            return Err(TaskStoreError::DuplicateTask(task.id()));
        }
        if state.counts().in_flight() >= capacity {
            return Err(TaskStoreError::CapacityExceeded { capacity });
        }
        state.tasks.insert(task.id(), task.clone());
        Ok(())
    }

    async fn update(&self, task: &Task) -> TaskStoreResult<()> {
        let mut state = self.state.write().map_err(poisoned)?;
        let slot = state
            .tasks
            .get_mut(&task.id())
            .ok_or(TaskStoreError::NotFound(task.id()))?;
        *slot = task.clone();
        Ok(())
    }

    async fn find_by_id(&self, id: TaskId) -> TaskStoreResult<Option<Task>> {
        let state = self.state.read().map_err(poisoned)?;
        Ok(state.tasks.get(&id).cloned())
    }

    async fn remove(&self, id: TaskId) -> TaskStoreResult<Option<Task>> {
        let mut state = self.state.write().map_err(poisoned)?;
        Ok(state.tasks.remove(&id))
    }

    async fn evict_finished_before(&self, cutoff: DateTime<Utc>) -> TaskStoreResult<usize> {
        let mut state = self.state.write().map_err(poisoned)?;
        let before = state.tasks.len();
        state.tasks.retain(|_, task| !task.finished_before(cutoff));
        Ok(before.saturating_sub(state.tasks.len()))
    }

    async fn counts(&self) -> TaskStoreResult<TaskCounts> {
        let state = self.state.read().map_err(poisoned)?;
        Ok(state.counts())
    }
}
