//! Port contracts for task storage.

pub mod store;

pub use store::{TaskStore, TaskStoreError, TaskStoreResult};
