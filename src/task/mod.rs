//! Optimisation tasks and the engine that runs them.
//!
//! A submitted request becomes a [`domain::Task`] held by a
//! [`ports::TaskStore`]. The [`services::OptimizationEngine`] admits tasks
//! into a bounded FIFO queue and a fixed worker pool runs each through the
//! [`services::OptimizationPipeline`] under a deadline. The module follows
//! hexagonal architecture:
//!
//! - Domain types in [`domain`]
//! - Port contracts in [`ports`]
//! - Adapter implementations in [`adapters`]
//! - Orchestration services in [`services`]

pub mod adapters;
pub mod domain;
pub mod ports;
pub mod services;

#[cfg(test)]
mod tests;
