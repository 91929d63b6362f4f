//! sqlagent: asynchronous SQL workload optimisation.
//!
//! Callers submit a table schema and a query workload. A worker pool turns
//! each submission into a validated artefact of target DDL, data migrations
//! and rewritten queries, while the caller polls for status and results.
//!
//! # Architecture
//!
//! Each bounded context follows hexagonal architecture principles:
//!
//! - **Domain**: Pure business logic with no infrastructure dependencies
//! - **Ports**: Abstract trait interfaces for external interactions
//! - **Adapters**: Concrete implementations of ports
//!
//! # Modules
//!
//! - [`rewrite`]: Schema catalog, table naming and tiered query rewriting
//! - [`advisor`]: Strategy negotiation with an external advisor
//! - [`artifact`]: DDL and migration rendering, artefact validation
//! - [`task`]: Task admission, worker pool and result retention
//! - [`health`]: Error categories, counters and health tiers
//! - [`config`]: Engine tuning parameters

pub mod advisor;
pub mod artifact;
pub mod config;
pub mod health;
pub mod rewrite;
pub mod task;
