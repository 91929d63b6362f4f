//! Tiered SQL rewriting for optimisation tasks.
//!
//! Schema statements are turned into immutable [`domain::TableMetadata`]
//! records and workload queries are rewritten against the optimised target
//! schema. Every statement is first handled structurally through a full SQL
//! parse; when parsing fails a pattern-based tier takes over so a single
//! awkward statement never fails the task.
//!
//! - Domain types in [`domain`]
//! - Metadata building and query rewriting in [`services`]

pub mod domain;
pub mod services;

#[cfg(test)]
mod tests;
