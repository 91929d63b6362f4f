//! Optimisation artefact: target naming, generated SQL and validation.
//!
//! The artefact is what a finished task hands back: schema statements for
//! the new optimised schema, the migrations that fill it and the rewritten
//! workload. Everything in it passes the policy deny-list and the path
//! qualification rules before a task may finish as done.

pub mod domain;
pub mod services;

#[cfg(test)]
mod tests;
