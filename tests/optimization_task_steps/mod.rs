//! Step definitions for optimisation task BDD scenarios.

pub mod given;
pub mod then;
pub mod when;
pub mod world;
