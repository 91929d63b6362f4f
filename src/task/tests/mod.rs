//! Unit tests for the task context.

mod store_tests;
mod support;
