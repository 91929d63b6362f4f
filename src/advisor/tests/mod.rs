//! Unit tests for strategy negotiation.

mod cancellation_tests;
mod support;
