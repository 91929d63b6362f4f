//! Unit tests for the rewrite bounded context.

mod metadata_tests;
