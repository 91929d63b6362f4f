//! Unit tests for failure classification and health reporting.
