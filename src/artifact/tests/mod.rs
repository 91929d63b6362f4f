//! Unit tests for the artefact context.
