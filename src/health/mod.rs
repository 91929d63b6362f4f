//! Failure classification and service health.
//!
//! Every failed task carries exactly one [`domain::ErrorCategory`]. The
//! [`services::ErrorMetrics`] counters owned by one engine instance turn
//! those outcomes into a [`domain::MetricsSnapshot`] with a coarse
//! [`domain::HealthTier`].

pub mod domain;
pub mod services;

#[cfg(test)]
mod tests;
