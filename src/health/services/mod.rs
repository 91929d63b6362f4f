//! Health services.

mod metrics;

pub use metrics::ErrorMetrics;
