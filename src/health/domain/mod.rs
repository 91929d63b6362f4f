//! Domain types for failure classification and health reporting.

mod category;
mod snapshot;
mod tier;

pub use category::{ErrorCategory, ParseErrorCategoryError};
pub use snapshot::MetricsSnapshot;
pub use tier::HealthTier;
