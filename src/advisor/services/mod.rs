//! Negotiation, prompt rendering and statistics gathering services.

mod extraction;
mod negotiator;
mod prompt;
mod statistics;
mod validation;

pub use extraction::{extract_json, parse_strategy};
pub use negotiator::{NegotiationError, NegotiationResult, NegotiationState, StrategyNegotiator};
pub use prompt::{PromptError, render_prompt, summarise_tables};
pub use statistics::StatisticsCollector;
pub use validation::{
    validate_cluster_count, validate_columns_exist, validate_compression, validate_known_table,
    validate_migration, validate_partition_count, validate_strategy,
};
