//! Strategy negotiation with the advisor collaborator.
//!
//! The advisor proposes a physical layout strategy (partitioning,
//! clustering, compression and extra migrations) for the tables of one
//! request. Its raw answer is untrusted text: the negotiator extracts JSON,
//! validates it against the table catalog and retries with a repair prompt
//! until the strategy is usable or the attempt budget runs out.
//!
//! Live table statistics feed the prompt when a statistics source is
//! available; their absence never fails a task.

pub mod adapters;
pub mod domain;
pub mod ports;
pub mod services;

#[cfg(test)]
mod tests;
