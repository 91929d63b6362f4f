//! Strategy advisor port.

use crate::advisor::domain::{CancellationSignal, StrategyPrompt};
use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;

/// Result type for advisor calls.
pub type AdvisorResult<T> = Result<T, AdvisorError>;

/// Collaborator that proposes a layout strategy as raw text.
///
/// Implementations should stop early once `cancel` fires; the negotiator
/// discards late answers either way.
#[async_trait]
pub trait StrategyAdvisor: Send + Sync {
    /// Answers one rendered prompt.
    ///
    /// # Errors
    ///
    /// Returns [`AdvisorError::Connectivity`] when the advisor cannot be
    /// reached, [`AdvisorError::Call`] when it refuses the request and
    /// [`AdvisorError::Cancelled`] when it observed cancellation.
    async fn propose(
        &self,
        prompt: &StrategyPrompt,
        cancel: CancellationSignal,
    ) -> AdvisorResult<String>;
}

/// Errors returned by advisor implementations.
#[derive(Debug, Clone, Error)]
pub enum AdvisorError {
    /// The advisor could not be reached.
    #[error("advisor unreachable: {0}")]
    Connectivity(Arc<dyn std::error::Error + Send + Sync>),

    /// The advisor was reached but the call failed.
    #[error("advisor call failed: {0}")]
    Call(String),

    /// The call stopped because the task was cancelled.
    #[error("advisor call cancelled")]
    Cancelled,
}

impl AdvisorError {
    /// Wraps a transport error.
    pub fn connectivity(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Connectivity(Arc::new(err))
    }
}
