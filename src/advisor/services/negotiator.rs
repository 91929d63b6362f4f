//! Retry-with-repair negotiation with the strategy advisor.

use std::sync::Arc;
use std::time::Duration;

use super::{PromptError, parse_strategy, render_prompt, validate_strategy};
use crate::advisor::{
    domain::{
        CancellationSignal, RepairKind, RepairRequest, StrategyContext, StrategyDocument,
        StrategyIssue, StrategyPrompt,
    },
    ports::{AdvisorError, StrategyAdvisor},
};
use crate::rewrite::domain::{TableCatalog, TargetLocation};
use thiserror::Error;
use tracing::{debug, warn};

/// Errors that end a negotiation without a strategy.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum NegotiationError {
    /// The advisor answered, but never with a usable strategy.
    #[error("advisor produced no usable strategy after {attempts} attempts: {reason}")]
    Exhausted {
        /// Attempts made.
        attempts: u32,
        /// Last problem observed.
        reason: String,
    },

    /// Every attempt failed to reach the advisor.
    #[error("advisor unreachable after {attempts} attempts: {reason}")]
    Unreachable {
        /// Attempts made.
        attempts: u32,
        /// Last transport error.
        reason: String,
    },

    /// The task was cancelled mid-negotiation.
    #[error("strategy negotiation cancelled")]
    Cancelled,

    /// A prompt could not be rendered.
    #[error(transparent)]
    Prompt(#[from] PromptError),
}

/// Result type for negotiations.
pub type NegotiationResult<T> = Result<T, NegotiationError>;

/// Step of a negotiation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NegotiationState {
    /// Send a prompt to the advisor.
    Attempt {
        /// One-based attempt number.
        attempt: u32,
        /// Repair instructions from the previous attempt.
        repair: Option<RepairRequest>,
    },
    /// Check a raw answer.
    Validate {
        /// Attempt that produced the answer.
        attempt: u32,
        /// Raw advisor answer.
        raw: String,
    },
    /// Decide whether to retry a rejected answer.
    Repair {
        /// Attempt that produced the answer.
        attempt: u32,
        /// Problems found.
        issues: Vec<StrategyIssue>,
        /// Raw advisor answer.
        raw: String,
    },
    /// A valid strategy was found.
    Success(StrategyDocument),
    /// The attempt budget ran out.
    Exhausted {
        /// Attempts made.
        attempts: u32,
        /// Last problem observed.
        reason: String,
        /// Whether no attempt ever reached the advisor.
        unreachable: bool,
    },
}

#[derive(Debug, Error)]
enum CallFailure {
    #[error(transparent)]
    Advisor(AdvisorError),
    #[error("advisor call timed out after {0:?}")]
    TimedOut(Duration),
    #[error("advisor call panicked: {0}")]
    Panicked(String),
    #[error("advisor call cancelled")]
    Cancelled,
}

/// Drives the advisor until it proposes a valid strategy.
pub struct StrategyNegotiator<A>
where
    A: StrategyAdvisor + 'static,
{
    advisor: Arc<A>,
    max_attempts: u32,
    call_timeout: Duration,
}

impl<A> StrategyNegotiator<A>
where
    A: StrategyAdvisor + 'static,
{
    /// Creates a negotiator.
    ///
    /// `max_attempts` counts the first attempt and every retry; zero is
    /// treated as one.
    #[must_use]
    pub const fn new(advisor: Arc<A>, max_attempts: u32, call_timeout: Duration) -> Self {
        Self {
            advisor,
            max_attempts,
            call_timeout,
        }
    }

    /// Negotiates a strategy for the tables in `context`.
    ///
    /// Each advisor call runs in its own task under `call_timeout`. A call
    /// that outlives its deadline or the task's cancellation is abandoned;
    /// its eventual answer is discarded.
    ///
    /// # Errors
    ///
    /// Returns [`NegotiationError::Exhausted`] or
    /// [`NegotiationError::Unreachable`] when the attempt budget runs out,
    /// [`NegotiationError::Cancelled`] when `cancel` fires, and
    /// [`NegotiationError::Prompt`] when a prompt cannot be rendered.
    pub async fn negotiate(
        &self,
        context: Arc<StrategyContext>,
        catalog: &TableCatalog,
        target: &TargetLocation,
        cancel: CancellationSignal,
    ) -> NegotiationResult<StrategyDocument> {
        let mut state = NegotiationState::Attempt {
            attempt: 1,
            repair: None,
        };
        let mut unreachable_attempts = 0_u32;
        loop {
            state = match state {
                NegotiationState::Attempt { attempt, repair } => {
                    if cancel.is_cancelled() {
                        return Err(NegotiationError::Cancelled);
                    }
                    let prompt = render_prompt(Arc::clone(&context), attempt, repair)?;
                    match self.call(prompt, cancel.clone()).await {
                        Ok(raw) => NegotiationState::Validate { attempt, raw },
                        Err(CallFailure::Cancelled | CallFailure::Advisor(AdvisorError::Cancelled)) => {
                            return Err(NegotiationError::Cancelled);
                        }
                        Err(failure) => {
                            if matches!(failure, CallFailure::Advisor(AdvisorError::Connectivity(_))) {
                                unreachable_attempts = unreachable_attempts.saturating_add(1);
                            }
                            self.after_call_failure(attempt, &failure, unreachable_attempts)
                        }
                    }
                }
                NegotiationState::Validate { attempt, raw } => {
                    match check_answer(&raw, catalog, target) {
                        Ok(document) => NegotiationState::Success(document),
                        Err(issues) => NegotiationState::Repair {
                            attempt,
                            issues,
                            raw,
                        },
                    }
                }
                NegotiationState::Repair {
                    attempt,
                    issues,
                    raw,
                } => self.after_rejection(attempt, &issues, &raw),
                NegotiationState::Success(document) => {
                    debug!(tables = document.tables.len(), "advisor strategy accepted");
                    return Ok(document);
                }
                NegotiationState::Exhausted {
                    attempts,
                    reason,
                    unreachable,
                } => {
                    return Err(if unreachable {
                        NegotiationError::Unreachable { attempts, reason }
                    } else {
                        NegotiationError::Exhausted { attempts, reason }
                    });
                }
            };
        }
    }

    const fn attempts_left(&self, attempt: u32) -> bool {
        attempt < self.max_attempts
    }

    fn after_call_failure(
        &self,
        attempt: u32,
        failure: &CallFailure,
        unreachable_attempts: u32,
    ) -> NegotiationState {
        warn!(attempt, error = %failure, "advisor call failed");
        if self.attempts_left(attempt) {
            return NegotiationState::Attempt {
                attempt: attempt.saturating_add(1),
                repair: None,
            };
        }
        NegotiationState::Exhausted {
            attempts: attempt,
            reason: failure.to_string(),
            unreachable: unreachable_attempts == attempt,
        }
    }

    fn after_rejection(&self, attempt: u32, issues: &[StrategyIssue], raw: &str) -> NegotiationState {
        let rendered: Vec<String> = issues.iter().map(ToString::to_string).collect();
        if !self.attempts_left(attempt) {
            return NegotiationState::Exhausted {
                attempts: attempt,
                reason: rendered.join("; "),
                unreachable: false,
            };
        }
        let kind = if issues
            .iter()
            .any(|issue| issue.kind() == RepairKind::JsonSyntax)
        {
            RepairKind::JsonSyntax
        } else {
            RepairKind::Schema
        };
        warn!(
            attempt,
            issues = rendered.len(),
            kind = ?kind,
            "advisor answer rejected; retrying with repair prompt"
        );
        NegotiationState::Attempt {
            attempt: attempt.saturating_add(1),
            repair: Some(RepairRequest::new(kind, rendered, raw)),
        }
    }

    async fn call(
        &self,
        prompt: StrategyPrompt,
        cancel: CancellationSignal,
    ) -> Result<String, CallFailure> {
        let advisor = Arc::clone(&self.advisor);
        let signal = cancel.clone();
        let mut call = tokio::spawn(async move { advisor.propose(&prompt, signal).await });
        let mut watcher = cancel;
        tokio::select! {
            joined = tokio::time::timeout(self.call_timeout, &mut call) => match joined {
                Ok(Ok(answer)) => answer.map_err(CallFailure::Advisor),
                Ok(Err(join_error)) => Err(CallFailure::Panicked(join_error.to_string())),
                Err(_) => Err(CallFailure::TimedOut(self.call_timeout)),
            },
            () = watcher.cancelled() => Err(CallFailure::Cancelled),
        }
    }
}

fn check_answer(
    raw: &str,
    catalog: &TableCatalog,
    target: &TargetLocation,
) -> Result<StrategyDocument, Vec<StrategyIssue>> {
    let document = parse_strategy(raw).map_err(|issue| vec![issue])?;
    validate_strategy(&document, catalog, target)?;
    Ok(document)
}
