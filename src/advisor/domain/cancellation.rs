//! Cooperative cancellation shared between a task and its advisor call.

use std::sync::Arc;
use tokio::sync::watch;

/// Owning side of a cancellation flag.
///
/// Cancelling is idempotent and visible to every signal taken from the
/// handle, including signals taken afterwards.
#[derive(Debug, Clone)]
pub struct CancellationHandle {
    sender: Arc<watch::Sender<bool>>,
}

impl CancellationHandle {
    /// Creates a handle in the not-cancelled state.
    #[must_use]
    pub fn new() -> Self {
        let (sender, _) = watch::channel(false);
        Self {
            sender: Arc::new(sender),
        }
    }

    /// Flips the flag to cancelled.
    pub fn cancel(&self) {
        self.sender.send_replace(true);
    }

    /// Returns `true` once [`Self::cancel`] has been called.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        *self.sender.borrow()
    }

    /// Returns a signal observing this handle.
    #[must_use]
    pub fn signal(&self) -> CancellationSignal {
        CancellationSignal {
            receiver: Some(self.sender.subscribe()),
        }
    }
}

impl Default for CancellationHandle {
    fn default() -> Self {
        Self::new()
    }
}

/// Observing side of a cancellation flag, passed into collaborator calls.
#[derive(Debug, Clone)]
pub struct CancellationSignal {
    receiver: Option<watch::Receiver<bool>>,
}

impl CancellationSignal {
    /// Returns a signal that never fires.
    #[must_use]
    pub const fn never() -> Self {
        Self { receiver: None }
    }

    /// Returns `true` once the owning handle has been cancelled.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.receiver
            .as_ref()
            .is_some_and(|receiver| *receiver.borrow())
    }

    /// Completes once the owning handle has been cancelled.
    ///
    /// Never completes for [`Self::never`] or when the handle is dropped
    /// without cancelling.
    pub async fn cancelled(&mut self) {
        let Some(receiver) = self.receiver.as_mut() else {
            return std::future::pending().await;
        };
        if receiver.wait_for(|cancelled| *cancelled).await.is_err() {
            std::future::pending::<()>().await;
        }
    }
}
