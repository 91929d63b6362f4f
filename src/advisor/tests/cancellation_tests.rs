//! Tests for the cancellation handle and signal.

use std::time::Duration;

use crate::advisor::domain::{CancellationHandle, CancellationSignal};
use rstest::rstest;

#[rstest]
fn signals_observe_cancellation_taken_before_and_after() {
    let handle = CancellationHandle::new();
    let early = handle.signal();
    assert!(!early.is_cancelled());

    handle.cancel();

    assert!(early.is_cancelled());
    assert!(handle.signal().is_cancelled());
    assert!(handle.is_cancelled());
}

#[rstest]
fn never_signal_is_never_cancelled() {
    assert!(!CancellationSignal::never().is_cancelled());
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn cancelled_future_completes_after_cancel() {
    let handle = CancellationHandle::new();
    let mut signal = handle.signal();
    let waiter = tokio::spawn(async move { signal.cancelled().await });

    handle.cancel();

    tokio::time::timeout(Duration::from_secs(1), waiter)
        .await
        .expect("waiter should wake")
        .expect("waiter should not panic");
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn cancelled_future_stays_pending_without_cancel() {
    let handle = CancellationHandle::new();
    let mut signal = handle.signal();

    let outcome = tokio::time::timeout(Duration::from_millis(50), signal.cancelled()).await;

    assert!(outcome.is_err());
}
