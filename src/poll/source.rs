//! Pollable Source
//!
//! Wraps a request operation into a repeating, cancellable stream of
//! outcomes. One request is in flight at a time; a tick that comes due
//! while the prior request is still running is skipped, not queued.

use std::future::Future;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::{interval, MissedTickBehavior};
use tracing::debug;

use super::subscription::{Gate, Subscription};
use crate::client::ApiError;

/// One poll tick's outcome
pub type PollOutcome<T> = Result<T, ApiError>;

/// Buffered outcomes per source
pub(crate) const CHANNEL_CAPACITY: usize = 16;

/// Start polling an operation on a fixed interval.
///
/// The source itself never retries: failed ticks are delivered as `Err`
/// outcomes and the consumer applies its own policy. Outcomes arrive in
/// tick order. The loop ends when the subscription is released or the
/// receiver is dropped.
pub fn spawn_poller<T, F, Fut>(
    name: &'static str,
    every: Duration,
    op: F,
) -> (Subscription, mpsc::Receiver<PollOutcome<T>>)
where
    T: Send + 'static,
    F: Fn() -> Fut + Send + 'static,
    Fut: Future<Output = PollOutcome<T>> + Send,
{
    let (tx, rx) = mpsc::channel(CHANNEL_CAPACITY);
    let gate = Gate::new();
    let loop_gate = gate.clone();

    let task = tokio::spawn(async move {
        let mut ticker = interval(every);
        // overdue ticks collapse instead of queueing up
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                biased;
                _ = loop_gate.closed() => return,
                _ = ticker.tick() => {}
            }

            // never aborted mid-request; the result is checked against the
            // gate once it lands
            let outcome = op().await;

            if !loop_gate.is_open() {
                debug!("{name}: discarding result after release");
                return;
            }

            if tx.send(outcome).await.is_err() {
                return;
            }
        }
    });

    (Subscription::new(name, gate, task), rx)
}

/// Poll until the first successful payload matching `pred`, then stop.
///
/// Failed ticks are retried silently. At most one value is ever delivered.
pub fn poll_first_match<T, F, Fut, P>(
    name: &'static str,
    every: Duration,
    op: F,
    pred: P,
) -> (Subscription, mpsc::Receiver<T>)
where
    T: Send + 'static,
    F: Fn() -> Fut + Send + 'static,
    Fut: Future<Output = PollOutcome<T>> + Send,
    P: Fn(&T) -> bool + Send + 'static,
{
    let (tx, rx) = mpsc::channel(1);
    let gate = Gate::new();
    let loop_gate = gate.clone();

    let task = tokio::spawn(async move {
        let mut ticker = interval(every);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                biased;
                _ = loop_gate.closed() => return,
                _ = ticker.tick() => {}
            }

            let payload = match op().await {
                Ok(payload) => payload,
                Err(err) => {
                    debug!("{name}: poll failed, retrying: {err}");
                    continue;
                }
            };

            if !loop_gate.is_open() {
                debug!("{name}: discarding result after release");
                return;
            }

            if pred(&payload) {
                let _ = tx.send(payload).await;
                return;
            }
        }
    });

    (Subscription::new(name, gate, task), rx)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Arc;
    use tokio::sync::Notify;

    #[tokio::test(start_paused = true)]
    async fn test_outcomes_arrive_in_tick_order() {
        let counter = Arc::new(AtomicU32::new(0));
        let op_counter = counter.clone();

        let (mut sub, mut rx) = spawn_poller("test", Duration::from_secs(5), move || {
            let counter = op_counter.clone();
            async move { Ok(counter.fetch_add(1, Ordering::SeqCst)) }
        });

        for expected in 0..3 {
            let outcome = rx.recv().await.unwrap();
            assert_eq!(outcome.unwrap(), expected);
        }

        sub.release();
    }

    #[tokio::test(start_paused = true)]
    async fn test_slow_op_never_overlaps_itself() {
        let in_flight = Arc::new(AtomicU32::new(0));
        let calls = Arc::new(AtomicU32::new(0));
        let op_in_flight = in_flight.clone();
        let op_calls = calls.clone();

        // each call takes three intervals
        let (mut sub, mut rx) = spawn_poller("test", Duration::from_secs(1), move || {
            let in_flight = op_in_flight.clone();
            let calls = op_calls.clone();
            async move {
                let concurrent = in_flight.fetch_add(1, Ordering::SeqCst);
                assert_eq!(concurrent, 0, "poll op overlapped itself");
                tokio::time::sleep(Duration::from_secs(3)).await;
                in_flight.fetch_sub(1, Ordering::SeqCst);
                Ok(calls.fetch_add(1, Ordering::SeqCst))
            }
        });

        // three completions take ~9s of virtual time; skipped ticks must
        // not queue extra calls
        for _ in 0..3 {
            rx.recv().await.unwrap().unwrap();
        }
        assert_eq!(calls.load(Ordering::SeqCst), 3);

        sub.release();
    }

    #[tokio::test(start_paused = true)]
    async fn test_failures_are_delivered_not_retried() {
        let calls = Arc::new(AtomicU32::new(0));
        let op_calls = calls.clone();

        let (mut sub, mut rx) = spawn_poller("test", Duration::from_secs(1), move || {
            let calls = op_calls.clone();
            async move {
                let n = calls.fetch_add(1, Ordering::SeqCst);
                if n == 0 {
                    Err(ApiError::Parse("bad payload".to_string()))
                } else {
                    Ok(n)
                }
            }
        });

        assert!(rx.recv().await.unwrap().is_err());
        assert_eq!(rx.recv().await.unwrap().unwrap(), 1);

        sub.release();
    }

    #[tokio::test(start_paused = true)]
    async fn test_release_while_sleeping_stops_the_loop() {
        let calls = Arc::new(AtomicU32::new(0));
        let op_calls = calls.clone();

        let (mut sub, mut rx) = spawn_poller("test", Duration::from_secs(60), move || {
            let calls = op_calls.clone();
            async move { Ok(calls.fetch_add(1, Ordering::SeqCst)) }
        });

        rx.recv().await.unwrap().unwrap();
        sub.release();

        // no further outcome is delivered once released
        assert!(rx.recv().await.is_none());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_in_flight_result_is_discarded_after_release() {
        let release_gate = Arc::new(Notify::new());
        let op_started = Arc::new(Notify::new());
        let op_release_gate = release_gate.clone();
        let op_started_tx = op_started.clone();

        let (mut sub, mut rx) = spawn_poller("test", Duration::from_secs(1), move || {
            let release_gate = op_release_gate.clone();
            let started = op_started_tx.clone();
            async move {
                started.notify_one();
                // held open until the test releases the subscription
                release_gate.notified().await;
                Ok(42u32)
            }
        });

        op_started.notified().await;
        sub.release();
        release_gate.notify_one();

        assert!(rx.recv().await.is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_first_match_delivers_once_and_retries_errors() {
        let calls = Arc::new(AtomicU32::new(0));
        let op_calls = calls.clone();

        let (mut sub, mut rx) = poll_first_match(
            "test",
            Duration::from_secs(1),
            move || {
                let calls = op_calls.clone();
                async move {
                    match calls.fetch_add(1, Ordering::SeqCst) {
                        0 => Err(ApiError::Parse("flaky".to_string())),
                        n => Ok(n),
                    }
                }
            },
            |n: &u32| *n >= 3,
        );

        assert_eq!(rx.recv().await, Some(3));
        // the source stops itself after the match
        assert!(rx.recv().await.is_none());

        sub.release();
    }
}
