//! Event Combinators
//!
//! Push-based plumbing between sources and view state machines. Each
//! combinator is a forwarding task over mpsc channels that winds down on
//! its own when either end of the pipe goes away. Ordering within one
//! upstream is preserved; `merge` makes no promise across upstreams.

use tokio::sync::{broadcast, mpsc};
use tracing::debug;

use super::source::CHANNEL_CAPACITY;

/// Transform every event with `f`
pub fn map<T, U, F>(mut rx: mpsc::Receiver<T>, mut f: F) -> mpsc::Receiver<U>
where
    T: Send + 'static,
    U: Send + 'static,
    F: FnMut(T) -> U + Send + 'static,
{
    let (tx, out) = mpsc::channel(CHANNEL_CAPACITY);
    tokio::spawn(async move {
        while let Some(event) = rx.recv().await {
            if tx.send(f(event)).await.is_err() {
                break;
            }
        }
    });
    out
}

/// Drop events `pred` rejects
pub fn filter<T, P>(mut rx: mpsc::Receiver<T>, mut pred: P) -> mpsc::Receiver<T>
where
    T: Send + 'static,
    P: FnMut(&T) -> bool + Send + 'static,
{
    let (tx, out) = mpsc::channel(CHANNEL_CAPACITY);
    tokio::spawn(async move {
        while let Some(event) = rx.recv().await {
            if pred(&event) && tx.send(event).await.is_err() {
                break;
            }
        }
    });
    out
}

/// Interleave several upstreams into one
pub fn merge<T>(sources: Vec<mpsc::Receiver<T>>) -> mpsc::Receiver<T>
where
    T: Send + 'static,
{
    let (tx, out) = mpsc::channel(CHANNEL_CAPACITY);
    for mut rx in sources {
        let tx = tx.clone();
        tokio::spawn(async move {
            while let Some(event) = rx.recv().await {
                if tx.send(event).await.is_err() {
                    break;
                }
            }
        });
    }
    out
}

/// Adapt a broadcast receiver into the mpsc event interface.
///
/// A lagged receiver skips what it missed and carries on; for the
/// value-less signals this is used with, the skipped run collapses into
/// whatever is still buffered.
pub fn broadcast_events<T>(mut rx: broadcast::Receiver<T>) -> mpsc::Receiver<T>
where
    T: Clone + Send + 'static,
{
    let (tx, out) = mpsc::channel(CHANNEL_CAPACITY);
    tokio::spawn(async move {
        loop {
            match rx.recv().await {
                Ok(event) => {
                    if tx.send(event).await.is_err() {
                        break;
                    }
                }
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    debug!("feed consumer lagged, skipped {skipped} events");
                }
                Err(broadcast::error::RecvError::Closed) => break,
            }
        }
    });
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_map_transforms_in_order() {
        let (tx, rx) = mpsc::channel(4);
        let mut mapped = map(rx, |n: u32| n * 2);

        for n in 1..=3 {
            tx.send(n).await.unwrap();
        }
        drop(tx);

        assert_eq!(mapped.recv().await, Some(2));
        assert_eq!(mapped.recv().await, Some(4));
        assert_eq!(mapped.recv().await, Some(6));
        assert_eq!(mapped.recv().await, None);
    }

    #[tokio::test]
    async fn test_filter_drops_rejected_events() {
        let (tx, rx) = mpsc::channel(8);
        let mut odd = filter(rx, |n: &u32| n % 2 == 1);

        for n in 1..=6 {
            tx.send(n).await.unwrap();
        }
        drop(tx);

        assert_eq!(odd.recv().await, Some(1));
        assert_eq!(odd.recv().await, Some(3));
        assert_eq!(odd.recv().await, Some(5));
        assert_eq!(odd.recv().await, None);
    }

    #[tokio::test]
    async fn test_merge_preserves_per_upstream_order() {
        let (tx_a, rx_a) = mpsc::channel(8);
        let (tx_b, rx_b) = mpsc::channel(8);
        let mut merged = merge(vec![rx_a, rx_b]);

        for n in [1, 2, 3] {
            tx_a.send(n).await.unwrap();
        }
        for n in [10, 20, 30] {
            tx_b.send(n).await.unwrap();
        }
        drop(tx_a);
        drop(tx_b);

        let mut seen = Vec::new();
        while let Some(n) = merged.recv().await {
            seen.push(n);
        }

        let from_a: Vec<u32> = seen.iter().copied().filter(|n| *n < 10).collect();
        let from_b: Vec<u32> = seen.iter().copied().filter(|n| *n >= 10).collect();
        assert_eq!(from_a, vec![1, 2, 3]);
        assert_eq!(from_b, vec![10, 20, 30]);
    }

    #[tokio::test]
    async fn test_broadcast_adapter_forwards_events() {
        let (tx, rx) = broadcast::channel(4);
        let mut events = broadcast_events(rx);

        tx.send("a").unwrap();
        tx.send("b").unwrap();

        assert_eq!(events.recv().await, Some("a"));
        assert_eq!(events.recv().await, Some("b"));

        drop(tx);
        assert_eq!(events.recv().await, None);
    }
}
