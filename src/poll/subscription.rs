//! Subscription Lifecycle Guard
//!
//! Every stream a view starts is wrapped in a `Subscription`. Releasing it
//! closes a shared gate that every delivery site checks, so nothing the
//! stream produces reaches a consumer once release has begun. In-flight
//! remote calls are not aborted; their results are checked against the gate
//! and dropped.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::Notify;
use tokio::task::JoinHandle;
use tracing::debug;

/// Shared open/closed flag for one subscription
#[derive(Debug, Clone)]
pub struct Gate {
    inner: Arc<GateInner>,
}

#[derive(Debug)]
struct GateInner {
    open: AtomicBool,
    on_close: Notify,
}

impl Gate {
    /// Create an open gate
    pub fn new() -> Self {
        Self {
            inner: Arc::new(GateInner {
                open: AtomicBool::new(true),
                on_close: Notify::new(),
            }),
        }
    }

    /// Whether the subscription is still open
    pub fn is_open(&self) -> bool {
        self.inner.open.load(Ordering::Acquire)
    }

    /// Close the gate; returns true only for the call that closed it
    pub fn close(&self) -> bool {
        let was_open = self.inner.open.swap(false, Ordering::AcqRel);
        if was_open {
            self.inner.on_close.notify_waiters();
        }
        was_open
    }

    /// Wait until the gate closes
    pub async fn closed(&self) {
        let notified = self.inner.on_close.notified();
        tokio::pin!(notified);
        // register before the flag check so a close racing with this call
        // is not missed
        notified.as_mut().enable();
        if !self.is_open() {
            return;
        }
        notified.await;
    }
}

impl Default for Gate {
    fn default() -> Self {
        Self::new()
    }
}

/// Handle for a stream started by a view
///
/// Must be released when the view becomes inactive. Release is idempotent;
/// dropping the handle releases it as a backstop.
#[derive(Debug)]
pub struct Subscription {
    name: &'static str,
    gate: Gate,
    task: Option<JoinHandle<()>>,
}

impl Subscription {
    /// Wrap a spawned task with the gate its delivery sites check
    pub fn new(name: &'static str, gate: Gate, task: JoinHandle<()>) -> Self {
        Self {
            name,
            gate,
            task: Some(task),
        }
    }

    /// The gate delivery sites check
    pub fn gate(&self) -> Gate {
        self.gate.clone()
    }

    /// Whether release has begun
    pub fn is_released(&self) -> bool {
        !self.gate.is_open()
    }

    /// Stop the stream
    ///
    /// The task is detached, never aborted: a remote call already in flight
    /// runs to completion and its result is discarded behind the gate.
    pub fn release(&mut self) {
        if self.gate.close() {
            debug!("{}: subscription released", self.name);
        }
        self.task.take();
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.release();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_close_is_idempotent() {
        let gate = Gate::new();
        assert!(gate.is_open());

        assert!(gate.close());
        assert!(!gate.is_open());
        assert!(!gate.close());
        assert!(!gate.is_open());
    }

    #[tokio::test]
    async fn test_closed_wakes_waiter() {
        let gate = Gate::new();
        let waiter = gate.clone();

        let handle = tokio::spawn(async move { waiter.closed().await });

        tokio::task::yield_now().await;
        gate.close();

        tokio::time::timeout(Duration::from_secs(1), handle)
            .await
            .expect("waiter should wake after close")
            .unwrap();
    }

    #[tokio::test]
    async fn test_closed_returns_immediately_when_already_closed() {
        let gate = Gate::new();
        gate.close();

        tokio::time::timeout(Duration::from_secs(1), gate.closed())
            .await
            .expect("closed gate should not block");
    }

    #[tokio::test]
    async fn test_release_is_idempotent_and_drop_is_a_backstop() {
        let gate = Gate::new();
        let task = tokio::spawn(async {});
        let mut sub = Subscription::new("test", gate.clone(), task);

        assert!(!sub.is_released());
        sub.release();
        assert!(sub.is_released());
        sub.release();
        assert!(!gate.is_open());

        let gate = Gate::new();
        let task = tokio::spawn(async {});
        let sub = Subscription::new("test", gate.clone(), task);
        drop(sub);
        assert!(!gate.is_open());
    }
}
