//! Refresh Broadcast Channel
//!
//! Value-less trigger shared by every party that can force a resource to
//! re-fetch (manual refresh, automatic expiry). One instance per resource;
//! it dies with the owning view, so pending triggers can never leak into a
//! successor instance.

use tokio::sync::broadcast;

/// Buffered triggers; a burst beyond this collapses on the consumer side
const REFRESH_CAPACITY: usize = 8;

/// Shared re-fetch trigger for one resource instance
#[derive(Debug, Clone)]
pub struct RefreshChannel {
    sender: broadcast::Sender<()>,
}

impl RefreshChannel {
    /// Create a channel with no consumer yet
    pub fn new() -> Self {
        let (sender, _) = broadcast::channel(REFRESH_CAPACITY);
        Self { sender }
    }

    /// Ask the consumer to re-fetch now
    pub fn trigger(&self) {
        // Ignore send errors (no consumer)
        let _ = self.sender.send(());
    }

    /// Subscribe as the consumer role
    pub fn subscribe(&self) -> broadcast::Receiver<()> {
        self.sender.subscribe()
    }
}

impl Default for RefreshChannel {
    fn default() -> Self {
        Self::new()
    }
}

/// Drain triggers that piled up while a fetch was in flight.
///
/// Returns how many were pending; the caller turns a non-zero count into a
/// single follow-up fetch, collapsing the burst.
pub fn drain_pending(rx: &mut broadcast::Receiver<()>) -> usize {
    let mut drained = 0;
    loop {
        match rx.try_recv() {
            Ok(()) => drained += 1,
            // a lagged run is still that many pending triggers
            Err(broadcast::error::TryRecvError::Lagged(skipped)) => {
                drained += skipped as usize;
            }
            Err(_) => return drained,
        }
    }
}
