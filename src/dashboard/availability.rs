//! Gated Availability Tracker
//!
//! Decides whether deposits and withdrawals are currently usable. The first
//! node info emission gates everything: on simnet the feature is off for
//! good and the swap service feed is never subscribed; otherwise every
//! boltz status emission produces a fresh usable/reason pair.

use tokio::sync::{broadcast, watch};

use crate::poll::{broadcast_events, Gate, Subscription};
use crate::types::{NodeInfo, ServiceStatus};

/// Reason shown until the gate decides and the first boltz status arrives
pub const WAITING_FOR_BOLTZ: &str = "Waiting for Boltz status";

/// Reason shown when the node runs in simnet mode
pub const NOT_ON_SIMNET: &str = "Not available on Simnet";

/// Whether a user action is currently available, and why not
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AvailabilityState {
    /// Whether the action may be taken
    pub usable: bool,
    /// Human-readable cause, empty exactly when usable
    pub reason: String,
}

impl AvailabilityState {
    /// Usable, with the reason cleared
    pub fn usable() -> Self {
        Self {
            usable: true,
            reason: String::new(),
        }
    }

    /// Unusable for the given cause
    pub fn unusable(reason: impl Into<String>) -> Self {
        Self {
            usable: false,
            reason: reason.into(),
        }
    }
}

/// State machine behind the availability gate
///
/// Pure event handlers; `spawn_tracker` wires them to the shared feeds.
#[derive(Debug)]
pub struct AvailabilityTracker {
    state: AvailabilityState,
    gate_decided: bool,
}

impl AvailabilityTracker {
    /// Create a tracker waiting for its first node info
    pub fn new() -> Self {
        Self {
            state: AvailabilityState::unusable(WAITING_FOR_BOLTZ),
            gate_decided: false,
        }
    }

    /// Current state snapshot
    pub fn state(&self) -> &AvailabilityState {
        &self.state
    }

    /// Whether the one-shot network gate has been decided
    pub fn gate_decided(&self) -> bool {
        self.gate_decided
    }

    /// Decide the gate from the first node info.
    ///
    /// Returns whether boltz monitoring should start; later calls are
    /// ignored. On simnet the state is fixed and monitoring never starts.
    pub fn on_network(&mut self, info: &NodeInfo) -> bool {
        if self.gate_decided {
            return false;
        }
        self.gate_decided = true;

        if info.is_simnet() {
            self.state = AvailabilityState::unusable(NOT_ON_SIMNET);
            false
        } else {
            true
        }
    }

    /// Apply one boltz status emission; the state is rebuilt, not merged
    pub fn on_boltz_status(&mut self, status: &ServiceStatus) {
        self.state = if status.is_ready() {
            AvailabilityState::usable()
        } else {
            AvailabilityState::unusable(format!("Boltz is not ready. Status: {}", status.status))
        };
    }

    /// Apply one boltz feed failure
    pub fn on_boltz_error(&mut self, cause: &str) {
        self.state = AvailabilityState::unusable(format!("Boltz is unavailable. Error: {}", cause));
    }
}

impl Default for AvailabilityTracker {
    fn default() -> Self {
        Self::new()
    }
}

/// Wire a tracker to the shared feeds and publish its state over a watch.
///
/// The boltz feed sender is only subscribed after a non-simnet gate
/// decision; on simnet the task ends with the fixed state published.
pub fn spawn_tracker(
    info_feed: broadcast::Receiver<Result<NodeInfo, String>>,
    boltz_feed: broadcast::Sender<Result<ServiceStatus, String>>,
) -> (Subscription, watch::Receiver<AvailabilityState>) {
    let mut tracker = AvailabilityTracker::new();
    let (state_tx, state_rx) = watch::channel(tracker.state().clone());
    let mut info_events = broadcast_events(info_feed);
    let gate = Gate::new();
    let loop_gate = gate.clone();

    let task = tokio::spawn(async move {
        // one-shot gate from the first successful info read; failed reads
        // leave the gate open for the next tick
        let monitor_boltz = loop {
            tokio::select! {
                biased;
                _ = loop_gate.closed() => return,
                event = info_events.recv() => match event {
                    Some(Ok(info)) => break tracker.on_network(&info),
                    Some(Err(_)) => continue,
                    None => return,
                },
            }
        };

        if !monitor_boltz {
            // the fixed simnet verdict is this task's only publish
            let _ = state_tx.send(tracker.state().clone());
            return;
        }

        let mut boltz_events = broadcast_events(boltz_feed.subscribe());
        loop {
            tokio::select! {
                biased;
                _ = loop_gate.closed() => return,
                event = boltz_events.recv() => {
                    let Some(event) = event else { return };
                    match event {
                        Ok(status) => tracker.on_boltz_status(&status),
                        Err(cause) => tracker.on_boltz_error(&cause),
                    }
                    let _ = state_tx.send(tracker.state().clone());
                }
            }
        }
    });

    (Subscription::new("availability", gate, task), state_rx)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    fn info(network: &str) -> NodeInfo {
        NodeInfo {
            network: network.to_string(),
            chains: BTreeMap::new(),
        }
    }

    #[test]
    fn test_initial_state_waits_for_boltz() {
        let tracker = AvailabilityTracker::new();
        assert!(!tracker.state().usable);
        assert_eq!(tracker.state().reason, WAITING_FOR_BOLTZ);
    }

    #[test]
    fn test_simnet_short_circuits() {
        let mut tracker = AvailabilityTracker::new();

        assert!(!tracker.on_network(&info("Simnet")));
        assert_eq!(tracker.state().reason, NOT_ON_SIMNET);

        // the gate never reopens, and boltz emissions would not be wired
        assert!(!tracker.on_network(&info("mainnet")));
        assert_eq!(tracker.state().reason, NOT_ON_SIMNET);
    }

    #[test]
    fn test_gate_decides_once() {
        let mut tracker = AvailabilityTracker::new();

        assert!(tracker.on_network(&info("mainnet")));
        assert!(tracker.gate_decided());
        assert!(!tracker.on_network(&info("mainnet")));
    }

    #[test]
    fn test_boltz_emissions_rebuild_the_state() {
        let mut tracker = AvailabilityTracker::new();
        tracker.on_network(&info("testnet"));

        tracker.on_boltz_status(&ServiceStatus::new("boltz", "Starting"));
        assert_eq!(
            tracker.state().reason,
            "Boltz is not ready. Status: Starting"
        );

        tracker.on_boltz_status(&ServiceStatus::new("boltz", "Ready"));
        assert!(tracker.state().usable);
        assert!(tracker.state().reason.is_empty());

        tracker.on_boltz_error("connection refused");
        assert!(!tracker.state().usable);
        assert_eq!(
            tracker.state().reason,
            "Boltz is unavailable. Error: connection refused"
        );
    }

    #[tokio::test]
    async fn test_spawned_tracker_follows_the_feeds() {
        let (info_tx, _) = broadcast::channel(4);
        let (boltz_tx, _) = broadcast::channel::<Result<ServiceStatus, String>>(4);

        let (mut sub, mut state) = spawn_tracker(info_tx.subscribe(), boltz_tx.clone());
        assert_eq!(state.borrow().reason, WAITING_FOR_BOLTZ);

        info_tx
            .send(Ok(info("mainnet")))
            .expect("tracker should be subscribed");

        // the boltz subscription appears once the gate decides
        let mut tries = 0;
        while boltz_tx.receiver_count() == 0 && tries < 100 {
            tokio::task::yield_now().await;
            tries += 1;
        }
        assert!(boltz_tx.receiver_count() > 0);

        // a non-simnet verdict leaves the waiting state alone; nothing is
        // re-published until boltz actually reports in
        assert!(!state.has_changed().expect("tracker should be alive"));

        boltz_tx
            .send(Ok(ServiceStatus::new("boltz", "Ready")))
            .expect("tracker should be subscribed");

        state.changed().await.expect("state should update");
        assert!(state.borrow().usable);

        sub.release();
    }

    #[tokio::test]
    async fn test_spawned_tracker_never_subscribes_on_simnet() {
        let (info_tx, _) = broadcast::channel(4);
        let (boltz_tx, _) = broadcast::channel::<Result<ServiceStatus, String>>(4);

        let (mut sub, mut state) = spawn_tracker(info_tx.subscribe(), boltz_tx.clone());

        info_tx
            .send(Ok(info("simnet")))
            .expect("tracker should be subscribed");

        state.changed().await.expect("state should update");
        assert_eq!(state.borrow().reason, NOT_ON_SIMNET);
        assert_eq!(boltz_tx.receiver_count(), 0);

        sub.release();
    }
}
