//! Deposit Lifecycle Tracker
//!
//! Keeps one currency's deposit descriptor current: fetched on mount and on
//! every refresh trigger, and re-fetched autonomously once the observed
//! block height reaches the descriptor's validity bound. Height monitoring
//! survives fetch failures so a later manual refresh can recover.

use std::sync::Arc;
use tokio::sync::{broadcast, watch};
use tracing::{debug, info, warn};

use super::estimate::{estimate_minutes, format_wait};
use super::ViewEffects;
use crate::client::NodeApi;
use crate::poll::{
    broadcast_events, drain_pending, filter, map, Gate, RefreshChannel, Subscription,
};
use crate::types::{DepositDescriptor, NodeInfo};

/// Observable phase of the deposit panel
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DepositPhase {
    /// Fetch in flight with nothing to show yet
    Loading,
    /// Descriptor present and valid
    Ready,
    /// Fetch failed; any stale descriptor is off display
    Error,
    /// Validity bound reached, awaiting the replacement descriptor
    ExpiredRefreshing,
}

/// Published deposit state
#[derive(Debug, Clone, PartialEq)]
pub struct DepositState {
    /// Descriptor from the last successful fetch
    pub descriptor: Option<DepositDescriptor>,
    /// Last accepted block height observation
    pub current_height: Option<u64>,
    /// Human-readable cause of the last failure
    pub error: Option<String>,
    /// Whether a fetch is in flight
    pub fetching: bool,
    /// Expiry guard, reset when the descriptor is replaced
    pub expiry_notified: bool,
    /// One-time notice that the address was replaced automatically
    pub address_auto_updated: bool,
}

impl DepositState {
    fn initial() -> Self {
        Self {
            descriptor: None,
            current_height: None,
            error: None,
            fetching: true,
            expiry_notified: false,
            address_auto_updated: false,
        }
    }

    /// Phase derived from the state fields.
    ///
    /// The expired phase holds from the moment the bound is reached until
    /// the replacement descriptor rearms the guard, whether or not the
    /// follow-up fetch has been issued yet.
    pub fn phase(&self) -> DepositPhase {
        if self.error.is_some() {
            DepositPhase::Error
        } else if self.expiry_notified {
            DepositPhase::ExpiredRefreshing
        } else if self.descriptor.is_none() {
            DepositPhase::Loading
        } else {
            DepositPhase::Ready
        }
    }

    /// Wait estimate for the remaining validity window, rendered for the
    /// panel; `None` until a descriptor and a height are both on hand
    pub fn wait_estimate(&self, currency: &str) -> Option<String> {
        let descriptor = self.descriptor.as_ref()?;
        let height = self.current_height?;
        Some(format_wait(estimate_minutes(
            height,
            descriptor.timeout_block_height,
            currency,
        )))
    }
}

/// State machine behind the deposit view
///
/// Pure event handlers; `DepositView` wires them to the refresh channel and
/// the height stream.
#[derive(Debug)]
pub struct DepositMonitor {
    currency: String,
    state: DepositState,
}

impl DepositMonitor {
    /// Create a monitor in the initial-fetch state
    pub fn new(currency: impl Into<String>) -> Self {
        Self {
            currency: currency.into(),
            state: DepositState::initial(),
        }
    }

    /// Current state snapshot
    pub fn state(&self) -> &DepositState {
        &self.state
    }

    /// A fetch was just issued
    pub fn on_fetch_started(&mut self) {
        self.state.fetching = true;
    }

    /// A fetch resolved with a fresh descriptor.
    ///
    /// The descriptor is replaced wholesale, which also rearms the expiry
    /// guard for the new validity bound.
    pub fn on_fetch_success(&mut self, descriptor: DepositDescriptor) {
        self.state.descriptor = Some(descriptor);
        self.state.error = None;
        self.state.fetching = false;
        self.state.expiry_notified = false;
    }

    /// A fetch resolved with a failure; the stale descriptor leaves display
    pub fn on_fetch_failure(&mut self, cause: &str) {
        self.state.descriptor = None;
        self.state.error = Some(cause.to_string());
        self.state.fetching = false;
    }

    /// Apply one block height observation.
    ///
    /// Returns true when the validity bound was just reached and a refresh
    /// broadcast is due; that happens at most once per descriptor.
    pub fn on_height(&mut self, height: u64) -> bool {
        if let Some(previous) = self.state.current_height {
            if height < previous {
                warn!(
                    "{}: block height regressed from {} to {}, ignoring",
                    self.currency, previous, height
                );
                return false;
            }
        }
        self.state.current_height = Some(height);

        let Some(descriptor) = &self.state.descriptor else {
            return false;
        };
        if self.state.expiry_notified {
            return false;
        }
        if !descriptor.is_expired_at(height) {
            debug!(
                "{}: {} blocks left on the deposit address",
                self.currency,
                descriptor.blocks_remaining(height)
            );
            return false;
        }

        self.state.expiry_notified = true;
        self.state.address_auto_updated = true;
        true
    }

    /// The height stream reported a failure; monitoring continues
    pub fn on_height_error(&mut self, cause: &str) {
        self.state.error = Some(cause.to_string());
    }
}

/// Mounted deposit panel for one currency
pub struct DepositView {
    state: watch::Receiver<DepositState>,
    loop_sub: Subscription,
}

impl DepositView {
    /// Fetch the first descriptor and start following the refresh channel
    /// and the height stream
    pub fn mount(
        api: Arc<dyn NodeApi>,
        effects: Arc<dyn ViewEffects>,
        currency: String,
        refresh: RefreshChannel,
        info_feed: broadcast::Receiver<Result<NodeInfo, String>>,
    ) -> Self {
        let monitor = DepositMonitor::new(currency.clone());
        let (state_tx, state_rx) = watch::channel(monitor.state().clone());
        let mut refresh_rx = refresh.subscribe();

        // this currency's heights, sifted out of the shared info feed
        let height_currency = currency.clone();
        let mapped = map(broadcast_events(info_feed), move |outcome| {
            outcome.map(|info: NodeInfo| info.height_of(&height_currency))
        });
        let mut heights = filter(mapped, |event| !matches!(event, Ok(None)));

        let gate = Gate::new();
        let loop_gate = gate.clone();

        let task = tokio::spawn(async move {
            let mut monitor = monitor;

            if !fetch_and_collapse(
                &*api,
                &mut monitor,
                &currency,
                &loop_gate,
                &state_tx,
                &mut refresh_rx,
            )
            .await
            {
                return;
            }

            loop {
                tokio::select! {
                    // teardown outranks anything already buffered
                    biased;

                    _ = loop_gate.closed() => return,

                    signal = refresh_rx.recv() => {
                        match signal {
                            Ok(()) | Err(broadcast::error::RecvError::Lagged(_)) => {}
                            Err(broadcast::error::RecvError::Closed) => return,
                        }
                        if !fetch_and_collapse(
                            &*api,
                            &mut monitor,
                            &currency,
                            &loop_gate,
                            &state_tx,
                            &mut refresh_rx,
                        )
                        .await
                        {
                            return;
                        }
                    }

                    event = heights.recv() => {
                        let Some(event) = event else { return };
                        match event {
                            Ok(Some(height)) => {
                                if monitor.on_height(height) {
                                    info!(
                                        "{currency}: deposit address expired at height {height}, refreshing"
                                    );
                                    refresh.trigger();
                                    effects.notify_address_updated(&currency);
                                }
                            }
                            // chains the pipeline does not track never get here
                            Ok(None) => continue,
                            Err(cause) => monitor.on_height_error(&cause),
                        }
                        let _ = state_tx.send(monitor.state().clone());
                    }
                }
            }
        });

        Self {
            state: state_rx,
            loop_sub: Subscription::new("deposit", gate, task),
        }
    }

    /// Watch handle over the published state
    pub fn state(&self) -> watch::Receiver<DepositState> {
        self.state.clone()
    }

    /// Tear the panel down
    pub fn unmount(mut self) {
        self.loop_sub.release();
    }
}

/// Run a fetch pass, re-running once for triggers that arrived meanwhile.
///
/// Triggers landing while a fetch is in flight collapse into a single
/// follow-up fetch, so every trigger is answered by a fetch issued at or
/// after it. Returns false when the subscription was released mid-flight.
async fn fetch_and_collapse(
    api: &dyn NodeApi,
    monitor: &mut DepositMonitor,
    currency: &str,
    gate: &Gate,
    state_tx: &watch::Sender<DepositState>,
    refresh_rx: &mut broadcast::Receiver<()>,
) -> bool {
    loop {
        if !gate.is_open() {
            return false;
        }
        monitor.on_fetch_started();
        let _ = state_tx.send(monitor.state().clone());

        if !fetch_descriptor(api, monitor, currency, gate).await {
            return false;
        }
        let _ = state_tx.send(monitor.state().clone());

        if drain_pending(refresh_rx) == 0 {
            return true;
        }
    }
}

/// Run one descriptor fetch and apply its outcome behind the gate.
///
/// Returns false when the subscription was released while the request was
/// in flight; the result is dropped without touching state.
async fn fetch_descriptor(
    api: &dyn NodeApi,
    monitor: &mut DepositMonitor,
    currency: &str,
    gate: &Gate,
) -> bool {
    let outcome = api.get_deposit_address(currency).await;

    if !gate.is_open() {
        debug!("{currency}: discarding deposit descriptor after release");
        return false;
    }

    match outcome {
        Ok(descriptor) => monitor.on_fetch_success(descriptor),
        Err(err) => monitor.on_fetch_failure(&err.to_string()),
    }
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{DepositFees, DepositLimits};

    fn descriptor(timeout_block_height: u64) -> DepositDescriptor {
        DepositDescriptor {
            id: "swap-1".to_string(),
            address: "bcrt1q...".to_string(),
            timeout_block_height,
            limits: DepositLimits::default(),
            fees: DepositFees::default(),
        }
    }

    #[test]
    fn test_initial_phase_is_loading() {
        let monitor = DepositMonitor::new("BTC");
        assert_eq!(monitor.state().phase(), DepositPhase::Loading);
        assert!(monitor.state().fetching);
    }

    #[test]
    fn test_fetch_outcomes_drive_the_phase() {
        let mut monitor = DepositMonitor::new("BTC");

        monitor.on_fetch_success(descriptor(100));
        assert_eq!(monitor.state().phase(), DepositPhase::Ready);
        assert!(monitor.state().error.is_none());

        monitor.on_fetch_started();
        monitor.on_fetch_failure("endpoint returned 502: boltz is down");
        assert_eq!(monitor.state().phase(), DepositPhase::Error);
        // the stale descriptor leaves display with the error
        assert!(monitor.state().descriptor.is_none());

        monitor.on_fetch_started();
        monitor.on_fetch_success(descriptor(120));
        assert_eq!(monitor.state().phase(), DepositPhase::Ready);
        assert!(monitor.state().error.is_none());
    }

    #[test]
    fn test_expiry_triggers_exactly_once_per_descriptor() {
        let mut monitor = DepositMonitor::new("BTC");
        monitor.on_fetch_success(descriptor(100));

        assert!(!monitor.on_height(98));
        assert!(!monitor.on_height(99));
        assert!(monitor.on_height(100));
        assert!(monitor.state().address_auto_updated);
        assert_eq!(monitor.state().phase(), DepositPhase::ExpiredRefreshing);

        // further heights past the bound stay silent for this descriptor
        assert!(!monitor.on_height(100));
        assert!(!monitor.on_height(101));

        // the replacement descriptor rearms the guard
        monitor.on_fetch_success(descriptor(200));
        assert_eq!(monitor.state().phase(), DepositPhase::Ready);
        assert!(!monitor.on_height(150));
        assert!(monitor.on_height(200));
    }

    #[test]
    fn test_expiry_phase_holds_until_the_replacement_lands() {
        let mut monitor = DepositMonitor::new("BTC");
        monitor.on_fetch_success(descriptor(100));

        // the bound is reached before the follow-up fetch is issued
        assert!(monitor.on_height(100));
        assert_eq!(monitor.state().phase(), DepositPhase::ExpiredRefreshing);

        monitor.on_fetch_started();
        assert_eq!(monitor.state().phase(), DepositPhase::ExpiredRefreshing);

        monitor.on_fetch_success(descriptor(200));
        assert_eq!(monitor.state().phase(), DepositPhase::Ready);
    }

    #[test]
    fn test_auto_update_notice_outlives_the_refresh() {
        let mut monitor = DepositMonitor::new("BTC");
        monitor.on_fetch_success(descriptor(100));
        assert!(monitor.on_height(100));

        monitor.on_fetch_success(descriptor(200));
        assert!(monitor.state().address_auto_updated);
        assert!(!monitor.state().expiry_notified);
    }

    #[test]
    fn test_height_regression_is_ignored() {
        let mut monitor = DepositMonitor::new("BTC");
        monitor.on_fetch_success(descriptor(100));

        assert!(!monitor.on_height(99));
        assert!(!monitor.on_height(95));
        assert_eq!(monitor.state().current_height, Some(99));

        // a regressed reading must not trigger the expiry either
        monitor.on_fetch_success(descriptor(96));
        assert!(!monitor.on_height(94));
        assert!(monitor.on_height(99));
    }

    #[test]
    fn test_fetch_failure_keeps_height_monitoring_alive() {
        let mut monitor = DepositMonitor::new("BTC");
        monitor.on_fetch_failure("connection refused");

        assert!(!monitor.on_height(100));
        assert_eq!(monitor.state().current_height, Some(100));
        assert_eq!(monitor.state().phase(), DepositPhase::Error);

        // a later successful refresh picks the heights back up
        monitor.on_fetch_success(descriptor(100));
        assert!(monitor.on_height(101));
    }

    #[test]
    fn test_height_errors_surface_inline() {
        let mut monitor = DepositMonitor::new("BTC");
        monitor.on_fetch_success(descriptor(100));

        monitor.on_height_error("getinfo failed");
        assert_eq!(monitor.state().phase(), DepositPhase::Error);
        assert_eq!(monitor.state().error.as_deref(), Some("getinfo failed"));

        // the next successful fetch clears it
        monitor.on_fetch_success(descriptor(100));
        assert_eq!(monitor.state().phase(), DepositPhase::Ready);
    }

    #[test]
    fn test_wait_estimate_renders_known_chains() {
        let mut monitor = DepositMonitor::new("BTC");
        monitor.on_fetch_success(descriptor(130));
        monitor.on_height(100);

        assert_eq!(
            monitor.state().wait_estimate("BTC").as_deref(),
            Some("5 hours")
        );
        assert_eq!(
            monitor.state().wait_estimate("LTC").as_deref(),
            Some("1 hours 15 minutes")
        );
        // chains without a known block interval render as unknown, not zero
        assert_eq!(
            monitor.state().wait_estimate("ETH").as_deref(),
            Some("unknown")
        );
    }

    #[test]
    fn test_wait_estimate_needs_descriptor_and_height() {
        let mut monitor = DepositMonitor::new("BTC");
        assert_eq!(monitor.state().wait_estimate("BTC"), None);

        monitor.on_fetch_success(descriptor(130));
        assert_eq!(monitor.state().wait_estimate("BTC"), None);

        monitor.on_height(100);
        assert!(monitor.state().wait_estimate("BTC").is_some());
    }
}
