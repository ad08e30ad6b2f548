//! Wallets View
//!
//! Owns the continuous info, boltz status, and balance polls and
//! re-broadcasts their outcomes to per-currency wallet views over shared
//! feeds, so each payload is fetched once however many views consume it.
//! The boltz poll only ever starts once the first node info reports a
//! non-simnet network.

use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{broadcast, watch};
use tracing::debug;

use super::availability::{spawn_tracker, AvailabilityState};
use super::deposit::{DepositState, DepositView};
use super::ViewEffects;
use crate::client::NodeApi;
use crate::poll::{spawn_poller, Gate, RefreshChannel, Subscription};
use crate::types::{BalanceSnapshot, NodeInfo, ServiceStatus};

/// Poll outcomes re-broadcast to sibling views; errors carry the cause
pub type SharedFeed<T> = broadcast::Sender<Result<T, String>>;

/// Buffered emissions per feed before slow consumers lag
const FEED_CAPACITY: usize = 16;

/// Mounted wallets container
pub struct Wallets {
    api: Arc<dyn NodeApi>,
    effects: Arc<dyn ViewEffects>,
    info_feed: SharedFeed<NodeInfo>,
    boltz_feed: SharedFeed<ServiceStatus>,
    balance_feed: SharedFeed<BalanceSnapshot>,
    info_sub: Subscription,
    balance_sub: Subscription,
    loop_sub: Subscription,
}

impl Wallets {
    /// Start the shared polls and return the mounted container
    pub fn mount(
        api: Arc<dyn NodeApi>,
        effects: Arc<dyn ViewEffects>,
        info_every: Duration,
        boltz_every: Duration,
        balance_every: Duration,
    ) -> Self {
        let info_api = api.clone();
        let (info_sub, mut info_rx) = spawn_poller("getinfo", info_every, move || {
            let api = info_api.clone();
            async move { api.get_info().await }
        });

        let balance_api = api.clone();
        let (balance_sub, mut balance_rx) = spawn_poller("balance", balance_every, move || {
            let api = balance_api.clone();
            async move { api.get_balance().await }
        });

        let (info_feed, _) = broadcast::channel(FEED_CAPACITY);
        let (boltz_feed, _) = broadcast::channel(FEED_CAPACITY);
        let (balance_feed, _) = broadcast::channel(FEED_CAPACITY);

        let gate = Gate::new();
        let loop_gate = gate.clone();
        let loop_info_feed = info_feed.clone();
        let loop_boltz_feed = boltz_feed.clone();
        let loop_balance_feed = balance_feed.clone();
        let boltz_api = api.clone();

        let task = tokio::spawn(async move {
            // forward outcomes until the first successful info read decides
            // whether boltz is polled at all
            let first_info = loop {
                tokio::select! {
                    biased;
                    _ = loop_gate.closed() => return,
                    outcome = info_rx.recv() => {
                        let Some(outcome) = outcome else { return };
                        let info = outcome.as_ref().ok().cloned();
                        let _ = loop_info_feed.send(outcome.map_err(|e| e.to_string()));
                        if let Some(info) = info {
                            break info;
                        }
                    }
                    outcome = balance_rx.recv() => {
                        let Some(outcome) = outcome else { return };
                        let _ = loop_balance_feed.send(outcome.map_err(|e| e.to_string()));
                    }
                }
            };

            if first_info.is_simnet() {
                debug!("simnet node, boltz status poll not started");
                loop {
                    tokio::select! {
                        biased;
                        _ = loop_gate.closed() => return,
                        outcome = info_rx.recv() => {
                            let Some(outcome) = outcome else { return };
                            let _ = loop_info_feed.send(outcome.map_err(|e| e.to_string()));
                        }
                        outcome = balance_rx.recv() => {
                            let Some(outcome) = outcome else { return };
                            let _ = loop_balance_feed.send(outcome.map_err(|e| e.to_string()));
                        }
                    }
                }
            }

            // released when this task winds down
            let (_boltz_sub, mut boltz_rx) = spawn_poller("boltz-status", boltz_every, move || {
                let api = boltz_api.clone();
                async move { api.get_boltz_status().await }
            });

            loop {
                tokio::select! {
                    biased;
                    _ = loop_gate.closed() => return,
                    outcome = info_rx.recv() => {
                        let Some(outcome) = outcome else { return };
                        let _ = loop_info_feed.send(outcome.map_err(|e| e.to_string()));
                    }
                    outcome = boltz_rx.recv() => {
                        let Some(outcome) = outcome else { return };
                        let _ = loop_boltz_feed.send(outcome.map_err(|e| e.to_string()));
                    }
                    outcome = balance_rx.recv() => {
                        let Some(outcome) = outcome else { return };
                        let _ = loop_balance_feed.send(outcome.map_err(|e| e.to_string()));
                    }
                }
            }
        });

        Self {
            api,
            effects,
            info_feed,
            boltz_feed,
            balance_feed,
            info_sub,
            balance_sub,
            loop_sub: Subscription::new("wallets", gate, task),
        }
    }

    /// Create a view over one currency's wallet
    pub fn wallet_view(&self, currency: impl Into<String>) -> WalletView {
        let (availability_sub, availability) =
            spawn_tracker(self.info_feed.subscribe(), self.boltz_feed.clone());

        WalletView {
            currency: currency.into(),
            api: self.api.clone(),
            effects: self.effects.clone(),
            refresh: RefreshChannel::new(),
            availability,
            availability_sub,
            info_feed: self.info_feed.clone(),
            deposit: None,
        }
    }

    /// Subscribe to the shared balance feed
    pub fn balances(&self) -> broadcast::Receiver<Result<BalanceSnapshot, String>> {
        self.balance_feed.subscribe()
    }

    /// Tear the container down; the shared polls stop
    pub fn unmount(mut self) {
        self.loop_sub.release();
        self.info_sub.release();
        self.balance_sub.release();
    }
}

/// View over one currency's wallet
///
/// Owns the per-instance refresh channel, the availability tracker, and
/// the deposit panel when it is open. Dropping the view releases whatever
/// is still mounted.
pub struct WalletView {
    currency: String,
    api: Arc<dyn NodeApi>,
    effects: Arc<dyn ViewEffects>,
    refresh: RefreshChannel,
    availability: watch::Receiver<AvailabilityState>,
    availability_sub: Subscription,
    info_feed: SharedFeed<NodeInfo>,
    deposit: Option<DepositView>,
}

impl WalletView {
    /// Currency this view belongs to
    pub fn currency(&self) -> &str {
        &self.currency
    }

    /// Watch handle over the availability state
    pub fn availability(&self) -> watch::Receiver<AvailabilityState> {
        self.availability.clone()
    }

    /// Open the deposit panel; a no-op when it is already open
    pub fn open_deposit(&mut self) {
        if self.deposit.is_none() {
            self.deposit = Some(DepositView::mount(
                self.api.clone(),
                self.effects.clone(),
                self.currency.clone(),
                self.refresh.clone(),
                self.info_feed.subscribe(),
            ));
        }
    }

    /// Close the deposit panel, releasing its subscriptions
    pub fn close_deposit(&mut self) {
        if let Some(view) = self.deposit.take() {
            view.unmount();
        }
    }

    /// Watch handle over the open deposit panel's state
    pub fn deposit_state(&self) -> Option<watch::Receiver<DepositState>> {
        self.deposit.as_ref().map(DepositView::state)
    }

    /// Manual refresh trigger for the deposit descriptor
    pub fn refresh_deposit(&self) {
        self.refresh.trigger();
    }

    /// Tear the view down; the deposit panel goes with it
    pub fn unmount(mut self) {
        self.close_deposit();
        self.availability_sub.release();
    }
}
