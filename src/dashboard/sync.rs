//! Sync Monitor
//!
//! Merges the per-service status poll with the setup-status stream into one
//! readiness signal. While the light clients sync, setup progress records
//! feed an explanatory message; once both lnd instances report ready, the
//! setup stream is cut over and never consumed again. The status poll keeps
//! running for the service overview.

use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tracing::{error, info, warn};

use super::ViewEffects;
use crate::client::NodeApi;
use crate::poll::{map, merge, spawn_poller, Gate, PollOutcome, Subscription};
use crate::types::{status_of, ServiceStatus, SetupStatus, SERVICE_LNDBTC, SERVICE_LNDLTC};

/// First detail row shown while the initial sync runs
const WAITING_FOR_SYNC: &str = "Waiting for initial sync...";

/// Published dashboard state
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DashboardState {
    /// Whether the light-client sync is still in progress
    pub sync_in_progress: bool,
    /// Explanatory rows for the sync tooltip, empty once sync is over
    pub sync_detail: Vec<String>,
    /// Latest status of every managed service, for the overview cards
    pub services: Vec<ServiceStatus>,
    /// Whether both lnd instances have reported ready this mount
    pub ready: bool,
}

/// State machine behind the dashboard view
///
/// Pure event handlers; the view wires them to the sources.
#[derive(Debug, Default)]
pub struct SyncMonitor {
    state: DashboardState,
}

impl SyncMonitor {
    /// Create a monitor in the pre-sync state
    pub fn new() -> Self {
        Self::default()
    }

    /// Current state snapshot
    pub fn state(&self) -> &DashboardState {
        &self.state
    }

    /// Apply one status poll cycle.
    ///
    /// Returns true when this cycle flipped the monitor to ready; that
    /// happens at most once per mount.
    pub fn on_statuses(&mut self, statuses: Vec<ServiceStatus>) -> bool {
        self.state.services = statuses;
        if self.state.ready {
            return false;
        }

        // duplicates within a cycle use the first entry; a missing service
        // classifies as not ready
        let lndbtc_ready = status_of(&self.state.services, SERVICE_LNDBTC)
            .map(ServiceStatus::is_ready)
            .unwrap_or(false);
        let lndltc_ready = status_of(&self.state.services, SERVICE_LNDLTC)
            .map(ServiceStatus::is_ready)
            .unwrap_or(false);

        if lndbtc_ready && lndltc_ready {
            self.state.ready = true;
            self.complete_sync();
            true
        } else {
            false
        }
    }

    /// Apply one setup progress record
    pub fn on_setup_progress(&mut self, record: &SetupStatus) {
        if self.state.ready {
            return;
        }
        if record.is_light_client_sync() {
            self.state.sync_in_progress = true;
            self.state.sync_detail = vec![
                WAITING_FOR_SYNC.to_string(),
                format!("Bitcoin: {}", record.detail(SERVICE_LNDBTC).unwrap_or_default()),
                format!("Litecoin: {}", record.detail(SERVICE_LNDLTC).unwrap_or_default()),
            ];
        }
    }

    /// The setup stream ended on its own
    pub fn on_setup_complete(&mut self) {
        self.complete_sync();
    }

    fn complete_sync(&mut self) {
        self.state.sync_in_progress = false;
        self.state.sync_detail.clear();
    }
}

/// Both sources tagged into the one feed the dashboard loop folds
enum DashboardEvent {
    Statuses(PollOutcome<Vec<ServiceStatus>>),
    Setup(PollOutcome<Option<SetupStatus>>),
}

/// Mounted dashboard view
///
/// Owns the status poll, the setup-status poll, and the event loop folding
/// them into `DashboardState`.
pub struct DashboardView {
    state: watch::Receiver<DashboardState>,
    loop_sub: Subscription,
    statuses_sub: Subscription,
}

impl DashboardView {
    /// Start polling and return the mounted view
    pub fn mount(
        api: Arc<dyn NodeApi>,
        effects: Arc<dyn ViewEffects>,
        status_every: Duration,
        setup_every: Duration,
    ) -> Self {
        let statuses_api = api.clone();
        let (statuses_sub, statuses_rx) = spawn_poller("statuses", status_every, move || {
            let api = statuses_api.clone();
            async move { api.get_statuses().await }
        });

        let setup_api = api;
        let (setup_sub, setup_rx) = spawn_poller("setup-status", setup_every, move || {
            let api = setup_api.clone();
            async move { api.get_setup_status().await }
        });

        let mut feed = merge(vec![
            map(statuses_rx, DashboardEvent::Statuses),
            map(setup_rx, DashboardEvent::Setup),
        ]);

        let (state_tx, state_rx) = watch::channel(DashboardState::default());
        let gate = Gate::new();
        let loop_gate = gate.clone();

        let task = tokio::spawn(async move {
            let mut monitor = SyncMonitor::new();
            let mut setup_sub = Some(setup_sub);

            loop {
                tokio::select! {
                    // teardown outranks anything already buffered
                    biased;

                    _ = loop_gate.closed() => return,

                    event = feed.recv() => {
                        let Some(event) = event else { return };
                        match event {
                            DashboardEvent::Statuses(Ok(statuses)) => {
                                if monitor.on_statuses(statuses) {
                                    info!("lnd clients ready, releasing setup-status stream");
                                    if let Some(mut sub) = setup_sub.take() {
                                        sub.release();
                                    }
                                }
                            }
                            // transient; the next tick retries
                            DashboardEvent::Statuses(Err(err)) => warn!("status poll failed: {err}"),

                            // stragglers still in the feed after the cutover
                            DashboardEvent::Setup(_) if setup_sub.is_none() => continue,
                            DashboardEvent::Setup(Ok(Some(record))) => {
                                monitor.on_setup_progress(&record)
                            }
                            DashboardEvent::Setup(Ok(None)) => {
                                info!("setup phase over");
                                monitor.on_setup_complete();
                                if let Some(mut sub) = setup_sub.take() {
                                    sub.release();
                                }
                            }
                            DashboardEvent::Setup(Err(err)) => {
                                // fatal to this view, not retried
                                error!("setup-status stream failed: {err}");
                                effects.navigate_to_failure(&err.to_string());
                                if let Some(mut sub) = setup_sub.take() {
                                    sub.release();
                                }
                            }
                        }
                        let _ = state_tx.send(monitor.state().clone());
                    }
                }
            }
        });

        Self {
            state: state_rx,
            loop_sub: Subscription::new("dashboard", gate, task),
            statuses_sub,
        }
    }

    /// Watch handle over the published state
    pub fn state(&self) -> watch::Receiver<DashboardState> {
        self.state.clone()
    }

    /// Tear the view down; every subscription it started is released
    pub fn unmount(mut self) {
        self.loop_sub.release();
        self.statuses_sub.release();
    }
}
