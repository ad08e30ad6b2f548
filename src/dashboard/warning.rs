//! Setup Warning Probe
//!
//! Decides once per mount whether the setup warning banner may be
//! dismissed. The first non-empty balance snapshot settles it: wallets
//! holding no funds make the warning dismissible, funded wallets keep it
//! pinned until setup is completed.

use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tracing::debug;

use crate::client::NodeApi;
use crate::poll::{poll_first_match, Gate, Subscription};

/// Published warning banner state
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SetupWarning {
    /// Whether the banner carries a dismiss control
    pub dismissible: bool,
}

/// One-shot probe behind the setup warning banner
pub struct SetupWarningProbe {
    state: watch::Receiver<SetupWarning>,
    probe_sub: Subscription,
    loop_sub: Subscription,
}

impl SetupWarningProbe {
    /// Start probing wallet balances
    pub fn mount(api: Arc<dyn NodeApi>, every: Duration) -> Self {
        let balance_api = api.clone();
        let (probe_sub, mut probe_rx) = poll_first_match(
            "setup-warning",
            every,
            move || {
                let api = balance_api.clone();
                async move { api.get_balance().await }
            },
            |snapshot| !snapshot.is_empty(),
        );

        let (state_tx, state) = watch::channel(SetupWarning::default());
        let gate = Gate::new();
        let loop_gate = gate.clone();

        let task = tokio::spawn(async move {
            tokio::select! {
                biased;
                _ = loop_gate.closed() => {}
                snapshot = probe_rx.recv() => {
                    if let Some(snapshot) = snapshot {
                        if !snapshot.has_any_funds() {
                            debug!("wallets are empty, setup warning can be dismissed");
                            let _ = state_tx.send(SetupWarning { dismissible: true });
                        }
                    }
                }
            }
        });

        Self {
            state,
            probe_sub,
            loop_sub: Subscription::new("setup-warning-view", gate, task),
        }
    }

    /// Watch handle over the warning state
    pub fn state(&self) -> watch::Receiver<SetupWarning> {
        self.state.clone()
    }

    /// Tear the probe down
    pub fn unmount(mut self) {
        self.loop_sub.release();
        self.probe_sub.release();
    }
}
