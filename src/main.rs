//! dexdash CLI
//!
//! Headless dashboard over an OpenDEX node. Mounts the full view graph and
//! logs every state transition; the UI shell would consume the same watch
//! channels instead.
//!
//! Run modes:
//!   dexdash run      - Mount the dashboard and log state transitions
//!   dexdash status   - One-shot service status dump

use clap::{Parser, Subcommand};
use dexdash::dashboard::{
    AvailabilityState, DashboardState, DashboardView, DepositPhase, DepositState,
    SetupWarningProbe, ViewEffects, WalletView, Wallets,
};
use dexdash::types::units::{format_balance, sats_to_coins_string};
use dexdash::{Config, DashError, NodeApi, NodeApiClient};
use std::sync::Arc;
use tokio::sync::broadcast::error::RecvError;
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

#[derive(Parser)]
#[command(name = "dexdash")]
#[command(about = "Headless dashboard over an OpenDEX node")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Mount the dashboard and log state transitions
    Run {
        /// Node API base URL
        #[arg(short, long, env = "DEXDASH_NODE_URL")]
        node_url: Option<String>,

        /// Emit JSON logs
        #[arg(long)]
        json_logs: bool,
    },

    /// One-shot service status dump
    Status {
        /// Node API base URL
        #[arg(short, long, env = "DEXDASH_NODE_URL")]
        node_url: Option<String>,
    },
}

#[tokio::main]
async fn main() -> Result<(), DashError> {
    dotenv::dotenv().ok();

    let cli = Cli::parse();

    match cli.command {
        Commands::Run {
            node_url,
            json_logs,
        } => run_dashboard(node_url, json_logs).await,
        Commands::Status { node_url } => run_status(node_url).await,
    }
}

/// Effects sink for the headless shell
///
/// Navigation to the connection-failed screen becomes a fatal signal that
/// tears the process down with a non-zero exit.
struct ShellEffects {
    fatal: mpsc::UnboundedSender<String>,
}

impl ViewEffects for ShellEffects {
    fn navigate_to_failure(&self, cause: &str) {
        error!("leaving dashboard: {}", cause);
        let _ = self.fatal.send(cause.to_string());
    }

    fn notify_address_updated(&self, currency: &str) {
        info!("{}: deposit address updated", currency);
    }
}

async fn run_dashboard(node_url: Option<String>, json_logs: bool) -> Result<(), DashError> {
    let mut config = Config::from_env()?;
    if let Some(url) = node_url {
        config.node_url = url;
    }
    if json_logs {
        config.json_logs = true;
    }

    dexdash::logging::init_from_config(&config)?;

    println!("=== dexdash ===");
    println!();
    println!("Node URL: {}", config.node_url);
    println!("Currencies: {}", config.currencies.join(", "));
    println!();
    println!("Press Ctrl+C to stop");
    println!();

    let api: Arc<dyn NodeApi> = Arc::new(NodeApiClient::new(&config.node_url));
    let (fatal_tx, mut fatal_rx) = mpsc::unbounded_channel();
    let effects: Arc<dyn ViewEffects> = Arc::new(ShellEffects { fatal: fatal_tx });

    let dashboard = DashboardView::mount(
        api.clone(),
        effects.clone(),
        config.status_interval,
        config.setup_interval,
    );
    let wallets = Wallets::mount(
        api.clone(),
        effects.clone(),
        config.info_interval,
        config.boltz_interval,
        config.balance_interval,
    );
    let mut views: Vec<WalletView> = config
        .currencies
        .iter()
        .map(|currency| wallets.wallet_view(currency.clone()))
        .collect();
    for view in &mut views {
        view.open_deposit();
    }
    let probe = SetupWarningProbe::mount(api.clone(), config.balance_interval);

    log_dashboard_changes(&dashboard);
    for view in &views {
        log_availability_changes(view);
        log_deposit_changes(view);
    }
    log_balance_changes(&wallets);
    log_warning_decision(&probe);

    let fatal_cause = tokio::select! {
        res = tokio::signal::ctrl_c() => {
            if let Err(e) = res {
                warn!("ctrl-c handler failed: {}", e);
            }
            info!("shutting down");
            None
        }
        cause = fatal_rx.recv() => cause,
    };

    for view in views {
        view.unmount();
    }
    wallets.unmount();
    dashboard.unmount();
    probe.unmount();

    match fatal_cause {
        Some(cause) => Err(DashError::Fatal(cause)),
        None => {
            info!("dashboard closed");
            Ok(())
        }
    }
}

/// Log sync progress and the readiness transition
fn log_dashboard_changes(dashboard: &DashboardView) {
    let mut state_rx = dashboard.state();
    tokio::spawn(async move {
        let mut last = DashboardState::default();
        while state_rx.changed().await.is_ok() {
            let state = state_rx.borrow().clone();
            if state == last {
                continue;
            }
            if state.ready && !last.ready {
                info!("node is ready");
            }
            if state.sync_in_progress && state.sync_detail != last.sync_detail {
                for line in &state.sync_detail {
                    info!("syncing: {}", line);
                }
            }
            last = state;
        }
    });
}

/// Log swap availability transitions for one wallet
fn log_availability_changes(view: &WalletView) {
    let currency = view.currency().to_string();
    let mut state_rx = view.availability();
    tokio::spawn(async move {
        let mut last: Option<AvailabilityState> = None;
        while state_rx.changed().await.is_ok() {
            let state = state_rx.borrow().clone();
            if last.as_ref() == Some(&state) {
                continue;
            }
            if state.usable {
                info!("{}: swaps available", currency);
            } else {
                info!("{}: swaps unavailable ({})", currency, state.reason);
            }
            last = Some(state);
        }
    });
}

/// Log the deposit address lifecycle for one wallet
fn log_deposit_changes(view: &WalletView) {
    let currency = view.currency().to_string();
    let Some(mut state_rx) = view.deposit_state() else {
        return;
    };
    tokio::spawn(async move {
        let mut last: Option<DepositState> = None;
        while state_rx.changed().await.is_ok() {
            let state = state_rx.borrow().clone();
            if last.as_ref() == Some(&state) {
                continue;
            }
            match state.phase() {
                DepositPhase::Loading => debug!("{}: fetching deposit address", currency),
                DepositPhase::Ready => log_deposit_ready(&currency, &state),
                DepositPhase::ExpiredRefreshing => info!(
                    "{}: deposit address hit its validity bound, replacing it",
                    currency
                ),
                DepositPhase::Error => {
                    if let Some(cause) = &state.error {
                        warn!("{}: deposit unavailable: {}", currency, cause);
                    }
                }
            }
            last = Some(state);
        }
    });
}

/// Render the deposit line the way the wallet panel shows it
fn log_deposit_ready(currency: &str, state: &DepositState) {
    let Some(descriptor) = &state.descriptor else {
        return;
    };
    match state.wait_estimate(currency) {
        Some(wait) => info!(
            "{}: deposit between {} and {} {} to {} in the next ~{} (block height {})",
            currency,
            sats_to_coins_string(descriptor.limits.minimal),
            sats_to_coins_string(descriptor.limits.maximal),
            currency,
            descriptor.address,
            wait,
            descriptor.timeout_block_height
        ),
        // no height observed yet, so no window to put on the line
        None => info!("{}: deposit to {}", currency, descriptor.address),
    }
}

/// Log balances as they come in
fn log_balance_changes(wallets: &Wallets) {
    let mut balances = wallets.balances();
    tokio::spawn(async move {
        let mut last = None;
        loop {
            match balances.recv().await {
                Ok(Ok(snapshot)) => {
                    if last.as_ref() == Some(&snapshot) {
                        continue;
                    }
                    for (ticker, balance) in &snapshot.balances {
                        debug!("{}: {}", ticker, format_balance(balance.total_balance, ticker));
                    }
                    last = Some(snapshot);
                }
                Ok(Err(cause)) => warn!("balance poll failed: {}", cause),
                Err(RecvError::Lagged(_)) => continue,
                Err(RecvError::Closed) => break,
            }
        }
    });
}

/// Log the setup warning decision if one arrives
fn log_warning_decision(probe: &SetupWarningProbe) {
    let mut state_rx = probe.state();
    tokio::spawn(async move {
        if state_rx.changed().await.is_ok() && state_rx.borrow().dismissible {
            info!("wallets are empty, setup warning can be dismissed");
        }
    });
}

async fn run_status(node_url: Option<String>) -> Result<(), DashError> {
    let mut config = Config::from_env()?;
    if let Some(url) = node_url {
        config.node_url = url;
    }

    let client = NodeApiClient::new(&config.node_url);
    let statuses = client.get_statuses().await?;

    for status in statuses {
        println!("{}", status);
    }

    Ok(())
}
