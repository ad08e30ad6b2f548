//! Shared Types Module
//!
//! Wire payload models for the node proxy API, shared across the dashboard.

pub mod balance;
pub mod deposit;
pub mod info;
pub mod status;
pub mod units;

// Re-exports for convenience
pub use balance::{BalanceSnapshot, WalletBalance};
pub use deposit::{DepositDescriptor, DepositFees, DepositLimits};
pub use info::{ChainInfo, NodeInfo, NETWORK_SIMNET};
pub use status::{
    status_of, ServiceStatus, SetupStatus, READY_TOKEN, SERVICE_BOLTZ, SERVICE_LNDBTC,
    SERVICE_LNDLTC, SYNCING_LIGHT_CLIENTS,
};
pub use units::{format_balance, sats_to_coins_string, SUBUNITS_PER_COIN};
