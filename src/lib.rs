//! dexdash - Reactive Dashboard Core for OpenDEX Nodes
//!
//! Polling and subscription orchestration for a dashboard over a remote
//! opendexd node and its wallet services. The UI layer is swappable; this
//! crate owns everything between the HTTP API and the rendered state:
//!
//! ## Views
//!
//! 1. **DashboardView** - Aggregates lnd service statuses into a single
//!    readiness state and relays setup progress until the node is ready
//! 2. **Wallets / WalletView** - Shared info, boltz, and balance feeds plus
//!    per-currency availability tracking
//! 3. **DepositView** - Deposit address lifecycle with refresh broadcasts
//!    and block-height expiry
//! 4. **SetupWarningProbe** - One-shot dismissibility decision for the
//!    setup warning banner
//!
//! Every view publishes immutable state snapshots over `tokio::sync::watch`
//! and tears down through [`poll::Subscription`] handles, so a release is
//! final even when a request is still in flight.

// Core modules
pub mod client;
pub mod config;
pub mod dashboard;
pub mod error;
pub mod logging;
pub mod poll;
pub mod types;

// Re-exports: API client
pub use client::{ApiError, ApiResult, NodeApi, NodeApiClient};

// Re-exports: Configuration
pub use config::{Config, ConfigError};

// Re-exports: Root error
pub use error::DashError;

// Re-exports: Polling primitives
pub use poll::{Gate, PollOutcome, RefreshChannel, Subscription};

// Re-exports: Views
pub use dashboard::{
    AvailabilityState, DashboardState, DashboardView, DepositPhase, DepositState, DepositView,
    SetupWarning, SetupWarningProbe, ViewEffects, WalletView, Wallets,
};
