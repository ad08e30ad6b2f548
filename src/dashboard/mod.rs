//! Dashboard Views
//!
//! View-level orchestration over the polling core: each view mounts its
//! sources, folds their events into published state, and releases every
//! subscription exactly once on unmount.

pub mod availability;
pub mod deposit;
pub mod estimate;
pub mod sync;
pub mod wallet;
pub mod warning;

// Re-exports for convenience
pub use availability::{AvailabilityState, AvailabilityTracker};
pub use deposit::{DepositMonitor, DepositPhase, DepositState, DepositView};
pub use estimate::{estimate_minutes, format_wait, format_wait_minutes};
pub use sync::{DashboardState, DashboardView, SyncMonitor};
pub use wallet::{SharedFeed, WalletView, Wallets};
pub use warning::{SetupWarning, SetupWarningProbe};

/// Actions the views hand off to the surrounding shell
pub trait ViewEffects: Send + Sync {
    /// Leave the dashboard for the connection-failed screen
    fn navigate_to_failure(&self, cause: &str);

    /// Surface a one-time notice that a deposit address was replaced
    fn notify_address_updated(&self, currency: &str);
}
