//! Reactive Polling Core
//!
//! The machinery every dashboard view is built from: cancellable polling
//! sources, event combinators, the shared refresh trigger, and the
//! subscription guard that keeps released streams silent.

pub mod events;
pub mod refresh;
pub mod source;
pub mod subscription;

// Re-exports for convenience
pub use events::{broadcast_events, filter, map, merge};
pub use refresh::{drain_pending, RefreshChannel};
pub use source::{poll_first_match, spawn_poller, PollOutcome};
pub use subscription::{Gate, Subscription};
