//! Service Status Types
//!
//! Status payloads reported by the node proxy for the services it manages
//! (xud, lndbtc, lndltc, boltz, ...). The daemons emit free-text state
//! labels, so readiness is derived by substring match rather than an enum.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Token that marks a service label as ready, e.g. "Ready", "Ready (syncing)".
pub const READY_TOKEN: &str = "Ready";

/// Multi-currency node service name for the Bitcoin lnd instance
pub const SERVICE_LNDBTC: &str = "lndbtc";

/// Multi-currency node service name for the Litecoin lnd instance
pub const SERVICE_LNDLTC: &str = "lndltc";

/// Swap service daemon name
pub const SERVICE_BOLTZ: &str = "boltz";

/// Setup phase label reported while the light clients are syncing
pub const SYNCING_LIGHT_CLIENTS: &str = "Syncing light clients";

/// Status of a single managed service
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceStatus {
    /// Service identifier (e.g. "lndbtc")
    pub service: String,
    /// Free-text state label (e.g. "Ready", "Syncing 53%")
    pub status: String,
}

impl ServiceStatus {
    /// Create a status entry
    pub fn new(service: impl Into<String>, status: impl Into<String>) -> Self {
        Self {
            service: service.into(),
            status: status.into(),
        }
    }

    /// Whether the label classifies as ready
    pub fn is_ready(&self) -> bool {
        self.status.contains(READY_TOKEN)
    }
}

impl std::fmt::Display for ServiceStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.service, self.status)
    }
}

/// First status entry for a service within one poll cycle.
///
/// A cycle may carry duplicate rows for a service; only the first one is
/// meaningful.
pub fn status_of<'a>(statuses: &'a [ServiceStatus], service: &str) -> Option<&'a ServiceStatus> {
    statuses.iter().find(|s| s.service == service)
}

/// Progress record from the setup-status stream.
///
/// Emitted while the node stack is still bootstrapping; the stream ends on
/// its own once setup is over.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SetupStatus {
    /// Phase label, e.g. "Syncing light clients"
    pub status: String,
    /// Per-service progress details keyed by service name
    #[serde(default)]
    pub details: BTreeMap<String, String>,
}

impl SetupStatus {
    /// Whether this record reports the light-client sync phase
    pub fn is_light_client_sync(&self) -> bool {
        self.status == SYNCING_LIGHT_CLIENTS
    }

    /// Progress detail for one service, if reported
    pub fn detail(&self, service: &str) -> Option<&str> {
        self.details.get(service).map(String::as_str)
    }
}
