//! Node Info Types
//!
//! Payload of the proxy's `getinfo` endpoint: the network mode plus one
//! block-height entry per chain. This is the only source of current block
//! heights for the deposit expiry checks.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Network mode in which deposits via the swap service are not offered
pub const NETWORK_SIMNET: &str = "simnet";

/// Per-chain info entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChainInfo {
    /// Best block height known to the chain backend
    pub blockheight: u64,
}

/// Node info snapshot
///
/// The wire shape keys each chain entry by its currency ticker next to the
/// `network` field, e.g. `{"network":"mainnet","btc":{"blockheight":1}}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeInfo {
    /// Network mode (mainnet, testnet, simnet)
    pub network: String,
    /// Chain entries keyed by currency ticker
    #[serde(flatten)]
    pub chains: BTreeMap<String, ChainInfo>,
}

impl NodeInfo {
    /// Whether the node runs in simnet mode
    pub fn is_simnet(&self) -> bool {
        self.network.eq_ignore_ascii_case(NETWORK_SIMNET)
    }

    /// Block height for a currency, matched case-insensitively
    pub fn height_of(&self, currency: &str) -> Option<u64> {
        self.chains
            .iter()
            .find(|(ticker, _)| ticker.eq_ignore_ascii_case(currency))
            .map(|(_, chain)| chain.blockheight)
    }
}
