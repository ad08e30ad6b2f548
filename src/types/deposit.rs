//! Deposit Descriptor Types
//!
//! Payload of the proxy's deposit-address endpoint: the address to pay to,
//! the block height at which it expires, and the amount limits and fees the
//! swap service applies. A descriptor is replaced wholesale by each
//! successful fetch, never patched in place.

use serde::{Deserialize, Serialize};

/// Amount limits for a deposit, in satoshis
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DepositLimits {
    /// Smallest accepted amount
    pub minimal: u64,
    /// Largest accepted amount
    pub maximal: u64,
}

/// Fees the swap service charges on a deposit
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DepositFees {
    /// Service fee as a percentage of the amount
    pub percentage: f64,
    /// Flat lockup miner fee in satoshis
    pub lockup_sats: u64,
}

/// A deposit address with its validity window
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DepositDescriptor {
    /// Swap identifier assigned by the service
    pub id: String,
    /// On-chain address to deposit to
    pub address: String,
    /// Block height at which the address expires
    pub timeout_block_height: u64,
    /// Accepted amount range
    #[serde(default)]
    pub limits: DepositLimits,
    /// Fee schedule
    #[serde(default)]
    pub fees: DepositFees,
}

impl DepositDescriptor {
    /// Whether the validity window has elapsed at the given height
    pub fn is_expired_at(&self, height: u64) -> bool {
        height >= self.timeout_block_height
    }

    /// Blocks left before expiry, zero once the bound is reached
    pub fn blocks_remaining(&self, height: u64) -> u64 {
        self.timeout_block_height.saturating_sub(height)
    }
}
