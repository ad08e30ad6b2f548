//! Balance Types
//!
//! Payload of the proxy's balance endpoint: one entry per currency with the
//! usual lnd split between on-chain and channel funds, in satoshis.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Balance of one currency's wallet
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WalletBalance {
    /// Channel plus wallet balance
    pub total_balance: u64,
    /// Funds committed to channels
    pub channel_balance: u64,
    /// On-chain funds
    pub wallet_balance: u64,
}

/// Balances for every currency the node manages
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BalanceSnapshot {
    /// Entries keyed by currency ticker
    #[serde(default)]
    pub balances: BTreeMap<String, WalletBalance>,
}

impl BalanceSnapshot {
    /// Whether the snapshot carries no entries at all
    pub fn is_empty(&self) -> bool {
        self.balances.is_empty()
    }

    /// Whether any currency holds a non-zero total balance
    pub fn has_any_funds(&self) -> bool {
        self.balances.values().any(|b| b.total_balance > 0)
    }

    /// Balance entry for a currency, matched case-insensitively
    pub fn balance_of(&self, currency: &str) -> Option<&WalletBalance> {
        self.balances
            .iter()
            .find(|(ticker, _)| ticker.eq_ignore_ascii_case(currency))
            .map(|(_, balance)| balance)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_has_any_funds() {
        let mut snapshot = BalanceSnapshot::default();
        assert!(snapshot.is_empty());
        assert!(!snapshot.has_any_funds());

        snapshot
            .balances
            .insert("BTC".to_string(), WalletBalance::default());
        assert!(!snapshot.is_empty());
        assert!(!snapshot.has_any_funds());

        snapshot.balances.insert(
            "LTC".to_string(),
            WalletBalance {
                total_balance: 5_000,
                channel_balance: 0,
                wallet_balance: 5_000,
            },
        );
        assert!(snapshot.has_any_funds());
    }

    #[test]
    fn test_balance_lookup_is_case_insensitive() {
        let json = r#"{"balances":{"BTC":{"totalBalance":100,"channelBalance":40,"walletBalance":60}}}"#;
        let snapshot: BalanceSnapshot = serde_json::from_str(json).unwrap();

        assert_eq!(snapshot.balance_of("btc").unwrap().total_balance, 100);
        assert_eq!(snapshot.balance_of("BTC").unwrap().channel_balance, 40);
        assert!(snapshot.balance_of("ltc").is_none());
    }
}
