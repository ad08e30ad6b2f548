//! Unit Formatting Utilities
//!
//! Display helpers for satoshi-denominated amounts. Both chains the
//! dashboard cares about use 10^8 subunits per coin.

/// Subunits per whole coin
pub const SUBUNITS_PER_COIN: u64 = 100_000_000;

/// Format a satoshi amount as a fixed 8-decimal coin string
pub fn sats_to_coins_string(sats: u64) -> String {
    let whole = sats / SUBUNITS_PER_COIN;
    let frac = sats % SUBUNITS_PER_COIN;
    format!("{}.{:08}", whole, frac)
}

/// Render a balance line for a currency
/// e.g., 1500000, "BTC" -> "1,500,000 sats (0.01500000 BTC)"
pub fn format_balance(sats: u64, ticker: &str) -> String {
    format!(
        "{} sats ({} {})",
        format_with_commas(sats),
        sats_to_coins_string(sats),
        ticker
    )
}

/// Format number with thousands separators
fn format_with_commas(n: u64) -> String {
    let digits = n.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sats_to_coins_string() {
        assert_eq!(sats_to_coins_string(0), "0.00000000");
        assert_eq!(sats_to_coins_string(1), "0.00000001");
        assert_eq!(sats_to_coins_string(100_000_000), "1.00000000");
        assert_eq!(sats_to_coins_string(123_456_789), "1.23456789");
    }

    #[test]
    fn test_format_balance() {
        let line = format_balance(1_500_000, "BTC");
        assert_eq!(line, "1,500,000 sats (0.01500000 BTC)");

        let line = format_balance(42, "LTC");
        assert_eq!(line, "42 sats (0.00000042 LTC)");
    }
}
