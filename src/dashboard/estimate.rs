//! Deposit Wait Estimates
//!
//! Rough time-to-expiry figures derived from per-chain average block
//! intervals: 10 minutes per block on Bitcoin, 2.5 on Litecoin.

/// Estimated minutes until height `end` is reached from `start`.
///
/// `None` for currencies without a known block interval; callers render
/// that as unknown, never as zero.
pub fn estimate_minutes(start: u64, end: u64, currency: &str) -> Option<u64> {
    let blocks = end.saturating_sub(start);
    match currency {
        "BTC" => Some(blocks * 10),
        "LTC" => Some((blocks as f64 * 2.5).round() as u64),
        _ => None,
    }
}

/// Render a minute count as "H hours M minutes"
pub fn format_wait_minutes(minutes: u64) -> String {
    let hours = minutes / 60;
    let remaining = minutes % 60;
    if hours > 0 && remaining > 0 {
        format!("{} hours {} minutes", hours, remaining)
    } else if hours > 0 {
        format!("{} hours", hours)
    } else {
        format!("{} minutes", remaining)
    }
}

/// Render an optional estimate, with unknown currencies spelled out
pub fn format_wait(estimate: Option<u64>) -> String {
    match estimate {
        Some(minutes) => format_wait_minutes(minutes),
        None => "unknown".to_string(),
    }
}
