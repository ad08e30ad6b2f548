//! Environment-based Configuration
//!
//! Loads dashboard settings from environment variables. Every variable has
//! a working default so a plain `dexdash run` against a local node needs no
//! setup at all.
//!
//! # Environment Variables
//!
//! ## Node Connection
//! - `DEXDASH_NODE_URL` - Base URL of the node API (default: "http://localhost:8866")
//!
//! ## Poll Intervals (seconds, must be positive)
//! - `DEXDASH_STATUS_INTERVAL_SECS` - Service status poll (default: 5)
//! - `DEXDASH_SETUP_INTERVAL_SECS` - Setup status poll (default: 2)
//! - `DEXDASH_INFO_INTERVAL_SECS` - Node info poll (default: 5)
//! - `DEXDASH_BOLTZ_INTERVAL_SECS` - Boltz status poll (default: 5)
//! - `DEXDASH_BALANCE_INTERVAL_SECS` - Balance poll (default: 1)
//!
//! ## Wallets
//! - `DEXDASH_CURRENCIES` - Comma-separated currency tickers (default: "BTC,LTC")
//!
//! ## Logging
//! - `DEXDASH_LOG_LEVEL` - Logging level (trace, debug, info, warn, error)
//! - `DEXDASH_JSON_LOGS` - Set to "1" for JSON log output

use std::env;
use std::time::Duration;
use thiserror::Error;

/// Configuration errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid value for {0}: {1}")]
    InvalidValue(String, String),
}

/// Main configuration struct
#[derive(Debug, Clone)]
pub struct Config {
    /// Base URL of the node API
    pub node_url: String,

    /// Service status poll interval
    pub status_interval: Duration,

    /// Setup status poll interval
    pub setup_interval: Duration,

    /// Node info poll interval
    pub info_interval: Duration,

    /// Boltz status poll interval
    pub boltz_interval: Duration,

    /// Balance poll interval
    pub balance_interval: Duration,

    /// Currency tickers to mount wallet views for
    pub currencies: Vec<String>,

    /// Log level
    pub log_level: String,

    /// Whether logs are emitted as JSON
    pub json_logs: bool,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        let node_url = env::var("DEXDASH_NODE_URL")
            .unwrap_or_else(|_| "http://localhost:8866".to_string());

        let status_interval =
            parse_interval("DEXDASH_STATUS_INTERVAL_SECS", env_opt("DEXDASH_STATUS_INTERVAL_SECS"), 5)?;
        let setup_interval =
            parse_interval("DEXDASH_SETUP_INTERVAL_SECS", env_opt("DEXDASH_SETUP_INTERVAL_SECS"), 2)?;
        let info_interval =
            parse_interval("DEXDASH_INFO_INTERVAL_SECS", env_opt("DEXDASH_INFO_INTERVAL_SECS"), 5)?;
        let boltz_interval =
            parse_interval("DEXDASH_BOLTZ_INTERVAL_SECS", env_opt("DEXDASH_BOLTZ_INTERVAL_SECS"), 5)?;
        let balance_interval =
            parse_interval("DEXDASH_BALANCE_INTERVAL_SECS", env_opt("DEXDASH_BALANCE_INTERVAL_SECS"), 1)?;

        let currencies = parse_currencies(env_opt("DEXDASH_CURRENCIES"))?;

        let log_level = env::var("DEXDASH_LOG_LEVEL").unwrap_or_else(|_| "info".to_string());
        let json_logs = env::var("DEXDASH_JSON_LOGS").map(|v| v == "1").unwrap_or(false);

        Ok(Self {
            node_url,
            status_interval,
            setup_interval,
            info_interval,
            boltz_interval,
            balance_interval,
            currencies,
            log_level,
            json_logs,
        })
    }
}

fn env_opt(var_name: &str) -> Option<String> {
    env::var(var_name).ok()
}

/// Parse a poll interval; zero is rejected since the timers never fire
fn parse_interval(
    var_name: &str,
    raw: Option<String>,
    default_secs: u64,
) -> Result<Duration, ConfigError> {
    let secs = match raw {
        Some(value) => value.trim().parse::<u64>().map_err(|_| {
            ConfigError::InvalidValue(
                var_name.to_string(),
                format!("must be a number of seconds, got {:?}", value),
            )
        })?,
        None => default_secs,
    };

    if secs == 0 {
        return Err(ConfigError::InvalidValue(
            var_name.to_string(),
            "must be a positive number of seconds".to_string(),
        ));
    }

    Ok(Duration::from_secs(secs))
}

/// Parse the comma-separated currency list, normalized to uppercase tickers
fn parse_currencies(raw: Option<String>) -> Result<Vec<String>, ConfigError> {
    let raw = match raw {
        Some(value) => value,
        None => return Ok(vec!["BTC".to_string(), "LTC".to_string()]),
    };

    let currencies: Vec<String> = raw
        .split(',')
        .map(|ticker| ticker.trim().to_uppercase())
        .filter(|ticker| !ticker.is_empty())
        .collect();

    if currencies.is_empty() {
        return Err(ConfigError::InvalidValue(
            "DEXDASH_CURRENCIES".to_string(),
            format!("no tickers in {:?}", raw),
        ));
    }

    Ok(currencies)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_interval_parsing() {
        assert_eq!(
            parse_interval("X", None, 5).unwrap(),
            Duration::from_secs(5)
        );
        assert_eq!(
            parse_interval("X", Some("30".to_string()), 5).unwrap(),
            Duration::from_secs(30)
        );
        assert!(parse_interval("X", Some("0".to_string()), 5).is_err());
        assert!(parse_interval("X", Some("fast".to_string()), 5).is_err());
    }

    #[test]
    fn test_currency_parsing() {
        assert_eq!(
            parse_currencies(None).unwrap(),
            vec!["BTC".to_string(), "LTC".to_string()]
        );
        assert_eq!(
            parse_currencies(Some("btc, ltc".to_string())).unwrap(),
            vec!["BTC".to_string(), "LTC".to_string()]
        );
        assert!(parse_currencies(Some(" , ".to_string())).is_err());
    }
}
