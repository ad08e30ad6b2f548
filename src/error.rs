//! Root Error Type
//!
//! Aggregates the per-concern errors for the binary's `?` chains.

use thiserror::Error;

/// Root error type for the dashboard
#[derive(Debug, Error)]
pub enum DashError {
    /// Configuration errors
    #[error("configuration error: {0}")]
    Config(#[from] crate::config::ConfigError),

    /// Logging errors
    #[error("logging error: {0}")]
    Logging(#[from] crate::logging::LoggingError),

    /// Node API errors
    #[error("API error: {0}")]
    Api(#[from] crate::client::ApiError),

    /// Fatal dashboard failure surfaced by a view
    #[error("dashboard failure: {0}")]
    Fatal(String),
}
