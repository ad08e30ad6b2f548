//! Node Proxy API Client
//!
//! HTTP client for the proxy that fronts the node stack, plus the `NodeApi`
//! trait the dashboard views poll through. Views depend on the trait so
//! tests can script the remote side.

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;
use thiserror::Error;

#[cfg(test)]
use mockall::automock;

use crate::types::{BalanceSnapshot, DepositDescriptor, NodeInfo, ServiceStatus, SetupStatus};

/// API errors
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("endpoint returned {status}: {message}")]
    Endpoint { status: u16, message: String },

    #[error("failed to parse response: {0}")]
    Parse(String),
}

/// Result type for API operations
pub type ApiResult<T> = Result<T, ApiError>;

/// Remote operations the dashboard polls
///
/// Implementations:
/// - `NodeApiClient` - HTTP client against the node proxy
/// - scripted fakes in tests
#[cfg_attr(test, automock)]
#[async_trait]
pub trait NodeApi: Send + Sync {
    /// Status of every managed service
    async fn get_statuses(&self) -> ApiResult<Vec<ServiceStatus>>;

    /// Next setup progress record, `Ok(None)` once the setup phase is over
    /// and the stream has ended
    async fn get_setup_status(&self) -> ApiResult<Option<SetupStatus>>;

    /// Fresh deposit descriptor for a currency
    async fn get_deposit_address(&self, currency: &str) -> ApiResult<DepositDescriptor>;

    /// Node info with per-chain block heights
    async fn get_info(&self) -> ApiResult<NodeInfo>;

    /// Status of the swap service daemon
    async fn get_boltz_status(&self) -> ApiResult<ServiceStatus>;

    /// Balances for every currency
    async fn get_balance(&self) -> ApiResult<BalanceSnapshot>;
}

/// HTTP client for the node proxy
#[derive(Debug, Clone)]
pub struct NodeApiClient {
    client: Client,
    base_url: String,
}

impl NodeApiClient {
    /// Create a new client against a proxy base URL
    pub fn new(base_url: &str) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    /// Get the base URL
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}/api/v1/{}", self.base_url, path)
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> ApiResult<T> {
        let resp = self.client.get(self.url(path)).send().await?;
        let status = resp.status();

        if !status.is_success() {
            return Err(endpoint_error(status, resp.text().await.unwrap_or_default()));
        }

        resp.json().await.map_err(|e| ApiError::Parse(e.to_string()))
    }
}

fn endpoint_error(status: StatusCode, body: String) -> ApiError {
    let message = if body.trim().is_empty() {
        status
            .canonical_reason()
            .unwrap_or("unexpected status")
            .to_string()
    } else {
        body
    };
    ApiError::Endpoint {
        status: status.as_u16(),
        message,
    }
}

#[async_trait]
impl NodeApi for NodeApiClient {
    async fn get_statuses(&self) -> ApiResult<Vec<ServiceStatus>> {
        self.get_json("status").await
    }

    async fn get_setup_status(&self) -> ApiResult<Option<SetupStatus>> {
        let resp = self.client.get(self.url("setup-status")).send().await?;
        let status = resp.status();

        // The proxy retires this endpoint once setup is over.
        if matches!(
            status,
            StatusCode::NO_CONTENT | StatusCode::NOT_FOUND | StatusCode::GONE
        ) {
            return Ok(None);
        }

        if !status.is_success() {
            return Err(endpoint_error(status, resp.text().await.unwrap_or_default()));
        }

        let record = resp.json().await.map_err(|e| ApiError::Parse(e.to_string()))?;
        Ok(Some(record))
    }

    async fn get_deposit_address(&self, currency: &str) -> ApiResult<DepositDescriptor> {
        self.get_json(&format!("boltz/deposit/{}", currency.to_lowercase()))
            .await
    }

    async fn get_info(&self) -> ApiResult<NodeInfo> {
        self.get_json("getinfo").await
    }

    async fn get_boltz_status(&self) -> ApiResult<ServiceStatus> {
        self.get_json("boltz/status").await
    }

    async fn get_balance(&self) -> ApiResult<BalanceSnapshot> {
        self.get_json("balance").await
    }
}
