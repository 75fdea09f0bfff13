//! Node REST API client
//!
//! This module handles:
//! - The [`NodeApi`] boundary the cancellation pipeline talks to
//! - A reqwest implementation against a Waves node's REST API
//! - Racing every request against the run's cancellation token

use async_trait::async_trait;
use log::debug;
use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::future::Future;
use std::time::Duration;
use thiserror::Error;
use tokio_util::sync::CancellationToken;

use crate::account::Address;
use crate::crypto::Digest;
use crate::transaction::LeaseCancel;

/// Node request errors
#[derive(Debug, Error)]
pub enum NodeError {
    #[error("request cancelled")]
    Cancelled,

    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("node responded with status {status}: {body}")]
    Status { status: StatusCode, body: String },

    #[error("failed to decode node response: {0}")]
    Decode(String),
}

/// Current blockchain height
#[derive(Debug, Deserialize)]
pub struct HeightResponse {
    pub height: u64,
}

/// The subset of a block header needed to find the network scheme
#[derive(Debug, Deserialize)]
pub struct BlockHeader {
    /// Base58 address of the block generator
    pub generator: String,
    #[serde(default)]
    pub height: Option<u64>,
}

/// An active lease of the account
#[derive(Clone, Debug, Deserialize)]
pub struct LeaseInfo {
    /// Lease transaction id
    pub id: Digest,
    /// Leased amount in wavelets
    pub amount: u64,
}

/// Script information of an address
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScriptInfo {
    /// Extra fee charged for transactions of a scripted account
    #[serde(default)]
    pub extra_fee: u64,
}

/// Node operations used by the lease canceller
///
/// Every call observes `cancel` and returns [`NodeError::Cancelled`] as soon as
/// it fires, abandoning the in-flight request.
#[async_trait]
pub trait NodeApi: Send + Sync {
    /// Current blockchain height, used as a connectivity probe
    async fn height(&self, cancel: &CancellationToken) -> Result<u64, NodeError>;

    /// Most recent block
    async fn last_block(&self, cancel: &CancellationToken) -> Result<BlockHeader, NodeError>;

    /// Active leases where `address` is the lessor
    async fn active_leases(&self, address: &Address, cancel: &CancellationToken) -> Result<Vec<LeaseInfo>, NodeError>;

    /// Script information of `address`
    async fn script_info(&self, address: &Address, cancel: &CancellationToken) -> Result<ScriptInfo, NodeError>;

    /// Broadcast a signed transaction
    async fn broadcast(&self, tx: &LeaseCancel, cancel: &CancellationToken) -> Result<(), NodeError>;

    /// Whether the node knows the transaction with the given id
    async fn transaction_known(&self, id: &Digest, cancel: &CancellationToken) -> Result<bool, NodeError>;
}

/// Run `fut` unless `cancel` fires first
pub async fn cancellable<T, F>(cancel: &CancellationToken, fut: F) -> Result<T, NodeError>
where
    F: Future<Output = Result<T, NodeError>>,
{
    tokio::select! {
        biased;
        _ = cancel.cancelled() => Err(NodeError::Cancelled),
        result = fut => result,
    }
}

/// reqwest-backed client for a node's REST API
pub struct NodeClient {
    /// HTTP client
    client: Client,
    /// Base URL without a trailing slash
    base_url: String,
}

impl NodeClient {
    /// Create a client without contacting the node
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, NodeError> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// GET a JSON document, failing on any non-success status
    async fn get<T: DeserializeOwned>(&self, path: &str, cancel: &CancellationToken) -> Result<T, NodeError> {
        cancellable(cancel, async {
            debug!("Making node API request to {}", path);
            let response = self.client.get(self.url(path)).send().await?;
            let status = response.status();
            if !status.is_success() {
                let body = response.text().await.unwrap_or_default();
                return Err(NodeError::Status { status, body });
            }
            let text = response.text().await?;
            serde_json::from_str(&text).map_err(|e| NodeError::Decode(e.to_string()))
        })
        .await
    }
}

#[async_trait]
impl NodeApi for NodeClient {
    async fn height(&self, cancel: &CancellationToken) -> Result<u64, NodeError> {
        let response: HeightResponse = self.get("/blocks/height", cancel).await?;
        Ok(response.height)
    }

    async fn last_block(&self, cancel: &CancellationToken) -> Result<BlockHeader, NodeError> {
        self.get("/blocks/last", cancel).await
    }

    async fn active_leases(&self, address: &Address, cancel: &CancellationToken) -> Result<Vec<LeaseInfo>, NodeError> {
        self.get(&format!("/leasing/active/{}", address), cancel).await
    }

    async fn script_info(&self, address: &Address, cancel: &CancellationToken) -> Result<ScriptInfo, NodeError> {
        self.get(&format!("/addresses/scriptInfo/{}", address), cancel).await
    }

    async fn broadcast(&self, tx: &LeaseCancel, cancel: &CancellationToken) -> Result<(), NodeError> {
        cancellable(cancel, async {
            debug!("Broadcasting transaction {}", tx.id);
            let response = self
                .client
                .post(self.url("/transactions/broadcast"))
                .json(tx)
                .send()
                .await?;
            let status = response.status();
            if !status.is_success() {
                let body = response.text().await.unwrap_or_default();
                return Err(NodeError::Status { status, body });
            }
            Ok(())
        })
        .await
    }

    async fn transaction_known(&self, id: &Digest, cancel: &CancellationToken) -> Result<bool, NodeError> {
        cancellable(cancel, async {
            let response = self
                .client
                .get(self.url(&format!("/transactions/info/{}", id)))
                .send()
                .await?;
            Ok(response.status() == StatusCode::OK)
        })
        .await
    }
}
