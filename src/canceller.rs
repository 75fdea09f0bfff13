//! Lease cancellation pipeline
//!
//! This module handles:
//! - The sequential run: probe, scheme, identity, leases, fee
//! - Building and signing one cancel transaction per active lease
//! - Previewing the transactions or broadcasting them one at a time, waiting
//!   for the node to know each before the next is sent

use log::{debug, info};
use std::io::{self, Write};
use std::sync::Mutex;
use tokio::time::sleep;
use tokio_util::sync::CancellationToken;

use crate::account::{AccountIdentity, Address};
use crate::config::CancellerConfig;
use crate::crypto::Digest;
use crate::error::{CancellerError, Result};
use crate::fee;
use crate::leasing;
use crate::network::{self, Scheme};
use crate::rpc::{NodeApi, NodeClient, NodeError};
use crate::transaction::LeaseCancel;
use crate::utils::timestamp_millis;

/// How signed transactions leave the pipeline
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SubmissionMode {
    /// Print the transactions, never broadcast
    Preview,
    /// Broadcast and wait for each transaction
    Live,
}

impl SubmissionMode {
    pub fn from_dry_run(dry_run: bool) -> Self {
        if dry_run {
            SubmissionMode::Preview
        } else {
            SubmissionMode::Live
        }
    }
}

/// Outcome of a successful run
#[derive(Clone, Debug)]
pub struct CancelReport {
    pub scheme: Scheme,
    pub address: Address,
    pub lease_count: usize,
    /// Sum of the cancelled leases' amounts
    pub total_leased: u64,
    /// Fee paid by each cancel transaction
    pub fee: u64,
    /// Signed transactions in lease order
    pub transactions: Vec<LeaseCancel>,
}

/// Cancels every active lease of one account
pub struct Canceller<N: NodeApi> {
    node: N,
    config: CancellerConfig,
    cancel: CancellationToken,
    /// Receives the previewed transactions; stdout unless replaced
    preview_out: Mutex<Box<dyn Write + Send>>,
}

impl Canceller<NodeClient> {
    /// Canceller talking to the node named in `config`
    pub fn connect(config: CancellerConfig, cancel: CancellationToken) -> Result<Self> {
        let node = NodeClient::new(&config.node_url, config.request_timeout).map_err(|e| {
            CancellerError::NetworkUnavailable(format!("Failed to create node client: {}", e))
        })?;
        Ok(Self::new(node, config, cancel))
    }
}

impl<N: NodeApi> Canceller<N> {
    pub fn new(node: N, config: CancellerConfig, cancel: CancellationToken) -> Self {
        Self {
            node,
            config,
            cancel,
            preview_out: Mutex::new(Box::new(io::stdout())),
        }
    }

    /// Write previewed transactions to `out` instead of stdout
    pub fn with_preview_output<W: Write + Send + 'static>(mut self, out: W) -> Self {
        self.preview_out = Mutex::new(Box::new(out));
        self
    }

    pub fn node(&self) -> &N {
        &self.node
    }

    pub fn mode(&self) -> SubmissionMode {
        SubmissionMode::from_dry_run(self.config.dry_run)
    }

    /// Run the whole pipeline
    pub async fn run(&self) -> Result<CancelReport> {
        if self.mode() == SubmissionMode::Preview {
            info!("DRY-RUN: No actual transactions will be created");
        }

        self.probe().await?;
        let scheme = network::resolve_scheme(&self.node, &self.cancel).await?;

        let identity = AccountIdentity::resolve(
            scheme,
            &self.config.account_sk,
            self.config.account_pk.as_deref(),
        )?;
        info!("Account's public key: {}", identity.public_key);
        info!("Account's address: {}", identity.address);

        let leases = leasing::fetch_active_leases(&self.node, &identity.address, &self.cancel).await?;
        let fee = fee::resolve_fee(&self.node, &identity.address, &self.cancel).await?;

        let mut transactions = Vec::with_capacity(leases.len());
        for (i, lease_id) in leases.ids.iter().enumerate() {
            self.ensure_active()?;
            let tx = build_signed(scheme, &identity, *lease_id, fee, timestamp_millis())?;
            self.submit(i + 1, &tx).await?;
            transactions.push(tx);
        }

        info!("{} cancel transactions created", transactions.len());
        Ok(CancelReport {
            scheme,
            address: identity.address,
            lease_count: leases.len(),
            total_leased: leases.total,
            fee,
            transactions,
        })
    }

    /// Check that the node answers before doing anything else
    async fn probe(&self) -> Result<()> {
        let height = self.node.height(&self.cancel).await.map_err(|e| match e {
            NodeError::Cancelled => CancellerError::UserTermination,
            other => CancellerError::NetworkUnavailable(format!(
                "Failed to connect to node at '{}': {}",
                self.config.node_url, other
            )),
        })?;
        info!("Successfully connected to '{}'", self.config.node_url);
        debug!("Blockchain height: {}", height);
        Ok(())
    }

    fn ensure_active(&self) -> Result<()> {
        if self.cancel.is_cancelled() {
            return Err(CancellerError::UserTermination);
        }
        Ok(())
    }

    async fn submit(&self, n: usize, tx: &LeaseCancel) -> Result<()> {
        match self.mode() {
            SubmissionMode::Preview => {
                debug!("Previewing cancel transaction #{} ID: {}", n, tx.id);
                self.print_preview(n, tx)
            }
            SubmissionMode::Live => {
                info!("Cancel transaction #{} ID: {}", n, tx.id);
                self.broadcast(tx).await?;
                self.wait_for_confirmation(&tx.id).await
            }
        }
    }

    /// The preview is the dry run's output, so it bypasses the log filter
    fn print_preview(&self, n: usize, tx: &LeaseCancel) -> Result<()> {
        let json = tx.to_json()?;
        let mut out = self
            .preview_out
            .lock()
            .map_err(|_| CancellerError::OperationFailure("Preview output is poisoned".to_string()))?;
        writeln!(out, "Cancel transaction #{}:\n{}", n, json)
            .and_then(|_| out.flush())
            .map_err(|e| CancellerError::OperationFailure(format!("Failed to write transaction #{}: {}", n, e)))
    }

    async fn broadcast(&self, tx: &LeaseCancel) -> Result<()> {
        self.ensure_active()?;
        self.node.broadcast(tx, &self.cancel).await.map_err(|e| match e {
            NodeError::Cancelled => CancellerError::UserTermination,
            other => CancellerError::BroadcastFailure(format!(
                "Failed to broadcast lease cancel transaction {}: {}",
                tx.id, other
            )),
        })
    }

    /// Poll the node until it knows the transaction
    ///
    /// There is no upper bound on the number of polls; only cancellation ends
    /// the wait early. Failed polls are retried like "not yet known" answers.
    async fn wait_for_confirmation(&self, id: &Digest) -> Result<()> {
        info!("Waiting for transaction '{}' on blockchain...", id);
        loop {
            self.ensure_active()?;
            match self.node.transaction_known(id, &self.cancel).await {
                Ok(true) => {
                    debug!("Transaction {} is known to the node", id);
                    return Ok(());
                }
                Ok(false) => {}
                Err(NodeError::Cancelled) => return Err(CancellerError::UserTermination),
                Err(e) => debug!("Status poll for {} failed: {}", id, e),
            }

            tokio::select! {
                biased;
                _ = self.cancel.cancelled() => return Err(CancellerError::UserTermination),
                _ = sleep(self.config.poll_interval) => {}
            }
        }
    }
}

/// Build and sign the cancel transaction of one lease
pub fn build_signed(
    scheme: Scheme,
    identity: &AccountIdentity,
    lease_id: Digest,
    fee: u64,
    timestamp: u64,
) -> Result<LeaseCancel> {
    let mut tx = LeaseCancel::new(scheme, identity.public_key, lease_id, fee, timestamp);
    tx.sign(scheme, &identity.secret_key)?;
    Ok(tx)
}
