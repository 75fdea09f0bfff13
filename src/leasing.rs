//! Active lease inventory of an account

use log::info;
use tokio_util::sync::CancellationToken;

use crate::account::Address;
use crate::crypto::Digest;
use crate::error::{CancellerError, Result};
use crate::rpc::{NodeApi, NodeError};
use crate::utils::format_amount;

/// Snapshot of the account's active leases
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ActiveLeases {
    /// Lease transaction ids in the order the node returned them
    pub ids: Vec<Digest>,
    /// Sum of all leased amounts
    pub total: u64,
}

impl ActiveLeases {
    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }
}

/// Fetch the active leases where `address` is the lessor
///
/// The result is not re-validated later; a lease cancelled by someone else in
/// the meantime is rejected by the node at broadcast.
pub async fn fetch_active_leases<N: NodeApi + ?Sized>(
    node: &N,
    address: &Address,
    cancel: &CancellationToken,
) -> Result<ActiveLeases> {
    let leases = node.active_leases(address, cancel).await.map_err(|e| match e {
        NodeError::Cancelled => CancellerError::UserTermination,
        other => CancellerError::NetworkUnavailable(format!("Failed to get active leasings: {}", other)),
    })?;

    let mut total: u64 = 0;
    let mut ids = Vec::with_capacity(leases.len());
    for lease in leases {
        total = total.checked_add(lease.amount).ok_or_else(|| {
            CancellerError::OperationFailure("Total leased amount overflows".to_string())
        })?;
        ids.push(lease.id);
    }

    info!(
        "Found {} active leasings on account '{}' with the total amount of {}",
        ids.len(),
        address,
        format_amount(total)
    );
    Ok(ActiveLeases { ids, total })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::{self, PublicKey};
    use crate::network::Scheme;
    use crate::rpc::{BlockHeader, LeaseInfo, ScriptInfo};
    use crate::transaction::LeaseCancel;
    use async_trait::async_trait;

    /// Node that only answers `active_leases`; `None` makes the request fail
    struct LeasesNode(Option<Vec<LeaseInfo>>);

    #[async_trait]
    impl NodeApi for LeasesNode {
        async fn height(&self, _: &CancellationToken) -> std::result::Result<u64, NodeError> {
            unreachable!("height is not used by fetch_active_leases")
        }

        async fn last_block(&self, _: &CancellationToken) -> std::result::Result<BlockHeader, NodeError> {
            unreachable!("last_block is not used by fetch_active_leases")
        }

        async fn active_leases(&self, _: &Address, cancel: &CancellationToken) -> std::result::Result<Vec<LeaseInfo>, NodeError> {
            if cancel.is_cancelled() {
                return Err(NodeError::Cancelled);
            }
            self.0
                .clone()
                .ok_or_else(|| NodeError::Decode("connection reset".to_string()))
        }

        async fn script_info(&self, _: &Address, _: &CancellationToken) -> std::result::Result<ScriptInfo, NodeError> {
            unreachable!("script_info is not used by fetch_active_leases")
        }

        async fn broadcast(&self, _: &LeaseCancel, _: &CancellationToken) -> std::result::Result<(), NodeError> {
            unreachable!("broadcast is not used by fetch_active_leases")
        }

        async fn transaction_known(&self, _: &Digest, _: &CancellationToken) -> std::result::Result<bool, NodeError> {
            unreachable!("transaction_known is not used by fetch_active_leases")
        }
    }

    fn address() -> Address {
        Address::from_public_key(Scheme::TESTNET, &PublicKey::from_bytes([6u8; 32]))
    }

    fn lease(name: &str, amount: u64) -> LeaseInfo {
        LeaseInfo {
            id: Digest::from_bytes(crypto::blake2b256(name.as_bytes())),
            amount,
        }
    }

    #[tokio::test]
    async fn test_ids_in_node_order_and_total() {
        let node = LeasesNode(Some(vec![lease("b", 250_000_000), lease("a", 1), lease("c", 99)]));
        let leases = fetch_active_leases(&node, &address(), &CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(leases.len(), 3);
        assert_eq!(leases.ids, vec![lease("b", 0).id, lease("a", 0).id, lease("c", 0).id]);
        assert_eq!(leases.total, 250_000_100);
    }

    #[tokio::test]
    async fn test_no_leases_is_not_an_error() {
        let leases = fetch_active_leases(&LeasesNode(Some(Vec::new())), &address(), &CancellationToken::new())
            .await
            .unwrap();
        assert!(leases.is_empty());
        assert_eq!(leases, ActiveLeases::default());
    }

    #[tokio::test]
    async fn test_total_overflow() {
        let node = LeasesNode(Some(vec![lease("a", u64::MAX), lease("b", 1)]));
        let err = fetch_active_leases(&node, &address(), &CancellationToken::new())
            .await
            .unwrap_err();
        assert!(matches!(err, CancellerError::OperationFailure(_)));
    }

    #[tokio::test]
    async fn test_node_failure_is_network_unavailable() {
        let err = fetch_active_leases(&LeasesNode(None), &address(), &CancellationToken::new())
            .await
            .unwrap_err();
        assert!(matches!(err, CancellerError::NetworkUnavailable(_)));
        assert!(err.to_string().contains("active leasings"));
    }

    #[tokio::test]
    async fn test_cancelled_fetch_is_user_termination() {
        let cancel = CancellationToken::new();
        cancel.cancel();
        let err = fetch_active_leases(&LeasesNode(Some(Vec::new())), &address(), &cancel)
            .await
            .unwrap_err();
        assert!(matches!(err, CancellerError::UserTermination));
    }
}
