//! Network scheme of the target blockchain
//!
//! The scheme byte is embedded in every address and transaction, so it is
//! resolved once from the node and shared by the whole run.

use log::{debug, info};
use serde::{Serialize, Serializer};
use std::fmt;
use tokio_util::sync::CancellationToken;

use crate::account::Address;
use crate::error::{CancellerError, Result};
use crate::rpc::{NodeApi, NodeError};

/// Single-byte chain identifier
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Scheme(u8);

impl Scheme {
    /// Mainnet scheme `W`
    pub const MAINNET: Scheme = Scheme(b'W');
    /// Testnet scheme `T`
    pub const TESTNET: Scheme = Scheme(b'T');
    /// Stagenet scheme `S`
    pub const STAGENET: Scheme = Scheme(b'S');

    pub const fn new(byte: u8) -> Self {
        Scheme(byte)
    }

    pub fn byte(&self) -> u8 {
        self.0
    }

    /// Human readable network name
    pub fn name(&self) -> &'static str {
        match *self {
            Scheme::MAINNET => "mainnet",
            Scheme::TESTNET => "testnet",
            Scheme::STAGENET => "stagenet",
            _ => "custom",
        }
    }
}

impl fmt::Display for Scheme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0 as char)
    }
}

impl Serialize for Scheme {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_u8(self.0)
    }
}

/// Acquire the network scheme from the generator of the last block
pub async fn resolve_scheme<N: NodeApi + ?Sized>(node: &N, cancel: &CancellationToken) -> Result<Scheme> {
    let block = node.last_block(cancel).await.map_err(|e| match e {
        NodeError::Cancelled => CancellerError::UserTermination,
        other => CancellerError::NetworkUnavailable(format!("Failed to acquire blockchain scheme: {}", other)),
    })?;
    match block.height {
        Some(height) => debug!("Last block at height {} generated by {}", height, block.generator),
        None => debug!("Last block generator: {}", block.generator),
    }

    let generator: Address = block.generator.parse().map_err(|e| {
        CancellerError::NetworkUnavailable(format!(
            "Invalid generator address '{}' in last block: {}",
            block.generator, e
        ))
    })?;
    let scheme = generator.scheme();
    info!("Blockchain scheme: {} ({})", scheme, scheme.name());
    Ok(scheme)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::{Digest, PublicKey};
    use crate::rpc::{BlockHeader, LeaseInfo, ScriptInfo};
    use crate::transaction::LeaseCancel;
    use async_trait::async_trait;

    /// Node that only answers `last_block`; `None` makes the request fail
    struct LastBlockNode(Option<String>);

    impl LastBlockNode {
        fn generator(generator: String) -> Self {
            Self(Some(generator))
        }

        fn failing() -> Self {
            Self(None)
        }
    }

    #[async_trait]
    impl NodeApi for LastBlockNode {
        async fn height(&self, _: &CancellationToken) -> std::result::Result<u64, NodeError> {
            unreachable!("height is not used by resolve_scheme")
        }

        async fn last_block(&self, _: &CancellationToken) -> std::result::Result<BlockHeader, NodeError> {
            match &self.0 {
                Some(generator) => Ok(BlockHeader {
                    generator: generator.clone(),
                    height: Some(42),
                }),
                None => Err(NodeError::Decode("connection reset".to_string())),
            }
        }

        async fn active_leases(&self, _: &Address, _: &CancellationToken) -> std::result::Result<Vec<LeaseInfo>, NodeError> {
            unreachable!("active_leases is not used by resolve_scheme")
        }

        async fn script_info(&self, _: &Address, _: &CancellationToken) -> std::result::Result<ScriptInfo, NodeError> {
            unreachable!("script_info is not used by resolve_scheme")
        }

        async fn broadcast(&self, _: &LeaseCancel, _: &CancellationToken) -> std::result::Result<(), NodeError> {
            unreachable!("broadcast is not used by resolve_scheme")
        }

        async fn transaction_known(&self, _: &Digest, _: &CancellationToken) -> std::result::Result<bool, NodeError> {
            unreachable!("transaction_known is not used by resolve_scheme")
        }
    }

    #[tokio::test]
    async fn test_resolve_scheme_from_generator() {
        let generator = Address::from_public_key(Scheme::STAGENET, &PublicKey::from_bytes([4u8; 32]));
        let node = LastBlockNode::generator(generator.to_string());
        let scheme = resolve_scheme(&node, &CancellationToken::new()).await.unwrap();
        assert_eq!(scheme, Scheme::STAGENET);
    }

    #[tokio::test]
    async fn test_resolve_scheme_node_failure() {
        let err = resolve_scheme(&LastBlockNode::failing(), &CancellationToken::new())
            .await
            .unwrap_err();
        assert!(matches!(err, CancellerError::NetworkUnavailable(_)));
        assert!(err.to_string().contains("blockchain scheme"));
    }

    #[tokio::test]
    async fn test_resolve_scheme_malformed_generator() {
        let valid = Address::from_public_key(Scheme::MAINNET, &PublicKey::from_bytes([4u8; 32]));
        let mut corrupted = *valid.as_bytes();
        corrupted[25] ^= 0xff;
        let corrupted = bs58::encode(corrupted).into_string();

        for generator in ["not-an-address-0OIl", "3y", corrupted.as_str()] {
            let node = LastBlockNode::generator(generator.to_string());
            let err = resolve_scheme(&node, &CancellationToken::new()).await.unwrap_err();
            assert!(matches!(err, CancellerError::NetworkUnavailable(_)), "{}", generator);
            assert!(err.to_string().contains("Invalid generator address"));
        }
    }

    #[test]
    fn test_scheme_display_and_name() {
        assert_eq!(Scheme::MAINNET.to_string(), "W");
        assert_eq!(Scheme::TESTNET.name(), "testnet");
        assert_eq!(Scheme::new(b'R').name(), "custom");
        assert_eq!(serde_json::to_string(&Scheme::MAINNET).unwrap(), "87");
    }
}
