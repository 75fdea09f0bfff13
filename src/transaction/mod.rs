//! Lease cancellation transaction construction and signing
//!
//! This module handles:
//! - Building version 2 lease cancel transactions
//! - Their binary body, from which the id and the signature are computed
//! - Signing and the JSON form accepted by the node's broadcast endpoint

use log::debug;
use serde::Serialize;

use crate::crypto::{self, Digest, PublicKey, SecretKey, Signature};
use crate::error::{CancellerError, Result};
use crate::network::Scheme;

/// Transaction type of lease cancellation
pub const LEASE_CANCEL_TYPE: u8 = 9;

/// Transaction version built by this tool
pub const LEASE_CANCEL_VERSION: u8 = 2;

const BODY_LEN: usize = 3 + 32 + 8 + 8 + 32;

/// Lease cancel transaction with proofs
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LeaseCancel {
    #[serde(rename = "type")]
    pub tx_type: u8,
    pub version: u8,
    pub id: Digest,
    pub sender_public_key: PublicKey,
    pub fee: u64,
    pub timestamp: u64,
    pub proofs: Vec<Signature>,
    pub lease_id: Digest,
    pub chain_id: Scheme,
}

impl LeaseCancel {
    /// Create an unsigned transaction cancelling `lease_id`
    pub fn new(scheme: Scheme, sender_public_key: PublicKey, lease_id: Digest, fee: u64, timestamp: u64) -> Self {
        let mut tx = Self {
            tx_type: LEASE_CANCEL_TYPE,
            version: LEASE_CANCEL_VERSION,
            id: Digest::from_bytes([0u8; 32]),
            sender_public_key,
            fee,
            timestamp,
            proofs: Vec::new(),
            lease_id,
            chain_id: scheme,
        };
        tx.id = Digest::from_bytes(crypto::blake2b256(&tx.body_bytes()));
        tx
    }

    /// Bytes covered by the id and the signature
    pub fn body_bytes(&self) -> Vec<u8> {
        let mut buf = Vec::with_capacity(BODY_LEN);
        buf.push(self.tx_type);
        buf.push(self.version);
        buf.push(self.chain_id.byte());
        buf.extend_from_slice(self.sender_public_key.as_bytes());
        buf.extend_from_slice(&self.fee.to_be_bytes());
        buf.extend_from_slice(&self.timestamp.to_be_bytes());
        buf.extend_from_slice(self.lease_id.as_bytes());
        buf
    }

    /// Sign the transaction for `scheme`, replacing any previous proofs
    pub fn sign(&mut self, scheme: Scheme, sk: &SecretKey) -> Result<()> {
        if self.chain_id != scheme {
            return Err(CancellerError::SigningFailure(format!(
                "transaction built for scheme '{}' cannot be signed for scheme '{}'",
                self.chain_id, scheme
            )));
        }
        let body = self.body_bytes();
        if body.len() != BODY_LEN {
            return Err(CancellerError::SigningFailure(format!(
                "unexpected body length {}",
                body.len()
            )));
        }
        debug!("Signing lease cancel body {}", hex::encode(&body));

        self.id = Digest::from_bytes(crypto::blake2b256(&body));
        self.proofs = vec![crypto::sign(sk, &body)];
        Ok(())
    }

    pub fn is_signed(&self) -> bool {
        !self.proofs.is_empty()
    }

    /// Check the first proof against the sender public key
    pub fn verify(&self) -> bool {
        self.proofs
            .first()
            .map(|proof| crypto::verify(&self.sender_public_key, proof, &self.body_bytes()))
            .unwrap_or(false)
    }

    /// JSON form as accepted by the node
    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string(self)
            .map_err(|e| CancellerError::OperationFailure(format!("Failed to make transaction json: {}", e)))
    }
}
