//! Account identity: keys and address
//!
//! This module provides functionality for:
//! - Waves address derivation from a public key and a network scheme
//! - Parsing the account secret key and the optional public key override

use log::debug;
use serde::{Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

use crate::crypto::{self, CryptoError, PublicKey, SecretKey};
use crate::error::{CancellerError, Result};
use crate::network::Scheme;

/// Length of an address in bytes
pub const ADDRESS_SIZE: usize = 26;

const ADDRESS_VERSION: u8 = 1;
const HASH_SIZE: usize = 20;
const CHECKSUM_SIZE: usize = 4;
const BODY_SIZE: usize = 2 + HASH_SIZE;

/// Waves account address
///
/// Layout: version byte, scheme byte, 20-byte public key hash, 4-byte checksum.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Address([u8; ADDRESS_SIZE]);

impl Address {
    /// Derive the address of a public key on the given network
    pub fn from_public_key(scheme: Scheme, pk: &PublicKey) -> Self {
        let mut bytes = [0u8; ADDRESS_SIZE];
        bytes[0] = ADDRESS_VERSION;
        bytes[1] = scheme.byte();
        bytes[2..BODY_SIZE].copy_from_slice(&crypto::secure_hash(pk.as_bytes())[..HASH_SIZE]);
        let checksum = crypto::secure_hash(&bytes[..BODY_SIZE]);
        bytes[BODY_SIZE..].copy_from_slice(&checksum[..CHECKSUM_SIZE]);
        Self(bytes)
    }

    /// Parse raw address bytes, verifying version and checksum
    pub fn from_bytes(bytes: &[u8]) -> std::result::Result<Self, AddressError> {
        let bytes: [u8; ADDRESS_SIZE] = bytes
            .try_into()
            .map_err(|_| AddressError::Length(bytes.len()))?;
        if bytes[0] != ADDRESS_VERSION {
            return Err(AddressError::Version(bytes[0]));
        }
        let checksum = crypto::secure_hash(&bytes[..BODY_SIZE]);
        if checksum[..CHECKSUM_SIZE] != bytes[BODY_SIZE..] {
            return Err(AddressError::Checksum);
        }
        Ok(Self(bytes))
    }

    pub fn as_bytes(&self) -> &[u8; ADDRESS_SIZE] {
        &self.0
    }

    /// Network scheme the address belongs to
    pub fn scheme(&self) -> Scheme {
        Scheme::new(self.0[1])
    }
}

/// Errors parsing an address
#[derive(Debug, thiserror::Error)]
pub enum AddressError {
    #[error("invalid base58 string: {0}")]
    Base58(#[from] bs58::decode::Error),

    #[error("invalid address length {0}")]
    Length(usize),

    #[error("unsupported address version {0}")]
    Version(u8),

    #[error("invalid address checksum")]
    Checksum,
}

impl FromStr for Address {
    type Err = AddressError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let bytes = bs58::decode(s).into_vec()?;
        Self::from_bytes(&bytes)
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&bs58::encode(&self.0).into_string())
    }
}

impl fmt::Debug for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Address({})", self)
    }
}

impl Serialize for Address {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// Keys and address of the account whose leases are cancelled
#[derive(Clone, Debug)]
pub struct AccountIdentity {
    /// Key used for signing
    pub secret_key: SecretKey,
    /// Key referenced by transactions as the sender
    pub public_key: PublicKey,
    /// Address the leases are looked up for
    pub address: Address,
}

impl AccountIdentity {
    /// Resolve the account identity from base58 keys
    ///
    /// With `public_key_override` the derived public key and address are
    /// replaced by those of the override. The secret key is still the one used
    /// for signing, so a mismatching override yields transactions the node
    /// rejects.
    pub fn resolve(scheme: Scheme, secret_key: &str, public_key_override: Option<&str>) -> Result<Self> {
        let secret_key: SecretKey = secret_key
            .parse()
            .map_err(|e: CryptoError| CancellerError::InvalidKeyFormat(format!("account private key: {}", e)))?;
        let mut public_key = crypto::generate_public_key(&secret_key);

        if let Some(pk) = public_key_override {
            public_key = pk.parse().map_err(|e: CryptoError| {
                CancellerError::InvalidKeyFormat(format!("additional public key: {}", e))
            })?;
            debug!("Using public key override {}", public_key);
        }

        let address = Address::from_public_key(scheme, &public_key);
        Ok(Self {
            secret_key,
            public_key,
            address,
        })
    }
}
