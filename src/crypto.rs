//! Cryptographic primitives for Waves accounts and transactions
//!
//! This module provides:
//! - Fixed-size key, digest and signature types with base58 text forms
//! - Curve25519 public key derivation from a secret key
//! - Curve25519 signatures (XEdDSA style) with verification
//! - Blake2b-256 and Keccak-256 hashing

use blake2::digest::consts::U32;
use blake2::{Blake2b, Digest as _};
use curve25519_dalek::edwards::{CompressedEdwardsY, EdwardsPoint};
use curve25519_dalek::montgomery::MontgomeryPoint;
use curve25519_dalek::scalar::Scalar;
use rand::RngCore;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use sha2::Sha512;
use sha3::Keccak256;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Length of keys and digests in bytes
pub const KEY_SIZE: usize = 32;

/// Length of a signature in bytes
pub const SIGNATURE_SIZE: usize = 64;

/// Errors decoding binary values from their text form
#[derive(Debug, Error)]
pub enum CryptoError {
    #[error("invalid base58 string: {0}")]
    Base58(#[from] bs58::decode::Error),

    #[error("invalid length: expected {expected} bytes, got {actual}")]
    Length { expected: usize, actual: usize },
}

fn decode_fixed<const N: usize>(s: &str) -> Result<[u8; N], CryptoError> {
    let bytes = bs58::decode(s).into_vec()?;
    bytes
        .as_slice()
        .try_into()
        .map_err(|_| CryptoError::Length { expected: N, actual: bytes.len() })
}

macro_rules! base58_type {
    ($name:ident, $size:expr) => {
        impl $name {
            pub fn from_bytes(bytes: [u8; $size]) -> Self {
                Self(bytes)
            }

            pub fn as_bytes(&self) -> &[u8; $size] {
                &self.0
            }
        }

        impl FromStr for $name {
            type Err = CryptoError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                decode_fixed::<$size>(s).map(Self::from_bytes)
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&bs58::encode(&self.0).into_string())
            }
        }

        impl Serialize for $name {
            fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
                serializer.collect_str(self)
            }
        }

        impl<'de> Deserialize<'de> for $name {
            fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
                let s = String::deserialize(deserializer)?;
                s.parse().map_err(serde::de::Error::custom)
            }
        }
    };
}

/// Curve25519 secret key
///
/// Always stored clamped. Its `Debug` form never prints the key material.
#[derive(Clone, PartialEq, Eq)]
pub struct SecretKey([u8; KEY_SIZE]);

impl SecretKey {
    pub fn from_bytes(mut bytes: [u8; KEY_SIZE]) -> Self {
        bytes[0] &= 248;
        bytes[31] &= 127;
        bytes[31] |= 64;
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; KEY_SIZE] {
        &self.0
    }

    fn scalar(&self) -> Scalar {
        Scalar::from_bytes_mod_order(self.0)
    }

    /// Edwards form of the public key, the point signatures are made against
    fn edwards_public_key(&self) -> CompressedEdwardsY {
        EdwardsPoint::mul_base(&self.scalar()).compress()
    }
}

impl FromStr for SecretKey {
    type Err = CryptoError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        decode_fixed::<KEY_SIZE>(s).map(Self::from_bytes)
    }
}

impl fmt::Debug for SecretKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SecretKey(..)")
    }
}

/// Curve25519 public key (Montgomery u-coordinate)
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct PublicKey([u8; KEY_SIZE]);
base58_type!(PublicKey, KEY_SIZE);

/// 32-byte digest, used for transaction and lease identifiers
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Digest([u8; KEY_SIZE]);
base58_type!(Digest, KEY_SIZE);

/// 64-byte Curve25519 signature
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct Signature([u8; SIGNATURE_SIZE]);
base58_type!(Signature, SIGNATURE_SIZE);

impl fmt::Debug for Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Signature({})", self)
    }
}

/// Derive the Curve25519 public key of a secret key
pub fn generate_public_key(sk: &SecretKey) -> PublicKey {
    PublicKey(EdwardsPoint::mul_base(&sk.scalar()).to_montgomery().to_bytes())
}

/// Blake2b with a 256-bit output
pub fn blake2b256(data: &[u8]) -> [u8; KEY_SIZE] {
    Blake2b::<U32>::digest(data).into()
}

/// Keccak-256 (pre-standard SHA-3 padding)
pub fn keccak256(data: &[u8]) -> [u8; KEY_SIZE] {
    Keccak256::digest(data).into()
}

/// keccak256(blake2b256(data)), used for addresses
pub fn secure_hash(data: &[u8]) -> [u8; KEY_SIZE] {
    keccak256(&blake2b256(data))
}

fn sha512_scalar(parts: &[&[u8]]) -> Scalar {
    let mut hasher = Sha512::new();
    for part in parts {
        hasher.update(part);
    }
    let mut wide = [0u8; 64];
    wide.copy_from_slice(&hasher.finalize());
    Scalar::from_bytes_mod_order_wide(&wide)
}

/// Sign `data` with a Curve25519 secret key
///
/// The nonce mixes the secret key, the message and 64 fresh random bytes, so
/// two signatures of the same message differ.
pub fn sign(sk: &SecretKey, data: &[u8]) -> Signature {
    let mut random = [0u8; 64];
    rand::thread_rng().fill_bytes(&mut random);
    sign_with_entropy(sk, data, &random)
}

fn sign_with_entropy(sk: &SecretKey, data: &[u8], random: &[u8; 64]) -> Signature {
    let ed_public = sk.edwards_public_key();
    let sign_bit = ed_public.as_bytes()[31] & 0x80;

    let mut prefix = [0xffu8; 32];
    prefix[0] = 0xfe;
    let r = sha512_scalar(&[&prefix[..], &sk.as_bytes()[..], data, &random[..]]);
    let big_r = EdwardsPoint::mul_base(&r).compress();
    let h = sha512_scalar(&[&big_r.as_bytes()[..], &ed_public.as_bytes()[..], data]);
    let s = r + h * sk.scalar();

    let mut out = [0u8; SIGNATURE_SIZE];
    out[..32].copy_from_slice(big_r.as_bytes());
    out[32..].copy_from_slice(s.as_bytes());
    out[63] &= 0x7f;
    out[63] |= sign_bit;
    Signature(out)
}

/// Verify a Curve25519 signature against a public key
pub fn verify(pk: &PublicKey, signature: &Signature, data: &[u8]) -> bool {
    let sig = signature.as_bytes();
    let sign_bit = (sig[63] & 0x80) >> 7;
    let Some(ed_public) = MontgomeryPoint(*pk.as_bytes()).to_edwards(sign_bit) else {
        return false;
    };

    let mut r_bytes = [0u8; 32];
    r_bytes.copy_from_slice(&sig[..32]);
    let Some(big_r) = CompressedEdwardsY(r_bytes).decompress() else {
        return false;
    };

    let mut s_bytes = [0u8; 32];
    s_bytes.copy_from_slice(&sig[32..]);
    s_bytes[31] &= 0x7f;
    let Some(s) = Option::<Scalar>::from(Scalar::from_canonical_bytes(s_bytes)) else {
        return false;
    };

    let h = sha512_scalar(&[&r_bytes[..], &ed_public.compress().as_bytes()[..], data]);
    EdwardsPoint::mul_base(&s) == big_r + h * ed_public
}
