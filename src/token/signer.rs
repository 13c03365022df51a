// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Signing capability.
//!
//! The codec never touches key material. It hands the signing input to a
//! [`Signer`] and gets bytes back, so any algorithm can back a token as long
//! as it can sign and verify a byte string.

use std::fmt;

use hmac::{Hmac, Mac};
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

/// Errors raised by a signing capability.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SignerError {
    /// The signer was built without key material.
    #[error("signing key is empty")]
    EmptyKey,
    /// The key was rejected by the underlying primitive.
    #[error("invalid signing key: {0}")]
    InvalidKey(String),
    /// The signature does not match the payload.
    #[error("signature verification failed")]
    Mismatch,
}

/// An opaque sign/verify pair.
pub trait Signer: Send + Sync {
    /// Algorithm name written into the token header (e.g. `HS256`).
    fn algorithm(&self) -> &'static str;

    /// Sign `payload`.
    fn sign(&self, payload: &[u8]) -> Result<Vec<u8>, SignerError>;

    /// Check that `signature` was produced for `payload` by this signer.
    fn verify(&self, payload: &[u8], signature: &[u8]) -> Result<(), SignerError>;
}

/// HMAC-SHA256 signer.
#[derive(Clone)]
pub struct Hs256Signer {
    key: Vec<u8>,
}

impl Hs256Signer {
    /// Create a signer from a shared secret.
    pub fn new(key: impl AsRef<[u8]>) -> Self {
        Self {
            key: key.as_ref().to_vec(),
        }
    }

    fn mac(&self) -> Result<HmacSha256, SignerError> {
        if self.key.is_empty() {
            return Err(SignerError::EmptyKey);
        }
        HmacSha256::new_from_slice(&self.key).map_err(|e| SignerError::InvalidKey(e.to_string()))
    }
}

// Never print the secret.
impl fmt::Debug for Hs256Signer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Hs256Signer")
            .field("key_len", &self.key.len())
            .finish()
    }
}

impl Signer for Hs256Signer {
    fn algorithm(&self) -> &'static str {
        "HS256"
    }

    fn sign(&self, payload: &[u8]) -> Result<Vec<u8>, SignerError> {
        let mut mac = self.mac()?;
        mac.update(payload);
        Ok(mac.finalize().into_bytes().to_vec())
    }

    fn verify(&self, payload: &[u8], signature: &[u8]) -> Result<(), SignerError> {
        let mut mac = self.mac()?;
        mac.update(payload);
        mac.verify_slice(signature)
            .map_err(|_| SignerError::Mismatch)
    }
}
