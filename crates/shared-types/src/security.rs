//! # Token Security Primitives
//!
//! The single implementation of the keyed hash that signs and verifies
//! component tokens.
//!
//! ## Security Properties
//!
//! - **HMAC-SHA256 Signatures**: keyed by one process-wide signing secret
//! - **Truncated Encoding**: the MAC is base64url encoded and truncated to
//!   fit the identifier budget
//! - **Constant-Time Comparison**: signature checks never short-circuit on
//!   the first differing byte

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use hmac::{Hmac, Mac};
use sha2::{Digest, Sha256};
use std::fmt;
use subtle::ConstantTimeEq;
use thiserror::Error;

type HmacSha256 = Hmac<Sha256>;

// =============================================================================
// CONSTANTS
// =============================================================================

/// Length of the truncated signature segment (base64url characters).
pub const SIGNATURE_LEN: usize = 12;

/// Minimum accepted signing secret length (bytes).
pub const MIN_SECRET_LEN: usize = 16;

// =============================================================================
// SIGNING SECRET
// =============================================================================

/// Errors constructing a [`SigningSecret`].
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SecretError {
    #[error("signing secret is missing")]
    Missing,

    #[error("signing secret too short: {len} bytes (minimum {min})")]
    TooShort { len: usize, min: usize },
}

/// The process-wide token signing key.
///
/// `Debug` never prints the key material.
#[derive(Clone)]
pub struct SigningSecret(Vec<u8>);

impl SigningSecret {
    /// Wrap raw key bytes, rejecting empty or short keys.
    pub fn new(bytes: impl Into<Vec<u8>>) -> Result<Self, SecretError> {
        let bytes = bytes.into();
        if bytes.is_empty() {
            return Err(SecretError::Missing);
        }
        if bytes.len() < MIN_SECRET_LEN {
            return Err(SecretError::TooShort {
                len: bytes.len(),
                min: MIN_SECRET_LEN,
            });
        }
        Ok(Self(bytes))
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }
}

impl fmt::Debug for SigningSecret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SigningSecret(<{} bytes>)", self.0.len())
    }
}

// =============================================================================
// HMAC SIGNING
// =============================================================================

/// Sign `message` and return the first `len` base64url characters of the MAC.
pub fn sign_truncated(secret: &SigningSecret, message: &[u8], len: usize) -> String {
    let mut mac =
        HmacSha256::new_from_slice(secret.as_bytes()).expect("HMAC can take key of any size");
    mac.update(message);

    let mut encoded = URL_SAFE_NO_PAD.encode(mac.finalize().into_bytes());
    encoded.truncate(len);
    encoded
}

/// Verify a truncated signature produced by [`sign_truncated`].
///
/// Uses constant-time comparison to prevent timing attacks.
pub fn verify_truncated(
    secret: &SigningSecret,
    message: &[u8],
    signature: &str,
    len: usize,
) -> bool {
    if signature.len() != len {
        return false;
    }
    let expected = sign_truncated(secret, message, len);
    expected.as_bytes().ct_eq(signature.as_bytes()).into()
}

/// Hex SHA-256 digest over `parts`, truncated to `len` characters.
///
/// Used to derive stable storage keys from route keys and custom data.
pub fn content_digest(parts: &[&[u8]], len: usize) -> String {
    let mut hasher = Sha256::new();
    for part in parts {
        hasher.update(part);
        hasher.update([0u8]);
    }
    let mut digest = hex::encode(hasher.finalize());
    digest.truncate(len);
    digest
}

// =============================================================================
// TESTS
// =============================================================================
