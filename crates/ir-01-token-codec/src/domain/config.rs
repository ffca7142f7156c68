//! Token codec configuration and validation

use crate::error::TokenError;
use serde::{Deserialize, Serialize};
use shared_types::SIGNATURE_LEN;

/// Platform identifier cap (characters).
pub const DEFAULT_MAX_TOKEN_LENGTH: usize = 100;

/// Tolerated clock drift when checking expiry (seconds).
pub const DEFAULT_CLOCK_SKEW_SECS: u64 = 30;

/// Longest signature a SHA-256 MAC can produce in base64url.
const MAX_SIGNATURE_LEN: usize = 43;

/// Shortest signature we are willing to trust.
const MIN_SIGNATURE_LEN: usize = 8;

/// Codec configuration.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TokenCodecConfig {
    /// Hard cap on the encoded token length.
    pub max_token_length: usize,
    /// Grace period past `expiry` before a token is rejected.
    pub clock_skew_secs: u64,
    /// Truncated signature length in base64url characters.
    pub signature_len: usize,
    /// Treat a channel mismatch as a hard failure instead of a warning.
    pub strict_channel: bool,
}

impl Default for TokenCodecConfig {
    fn default() -> Self {
        Self {
            max_token_length: DEFAULT_MAX_TOKEN_LENGTH,
            clock_skew_secs: DEFAULT_CLOCK_SKEW_SECS,
            signature_len: SIGNATURE_LEN,
            strict_channel: false,
        }
    }
}

impl TokenCodecConfig {
    pub fn validate(&self) -> Result<(), TokenError> {
        if self.signature_len < MIN_SIGNATURE_LEN || self.signature_len > MAX_SIGNATURE_LEN {
            return Err(TokenError::InvalidConfig(format!(
                "signature_len must be between {} and {}",
                MIN_SIGNATURE_LEN, MAX_SIGNATURE_LEN
            )));
        }

        // Room for four separators, the signature and at least one char per segment.
        let minimum = self.signature_len + 8;
        if self.max_token_length < minimum {
            return Err(TokenError::InvalidConfig(format!(
                "max_token_length must be at least {}",
                minimum
            )));
        }

        Ok(())
    }

    /// Builder-style method to set the identifier cap
    pub fn with_max_token_length(mut self, max: usize) -> Self {
        self.max_token_length = max;
        self
    }

    /// Builder-style method to set the clock skew tolerance
    pub fn with_clock_skew_secs(mut self, secs: u64) -> Self {
        self.clock_skew_secs = secs;
        self
    }

    /// Builder-style method to enable strict channel binding
    pub fn with_strict_channel(mut self, strict: bool) -> Self {
        self.strict_channel = strict;
        self
    }
}
