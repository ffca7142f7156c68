//! Error types for the token codec

use thiserror::Error;

/// Errors raised while building a token.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TokenError {
    #[error("Invalid {field} segment: {value:?} (must be non-empty and contain no ':')")]
    InvalidSegment { field: &'static str, value: String },

    #[error("Token length {length} exceeds identifier cap {max}")]
    LengthExceeded { length: usize, max: usize },

    #[error("Payload serialization failed: {0}")]
    Serialization(String),

    #[error("Invalid codec configuration: {0}")]
    InvalidConfig(String),
}

/// Why an inbound token was not accepted.
///
/// Callers that only need accept/reject can use
/// [`TokenCodec::parse_opt`](crate::TokenCodec::parse_opt).
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TokenRejection {
    #[error("Malformed token: {0}")]
    Malformed(&'static str),

    #[error("Token signature mismatch")]
    Tampered,

    #[error("Token expired at {expiry} (now {now})")]
    Expired { expiry: u64, now: u64 },

    #[error("Token bound to a different actor")]
    ActorMismatch,

    #[error("Token bound to a different tenant")]
    TenantMismatch,

    #[error("Token bound to a different channel")]
    ChannelMismatch,
}

impl TokenRejection {
    /// Returns true if the token was well-formed and authentic but stale.
    #[must_use]
    pub fn is_expired(&self) -> bool {
        matches!(self, TokenRejection::Expired { .. })
    }

    /// Returns true if the token is authentic but used in the wrong context.
    #[must_use]
    pub fn is_context_mismatch(&self) -> bool {
        matches!(
            self,
            TokenRejection::ActorMismatch
                | TokenRejection::TenantMismatch
                | TokenRejection::ChannelMismatch
        )
    }

    /// Stable label for logs.
    pub fn label(&self) -> &'static str {
        match self {
            TokenRejection::Malformed(_) => "malformed",
            TokenRejection::Tampered => "tampered",
            TokenRejection::Expired { .. } => "expired",
            TokenRejection::ActorMismatch => "actor_mismatch",
            TokenRejection::TenantMismatch => "tenant_mismatch",
            TokenRejection::ChannelMismatch => "channel_mismatch",
        }
    }
}
