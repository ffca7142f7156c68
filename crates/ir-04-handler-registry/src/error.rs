//! Error types for the handler registry and handlers

use ir_01_token_codec::TokenError;
use ir_03_config_cache::ConfigError;
use shared_types::InteractionKind;
use thiserror::Error;

/// Registration errors.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RegistryError {
    #[error("Handler already registered for {kind} {key}")]
    Duplicate { kind: InteractionKind, key: String },

    #[error("Invalid handler key {0:?} (expected ns:action or ns:action:version)")]
    InvalidKey(String),

    #[error("Invalid route pattern {pattern:?}: {reason}")]
    InvalidPattern { pattern: String, reason: String },
}

/// Errors a handler body may return.
///
/// The detail is logged; the user only ever sees a generic message.
#[derive(Debug, Error)]
pub enum HandlerError {
    #[error("Handler failed: {0}")]
    Failed(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Follow-up token could not be built: {0}")]
    Token(#[from] TokenError),

    #[error("Tenant config unavailable: {0}")]
    Config(#[from] ConfigError),
}

impl HandlerError {
    pub fn failed(reason: impl Into<String>) -> Self {
        HandlerError::Failed(reason.into())
    }
}
