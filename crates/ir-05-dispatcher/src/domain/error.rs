//! Dispatch failure taxonomy

use ir_01_token_codec::{TokenError, TokenRejection};
use shared_types::InteractionKind;
use thiserror::Error;

/// Why a dispatch did not succeed.
///
/// The `Display` form is for logs. Users only ever see
/// [`user_message`](DispatchError::user_message).
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DispatchError {
    #[error("Token rejected: {0}")]
    InvalidToken(TokenRejection),

    #[error("Token expired")]
    Expired,

    #[error("Token already used")]
    ReplayDetected,

    #[error("No {kind} handler for {route}")]
    UnknownHandler { kind: InteractionKind, route: String },

    #[error("Denied by middleware: {0}")]
    MiddlewareDenied(String),

    #[error("Component restricted to the issuing actor")]
    CallerOnlyViolation,

    #[error("Actor not on the handler allow-list")]
    NotAllowed,

    #[error("Handler failed: {0}")]
    HandlerExecution(String),

    #[error("Router failure: {0}")]
    Router(String),
}

impl DispatchError {
    pub fn from_rejection(rejection: TokenRejection) -> Self {
        if rejection.is_expired() {
            DispatchError::Expired
        } else {
            DispatchError::InvalidToken(rejection)
        }
    }

    /// Counter tag. Expiry is counted with the other token rejections.
    pub fn reason(&self) -> &'static str {
        match self {
            DispatchError::InvalidToken(_) | DispatchError::Expired => "invalidToken",
            DispatchError::ReplayDetected => "replay",
            DispatchError::UnknownHandler { .. } => "unknownHandler",
            DispatchError::MiddlewareDenied(_) => "middlewareDenied",
            DispatchError::CallerOnlyViolation => "callerOnly",
            DispatchError::NotAllowed => "notAllowed",
            DispatchError::HandlerExecution(_) => "handlerError",
            DispatchError::Router(_) => "routerError",
        }
    }

    /// Policy denials, as opposed to failures of a handler or the router.
    pub fn is_denial(&self) -> bool {
        !matches!(self, DispatchError::HandlerExecution(_) | DispatchError::Router(_))
    }

    /// Short text safe to show the interacting user.
    pub fn user_message(&self) -> &'static str {
        match self {
            DispatchError::InvalidToken(_) => "This component is no longer valid.",
            DispatchError::Expired => "This component has expired.",
            DispatchError::ReplayDetected => "This action has already been handled.",
            DispatchError::UnknownHandler { .. } => "This component is unknown or expired.",
            DispatchError::MiddlewareDenied(reason) => match reason.as_str() {
                "cooldown" => "You're doing that too often. Try again shortly.",
                "maintenance" => "This feature is temporarily unavailable.",
                _ => "You can't use this right now.",
            },
            DispatchError::CallerOnlyViolation => "Only the person who opened this can use it.",
            DispatchError::NotAllowed => "You don't have permission to use this.",
            DispatchError::HandlerExecution(_) | DispatchError::Router(_) => {
                "Something went wrong. Please try again later."
            }
        }
    }
}

/// Errors constructing a dispatcher.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SetupError {
    #[error(transparent)]
    Codec(#[from] TokenError),

    #[error("Invalid replay guard config: {0}")]
    Replay(&'static str),

    #[error("Config cache TTL must be positive")]
    CacheTtl,
}
