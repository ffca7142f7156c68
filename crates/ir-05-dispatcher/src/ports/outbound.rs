//! Outbound Ports (Driven Ports)

use async_trait::async_trait;
use ir_04_handler_registry::{AckStrategy, HandlerDescriptor};
use serde::{Deserialize, Serialize};
use shared_types::{Interaction, MessageId};
use thiserror::Error;

// =============================================================================
// MIDDLEWARE
// =============================================================================

/// Middleware decision.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MiddlewareVerdict {
    pub allowed: bool,
    /// Reason code on denial (e.g. `cooldown`, `maintenance`).
    pub reason: Option<String>,
}

impl MiddlewareVerdict {
    pub fn allow() -> Self {
        Self {
            allowed: true,
            reason: None,
        }
    }

    pub fn deny(reason: impl Into<String>) -> Self {
        Self {
            allowed: false,
            reason: Some(reason.into()),
        }
    }
}

/// Permission, cooldown and maintenance checks run after the replay check
/// and before the caller-only and allow-list policy.
#[async_trait]
pub trait MiddlewareEvaluator: Send + Sync {
    async fn evaluate(
        &self,
        interaction: &Interaction,
        descriptor: &HandlerDescriptor,
    ) -> MiddlewareVerdict;
}

/// Evaluator that lets everything through.
#[derive(Debug, Default, Clone, Copy)]
pub struct AllowAll;

#[async_trait]
impl MiddlewareEvaluator for AllowAll {
    async fn evaluate(
        &self,
        _interaction: &Interaction,
        _descriptor: &HandlerDescriptor,
    ) -> MiddlewareVerdict {
        MiddlewareVerdict::allow()
    }
}

// =============================================================================
// DURABLE STORE
// =============================================================================

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StoreError {
    #[error("Store unavailable: {0}")]
    Unavailable(String),

    #[error("Store rejected write: {0}")]
    Rejected(String),
}

/// Key-value persistence for component state.
#[async_trait]
pub trait DurableStore: Send + Sync {
    /// Insert or replace the state of one component on one message.
    ///
    /// `expiry` is in epoch seconds, `0` for never.
    async fn upsert(
        &self,
        message: &MessageId,
        component_key: &str,
        blob: &str,
        expiry: u64,
    ) -> Result<(), StoreError>;
}

// =============================================================================
// RESPONDER
// =============================================================================

/// Deferred acknowledgement forms.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Ack {
    UpdateInPlace,
    DeferredReply,
}

impl Ack {
    /// `None` for strategies that do not acknowledge (or are unresolved).
    pub fn from_strategy(strategy: AckStrategy) -> Option<Ack> {
        match strategy {
            AckStrategy::UpdateInPlace => Some(Ack::UpdateInPlace),
            AckStrategy::DeferredReply => Some(Ack::DeferredReply),
            AckStrategy::None | AckStrategy::AutoByKind => None,
        }
    }
}

/// Message sent back to the platform.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InteractionReply {
    pub content: String,
    pub ephemeral: bool,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub components: Vec<String>,
}

impl InteractionReply {
    /// Private notice to the interacting actor.
    pub fn notice(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            ephemeral: true,
            components: Vec::new(),
        }
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ResponderError {
    #[error("Interaction already acknowledged")]
    AlreadyAcknowledged,

    #[error("Acknowledgement window elapsed")]
    WindowElapsed,

    #[error("Transport failure: {0}")]
    Transport(String),
}

/// Platform side of an interaction.
#[async_trait]
pub trait InteractionResponder: Send + Sync {
    async fn acknowledge(&self, interaction: &Interaction, ack: Ack) -> Result<(), ResponderError>;

    async fn reply(
        &self,
        interaction: &Interaction,
        reply: InteractionReply,
    ) -> Result<(), ResponderError>;
}
