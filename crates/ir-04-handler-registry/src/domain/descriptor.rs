//! Handler descriptor and its builder
//!
//! The descriptor is the single normalised form of a handler registration:
//! callback plus declarative policy. The dispatcher reads the policy, the
//! middleware evaluator reads `cooldown`, nothing mutates it afterwards.

use serde::{Deserialize, Serialize};
use shared_types::{ActorId, InteractionKind, ReplayScope, RoleId};
use std::fmt;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use crate::domain::{HandlerContext, HandlerReply};
use crate::error::HandlerError;
use crate::ports::{FnHandler, InteractionHandler};

/// How long a consumed token stays consumed.
pub const DEFAULT_REPLAY_TTL: Duration = Duration::from_secs(15 * 60);

/// How the dispatcher acknowledges an event before running the handler.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AckStrategy {
    /// The handler acknowledges on its own.
    None,
    /// Defer an update of the message the component is on.
    UpdateInPlace,
    /// Defer a new reply ("thinking...").
    DeferredReply,
    /// Buttons and selects update in place; modals defer a reply.
    #[default]
    AutoByKind,
}

impl AckStrategy {
    /// Resolve `AutoByKind` for a concrete event kind.
    pub fn resolve(self, kind: InteractionKind) -> AckStrategy {
        match self {
            AckStrategy::AutoByKind => match kind {
                InteractionKind::Button | InteractionKind::SelectMenu => AckStrategy::UpdateInPlace,
                InteractionKind::ModalSubmit => AckStrategy::DeferredReply,
            },
            other => other,
        }
    }

    /// The other deferral form, tried once if the first acknowledgement fails.
    pub fn fallback(self) -> Option<AckStrategy> {
        match self {
            AckStrategy::UpdateInPlace => Some(AckStrategy::DeferredReply),
            AckStrategy::DeferredReply => Some(AckStrategy::UpdateInPlace),
            AckStrategy::None | AckStrategy::AutoByKind => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            AckStrategy::None => "none",
            AckStrategy::UpdateInPlace => "update_in_place",
            AckStrategy::DeferredReply => "deferred_reply",
            AckStrategy::AutoByKind => "auto_by_kind",
        }
    }
}

/// A registered handler with its policy.
pub struct HandlerDescriptor {
    handler: Arc<dyn InteractionHandler>,
    pub ack: AckStrategy,
    pub replay_scope: ReplayScope,
    pub replay_ttl: Duration,
    /// Only the actor the token was issued to may use it (unless elevated).
    pub caller_only: bool,
    pub allowed_users: Vec<ActorId>,
    pub allowed_roles: Vec<RoleId>,
    /// Store token state so the component survives a restart.
    pub persist: bool,
    /// Replies are visible only to the interacting actor.
    pub ephemeral: bool,
    pub needs_tenant_config: bool,
    /// Per-actor cooldown, enforced by the middleware evaluator.
    pub cooldown: Option<Duration>,
}

impl HandlerDescriptor {
    pub fn builder<H: InteractionHandler + 'static>(handler: H) -> HandlerDescriptorBuilder {
        HandlerDescriptorBuilder::new(Arc::new(handler))
    }

    /// Builder around an async closure.
    pub fn from_fn<F, Fut>(f: F) -> HandlerDescriptorBuilder
    where
        F: Fn(HandlerContext) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<HandlerReply, HandlerError>> + Send + 'static,
    {
        HandlerDescriptorBuilder::new(Arc::new(FnHandler::new(f)))
    }

    pub fn handler(&self) -> &Arc<dyn InteractionHandler> {
        &self.handler
    }

    /// Allow-list check. Empty lists allow everyone; otherwise the actor must
    /// be listed or hold a listed role.
    pub fn permits(&self, actor: &ActorId, roles: &[RoleId]) -> bool {
        if self.allowed_users.is_empty() && self.allowed_roles.is_empty() {
            return true;
        }
        self.allowed_users.contains(actor)
            || roles.iter().any(|role| self.allowed_roles.contains(role))
    }
}

impl fmt::Debug for HandlerDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HandlerDescriptor")
            .field("ack", &self.ack)
            .field("replay_scope", &self.replay_scope)
            .field("replay_ttl", &self.replay_ttl)
            .field("caller_only", &self.caller_only)
            .field("allowed_users", &self.allowed_users)
            .field("allowed_roles", &self.allowed_roles)
            .field("persist", &self.persist)
            .field("ephemeral", &self.ephemeral)
            .field("needs_tenant_config", &self.needs_tenant_config)
            .field("cooldown", &self.cooldown)
            .finish_non_exhaustive()
    }
}

/// Builder for [`HandlerDescriptor`].
pub struct HandlerDescriptorBuilder {
    descriptor: HandlerDescriptor,
}

impl HandlerDescriptorBuilder {
    fn new(handler: Arc<dyn InteractionHandler>) -> Self {
        Self {
            descriptor: HandlerDescriptor {
                handler,
                ack: AckStrategy::AutoByKind,
                replay_scope: ReplayScope::Id,
                replay_ttl: DEFAULT_REPLAY_TTL,
                caller_only: false,
                allowed_users: Vec::new(),
                allowed_roles: Vec::new(),
                persist: false,
                ephemeral: false,
                needs_tenant_config: false,
                cooldown: None,
            },
        }
    }

    pub fn ack(mut self, ack: AckStrategy) -> Self {
        self.descriptor.ack = ack;
        self
    }

    pub fn replay_scope(mut self, scope: ReplayScope) -> Self {
        self.descriptor.replay_scope = scope;
        self
    }

    pub fn replay_ttl(mut self, ttl: Duration) -> Self {
        self.descriptor.replay_ttl = ttl;
        self
    }

    pub fn caller_only(mut self, caller_only: bool) -> Self {
        self.descriptor.caller_only = caller_only;
        self
    }

    pub fn allow_user(mut self, actor: impl Into<ActorId>) -> Self {
        self.descriptor.allowed_users.push(actor.into());
        self
    }

    pub fn allow_role(mut self, role: impl Into<RoleId>) -> Self {
        self.descriptor.allowed_roles.push(role.into());
        self
    }

    pub fn persist(mut self, persist: bool) -> Self {
        self.descriptor.persist = persist;
        self
    }

    pub fn ephemeral(mut self, ephemeral: bool) -> Self {
        self.descriptor.ephemeral = ephemeral;
        self
    }

    pub fn needs_tenant_config(mut self, needs: bool) -> Self {
        self.descriptor.needs_tenant_config = needs;
        self
    }

    pub fn cooldown(mut self, cooldown: Duration) -> Self {
        self.descriptor.cooldown = Some(cooldown);
        self
    }

    /// Normalise and freeze.
    pub fn build(mut self) -> HandlerDescriptor {
        let d = &mut self.descriptor;
        d.allowed_users.sort();
        d.allowed_users.dedup();
        d.allowed_roles.sort();
        d.allowed_roles.dedup();
        if d.replay_ttl.is_zero() {
            d.replay_ttl = DEFAULT_REPLAY_TTL;
        }
        if d.cooldown.is_some_and(|c| c.is_zero()) {
            d.cooldown = None;
        }
        self.descriptor
    }
}
