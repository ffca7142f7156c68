//! What a handler receives and returns

use ir_01_token_codec::TokenError;
use ir_03_config_cache::TenantConfig;
use serde::Serialize;
use shared_types::{Interaction, ParsedToken};
use std::sync::Arc;

use crate::ports::RouterHandle;

/// Input to a handler invocation.
pub struct HandlerContext {
    /// Correlates every log line of one dispatch.
    pub dispatch_id: String,
    pub interaction: Interaction,
    /// The verified token; its payload is the authoritative issuer context.
    pub token: ParsedToken,
    /// Present when the descriptor asked for it and the event has a tenant.
    pub tenant_config: Option<Arc<TenantConfig>>,
    pub router: Arc<dyn RouterHandle>,
}

impl HandlerContext {
    pub fn custom(&self) -> &serde_json::Value {
        self.token.custom()
    }

    /// Custom field lookup, e.g. `ctx.field("option")`.
    pub fn field(&self, key: &str) -> Option<&serde_json::Value> {
        self.token.custom().get(key)
    }

    /// Issue a token for a component attached to this handler's reply,
    /// bound to the interacting actor, tenant and channel.
    pub fn follow_up_token(
        &self,
        namespace: &str,
        action: &str,
        custom: serde_json::Value,
        ttl_secs: u64,
    ) -> Result<String, TokenError> {
        self.router
            .build_token(namespace, action, &self.interaction.reply_context(), custom, ttl_secs)
    }
}

/// Handler output, relayed to the platform by the dispatcher.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct HandlerReply {
    /// `None` sends nothing beyond the acknowledgement.
    pub content: Option<String>,
    /// Overrides the descriptor's `ephemeral` flag when set.
    pub ephemeral: Option<bool>,
    /// Tokens for components attached to the reply.
    pub components: Vec<String>,
}

impl HandlerReply {
    pub fn text(content: impl Into<String>) -> Self {
        Self {
            content: Some(content.into()),
            ..Default::default()
        }
    }

    /// Acknowledge only.
    pub fn silent() -> Self {
        Self::default()
    }

    pub fn ephemeral(mut self, ephemeral: bool) -> Self {
        self.ephemeral = Some(ephemeral);
        self
    }

    pub fn with_component(mut self, token: impl Into<String>) -> Self {
        self.components.push(token.into());
        self
    }
}
