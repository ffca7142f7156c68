//! Inbound Ports (Driving Ports)

use ir_01_token_codec::TokenError;
use shared_types::{InteractionContext, TenantId};

use crate::domain::RouterStats;

/// Router operations available to handlers and host code.
pub trait RouterHandle: Send + Sync {
    /// Build a version-1 token bound to `context`.
    fn build_token(
        &self,
        namespace: &str,
        action: &str,
        context: &InteractionContext,
        custom: serde_json::Value,
        ttl_secs: u64,
    ) -> Result<String, TokenError>;

    /// Drop the tenant's cached config so the next read reloads it.
    fn invalidate_tenant_cache(&self, tenant: &TenantId);

    fn stats(&self) -> RouterStats;
}
