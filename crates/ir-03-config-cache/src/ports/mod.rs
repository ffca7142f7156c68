//! Outbound port: where tenant configs come from

use async_trait::async_trait;
use shared_types::TenantId;

use crate::error::ConfigError;

/// Backing store for tenant configuration (database, file, remote service).
#[async_trait]
pub trait TenantConfigSource: Send + Sync + 'static {
    /// Load the stored config, `Ok(None)` if the tenant has none yet.
    async fn fetch(&self, tenant: &TenantId) -> Result<Option<serde_json::Value>, ConfigError>;

    /// Create, persist and return the default config for a new tenant.
    async fn create_default(&self, tenant: &TenantId) -> Result<serde_json::Value, ConfigError>;
}
