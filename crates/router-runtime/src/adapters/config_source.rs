//! In-memory tenant configuration source.

use async_trait::async_trait;
use ir_03_config_cache::{ConfigError, TenantConfigSource};
use parking_lot::RwLock;
use serde_json::Value;
use shared_types::TenantId;
use std::collections::HashMap;
use tracing::info;

/// `TenantConfigSource` holding documents in a map.
///
/// Unknown tenants get a copy of the default template, which is then stored
/// so the next fetch finds it.
pub struct InMemoryTenantConfigSource {
    documents: RwLock<HashMap<TenantId, Value>>,
    template: Value,
}

impl Default for InMemoryTenantConfigSource {
    fn default() -> Self {
        Self::new(serde_json::json!({}))
    }
}

impl InMemoryTenantConfigSource {
    pub fn new(template: Value) -> Self {
        Self {
            documents: RwLock::new(HashMap::new()),
            template,
        }
    }

    /// Replace a tenant's document. Cached copies stay until invalidated.
    pub fn set(&self, tenant: impl Into<TenantId>, document: Value) {
        self.documents.write().insert(tenant.into(), document);
    }

    pub fn remove(&self, tenant: &TenantId) -> Option<Value> {
        self.documents.write().remove(tenant)
    }

    pub fn contains(&self, tenant: &TenantId) -> bool {
        self.documents.read().contains_key(tenant)
    }
}

#[async_trait]
impl TenantConfigSource for InMemoryTenantConfigSource {
    async fn fetch(&self, tenant: &TenantId) -> Result<Option<Value>, ConfigError> {
        Ok(self.documents.read().get(tenant).cloned())
    }

    async fn create_default(&self, tenant: &TenantId) -> Result<Value, ConfigError> {
        if !self.template.is_object() {
            return Err(ConfigError::DefaultCreationFailed {
                tenant: tenant.to_string(),
                reason: "default template is not an object".to_string(),
            });
        }
        let document = self
            .documents
            .write()
            .entry(tenant.clone())
            .or_insert_with(|| self.template.clone())
            .clone();
        info!(tenant = %tenant, "Default tenant configuration created");
        Ok(document)
    }
}
