//! # Config Cache Service

use futures::future::{BoxFuture, FutureExt, Shared};
use parking_lot::{Mutex, RwLock};
use shared_types::{system_clock, SharedClock, TenantId};
use std::collections::HashMap;
use std::panic::AssertUnwindSafe;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, warn};

use crate::domain::{CacheStats, TenantConfig, DEFAULT_CONFIG_TTL};
use crate::error::ConfigError;
use crate::ports::TenantConfigSource;

type LoadResult = Result<Arc<TenantConfig>, ConfigError>;
type SharedLoad = Shared<BoxFuture<'static, LoadResult>>;

struct CachedEntry {
    config: Arc<TenantConfig>,
    expires_at_ms: u64,
}

/// Placeholder for a load in progress. The generation tells a finishing load
/// whether it is still the one the cache is waiting for.
struct InFlight {
    generation: u64,
    load: SharedLoad,
}

#[derive(Default)]
struct Counters {
    hits: AtomicU64,
    misses: AtomicU64,
    fetches: AtomicU64,
    coalesced: AtomicU64,
    invalidations: AtomicU64,
}

struct Inner {
    source: Arc<dyn TenantConfigSource>,
    ttl: Duration,
    clock: SharedClock,
    entries: RwLock<HashMap<TenantId, CachedEntry>>,
    in_flight: Mutex<HashMap<TenantId, InFlight>>,
    next_generation: AtomicU64,
    counters: Counters,
}

/// TTL cache in front of a [`TenantConfigSource`].
///
/// Cheap to clone; clones share the same table.
#[derive(Clone)]
pub struct ConfigCache {
    inner: Arc<Inner>,
}

impl ConfigCache {
    /// Cache with the default TTL and the system clock.
    pub fn new(source: Arc<dyn TenantConfigSource>) -> Self {
        Self::with_settings(source, DEFAULT_CONFIG_TTL, system_clock())
    }

    pub fn with_settings(
        source: Arc<dyn TenantConfigSource>,
        ttl: Duration,
        clock: SharedClock,
    ) -> Self {
        Self {
            inner: Arc::new(Inner {
                source,
                ttl,
                clock,
                entries: RwLock::new(HashMap::new()),
                in_flight: Mutex::new(HashMap::new()),
                next_generation: AtomicU64::new(1),
                counters: Counters::default(),
            }),
        }
    }

    /// Return the tenant's config, loading it at most once across concurrent
    /// callers.
    pub async fn get(&self, tenant: &TenantId) -> LoadResult {
        if let Some(config) = self.lookup(tenant) {
            self.inner.counters.hits.fetch_add(1, Ordering::Relaxed);
            return Ok(config);
        }
        self.inner.counters.misses.fetch_add(1, Ordering::Relaxed);

        let load = {
            let mut in_flight = self.inner.in_flight.lock();

            // A load may have landed between the lookup and taking the lock.
            if let Some(config) = self.lookup(tenant) {
                return Ok(config);
            }

            match in_flight.get(tenant) {
                Some(pending) => {
                    self.inner.counters.coalesced.fetch_add(1, Ordering::Relaxed);
                    pending.load.clone()
                }
                None => {
                    let generation = self.inner.next_generation.fetch_add(1, Ordering::Relaxed);
                    let load = Self::load(self.inner.clone(), tenant.clone(), generation)
                        .boxed()
                        .shared();
                    in_flight.insert(
                        tenant.clone(),
                        InFlight {
                            generation,
                            load: load.clone(),
                        },
                    );
                    load
                }
            }
        };

        load.await
    }

    /// Drop the cached entry and any in-flight placeholder for `tenant`.
    pub fn invalidate(&self, tenant: &TenantId) {
        let mut in_flight = self.inner.in_flight.lock();
        in_flight.remove(tenant);
        self.inner.entries.write().remove(tenant);
        self.inner.counters.invalidations.fetch_add(1, Ordering::Relaxed);
        debug!(tenant = %tenant, "Tenant config invalidated");
    }

    pub fn stats(&self) -> CacheStats {
        let counters = &self.inner.counters;
        CacheStats {
            hits: counters.hits.load(Ordering::Relaxed),
            misses: counters.misses.load(Ordering::Relaxed),
            fetches: counters.fetches.load(Ordering::Relaxed),
            coalesced: counters.coalesced.load(Ordering::Relaxed),
            invalidations: counters.invalidations.load(Ordering::Relaxed),
            entries: self.inner.entries.read().len(),
        }
    }

    fn lookup(&self, tenant: &TenantId) -> Option<Arc<TenantConfig>> {
        let now = self.inner.clock.now_millis();
        self.inner
            .entries
            .read()
            .get(tenant)
            .filter(|entry| entry.expires_at_ms > now)
            .map(|entry| entry.config.clone())
    }

    async fn load(inner: Arc<Inner>, tenant: TenantId, generation: u64) -> LoadResult {
        inner.counters.fetches.fetch_add(1, Ordering::Relaxed);

        // A panic inside the source must still clear the placeholder below,
        // otherwise the shared future stays poisoned for this tenant.
        let data = AssertUnwindSafe(Self::fetch_or_create(&inner, &tenant))
            .catch_unwind()
            .await
            .unwrap_or_else(|_| {
                error!(tenant = %tenant, "Tenant config source panicked");
                Err(ConfigError::SourcePanicked {
                    tenant: tenant.to_string(),
                })
            });

        let mut in_flight = inner.in_flight.lock();
        let still_current = in_flight
            .get(&tenant)
            .map(|pending| pending.generation == generation)
            .unwrap_or(false);
        if still_current {
            in_flight.remove(&tenant);
        }

        match data {
            Ok(data) => {
                let config = Arc::new(TenantConfig::new(tenant.clone(), data));
                if still_current {
                    let expires_at_ms =
                        inner.clock.now_millis().saturating_add(inner.ttl.as_millis() as u64);
                    inner.entries.write().insert(
                        tenant,
                        CachedEntry {
                            config: config.clone(),
                            expires_at_ms,
                        },
                    );
                } else {
                    debug!(tenant = %tenant, "Load finished after invalidation, not cached");
                }
                Ok(config)
            }
            Err(e) => {
                warn!(tenant = %tenant, error = %e, "Tenant config load failed");
                Err(e)
            }
        }
    }

    async fn fetch_or_create(
        inner: &Inner,
        tenant: &TenantId,
    ) -> Result<serde_json::Value, ConfigError> {
        match inner.source.fetch(tenant).await? {
            Some(data) => Ok(data),
            None => {
                debug!(tenant = %tenant, "No stored config, creating default");
                inner.source.create_default(tenant).await
            }
        }
    }
}
