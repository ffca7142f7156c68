//! # IR-03 Tenant Config Cache
//!
//! Loads per-tenant configuration from a pluggable source and keeps it for a
//! fixed TTL.
//!
//! ## Loading Rules
//!
//! - A fresh entry is served without touching the source
//! - Concurrent misses for one tenant share a single in-flight load
//! - A tenant with no stored config gets one created through the source
//! - Failed loads are never cached; the next caller retries
//! - `invalidate` drops the entry and any in-flight placeholder, and a load
//!   that was already running when it was invalidated does not repopulate
//!   the cache

#![cfg_attr(test, allow(clippy::unwrap_used))]

pub mod domain;
pub mod error;
pub mod ports;
pub mod service;

pub use domain::{CacheStats, TenantConfig, DEFAULT_CONFIG_TTL};
pub use error::ConfigError;
pub use ports::TenantConfigSource;
pub use service::ConfigCache;
