//! # Router Runtime
//!
//! Wires a [`Dispatcher`] from [`RouterConfig`] with the in-memory adapters
//! and exposes the JSON-lines bridge used by the `router-runtime` binary.
//!
//! ## Wiring
//!
//! ```text
//! stdin ──> bridge ──> Dispatcher ──> JsonLinesResponder ──> stdout
//!                        │  ├── CooldownMiddleware
//!                        │  ├── InMemoryTenantConfigSource
//!                        │  └── InMemoryDurableStore
//!                        └── PrometheusMetrics
//! ```

#![cfg_attr(test, allow(clippy::unwrap_used))]

pub mod adapters;
pub mod bridge;
pub mod builtin;
pub mod config;

use ir_05_dispatcher::{Dispatcher, DispatcherPorts, RegistryError, SetupError};
use serde_json::Value;
use shared_types::{system_clock, SharedClock};
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::mpsc::UnboundedSender;

use crate::adapters::{
    CooldownMiddleware, InMemoryDurableStore, InMemoryTenantConfigSource, JsonLinesResponder,
    PrometheusMetrics,
};

pub use crate::bridge::{run_bridge, BridgeError, Command, Response};
pub use crate::config::{RouterConfig, RuntimeConfigError};

#[derive(Debug, Error)]
pub enum RuntimeError {
    #[error(transparent)]
    Setup(#[from] SetupError),

    #[error("Built-in handler registration failed: {0}")]
    Registry(#[from] RegistryError),
}

/// A wired router plus handles on its adapters.
#[derive(Clone)]
pub struct Runtime {
    pub dispatcher: Dispatcher,
    pub store: Arc<InMemoryDurableStore>,
    pub tenants: Arc<InMemoryTenantConfigSource>,
    pub middleware: Arc<CooldownMiddleware>,
    pub responder: Arc<JsonLinesResponder>,
    out: UnboundedSender<Value>,
}

impl Runtime {
    /// Build on the system clock. Everything written to the platform goes
    /// to `out`.
    pub fn build(config: &RouterConfig, out: UnboundedSender<Value>) -> Result<Self, RuntimeError> {
        Self::with_clock(config, out, system_clock())
    }

    pub fn with_clock(
        config: &RouterConfig,
        out: UnboundedSender<Value>,
        clock: SharedClock,
    ) -> Result<Self, RuntimeError> {
        let store = Arc::new(InMemoryDurableStore::with_clock(clock.clone()));
        let tenants = Arc::new(InMemoryTenantConfigSource::default());
        let middleware = Arc::new(CooldownMiddleware::with_clock(clock.clone()));
        let responder = Arc::new(JsonLinesResponder::new(out.clone()));

        let ports = DispatcherPorts {
            middleware: middleware.clone(),
            store: store.clone(),
            config_source: tenants.clone(),
            responder: responder.clone(),
            metrics: Arc::new(PrometheusMetrics),
        };
        let dispatcher = Dispatcher::with_clock(
            config.secret.clone(),
            config.dispatcher.clone(),
            ports,
            clock,
        )?;
        builtin::register_builtin_handlers(&dispatcher)?;

        Ok(Self {
            dispatcher,
            store,
            tenants,
            middleware,
            responder,
            out,
        })
    }

    /// Send one line to the output stream. Returns `false` once the writer
    /// has gone away.
    pub fn emit(&self, line: Value) -> bool {
        self.out.send(line).is_ok()
    }
}
