//! # IR-05 Dispatcher
//!
//! Drives an inbound interaction through the routing pipeline:
//!
//! ```text
//! Received -> Verified -> HandlerFound -> Acknowledged -> ReplayChecked
//!          -> MiddlewarePassed -> Authorized -> Executing -> Succeeded
//!                                                         \-> Failed
//! ```
//!
//! Any stage may short-circuit to `Failed`. The failure is counted under a
//! reason tag, logged with full detail and answered with a short generic
//! message. Nothing a handler or collaborator does (error or panic) escapes
//! [`Dispatcher::dispatch`].
//!
//! ## Ports
//!
//! | Port | Used for |
//! |------|----------|
//! | [`MiddlewareEvaluator`] | permissions, cooldowns, maintenance gates |
//! | [`DurableStore`] | persisting component state for `persist` handlers |
//! | [`TenantConfigSource`](ir_03_config_cache::TenantConfigSource) | tenant config for `needs_tenant_config` handlers |
//! | [`InteractionResponder`] | acknowledgements and replies |
//! | [`DispatchMetrics`] | external metrics sink |
//!
//! Responder sends are never retried, apart from the single fallback
//! acknowledgement.

#![cfg_attr(test, allow(clippy::unwrap_used))]

pub mod domain;
pub mod metrics;
pub mod ports;
pub mod service;

pub use domain::{
    DispatchError, DispatchOutcome, DispatcherConfig, PipelineStage, SetupError, StatsCollector,
    DEFAULT_ACK_WINDOW,
};
pub use metrics::{DispatchMetrics, NoOpMetrics};
pub use ports::{
    Ack, AllowAll, DurableStore, InteractionReply, InteractionResponder, MiddlewareEvaluator,
    MiddlewareVerdict,
    ResponderError, StoreError,
};
pub use service::{Dispatcher, DispatcherPorts};

pub use ir_04_handler_registry::{
    AckStrategy, HandlerContext, HandlerDescriptor, HandlerError, HandlerReply, RegistryError,
    RouterHandle,
    RouterStats,
};
