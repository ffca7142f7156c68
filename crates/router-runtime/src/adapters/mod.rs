//! # Adapter Implementations
//!
//! In-memory implementations of the dispatcher's outbound ports.
//!
//! | Port | Adapter |
//! |------|---------|
//! | `DurableStore` | [`InMemoryDurableStore`] |
//! | `TenantConfigSource` | [`InMemoryTenantConfigSource`] |
//! | `MiddlewareEvaluator` | [`CooldownMiddleware`] |
//! | `InteractionResponder` | [`JsonLinesResponder`] |
//! | `DispatchMetrics` | [`PrometheusMetrics`] |

pub mod config_source;
pub mod metrics;
pub mod middleware;
pub mod responder;
pub mod store;

pub use config_source::*;
pub use metrics::*;
pub use middleware::*;
pub use responder::*;
pub use store::*;
