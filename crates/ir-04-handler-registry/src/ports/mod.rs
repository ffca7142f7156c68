//! Ports Layer
//!
//! - Driving port (inbound): [`RouterHandle`], what handlers may ask of the
//!   router while they run
//! - Driven port (outbound): [`InteractionHandler`], the callback the router
//!   invokes

pub mod inbound;
pub mod outbound;

pub use inbound::RouterHandle;
pub use outbound::{FnHandler, InteractionHandler};
