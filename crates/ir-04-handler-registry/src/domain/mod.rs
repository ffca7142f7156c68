//! Registry domain types

pub mod context;
pub mod descriptor;
pub mod stats;

pub use context::{HandlerContext, HandlerReply};
pub use descriptor::{AckStrategy, HandlerDescriptor, HandlerDescriptorBuilder, DEFAULT_REPLAY_TTL};
pub use stats::RouterStats;
