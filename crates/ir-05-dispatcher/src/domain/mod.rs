//! Dispatcher domain types

pub mod config;
pub mod error;
pub mod stage;
pub mod stats;

pub use config::{DispatcherConfig, DEFAULT_ACK_WINDOW};
pub use error::{DispatchError, SetupError};
pub use stage::{DispatchOutcome, PipelineStage};
pub use stats::StatsCollector;
