//! # Integration Scenarios
//!
//! Each module drives a fully wired router (runtime adapters, shared manual
//! clock) through one end-to-end behavior.

#[cfg(test)]
mod support;

pub mod replay;
pub mod routing;
pub mod runtime;
pub mod tenant_config;
pub mod token_lifecycle;
