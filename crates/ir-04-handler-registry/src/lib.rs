//! # IR-04 Handler Registry
//!
//! Maps verified routes to handler descriptors, one namespace per
//! interaction kind.
//!
//! ## Resolution Order
//!
//! For a verified token `ns:action:version` arriving as kind `K`:
//!
//! 1. exact `ns:action:version` registered for `K`
//! 2. exact `ns:action` registered for `K`
//! 3. the first pattern registered for `K` that matches `ns:action:version`
//!
//! Patterns only ever see the route of a token whose signature already
//! verified, never raw input.
//!
//! ## Descriptors
//!
//! A [`HandlerDescriptor`] pairs the handler callback with its declarative
//! policy (acknowledgement, replay scope, caller-only, allow-lists,
//! persistence). It is built once and shared as `Arc<HandlerDescriptor>`.

#![cfg_attr(test, allow(clippy::unwrap_used))]

pub mod domain;
pub mod error;
pub mod ports;
pub mod service;

pub use domain::{
    AckStrategy, HandlerContext, HandlerDescriptor, HandlerDescriptorBuilder, HandlerReply,
    RouterStats,
    DEFAULT_REPLAY_TTL,
};
pub use error::{HandlerError, RegistryError};
pub use ports::{FnHandler, InteractionHandler, RouterHandle};
pub use service::HandlerRegistry;
