//! Ports Layer
//!
//! Driven ports the dispatcher calls out to. Hosts supply implementations;
//! the runtime crate ships in-memory ones.

pub mod outbound;

pub use outbound::{
    Ack, AllowAll, DurableStore, InteractionReply, InteractionResponder, MiddlewareEvaluator,
    MiddlewareVerdict,
    ResponderError, StoreError,
};
