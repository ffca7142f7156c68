//! Outbound Ports (Driven Ports)

use async_trait::async_trait;
use std::future::Future;

use crate::domain::{HandlerContext, HandlerReply};
use crate::error::HandlerError;

/// A command handler for one route.
#[async_trait]
pub trait InteractionHandler: Send + Sync {
    async fn handle(&self, ctx: HandlerContext) -> Result<HandlerReply, HandlerError>;
}

/// Adapts an async closure into an [`InteractionHandler`].
pub struct FnHandler<F> {
    f: F,
}

impl<F> FnHandler<F> {
    pub fn new(f: F) -> Self {
        Self { f }
    }
}

#[async_trait]
impl<F, Fut> InteractionHandler for FnHandler<F>
where
    F: Fn(HandlerContext) -> Fut + Send + Sync,
    Fut: Future<Output = Result<HandlerReply, HandlerError>> + Send,
{
    async fn handle(&self, ctx: HandlerContext) -> Result<HandlerReply, HandlerError> {
        (self.f)(ctx).await
    }
}
