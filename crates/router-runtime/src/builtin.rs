//! Handlers registered by the runtime itself.

use async_trait::async_trait;
use ir_04_handler_registry::InteractionHandler;
use ir_05_dispatcher::{
    Dispatcher, HandlerContext, HandlerDescriptor, HandlerError, HandlerReply, RegistryError,
    RouterStats,
};
use shared_types::{InteractionKind, ReplayScope};
use tracing::debug;

pub const STATS_NAMESPACE: &str = "router";
pub const STATS_ACTION: &str = "stats";

/// `router:stats` button: a private summary of the router counters with a
/// refresh button that carries the same route.
pub struct StatsHandler;

#[async_trait]
impl InteractionHandler for StatsHandler {
    async fn handle(&self, ctx: HandlerContext) -> Result<HandlerReply, HandlerError> {
        let reply = HandlerReply::text(render(&ctx.router.stats()));

        // Long actor or channel ids can push the refresh token over the cap.
        match ctx.follow_up_token(STATS_NAMESPACE, STATS_ACTION, serde_json::Value::Null, 0) {
            Ok(refresh) => Ok(reply.with_component(refresh)),
            Err(e) => {
                debug!(error = %e, "Stats reply sent without a refresh button");
                Ok(reply)
            }
        }
    }
}

fn render(stats: &RouterStats) -> String {
    let mut lines = vec![format!(
        "executions: {}  errors: {}  mean latency: {}us",
        stats.total_executions(),
        stats.error_count,
        stats.mean_execution_latency_us
    )];
    lines.extend(
        stats
            .handler_counts
            .iter()
            .map(|(kind, count)| format!("{} handlers: {}", kind, count)),
    );
    lines.extend(
        stats
            .denial_counts
            .iter()
            .map(|(reason, count)| format!("denied ({}): {}", reason, count)),
    );
    lines.join("\n")
}

pub fn register_builtin_handlers(dispatcher: &Dispatcher) -> Result<(), RegistryError> {
    dispatcher.register_handler(
        InteractionKind::Button,
        &format!("{}:{}", STATS_NAMESPACE, STATS_ACTION),
        HandlerDescriptor::builder(StatsHandler)
            .replay_scope(ReplayScope::None)
            .ephemeral(true)
            .build(),
    )
}
