//! # Replay Protection
//!
//! The same component clicked more than once, under each replay scope.

#[cfg(test)]
mod tests {
    use crate::integration::support::{button, context, Harness};
    use ir_05_dispatcher::{DispatchError, HandlerDescriptor, HandlerReply, PipelineStage};
    use serde_json::json;
    use shared_types::{InteractionKind, ReplayScope};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use std::time::Duration;

    fn register(
        harness: &Harness,
        key: &str,
        scope: ReplayScope,
        ttl: Duration,
    ) -> Arc<AtomicUsize> {
        let runs = Arc::new(AtomicUsize::new(0));
        let counter = runs.clone();
        harness
            .dispatcher()
            .register_handler(
                InteractionKind::Button,
                key,
                HandlerDescriptor::from_fn(move |_ctx| {
                    counter.fetch_add(1, Ordering::SeqCst);
                    async { Ok(HandlerReply::silent()) }
                })
                .replay_scope(scope)
                .replay_ttl(ttl)
                .build(),
            )
            .unwrap();
        runs
    }

    #[tokio::test]
    async fn test_id_scope_executes_once() {
        let mut harness = Harness::new();
        let runs = register(&harness, "shop:buy", ReplayScope::Id, Duration::from_secs(900));
        let token = harness
            .dispatcher()
            .build_token("shop", "buy", &context("u1", None, "c1"), json!({"item": 7}), 300)
            .unwrap();

        let first = harness.dispatcher().dispatch(button("e1", &token, "u1", "c1")).await;
        let second = harness.dispatcher().dispatch(button("e2", &token, "u1", "c1")).await;

        assert!(first.is_success());
        assert_eq!(second.error, Some(DispatchError::ReplayDetected));
        assert_eq!(second.reason(), "replay");
        assert_eq!(second.last_stage, PipelineStage::Acknowledged);
        assert_eq!(runs.load(Ordering::SeqCst), 1);

        let stats = harness.dispatcher().stats();
        assert_eq!(stats.denials("replay"), 1);
        assert_eq!(stats.execution_counts["button:shop:buy"], 1);
        assert_eq!(harness.replies(), vec!["This action has already been handled."]);
    }

    #[tokio::test]
    async fn test_id_scope_spans_users() {
        let harness = Harness::new();
        let runs = register(&harness, "shop:buy", ReplayScope::Id, Duration::from_secs(900));
        let token = harness
            .dispatcher()
            .build_token("shop", "buy", &context("u1", None, "c1"), json!({}), 300)
            .unwrap();

        assert!(harness.dispatcher().dispatch(button("e1", &token, "u1", "c1")).await.is_success());
        let second = harness.dispatcher().dispatch(button("e2", &token, "u2", "c1")).await;
        assert!(!second.is_success());
        assert_eq!(runs.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_user_scope_once_per_user() {
        let harness = Harness::new();
        let runs = register(&harness, "event:join", ReplayScope::User, Duration::from_secs(900));
        let token = harness
            .dispatcher()
            .build_token("event", "join", &context("host", None, "c1"), json!({}), 300)
            .unwrap();

        for (id, actor) in [("e1", "u1"), ("e2", "u2"), ("e3", "u1"), ("e4", "u3")] {
            harness.dispatcher().dispatch(button(id, &token, actor, "c1")).await;
        }
        assert_eq!(runs.load(Ordering::SeqCst), 3);
        assert_eq!(harness.dispatcher().stats().denials("replay"), 1);
    }

    #[tokio::test]
    async fn test_channel_scope_once_per_channel() {
        let harness = Harness::new();
        let runs = register(&harness, "alert:ack", ReplayScope::Channel, Duration::from_secs(900));
        let token = harness
            .dispatcher()
            .build_token("alert", "ack", &context("u1", None, "c1"), json!({}), 300)
            .unwrap();

        harness.dispatcher().dispatch(button("e1", &token, "u1", "c1")).await;
        harness.dispatcher().dispatch(button("e2", &token, "u2", "c1")).await;
        harness.dispatcher().dispatch(button("e3", &token, "u2", "c2")).await;
        assert_eq!(runs.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_consumed_token_usable_after_replay_ttl() {
        let harness = Harness::new();
        let runs = register(&harness, "daily:claim", ReplayScope::Id, Duration::from_secs(10));
        let token = harness
            .dispatcher()
            .build_token("daily", "claim", &context("u1", None, "c1"), json!({}), 0)
            .unwrap();

        assert!(harness.dispatcher().dispatch(button("e1", &token, "u1", "c1")).await.is_success());
        harness.clock.advance(Duration::from_secs(5));
        let second = harness.dispatcher().dispatch(button("e2", &token, "u1", "c1")).await;
        assert!(!second.is_success());
        harness.clock.advance(Duration::from_secs(6));
        assert!(harness.dispatcher().dispatch(button("e3", &token, "u1", "c1")).await.is_success());
        assert_eq!(runs.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_concurrent_clicks_execute_once() {
        let harness = Harness::new();
        let runs = register(&harness, "shop:buy", ReplayScope::Id, Duration::from_secs(900));
        let token = harness
            .dispatcher()
            .build_token("shop", "buy", &context("u1", None, "c1"), json!({}), 300)
            .unwrap();

        let clicks = (0..16).map(|i| {
            let dispatcher = harness.dispatcher().clone();
            let event = button(&format!("e{}", i), &token, "u1", "c1");
            tokio::spawn(async move { dispatcher.dispatch(event).await })
        });
        let outcomes = futures::future::join_all(clicks).await;

        let succeeded = outcomes.into_iter().filter(|o| o.as_ref().unwrap().is_success()).count();
        assert_eq!(succeeded, 1);
        assert_eq!(runs.load(Ordering::SeqCst), 1);
        assert_eq!(harness.dispatcher().stats().denials("replay"), 15);
    }
}
