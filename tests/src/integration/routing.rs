//! # Handler Resolution and Policy
//!
//! Which handler a verified token lands on, and who may trigger it.

#[cfg(test)]
mod tests {
    use crate::integration::support::{button, context, event, Harness};
    use ir_05_dispatcher::{
        AckStrategy, DispatchError, HandlerDescriptor, HandlerError, HandlerReply,
    };
    use serde_json::json;
    use shared_types::{InteractionKind, ReplayScope};

    fn tagged(tag: &'static str) -> HandlerDescriptor {
        HandlerDescriptor::from_fn(move |_ctx| async move { Ok(HandlerReply::text(tag)) })
            .replay_scope(ReplayScope::None)
            .build()
    }

    #[tokio::test]
    async fn test_versioned_then_unversioned_then_pattern() {
        let mut harness = Harness::new();
        let dispatcher = harness.dispatcher().clone();
        dispatcher.register_pattern(InteractionKind::Button, "^poll:", tagged("pattern")).unwrap();
        dispatcher
            .register_handler(InteractionKind::Button, "poll:vote", tagged("any version"))
            .unwrap();
        dispatcher.register_handler(InteractionKind::Button, "poll:vote:2", tagged("v2")).unwrap();

        let ctx = context("u1", None, "c1");
        let v2 = dispatcher.codec().build("poll", "vote", 2, &ctx, json!({}), 60).unwrap();
        let v1 = dispatcher.codec().build("poll", "vote", 1, &ctx, json!({}), 60).unwrap();
        let v3 = dispatcher.codec().build("poll", "vote", 3, &ctx, json!({}), 60).unwrap();
        let close = dispatcher.build_token("poll", "close", &ctx, json!({}), 60).unwrap();
        let quiz = dispatcher.build_token("quiz", "answer", &ctx, json!({}), 60).unwrap();

        for (i, token) in [&v2, &v1, &v3, &close].into_iter().enumerate() {
            let outcome = dispatcher.dispatch(button(&format!("e{}", i), token, "u1", "c1")).await;
            assert!(outcome.is_success());
        }
        assert_eq!(harness.replies(), vec!["v2", "any version", "any version", "pattern"]);

        let outcome = dispatcher.dispatch(button("e9", &quiz, "u1", "c1")).await;
        assert!(matches!(outcome.error, Some(DispatchError::UnknownHandler { .. })));
        assert_eq!(harness.replies(), vec!["This component is unknown or expired."]);
    }

    #[tokio::test]
    async fn test_kind_selects_the_table() {
        let harness = Harness::new();
        let dispatcher = harness.dispatcher();
        dispatcher
            .register_handler(InteractionKind::ModalSubmit, "form:send", tagged("modal"))
            .unwrap();
        let token = dispatcher
            .build_token("form", "send", &context("u1", None, "c1"), json!({}), 60)
            .unwrap();

        let as_button = dispatcher.dispatch(button("e1", &token, "u1", "c1")).await;
        assert_eq!(as_button.reason(), "unknownHandler");

        let as_modal = event("e2", InteractionKind::ModalSubmit, &token, "u1", None, "c1");
        assert!(dispatcher.dispatch(as_modal).await.is_success());
    }

    #[tokio::test]
    async fn test_caller_only_and_elevation() {
        let harness = Harness::new();
        let dispatcher = harness.dispatcher();
        dispatcher
            .register_handler(
                InteractionKind::Button,
                "panel:open",
                HandlerDescriptor::from_fn(|_ctx| async { Ok(HandlerReply::silent()) })
                    .replay_scope(ReplayScope::None)
                    .caller_only(true)
                    .build(),
            )
            .unwrap();
        let token = dispatcher
            .build_token("panel", "open", &context("owner-of-panel", None, "c1"), json!({}), 60)
            .unwrap();

        let stranger = dispatcher.dispatch(button("e1", &token, "someone", "c1")).await;
        assert_eq!(stranger.error, Some(DispatchError::CallerOnlyViolation));

        let mut admin = button("e2", &token, "admin", "c1");
        admin.elevated = true;
        assert!(dispatcher.dispatch(admin).await.is_success());

        assert!(dispatcher
            .dispatch(button("e3", &token, "owner-of-panel", "c1"))
            .await
            .is_success());
        assert_eq!(dispatcher.stats().denials("callerOnly"), 1);
    }

    #[tokio::test]
    async fn test_role_allow_list() {
        let harness = Harness::new();
        let dispatcher = harness.dispatcher();
        dispatcher
            .register_handler(
                InteractionKind::Button,
                "mod:ban",
                HandlerDescriptor::from_fn(|_ctx| async { Ok(HandlerReply::silent()) })
                    .replay_scope(ReplayScope::None)
                    .allow_role("moderator")
                    .build(),
            )
            .unwrap();
        let token = dispatcher
            .build_token("mod", "ban", &context("u1", None, "c1"), json!({}), 60)
            .unwrap();

        let member = dispatcher.dispatch(button("e1", &token, "u1", "c1")).await;
        assert_eq!(member.error, Some(DispatchError::NotAllowed));

        let mut moderator = button("e2", &token, "u1", "c1");
        moderator.roles = vec!["moderator".into()];
        assert!(dispatcher.dispatch(moderator).await.is_success());
    }

    #[tokio::test]
    async fn test_failing_handler_is_contained() {
        let mut harness = Harness::new();
        let dispatcher = harness.dispatcher().clone();
        dispatcher
            .register_handler(
                InteractionKind::Button,
                "job:run",
                HandlerDescriptor::from_fn(|_ctx| async {
                    Err(HandlerError::failed("database is down"))
                })
                .replay_scope(ReplayScope::None)
                .build(),
            )
            .unwrap();
        dispatcher
            .register_handler(
                InteractionKind::Button,
                "job:crash",
                HandlerDescriptor::from_fn(|_ctx| async {
                    if true {
                        panic!("boom");
                    }
                    Ok(HandlerReply::silent())
                })
                .replay_scope(ReplayScope::None)
                .ack(AckStrategy::None)
                .build(),
            )
            .unwrap();
        let ctx = context("u1", None, "c1");
        let run = dispatcher.build_token("job", "run", &ctx, json!({}), 60).unwrap();
        let crash = dispatcher.build_token("job", "crash", &ctx, json!({}), 60).unwrap();

        let failed = dispatcher.dispatch(button("e1", &run, "u1", "c1")).await;
        assert_eq!(failed.reason(), "handlerError");
        let panicked = dispatcher.dispatch(button("e2", &crash, "u1", "c1")).await;
        assert_eq!(panicked.reason(), "handlerError");

        // Users see a generic message, never the handler's error text.
        let replies = harness.replies();
        assert_eq!(replies.len(), 2);
        assert!(replies.iter().all(|r| r == "Something went wrong. Please try again later."));

        let stats = dispatcher.stats();
        assert_eq!(stats.error_count, 2);
        assert_eq!(stats.total_executions(), 0);
    }
}
