//! # Runtime Wiring
//!
//! The in-memory adapters behind the dispatcher, and the JSON-lines bridge
//! driving a full build-click-stats session.

#[cfg(test)]
mod tests {
    use crate::integration::support::{button, context, Harness, START_SECS};
    use ir_05_dispatcher::{DispatchError, HandlerDescriptor, HandlerReply};
    use router_runtime::adapters::{REASON_COOLDOWN, REASON_MAINTENANCE};
    use router_runtime::run_bridge;
    use serde_json::{json, Value};
    use shared_types::{InteractionKind, MessageId, ReplayScope};
    use std::time::Duration;

    #[tokio::test]
    async fn test_persisted_component_lands_in_store() {
        let harness = Harness::new();
        let dispatcher = harness.dispatcher();
        dispatcher
            .register_handler(
                InteractionKind::Button,
                "ticket:close",
                HandlerDescriptor::from_fn(|_ctx| async { Ok(HandlerReply::silent()) })
                    .persist(true)
                    .build(),
            )
            .unwrap();
        let token = dispatcher
            .build_token(
                "ticket",
                "close",
                &context("u1", None, "c1").with_message("m42"),
                json!({"ticket": 9}),
                600,
            )
            .unwrap();

        assert!(dispatcher.dispatch(button("e1", &token, "u1", "c1")).await.is_success());

        let stored = harness.runtime.store.components_on(&MessageId::from("m42"));
        assert_eq!(stored.len(), 1);
        let (component_key, row) = &stored[0];
        assert_eq!(component_key.len(), 16);
        assert_eq!(row.expiry, START_SECS + 600);

        let blob: Value = serde_json::from_str(&row.blob).unwrap();
        assert_eq!(blob["route"], "ticket:close:1");
        assert_eq!(blob["d"], json!({"ticket": 9}));
        assert_eq!(blob["u"], "u1");
    }

    #[tokio::test]
    async fn test_cooldown_from_descriptor() {
        let harness = Harness::new();
        let dispatcher = harness.dispatcher();
        dispatcher
            .register_handler(
                InteractionKind::Button,
                "daily:spin",
                HandlerDescriptor::from_fn(|_ctx| async { Ok(HandlerReply::silent()) })
                    .replay_scope(ReplayScope::None)
                    .cooldown(Duration::from_secs(30))
                    .build(),
            )
            .unwrap();
        let token = dispatcher
            .build_token("daily", "spin", &context("u1", None, "c1"), json!({}), 0)
            .unwrap();

        assert!(dispatcher.dispatch(button("e1", &token, "u1", "c1")).await.is_success());
        let again = dispatcher.dispatch(button("e2", &token, "u1", "c1")).await;
        assert_eq!(
            again.error,
            Some(DispatchError::MiddlewareDenied(REASON_COOLDOWN.to_string()))
        );
        assert!(dispatcher.dispatch(button("e3", &token, "u2", "c1")).await.is_success());

        harness.clock.advance(Duration::from_secs(30));
        assert!(dispatcher.dispatch(button("e4", &token, "u1", "c1")).await.is_success());
        assert_eq!(dispatcher.stats().denials("middlewareDenied"), 1);
    }

    #[tokio::test]
    async fn test_maintenance_blocks_all_but_elevated() {
        let mut harness = Harness::new();
        let dispatcher = harness.dispatcher().clone();
        dispatcher
            .register_handler(
                InteractionKind::Button,
                "shop:open",
                HandlerDescriptor::from_fn(|_ctx| async { Ok(HandlerReply::silent()) })
                    .replay_scope(ReplayScope::None)
                    .build(),
            )
            .unwrap();
        let token = dispatcher
            .build_token("shop", "open", &context("u1", None, "c1"), json!({}), 0)
            .unwrap();

        harness.runtime.middleware.set_maintenance(true);
        let blocked = dispatcher.dispatch(button("e1", &token, "u1", "c1")).await;
        assert_eq!(
            blocked.error,
            Some(DispatchError::MiddlewareDenied(REASON_MAINTENANCE.to_string()))
        );
        assert_eq!(harness.replies(), vec!["This feature is temporarily unavailable."]);

        let mut owner = button("e2", &token, "owner", "c1");
        owner.elevated = true;
        assert!(dispatcher.dispatch(owner).await.is_success());
    }

    #[tokio::test]
    async fn test_bridge_session() {
        let mut harness = Harness::new();
        let dispatcher = harness.dispatcher().clone();
        dispatcher
            .register_handler(
                InteractionKind::Button,
                "poll:vote",
                HandlerDescriptor::from_fn(|ctx| async move {
                    let option = ctx.field("option").cloned().unwrap_or(Value::Null);
                    Ok(HandlerReply::text(format!("counted {}", option)))
                })
                .build(),
            )
            .unwrap();
        let token = dispatcher
            .build_token("poll", "vote", &context("u1", None, "c1"), json!({"option": "yes"}), 60)
            .unwrap();

        let click = |id: &str| {
            json!({"cmd": "dispatch", "interaction": {
                "id": id, "kind": "button", "token": token, "actor": "u1", "channel": "c1"
            }})
            .to_string()
        };
        let input = [click("e1"), json!({"cmd": "stats"}).to_string()].join("\n");

        run_bridge(harness.runtime.clone(), input.as_bytes()).await.unwrap();

        let lines = harness.drain();
        let of_type = |t: &str| {
            lines
                .iter()
                .filter(|l| l["type"] == t)
                .cloned()
                .collect::<Vec<_>>()
        };

        let acks = of_type("ack");
        assert_eq!(acks.len(), 1);
        assert_eq!(acks[0]["ack"], "update_in_place");

        let replies = of_type("reply");
        assert_eq!(replies[0]["content"], "counted \"yes\"");

        // Stats may be answered before the concurrently running dispatch
        // finishes, so only the registration counts are certain.
        let stats = of_type("stats");
        assert_eq!(stats[0]["router"]["handler_counts"]["button"], 2);

        let outcomes = of_type("outcome");
        assert_eq!(outcomes.len(), 1);
        assert_eq!(outcomes[0]["success"], true);
        assert_eq!(outcomes[0]["route"], "poll:vote:1");

        // A second session replays the same click and is refused.
        let second = click("e2");
        run_bridge(harness.runtime.clone(), second.as_bytes()).await.unwrap();
        let lines = harness.drain();
        let outcome = lines.iter().find(|l| l["type"] == "outcome").unwrap();
        assert_eq!(outcome["reason"], "replay");
    }
}
