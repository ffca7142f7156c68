//! # Token Lifecycle
//!
//! A component token issued through the router, clicked within its lifetime,
//! clicked again after it lapsed, and tampered with on the way back.

#[cfg(test)]
mod tests {
    use crate::integration::support::{button, context, event, Harness};
    use ir_01_token_codec::TokenRejection;
    use ir_05_dispatcher::{DispatchError, HandlerDescriptor, HandlerReply, PipelineStage};
    use parking_lot::Mutex;
    use serde_json::json;
    use shared_types::{InteractionKind, ReplayScope};
    use std::sync::Arc;
    use std::time::Duration;

    fn register_vote(harness: &Harness) -> Arc<Mutex<Vec<String>>> {
        let votes = Arc::new(Mutex::new(Vec::new()));
        let sink = votes.clone();
        harness
            .dispatcher()
            .register_handler(
                InteractionKind::Button,
                "poll:vote",
                HandlerDescriptor::from_fn(move |ctx| {
                    let sink = sink.clone();
                    async move {
                        let option = ctx
                            .field("option")
                            .and_then(|v| v.as_str())
                            .unwrap_or("?")
                            .to_string();
                        sink.lock().push(option.clone());
                        Ok(HandlerReply::text(format!("voted {}", option)))
                    }
                })
                .replay_scope(ReplayScope::None)
                .build(),
            )
            .unwrap();
        votes
    }

    #[tokio::test]
    async fn test_poll_vote_within_and_after_lifetime() {
        let mut harness = Harness::new();
        let votes = register_vote(&harness);
        let token = harness
            .dispatcher()
            .build_token("poll", "vote", &context("u1", None, "c1"), json!({"option": "yes"}), 60)
            .unwrap();

        harness.clock.advance(Duration::from_secs(1));
        let parsed = harness.dispatcher().codec().parse(&token, None).unwrap();
        assert_eq!(parsed.namespace, "poll");
        assert_eq!(parsed.action, "vote");
        assert_eq!(parsed.version, 1);
        assert_eq!(parsed.custom(), &json!({"option": "yes"}));

        let outcome = harness.dispatcher().dispatch(button("e1", &token, "u1", "c1")).await;
        assert!(outcome.is_success(), "{:?}", outcome.error);
        assert_eq!(outcome.route.as_deref(), Some("poll:vote:1"));
        assert_eq!(*votes.lock(), vec!["yes"]);
        assert_eq!(harness.replies(), vec!["voted yes"]);

        // 60 s lifetime plus the 30 s skew allowance, then one more second.
        harness.clock.advance(Duration::from_secs(60 + 30));
        assert!(matches!(
            harness.dispatcher().codec().parse(&token, None),
            Err(TokenRejection::Expired { .. })
        ));

        let outcome = harness.dispatcher().dispatch(button("e2", &token, "u1", "c1")).await;
        assert_eq!(outcome.error, Some(DispatchError::Expired));
        assert_eq!(outcome.reason(), "invalidToken");
        assert_eq!(outcome.last_stage, PipelineStage::Received);
        assert_eq!(votes.lock().len(), 1);
        assert_eq!(harness.replies(), vec!["This component has expired."]);
    }

    #[tokio::test]
    async fn test_zero_ttl_never_expires() {
        let harness = Harness::new();
        register_vote(&harness);
        let token = harness
            .dispatcher()
            .build_token("poll", "vote", &context("u1", None, "c1"), json!({"option": "no"}), 0)
            .unwrap();

        harness.clock.advance(Duration::from_secs(365 * 24 * 3600));
        let outcome = harness.dispatcher().dispatch(button("e1", &token, "u1", "c1")).await;
        assert!(outcome.is_success());
    }

    #[tokio::test]
    async fn test_tampered_signature_rejected_before_ack() {
        let mut harness = Harness::new();
        let votes = register_vote(&harness);
        let token = harness
            .dispatcher()
            .build_token("poll", "vote", &context("u1", None, "c1"), json!({"option": "yes"}), 60)
            .unwrap();

        let mut tampered = token.clone();
        let last = tampered.pop().unwrap();
        tampered.push(if last == 'A' { 'B' } else { 'A' });

        let outcome = harness.dispatcher().dispatch(button("e1", &tampered, "u1", "c1")).await;
        assert_eq!(outcome.error, Some(DispatchError::InvalidToken(TokenRejection::Tampered)));
        assert!(votes.lock().is_empty());

        // The user is told, but nothing was acknowledged.
        let lines = harness.drain();
        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0]["type"], "reply");
    }

    #[tokio::test]
    async fn test_token_does_not_cross_tenants() {
        let harness = Harness::new();
        register_vote(&harness);
        let token = harness
            .dispatcher()
            .build_token("poll", "vote", &context("u1", Some("t1"), "c1"), json!({}), 60)
            .unwrap();

        let elsewhere = event("e1", InteractionKind::Button, &token, "u1", Some("t2"), "c1");
        let outcome = harness.dispatcher().dispatch(elsewhere).await;
        assert_eq!(
            outcome.error,
            Some(DispatchError::InvalidToken(TokenRejection::TenantMismatch))
        );

        let outside = event("e2", InteractionKind::Button, &token, "u1", None, "c1");
        assert!(!harness.dispatcher().dispatch(outside).await.is_success());

        let home = event("e3", InteractionKind::Button, &token, "u1", Some("t1"), "c1");
        assert!(harness.dispatcher().dispatch(home).await.is_success());
    }

    #[tokio::test]
    async fn test_channel_drift_accepted_unless_strict() {
        let lenient = Harness::new();
        register_vote(&lenient);
        let token = lenient
            .dispatcher()
            .build_token("poll", "vote", &context("u1", None, "c1"), json!({}), 60)
            .unwrap();
        assert!(lenient
            .dispatcher()
            .dispatch(button("e1", &token, "u1", "other"))
            .await
            .is_success());

        let strict = Harness::with_env(&[("IR_STRICT_CHANNEL", "true")]);
        register_vote(&strict);
        let token = strict
            .dispatcher()
            .build_token("poll", "vote", &context("u1", None, "c1"), json!({}), 60)
            .unwrap();
        let outcome = strict.dispatcher().dispatch(button("e1", &token, "u1", "other")).await;
        assert_eq!(
            outcome.error,
            Some(DispatchError::InvalidToken(TokenRejection::ChannelMismatch))
        );
    }
}
