//! # Tenant Configuration
//!
//! Single-flight loading under concurrent demand, and handlers reading the
//! cached document through the dispatcher.

#[cfg(test)]
mod tests {
    use crate::integration::support::{context, event, Harness};
    use async_trait::async_trait;
    use ir_03_config_cache::{ConfigCache, ConfigError, TenantConfigSource};
    use ir_05_dispatcher::{HandlerDescriptor, HandlerReply};
    use serde_json::{json, Value};
    use shared_types::{InteractionKind, ReplayScope, TenantId};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use std::time::Duration;

    /// Source that takes a while to answer and counts how often it is asked.
    #[derive(Default)]
    struct SlowSource {
        fetches: AtomicUsize,
        defaults: AtomicUsize,
    }

    #[async_trait]
    impl TenantConfigSource for SlowSource {
        async fn fetch(&self, tenant: &TenantId) -> Result<Option<Value>, ConfigError> {
            self.fetches.fetch_add(1, Ordering::SeqCst);
            tokio::time::sleep(Duration::from_millis(50)).await;
            if tenant.as_str() == "fresh" {
                return Ok(None);
            }
            Ok(Some(json!({"tenant": tenant.as_str()})))
        }

        async fn create_default(&self, _tenant: &TenantId) -> Result<Value, ConfigError> {
            self.defaults.fetch_add(1, Ordering::SeqCst);
            Ok(json!({"default": true}))
        }
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_gets_issue_one_fetch() {
        let source = Arc::new(SlowSource::default());
        let cache = ConfigCache::new(source.clone());
        let tenant = TenantId::from("t1");

        let gets = (0..16).map(|_| {
            let cache = cache.clone();
            let tenant = tenant.clone();
            tokio::spawn(async move { cache.get(&tenant).await })
        });
        let results = futures::future::join_all(gets).await;

        assert_eq!(source.fetches.load(Ordering::SeqCst), 1);
        for result in results {
            let config = result.unwrap().unwrap();
            assert_eq!(config.get("tenant"), Some(&json!("t1")));
        }
        let stats = cache.stats();
        assert_eq!(stats.fetches, 1);
        assert_eq!(stats.hits + stats.misses, 16);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_gets_create_one_default() {
        let source = Arc::new(SlowSource::default());
        let cache = ConfigCache::new(source.clone());
        let tenant = TenantId::from("fresh");

        let gets = (0..8).map(|_| {
            let cache = cache.clone();
            let tenant = tenant.clone();
            tokio::spawn(async move { cache.get(&tenant).await })
        });
        for result in futures::future::join_all(gets).await {
            assert!(result.unwrap().unwrap().flag("default"));
        }
        assert_eq!(source.defaults.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_handler_sees_tenant_config_until_invalidated() {
        let mut harness = Harness::new();
        harness.runtime.tenants.set("t1", json!({"greeting": "hello"}));
        let dispatcher = harness.dispatcher().clone();
        dispatcher
            .register_handler(
                InteractionKind::Button,
                "greet:show",
                HandlerDescriptor::from_fn(|ctx| async move {
                    let greeting = ctx
                        .tenant_config
                        .as_ref()
                        .and_then(|c| c.get("greeting"))
                        .and_then(|v| v.as_str())
                        .unwrap_or("none")
                        .to_string();
                    Ok(HandlerReply::text(greeting))
                })
                .replay_scope(ReplayScope::None)
                .needs_tenant_config(true)
                .build(),
            )
            .unwrap();
        let token = dispatcher
            .build_token("greet", "show", &context("u1", Some("t1"), "c1"), json!({}), 0)
            .unwrap();
        let click = |id: &str| event(id, InteractionKind::Button, &token, "u1", Some("t1"), "c1");

        dispatcher.dispatch(click("e1")).await;
        harness.runtime.tenants.set("t1", json!({"greeting": "hallo"}));
        dispatcher.dispatch(click("e2")).await;
        assert_eq!(harness.replies(), vec!["hello", "hello"]);

        dispatcher.invalidate_tenant_cache(&"t1".into());
        dispatcher.dispatch(click("e3")).await;
        assert_eq!(harness.replies(), vec!["hallo"]);

        // The cache TTL also brings the new document in.
        harness.runtime.tenants.set("t1", json!({"greeting": "hej"}));
        harness.clock.advance(Duration::from_secs(301));
        dispatcher.dispatch(click("e4")).await;
        assert_eq!(harness.replies(), vec!["hej"]);
    }

    #[tokio::test]
    async fn test_unknown_tenant_gets_default_document() {
        let harness = Harness::new();
        let dispatcher = harness.dispatcher().clone();
        dispatcher
            .register_handler(
                InteractionKind::Button,
                "setup:check",
                HandlerDescriptor::from_fn(|_ctx| async { Ok(HandlerReply::silent()) })
                    .replay_scope(ReplayScope::None)
                    .needs_tenant_config(true)
                    .build(),
            )
            .unwrap();
        let token = dispatcher
            .build_token("setup", "check", &context("u1", Some("new-tenant"), "c1"), json!({}), 0)
            .unwrap();

        let outcome = dispatcher
            .dispatch(event("e1", InteractionKind::Button, &token, "u1", Some("new-tenant"), "c1"))
            .await;
        assert!(outcome.is_success());
        assert!(harness.runtime.tenants.contains(&"new-tenant".into()));
        assert_eq!(dispatcher.cache_stats().misses, 1);
    }
}
