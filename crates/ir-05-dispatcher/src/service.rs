//! # Dispatcher Service
//!
//! Owns the codec, replay guard, config cache and registry, and runs each
//! inbound event through the fixed stage order. Every dispatch is an
//! independent future on a shared (cheaply cloned) `Dispatcher`.

use futures::FutureExt;
use ir_01_token_codec::{TokenCodec, TokenError};
use ir_02_replay_guard::{replay_key, ReplayGuard, ReplayStats};
use ir_03_config_cache::{CacheStats, ConfigCache, TenantConfigSource};
use ir_04_handler_registry::{
    AckStrategy, HandlerContext, HandlerDescriptor, HandlerRegistry, RegistryError, RouterHandle,
    RouterStats,
};
use serde::Serialize;
use shared_types::{
    content_digest, system_clock, Interaction, InteractionContext, InteractionKind, ParsedToken,
    SharedClock,
    SigningSecret, TenantId, TokenPayload,
};
use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, error, info, info_span, warn, Instrument};
use uuid::Uuid;

use crate::domain::{
    DispatchError, DispatchOutcome, DispatcherConfig, PipelineStage, SetupError, StatsCollector,
};
use crate::metrics::DispatchMetrics;
use crate::ports::{Ack, DurableStore, InteractionReply, InteractionResponder, MiddlewareEvaluator};

/// Version stamped on tokens built through the router API.
const ROUTER_TOKEN_VERSION: u16 = 1;

/// Hex characters of the SHA-256 digest used as a persisted component key.
const COMPONENT_KEY_LEN: usize = 16;

/// Collaborators the dispatcher calls out to.
#[derive(Clone)]
pub struct DispatcherPorts {
    pub middleware: Arc<dyn MiddlewareEvaluator>,
    pub store: Arc<dyn DurableStore>,
    pub config_source: Arc<dyn TenantConfigSource>,
    pub responder: Arc<dyn InteractionResponder>,
    pub metrics: Arc<dyn DispatchMetrics>,
}

struct Core {
    codec: TokenCodec,
    replay: ReplayGuard,
    cache: ConfigCache,
    registry: HandlerRegistry,
    ports: DispatcherPorts,
    config: DispatcherConfig,
    stats: StatsCollector,
    clock: SharedClock,
}

/// The interaction router.
#[derive(Clone)]
pub struct Dispatcher {
    core: Arc<Core>,
}

/// What a persisted component blob holds.
#[derive(Serialize)]
struct PersistedComponent<'a> {
    route: String,
    #[serde(flatten)]
    payload: &'a TokenPayload,
}

/// Stage bookkeeping for one dispatch.
struct StageTrace {
    stage: PipelineStage,
    route: Option<String>,
}

impl StageTrace {
    fn advance(&mut self, stage: PipelineStage) {
        debug!(stage = %stage, "Stage reached");
        self.stage = stage;
    }
}

impl Dispatcher {
    pub fn new(
        secret: SigningSecret,
        config: DispatcherConfig,
        ports: DispatcherPorts,
    ) -> Result<Self, SetupError> {
        Self::with_clock(secret, config, ports, system_clock())
    }

    /// Build a dispatcher whose components all read time from `clock`.
    pub fn with_clock(
        secret: SigningSecret,
        config: DispatcherConfig,
        ports: DispatcherPorts,
        clock: SharedClock,
    ) -> Result<Self, SetupError> {
        config.validate()?;

        let codec = TokenCodec::with_clock(secret, config.codec.clone(), clock.clone())?;
        let replay = ReplayGuard::with_config(config.replay, clock.clone());
        let cache = ConfigCache::with_settings(
            ports.config_source.clone(),
            config.config_cache_ttl,
            clock.clone(),
        );

        info!(
            max_token_length = config.codec.max_token_length,
            clock_skew_secs = config.codec.clock_skew_secs,
            strict_channel = config.codec.strict_channel,
            replay_max_entries = config.replay.max_entries,
            "Dispatcher ready"
        );

        Ok(Self {
            core: Arc::new(Core {
                codec,
                replay,
                cache,
                registry: HandlerRegistry::new(),
                ports,
                config,
                stats: StatsCollector::new(),
                clock,
            }),
        })
    }

    // =========================================================================
    // Exposed API
    // =========================================================================

    pub fn register_handler(
        &self,
        kind: InteractionKind,
        key: &str,
        descriptor: HandlerDescriptor,
    ) -> Result<(), RegistryError> {
        self.core.registry.register(kind, key, descriptor)
    }

    pub fn register_pattern(
        &self,
        kind: InteractionKind,
        pattern: &str,
        descriptor: HandlerDescriptor,
    ) -> Result<(), RegistryError> {
        self.core.registry.register_pattern(kind, pattern, descriptor)
    }

    /// Build a version-1 token.
    pub fn build_token(
        &self,
        namespace: &str,
        action: &str,
        context: &InteractionContext,
        custom: serde_json::Value,
        ttl_secs: u64,
    ) -> Result<String, TokenError> {
        self.core
            .codec
            .build(namespace, action, ROUTER_TOKEN_VERSION, context, custom, ttl_secs)
    }

    pub fn invalidate_tenant_cache(&self, tenant: &TenantId) {
        self.core.cache.invalidate(tenant);
    }

    pub fn stats(&self) -> RouterStats {
        self.core.stats.snapshot(self.core.registry.handler_counts())
    }

    pub fn replay_stats(&self) -> ReplayStats {
        self.core.replay.stats()
    }

    pub fn cache_stats(&self) -> CacheStats {
        self.core.cache.stats()
    }

    pub fn codec(&self) -> &TokenCodec {
        &self.core.codec
    }

    // =========================================================================
    // Pipeline
    // =========================================================================

    /// Route one inbound interaction. Never panics and never returns an
    /// error; the outcome says how far the event got.
    pub async fn dispatch(&self, interaction: Interaction) -> DispatchOutcome {
        let dispatch_id = Uuid::new_v4().to_string();
        let span = info_span!("dispatch", dispatch_id = %dispatch_id, kind = %interaction.kind);

        async move {
            let started = Instant::now();
            let mut trace = StageTrace {
                stage: PipelineStage::Received,
                route: None,
            };

            let result = AssertUnwindSafe(self.run(&dispatch_id, &interaction, &mut trace))
                .catch_unwind()
                .await
                .unwrap_or_else(|panic| Err(DispatchError::Router(panic_message(panic.as_ref()))));

            let outcome = DispatchOutcome {
                dispatch_id,
                route: trace.route,
                last_stage: trace.stage,
                error: result.err(),
                elapsed: started.elapsed(),
            };
            self.finish(&interaction, &outcome).await;
            outcome
        }
        .instrument(span)
        .await
    }

    async fn run(
        &self,
        dispatch_id: &str,
        interaction: &Interaction,
        trace: &mut StageTrace,
    ) -> Result<(), DispatchError> {
        let core = &self.core;

        // Actor binding is left to the caller-only policy below, so tokens
        // that are not caller-only remain usable by other members.
        let token = core
            .codec
            .parse(&interaction.token, Some(&interaction.verification_context()))
            .map_err(DispatchError::from_rejection)?;
        trace.route = Some(token.route_key());
        trace.advance(PipelineStage::Verified);

        let descriptor = core
            .registry
            .find_handler(interaction.kind, &token)
            .ok_or_else(|| DispatchError::UnknownHandler {
                kind: interaction.kind,
                route: token.route_key(),
            })?;
        trace.advance(PipelineStage::HandlerFound);

        self.acknowledge(interaction, descriptor.ack).await?;
        trace.advance(PipelineStage::Acknowledged);

        if let Some(key) = replay_key(descriptor.replay_scope, &token, interaction) {
            if !core.replay.check(&key, descriptor.replay_ttl) {
                return Err(DispatchError::ReplayDetected);
            }
        }
        trace.advance(PipelineStage::ReplayChecked);

        let verdict = core.ports.middleware.evaluate(interaction, &descriptor).await;
        if !verdict.allowed {
            return Err(DispatchError::MiddlewareDenied(
                verdict.reason.unwrap_or_else(|| "denied".to_string()),
            ));
        }
        trace.advance(PipelineStage::MiddlewarePassed);

        if descriptor.caller_only
            && !interaction.elevated
            && interaction.actor != token.payload.actor
        {
            return Err(DispatchError::CallerOnlyViolation);
        }
        if !descriptor.permits(&interaction.actor, &interaction.roles) {
            return Err(DispatchError::NotAllowed);
        }
        trace.advance(PipelineStage::Authorized);

        let tenant_config = match (&interaction.tenant, descriptor.needs_tenant_config) {
            (Some(tenant), true) => Some(
                core.cache
                    .get(tenant)
                    .await
                    .map_err(|e| DispatchError::Router(e.to_string()))?,
            ),
            _ => None,
        };
        trace.advance(PipelineStage::Executing);

        let route = token.route_key();
        let execution_key = format!("{}:{}", interaction.kind, token.unversioned_key());
        let ctx = HandlerContext {
            dispatch_id: dispatch_id.to_string(),
            interaction: interaction.clone(),
            token: token.clone(),
            tenant_config,
            router: Arc::new(self.clone()),
        };

        let started = Instant::now();
        let reply = AssertUnwindSafe(descriptor.handler().handle(ctx))
            .catch_unwind()
            .instrument(info_span!("handler", route = %route))
            .await;
        let latency = started.elapsed();

        let reply = match reply {
            Ok(Ok(reply)) => reply,
            Ok(Err(e)) => {
                error!(route = %route, error = %e, "Handler returned an error");
                return Err(DispatchError::HandlerExecution(e.to_string()));
            }
            Err(panic) => {
                let message = panic_message(panic.as_ref());
                error!(route = %route, panic = %message, "Handler panicked");
                return Err(DispatchError::HandlerExecution(message));
            }
        };

        core.stats.record_execution(execution_key, latency);
        core.ports
            .metrics
            .record_execution(interaction.kind.as_str(), &token.unversioned_key(), latency);

        if let Some(content) = reply.content {
            let reply = InteractionReply {
                content,
                ephemeral: reply.ephemeral.unwrap_or(descriptor.ephemeral),
                components: reply.components,
            };
            if let Err(e) = core.ports.responder.reply(interaction, reply).await {
                warn!(route = %route, error = %e, "Handler reply not delivered");
            }
        }

        if descriptor.persist {
            self.persist(interaction, &token).await;
        }

        Ok(())
    }

    /// Acknowledge per strategy, with one fallback to the other form.
    async fn acknowledge(
        &self,
        interaction: &Interaction,
        strategy: AckStrategy,
    ) -> Result<(), DispatchError> {
        let resolved = strategy.resolve(interaction.kind);
        let ack = match Ack::from_strategy(resolved) {
            Some(ack) => ack,
            None => return Ok(()),
        };

        if interaction.received_at_ms > 0 {
            let waited_ms = self.core.clock.now_millis().saturating_sub(interaction.received_at_ms);
            if waited_ms > self.core.config.ack_window.as_millis() as u64 {
                warn!(waited_ms = waited_ms, ack = ?ack, "Acknowledging after the platform window");
            }
        }

        let responder = &self.core.ports.responder;
        let first = match responder.acknowledge(interaction, ack).await {
            Ok(()) => return Ok(()),
            Err(e) => e,
        };

        let fallback = match resolved.fallback().and_then(Ack::from_strategy) {
            Some(fallback) => fallback,
            None => return Err(DispatchError::Router(format!("acknowledgement failed: {}", first))),
        };
        warn!(
            ack = ?ack,
            fallback = ?fallback,
            error = %first,
            "Acknowledgement failed, trying fallback"
        );

        responder
            .acknowledge(interaction, fallback)
            .await
            .map_err(|e| DispatchError::Router(format!("acknowledgement failed: {}", e)))
    }

    async fn persist(&self, interaction: &Interaction, token: &ParsedToken) {
        let message = match token.payload.message.as_ref().or(interaction.message.as_ref()) {
            Some(message) => message,
            None => {
                debug!(route = %token.route_key(), "No message to persist against");
                return;
            }
        };

        let route = token.route_key();
        let custom = token.custom().to_string();
        let component_key =
            content_digest(&[route.as_bytes(), custom.as_bytes()], COMPONENT_KEY_LEN);
        let blob = match serde_json::to_string(&PersistedComponent {
            route,
            payload: &token.payload,
        }) {
            Ok(blob) => blob,
            Err(e) => {
                warn!(error = %e, "Component state not serializable");
                return;
            }
        };

        if let Err(e) = self
            .core
            .ports
            .store
            .upsert(message, &component_key, &blob, token.payload.expiry)
            .await
        {
            warn!(
                message = %message,
                component_key = %component_key,
                error = %e,
                "Component state not persisted"
            );
        }
    }

    /// Count, log and answer the outcome.
    async fn finish(&self, interaction: &Interaction, outcome: &DispatchOutcome) {
        let core = &self.core;
        core.ports.metrics.record_outcome(outcome.reason());

        let error = match &outcome.error {
            None => {
                info!(
                    route = outcome.route.as_deref().unwrap_or("-"),
                    elapsed_ms = outcome.elapsed.as_millis() as u64,
                    "Dispatch succeeded"
                );
                return;
            }
            Some(error) => error,
        };

        if error.is_denial() {
            core.stats.record_denial(error.reason());
            info!(
                reason = error.reason(),
                stage = %outcome.last_stage,
                route = outcome.route.as_deref().unwrap_or("-"),
                tenant = interaction.tenant.as_ref().map(TenantId::as_str).unwrap_or("-"),
                detail = %error,
                "Dispatch denied"
            );
        } else {
            core.stats.record_error();
            error!(
                reason = error.reason(),
                stage = %outcome.last_stage,
                route = outcome.route.as_deref().unwrap_or("-"),
                detail = %error,
                "Dispatch failed"
            );
        }

        if let Err(e) = core
            .ports
            .responder
            .reply(interaction, InteractionReply::notice(error.user_message()))
            .await
        {
            warn!(error = %e, "Failure notice not delivered");
        }
    }
}

impl RouterHandle for Dispatcher {
    fn build_token(
        &self,
        namespace: &str,
        action: &str,
        context: &InteractionContext,
        custom: serde_json::Value,
        ttl_secs: u64,
    ) -> Result<String, TokenError> {
        Dispatcher::build_token(self, namespace, action, context, custom, ttl_secs)
    }

    fn invalidate_tenant_cache(&self, tenant: &TenantId) {
        Dispatcher::invalidate_tenant_cache(self, tenant)
    }

    fn stats(&self) -> RouterStats {
        Dispatcher::stats(self)
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(message) = panic.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = panic.downcast_ref::<String>() {
        message.clone()
    } else {
        "panic".to_string()
    }
}
