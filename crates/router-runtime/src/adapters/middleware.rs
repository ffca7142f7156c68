//! Maintenance gate and per-actor cooldowns.

use async_trait::async_trait;
use dashmap::DashMap;
use ir_05_dispatcher::{HandlerDescriptor, MiddlewareEvaluator, MiddlewareVerdict};
use shared_types::{system_clock, ActorId, Interaction, SharedClock};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use tracing::debug;

pub const REASON_MAINTENANCE: &str = "maintenance";
pub const REASON_COOLDOWN: &str = "cooldown";

/// Tracked cooldowns above which `evaluate` drops the lapsed ones.
pub const DEFAULT_PRUNE_THRESHOLD: usize = 10_000;

const MIN_PRUNE_GAP_MS: u64 = 1_000;

/// Middleware evaluator for the runtime.
///
/// - While maintenance is on, only elevated actors get through.
/// - Handlers with a `cooldown` admit one use per actor and `ns:action`
///   per cooldown window. Denied attempts do not restart the window.
pub struct CooldownMiddleware {
    maintenance: AtomicBool,
    /// `(actor, ns:action)` -> epoch ms at which the next use is admitted.
    open_at: DashMap<(ActorId, String), u64>,
    prune_threshold: usize,
    last_prune_ms: AtomicU64,
    clock: SharedClock,
}

impl Default for CooldownMiddleware {
    fn default() -> Self {
        Self::new()
    }
}

impl CooldownMiddleware {
    pub fn new() -> Self {
        Self::with_clock(system_clock())
    }

    pub fn with_clock(clock: SharedClock) -> Self {
        Self {
            maintenance: AtomicBool::new(false),
            open_at: DashMap::new(),
            prune_threshold: DEFAULT_PRUNE_THRESHOLD,
            last_prune_ms: AtomicU64::new(0),
            clock,
        }
    }

    pub fn with_prune_threshold(mut self, threshold: usize) -> Self {
        self.prune_threshold = threshold;
        self
    }

    pub fn set_maintenance(&self, on: bool) {
        self.maintenance.store(on, Ordering::SeqCst);
    }

    pub fn in_maintenance(&self) -> bool {
        self.maintenance.load(Ordering::SeqCst)
    }

    /// Number of tracked `(actor, route)` cooldowns, lapsed ones included.
    pub fn tracked(&self) -> usize {
        self.open_at.len()
    }

    /// Forget cooldowns whose window has passed, returning how many went.
    pub fn prune(&self) -> usize {
        let now = self.clock.now_millis();
        let before = self.open_at.len();
        self.open_at.retain(|_, open_at| *open_at > now);
        self.last_prune_ms.store(now, Ordering::Relaxed);
        before.saturating_sub(self.open_at.len())
    }

    fn prune_if_oversized(&self, now: u64) {
        if self.open_at.len() <= self.prune_threshold {
            return;
        }
        if now.saturating_sub(self.last_prune_ms.load(Ordering::Relaxed)) < MIN_PRUNE_GAP_MS {
            return;
        }
        let pruned = self.prune();
        debug!(pruned, remaining = self.open_at.len(), "Lapsed cooldowns pruned");
    }
}

/// `ns:action` from the token prefix. The dispatcher has verified the
/// signature before middleware runs, so the prefix is trusted here.
fn route_of(token: &str) -> String {
    let mut parts = token.splitn(3, ':');
    match (parts.next(), parts.next()) {
        (Some(namespace), Some(action)) => format!("{}:{}", namespace, action),
        _ => token.to_string(),
    }
}

#[async_trait]
impl MiddlewareEvaluator for CooldownMiddleware {
    async fn evaluate(
        &self,
        interaction: &Interaction,
        descriptor: &HandlerDescriptor,
    ) -> MiddlewareVerdict {
        if self.in_maintenance() && !interaction.elevated {
            return MiddlewareVerdict::deny(REASON_MAINTENANCE);
        }

        let cooldown = match descriptor.cooldown {
            Some(cooldown) => cooldown.as_millis() as u64,
            None => return MiddlewareVerdict::allow(),
        };

        let now = self.clock.now_millis();
        // Must run before taking an entry guard; `retain` locks every shard.
        self.prune_if_oversized(now);

        let key = (interaction.actor.clone(), route_of(&interaction.token));
        let mut open_at = self.open_at.entry(key).or_insert(0);
        if now < *open_at {
            debug!(actor = %interaction.actor, remaining_ms = *open_at - now, "On cooldown");
            return MiddlewareVerdict::deny(REASON_COOLDOWN);
        }
        *open_at = now.saturating_add(cooldown);
        MiddlewareVerdict::allow()
    }
}
