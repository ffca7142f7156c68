//! Shared fixtures: a runtime on a manual clock with its output captured.

use ir_05_dispatcher::Dispatcher;
use router_runtime::{RouterConfig, Runtime};
use serde_json::{json, Value};
use shared_types::{Interaction, InteractionContext, InteractionKind, ManualClock, TenantId};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::mpsc::{self, UnboundedReceiver};

/// Fixed start time for every scenario (epoch seconds).
pub const START_SECS: u64 = 1_700_000_000;

pub const SECRET: &str = "integration-secret-0123456789";

pub struct Harness {
    pub runtime: Runtime,
    pub clock: Arc<ManualClock>,
    pub out: UnboundedReceiver<Value>,
}

impl Harness {
    pub fn new() -> Self {
        Self::with_env(&[])
    }

    /// Extra `IR_*` settings on top of the secret and a 256-char cap.
    pub fn with_env(extra: &[(&str, &str)]) -> Self {
        let mut vars: HashMap<String, String> = HashMap::from([
            ("IR_SIGNING_SECRET".to_string(), SECRET.to_string()),
            ("IR_MAX_TOKEN_LENGTH".to_string(), "256".to_string()),
        ]);
        vars.extend(extra.iter().map(|(k, v)| (k.to_string(), v.to_string())));

        let config = RouterConfig::from_lookup(|key| vars.get(key).cloned()).unwrap();
        let clock = ManualClock::shared_at_secs(START_SECS);
        let (tx, out) = mpsc::unbounded_channel();
        let runtime = Runtime::with_clock(&config, tx, clock.clone()).unwrap();

        Self { runtime, clock, out }
    }

    pub fn dispatcher(&self) -> &Dispatcher {
        &self.runtime.dispatcher
    }

    /// Everything written to the platform so far.
    pub fn drain(&mut self) -> Vec<Value> {
        let mut lines = Vec::new();
        while let Ok(line) = self.out.try_recv() {
            lines.push(line);
        }
        lines
    }

    /// Reply texts written so far, in order.
    pub fn replies(&mut self) -> Vec<String> {
        self.drain()
            .into_iter()
            .filter(|line| line["type"] == "reply")
            .filter_map(|line| line["content"].as_str().map(str::to_string))
            .collect()
    }
}

pub fn context(actor: &str, tenant: Option<&str>, channel: &str) -> InteractionContext {
    InteractionContext::new(actor, tenant.map(TenantId::from), channel)
}

/// An inbound event carrying `token`.
pub fn event(
    id: &str,
    kind: InteractionKind,
    token: &str,
    actor: &str,
    tenant: Option<&str>,
    channel: &str,
) -> Interaction {
    serde_json::from_value(json!({
        "id": id,
        "kind": kind,
        "token": token,
        "actor": actor,
        "tenant": tenant,
        "channel": channel,
    }))
    .unwrap()
}

pub fn button(id: &str, token: &str, actor: &str, channel: &str) -> Interaction {
    event(id, InteractionKind::Button, token, actor, None, channel)
}
