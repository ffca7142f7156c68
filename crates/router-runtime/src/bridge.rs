//! # JSON-Lines Bridge
//!
//! One command per input line, one or more JSON objects per output line.
//!
//! ```text
//! {"cmd":"build","namespace":"poll","action":"vote","actor":"u1","channel":"c1","custom":{"option":"yes"},"ttl_secs":60}
//! {"cmd":"dispatch","interaction":{"id":"e1","kind":"button","token":"...","actor":"u1","channel":"c1"}}
//! {"cmd":"invalidate","tenant":"t1"}
//! {"cmd":"stats"}
//! ```
//!
//! Dispatches run concurrently; every other command is answered in input
//! order before the next line is read.

use ir_02_replay_guard::ReplayStats;
use ir_03_config_cache::CacheStats;
use ir_05_dispatcher::{DispatchOutcome, PipelineStage, RouterStats};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use shared_types::{ActorId, ChannelId, Interaction, InteractionContext, MessageId, TenantId};
use thiserror::Error;
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::task::JoinSet;
use tracing::{debug, warn};

use crate::Runtime;

#[derive(Debug, Error)]
pub enum BridgeError {
    #[error("Unreadable command: {0}")]
    Parse(String),

    #[error("Input failed: {0}")]
    Io(#[from] std::io::Error),
}

/// Inbound command.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "cmd", rename_all = "snake_case")]
pub enum Command {
    Dispatch {
        interaction: Interaction,
    },
    Build {
        namespace: String,
        action: String,
        actor: ActorId,
        #[serde(default)]
        tenant: Option<TenantId>,
        channel: ChannelId,
        #[serde(default)]
        message: Option<MessageId>,
        #[serde(default)]
        custom: Value,
        #[serde(default)]
        ttl_secs: u64,
    },
    Invalidate {
        tenant: TenantId,
    },
    /// Replace a tenant's stored configuration.
    SetTenantConfig {
        tenant: TenantId,
        config: Value,
    },
    Maintenance {
        on: bool,
    },
    Stats,
    Metrics,
}

/// Outbound record for everything except platform acks and replies, which
/// the responder writes itself.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Response {
    Outcome {
        interaction: String,
        dispatch_id: String,
        success: bool,
        reason: &'static str,
        last_stage: PipelineStage,
        #[serde(skip_serializing_if = "Option::is_none")]
        route: Option<String>,
        #[serde(skip_serializing_if = "Option::is_none")]
        error: Option<String>,
        elapsed_us: u64,
    },
    Token {
        token: String,
    },
    Stats {
        router: RouterStats,
        replay: ReplayStats,
        cache: CacheStats,
    },
    Metrics {
        text: String,
    },
    Ok,
    Error {
        message: String,
    },
}

impl Response {
    pub fn outcome(interaction_id: &str, outcome: &DispatchOutcome) -> Self {
        Response::Outcome {
            interaction: interaction_id.to_string(),
            dispatch_id: outcome.dispatch_id.clone(),
            success: outcome.is_success(),
            reason: outcome.reason(),
            last_stage: outcome.last_stage,
            route: outcome.route.clone(),
            error: outcome.error.as_ref().map(|e| e.to_string()),
            elapsed_us: outcome.elapsed.as_micros() as u64,
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Response::Error {
            message: message.into(),
        }
    }

    pub fn to_value(&self) -> Value {
        serde_json::to_value(self)
            .unwrap_or_else(|e| serde_json::json!({"type": "error", "message": e.to_string()}))
    }
}

/// Parse one input line. Blank lines yield `None`.
pub fn parse_line(line: &str) -> Result<Option<Command>, BridgeError> {
    let line = line.trim();
    if line.is_empty() {
        return Ok(None);
    }
    serde_json::from_str(line)
        .map(Some)
        .map_err(|e| BridgeError::Parse(e.to_string()))
}

impl Runtime {
    /// Dispatch one interaction and release its acknowledgement state.
    pub async fn dispatch(&self, interaction: Interaction) -> Response {
        let id = interaction.id.clone();
        let outcome = self.dispatcher.dispatch(interaction).await;
        self.responder.forget(&id);
        Response::outcome(&id, &outcome)
    }

    /// Run a command to completion.
    pub async fn execute(&self, command: Command) -> Response {
        match command {
            Command::Dispatch { interaction } => self.dispatch(interaction).await,
            Command::Build {
                namespace,
                action,
                actor,
                tenant,
                channel,
                message,
                custom,
                ttl_secs,
            } => {
                let context = InteractionContext {
                    actor,
                    tenant,
                    channel,
                    message,
                };
                match self
                    .dispatcher
                    .build_token(&namespace, &action, &context, custom, ttl_secs)
                {
                    Ok(token) => Response::Token { token },
                    Err(e) => Response::error(e.to_string()),
                }
            }
            Command::Invalidate { tenant } => {
                self.dispatcher.invalidate_tenant_cache(&tenant);
                Response::Ok
            }
            Command::SetTenantConfig { tenant, config } => {
                self.tenants.set(tenant.clone(), config);
                self.dispatcher.invalidate_tenant_cache(&tenant);
                Response::Ok
            }
            Command::Maintenance { on } => {
                self.middleware.set_maintenance(on);
                Response::Ok
            }
            Command::Stats => Response::Stats {
                router: self.dispatcher.stats(),
                replay: self.dispatcher.replay_stats(),
                cache: self.dispatcher.cache_stats(),
            },
            Command::Metrics => match router_telemetry::encode_metrics() {
                Ok(text) => Response::Metrics { text },
                Err(e) => Response::error(e.to_string()),
            },
        }
    }
}

/// Read commands until end of input, then wait for in-flight dispatches.
pub async fn run_bridge<R>(runtime: Runtime, input: R) -> Result<(), BridgeError>
where
    R: AsyncRead + Unpin,
{
    let mut lines = BufReader::new(input).lines();
    let mut in_flight = JoinSet::new();

    while let Some(line) = lines.next_line().await? {
        let command = match parse_line(&line) {
            Ok(Some(command)) => command,
            Ok(None) => continue,
            Err(e) => {
                warn!(error = %e, "Skipping input line");
                runtime.emit(Response::error(e.to_string()).to_value());
                continue;
            }
        };

        match command {
            Command::Dispatch { interaction } => {
                let runtime = runtime.clone();
                in_flight.spawn(async move {
                    let response = runtime.dispatch(interaction).await;
                    runtime.emit(response.to_value());
                });
            }
            command => {
                let response = runtime.execute(command).await;
                if !runtime.emit(response.to_value()) {
                    debug!("Output closed, stopping");
                    break;
                }
            }
        }

        // Reap finished dispatches so the set does not grow with the input.
        while in_flight.try_join_next().is_some() {}
    }

    while in_flight.join_next().await.is_some() {}
    Ok(())
}
