//! Responder that writes platform calls as JSON lines.

use async_trait::async_trait;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use ir_05_dispatcher::{Ack, InteractionReply, InteractionResponder, ResponderError};
use serde::Serialize;
use serde_json::Value;
use shared_types::Interaction;
use tokio::sync::mpsc::UnboundedSender;
use tracing::trace;

/// Output record emitted by the runtime.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum OutputLine<'a> {
    Ack {
        interaction: &'a str,
        ack: Ack,
    },
    Reply {
        interaction: &'a str,
        #[serde(flatten)]
        reply: &'a InteractionReply,
    },
}

/// `InteractionResponder` that forwards every acknowledgement and reply to a
/// channel drained by the stdout writer.
///
/// An interaction may be acknowledged once; the second attempt fails the way
/// the platform would.
pub struct JsonLinesResponder {
    out: UnboundedSender<Value>,
    acknowledged: DashMap<String, Ack>,
}

impl JsonLinesResponder {
    pub fn new(out: UnboundedSender<Value>) -> Self {
        Self {
            out,
            acknowledged: DashMap::new(),
        }
    }

    /// Drop acknowledgement state once an interaction is finished.
    pub fn forget(&self, interaction_id: &str) {
        self.acknowledged.remove(interaction_id);
    }

    pub fn acknowledged(&self, interaction_id: &str) -> Option<Ack> {
        self.acknowledged.get(interaction_id).map(|a| *a)
    }

    fn emit(&self, line: OutputLine<'_>) -> Result<(), ResponderError> {
        let value =
            serde_json::to_value(&line).map_err(|e| ResponderError::Transport(e.to_string()))?;
        trace!(line = %value, "Emitting");
        self.out
            .send(value)
            .map_err(|_| ResponderError::Transport("output closed".to_string()))
    }
}

#[async_trait]
impl InteractionResponder for JsonLinesResponder {
    async fn acknowledge(&self, interaction: &Interaction, ack: Ack) -> Result<(), ResponderError> {
        match self.acknowledged.entry(interaction.id.clone()) {
            Entry::Occupied(_) => return Err(ResponderError::AlreadyAcknowledged),
            Entry::Vacant(slot) => {
                slot.insert(ack);
            }
        }
        self.emit(OutputLine::Ack {
            interaction: &interaction.id,
            ack,
        })
    }

    async fn reply(
        &self,
        interaction: &Interaction,
        reply: InteractionReply,
    ) -> Result<(), ResponderError> {
        self.emit(OutputLine::Reply {
            interaction: &interaction.id,
            reply: &reply,
        })
    }
}
