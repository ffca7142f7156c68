//! Pipeline stages and dispatch outcomes

use serde::Serialize;
use std::fmt;
use std::time::Duration;

use crate::domain::DispatchError;

/// Stages of one dispatch, in order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PipelineStage {
    Received,
    Verified,
    HandlerFound,
    Acknowledged,
    ReplayChecked,
    MiddlewarePassed,
    Authorized,
    Executing,
    Succeeded,
    Failed,
}

impl PipelineStage {
    pub fn as_str(&self) -> &'static str {
        match self {
            PipelineStage::Received => "received",
            PipelineStage::Verified => "verified",
            PipelineStage::HandlerFound => "handler_found",
            PipelineStage::Acknowledged => "acknowledged",
            PipelineStage::ReplayChecked => "replay_checked",
            PipelineStage::MiddlewarePassed => "middleware_passed",
            PipelineStage::Authorized => "authorized",
            PipelineStage::Executing => "executing",
            PipelineStage::Succeeded => "succeeded",
            PipelineStage::Failed => "failed",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, PipelineStage::Succeeded | PipelineStage::Failed)
    }
}

impl fmt::Display for PipelineStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Result of [`Dispatcher::dispatch`](crate::Dispatcher::dispatch).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DispatchOutcome {
    pub dispatch_id: String,
    /// `ns:action:version`, once the token verified.
    pub route: Option<String>,
    /// Last non-terminal stage reached.
    pub last_stage: PipelineStage,
    pub error: Option<DispatchError>,
    pub elapsed: Duration,
}

impl DispatchOutcome {
    pub fn is_success(&self) -> bool {
        self.error.is_none()
    }

    pub fn final_stage(&self) -> PipelineStage {
        if self.error.is_some() {
            PipelineStage::Failed
        } else {
            PipelineStage::Succeeded
        }
    }

    /// `"success"` or the failure reason tag.
    pub fn reason(&self) -> &'static str {
        self.error.as_ref().map(DispatchError::reason).unwrap_or("success")
    }
}
