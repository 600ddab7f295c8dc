//! Response domain module
//!
//! [`AgentResponse`] is what a successful `send_message` returns. Non-fatal
//! problems (a malformed actions block, a failing action handler) ride along
//! in [`AgentResponse::errors`] instead of failing the call.

use crate::action::{ActionKind, AgentAction};
use crate::agent::{AgentId, AgentStatus, AgentType};
use serde::Serialize;
use std::time::Duration;

/// Where in response processing a non-fatal error happened.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "stage", rename_all = "snake_case")]
pub enum ProcessingStage {
    Extraction,
    Action { index: usize, kind: ActionKind },
    StatusUpdate,
}

/// A non-fatal error collected while processing a response.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProcessingError {
    #[serde(flatten)]
    pub stage: ProcessingStage,
    pub message: String,
}

impl ProcessingError {
    pub fn extraction(message: impl Into<String>) -> Self {
        Self {
            stage: ProcessingStage::Extraction,
            message: message.into(),
        }
    }

    pub fn action(index: usize, kind: ActionKind, message: impl Into<String>) -> Self {
        Self {
            stage: ProcessingStage::Action { index, kind },
            message: message.into(),
        }
    }

    pub fn status_update(message: impl Into<String>) -> Self {
        Self {
            stage: ProcessingStage::StatusUpdate,
            message: message.into(),
        }
    }

    /// Index of the offending action, if the error came from one.
    pub fn action_index(&self) -> Option<usize> {
        match self.stage {
            ProcessingStage::Action { index, .. } => Some(index),
            _ => None,
        }
    }
}

impl std::fmt::Display for ProcessingError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.stage {
            ProcessingStage::Extraction => write!(f, "extraction: {}", self.message),
            ProcessingStage::Action { index, kind } => {
                write!(f, "action #{index} ({kind}): {}", self.message)
            }
            ProcessingStage::StatusUpdate => write!(f, "status update: {}", self.message),
        }
    }
}

/// What happened to one extracted action.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum ActionOutcome {
    Executed {
        index: usize,
        kind: ActionKind,
        summary: String,
    },
    Failed {
        index: usize,
        kind: ActionKind,
        error: String,
    },
    /// Declined at the confirmation gate
    Skipped {
        index: usize,
        kind: ActionKind,
        reason: String,
    },
}

impl ActionOutcome {
    pub fn index(&self) -> usize {
        match self {
            ActionOutcome::Executed { index, .. }
            | ActionOutcome::Failed { index, .. }
            | ActionOutcome::Skipped { index, .. } => *index,
        }
    }

    pub fn is_executed(&self) -> bool {
        matches!(self, ActionOutcome::Executed { .. })
    }
}

/// Reply of an agent to one inbound message.
#[derive(Debug, Clone, Serialize)]
pub struct AgentResponse {
    /// Id of the inbound message this answers
    pub message_id: String,
    pub agent_id: AgentId,
    pub agent_type: AgentType,
    pub content: String,
    pub actions: Vec<AgentAction>,
    pub status_update: Option<AgentStatus>,
    pub outcomes: Vec<ActionOutcome>,
    pub errors: Vec<ProcessingError>,
    pub duration_ms: u64,
}

impl AgentResponse {
    pub fn new(
        message_id: impl Into<String>,
        agent_id: AgentId,
        agent_type: AgentType,
        content: impl Into<String>,
    ) -> Self {
        Self {
            message_id: message_id.into(),
            agent_id,
            agent_type,
            content: content.into(),
            actions: Vec::new(),
            status_update: None,
            outcomes: Vec::new(),
            errors: Vec::new(),
            duration_ms: 0,
        }
    }

    pub fn with_duration(mut self, duration: Duration) -> Self {
        self.duration_ms = duration.as_millis().min(u64::MAX as u128) as u64;
        self
    }

    pub fn duration(&self) -> Duration {
        Duration::from_millis(self.duration_ms)
    }

    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    /// Number of actions whose handler ran to completion.
    pub fn executed_count(&self) -> usize {
        self.outcomes.iter().filter(|o| o.is_executed()).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_processing_error_display() {
        let err = ProcessingError::action(1, ActionKind::CreateTask, "assignee not found");
        assert_eq!(err.to_string(), "action #1 (create-task): assignee not found");
        assert_eq!(err.action_index(), Some(1));
        assert_eq!(ProcessingError::extraction("bad json").action_index(), None);
    }

    #[test]
    fn test_processing_error_serializes_flat() {
        let err = ProcessingError::action(2, ActionKind::UpdatePlan, "boom");
        let json = serde_json::to_value(&err).unwrap();
        assert_eq!(json["stage"], "action");
        assert_eq!(json["index"], 2);
        assert_eq!(json["kind"], "update-plan");
        assert_eq!(json["message"], "boom");
    }

    #[test]
    fn test_executed_count() {
        let mut response = AgentResponse::new("msg-1", AgentId::new("qa"), AgentType::Qa, "ok");
        response.outcomes = vec![
            ActionOutcome::Executed {
                index: 0,
                kind: ActionKind::ReportIssue,
                summary: "reported".into(),
            },
            ActionOutcome::Failed {
                index: 1,
                kind: ActionKind::CreateTask,
                error: "x".into(),
            },
            ActionOutcome::Skipped {
                index: 2,
                kind: ActionKind::UpdatePlan,
                reason: "declined".into(),
            },
        ];
        assert_eq!(response.executed_count(), 1);
        assert_eq!(response.outcomes[2].index(), 2);
    }
}
