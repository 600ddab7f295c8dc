//! Domain events published by the orchestration engine.
//!
//! Events are immutable notifications; observers (console, JSONL journal,
//! tests) subscribe through the event bus in the application layer.

use crate::action::Priority;
use crate::agent::{AgentId, AgentStatus, AgentType};
use crate::message::{MessageKind, Participant};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Domain tag stamped on every event from this engine.
pub const AGENTS_DOMAIN: &str = "agents";

/// Event type identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum EventKind {
    AgentCreated,
    StatusChanged,
    MessageSent,
    ResponseReceived,
    CoordinationRequested,
    PlanUpdated,
    MilestoneCelebrated,
    ClarificationRequested,
    TaskCreated,
    DecisionRecorded,
    IssueReported,
    Error,
}

impl EventKind {
    pub const ALL: [EventKind; 12] = [
        EventKind::AgentCreated,
        EventKind::StatusChanged,
        EventKind::MessageSent,
        EventKind::ResponseReceived,
        EventKind::CoordinationRequested,
        EventKind::PlanUpdated,
        EventKind::MilestoneCelebrated,
        EventKind::ClarificationRequested,
        EventKind::TaskCreated,
        EventKind::DecisionRecorded,
        EventKind::IssueReported,
        EventKind::Error,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            EventKind::AgentCreated => "agent-created",
            EventKind::StatusChanged => "status-changed",
            EventKind::MessageSent => "message-sent",
            EventKind::ResponseReceived => "response-received",
            EventKind::CoordinationRequested => "coordination-requested",
            EventKind::PlanUpdated => "plan-updated",
            EventKind::MilestoneCelebrated => "milestone-celebrated",
            EventKind::ClarificationRequested => "clarification-requested",
            EventKind::TaskCreated => "task-created",
            EventKind::DecisionRecorded => "decision-recorded",
            EventKind::IssueReported => "issue-reported",
            EventKind::Error => "error",
        }
    }
}

impl std::fmt::Display for EventKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for EventKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        EventKind::ALL
            .into_iter()
            .find(|k| k.as_str() == s)
            .ok_or_else(|| format!("unknown event type: {s}"))
    }
}

/// Event-specific data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum EventPayload {
    AgentCreated {
        agent_id: AgentId,
        agent_type: AgentType,
        name: String,
    },
    StatusChanged {
        agent_id: AgentId,
        from: AgentStatus,
        to: AgentStatus,
    },
    MessageSent {
        agent_id: AgentId,
        message_id: String,
        sender: Participant,
        message_kind: MessageKind,
        content: String,
    },
    ResponseReceived {
        agent_id: AgentId,
        message_id: String,
        content: String,
        action_count: usize,
        error_count: usize,
        duration_ms: u64,
    },
    CoordinationRequested {
        from: AgentId,
        to: AgentId,
        message_id: String,
        request: String,
        depth: u32,
    },
    PlanUpdated {
        agent_id: AgentId,
        summary: String,
        steps: Vec<String>,
        status: Option<String>,
    },
    MilestoneCelebrated {
        agent_id: AgentId,
        milestone: String,
        message: Option<String>,
    },
    ClarificationRequested {
        agent_id: AgentId,
        question: String,
        options: Vec<String>,
    },
    TaskCreated {
        agent_id: AgentId,
        title: String,
        assignee: Option<AgentId>,
        priority: Priority,
    },
    DecisionRecorded {
        agent_id: AgentId,
        decision: String,
        rationale: Option<String>,
    },
    IssueReported {
        agent_id: AgentId,
        title: String,
        severity: Priority,
        details: Option<String>,
    },
    Error {
        agent_id: Option<AgentId>,
        message_id: Option<String>,
        error: String,
    },
}

impl EventPayload {
    pub fn kind(&self) -> EventKind {
        match self {
            EventPayload::AgentCreated { .. } => EventKind::AgentCreated,
            EventPayload::StatusChanged { .. } => EventKind::StatusChanged,
            EventPayload::MessageSent { .. } => EventKind::MessageSent,
            EventPayload::ResponseReceived { .. } => EventKind::ResponseReceived,
            EventPayload::CoordinationRequested { .. } => EventKind::CoordinationRequested,
            EventPayload::PlanUpdated { .. } => EventKind::PlanUpdated,
            EventPayload::MilestoneCelebrated { .. } => EventKind::MilestoneCelebrated,
            EventPayload::ClarificationRequested { .. } => EventKind::ClarificationRequested,
            EventPayload::TaskCreated { .. } => EventKind::TaskCreated,
            EventPayload::DecisionRecorded { .. } => EventKind::DecisionRecorded,
            EventPayload::IssueReported { .. } => EventKind::IssueReported,
            EventPayload::Error { .. } => EventKind::Error,
        }
    }

    /// The agent the event is about (the requesting agent for coordination).
    pub fn agent_id(&self) -> Option<&AgentId> {
        match self {
            EventPayload::AgentCreated { agent_id, .. }
            | EventPayload::StatusChanged { agent_id, .. }
            | EventPayload::MessageSent { agent_id, .. }
            | EventPayload::ResponseReceived { agent_id, .. }
            | EventPayload::PlanUpdated { agent_id, .. }
            | EventPayload::MilestoneCelebrated { agent_id, .. }
            | EventPayload::ClarificationRequested { agent_id, .. }
            | EventPayload::TaskCreated { agent_id, .. }
            | EventPayload::DecisionRecorded { agent_id, .. }
            | EventPayload::IssueReported { agent_id, .. } => Some(agent_id),
            EventPayload::CoordinationRequested { from, .. } => Some(from),
            EventPayload::Error { agent_id, .. } => agent_id.as_ref(),
        }
    }
}

/// An immutable notification of a state change.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DomainEvent {
    pub id: String,
    pub event_type: EventKind,
    pub domain: String,
    pub timestamp: DateTime<Utc>,
    /// Monotonically increasing per bus
    pub version: u64,
    pub payload: EventPayload,
}

impl DomainEvent {
    pub fn new(version: u64, payload: EventPayload) -> Self {
        Self {
            id: format!("evt-{}", uuid::Uuid::new_v4()),
            event_type: payload.kind(),
            domain: AGENTS_DOMAIN.to_string(),
            timestamp: Utc::now(),
            version,
            payload,
        }
    }

    pub fn agent_id(&self) -> Option<&AgentId> {
        self.payload.agent_id()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_matches_payload() {
        let event = DomainEvent::new(
            7,
            EventPayload::StatusChanged {
                agent_id: AgentId::new("producer"),
                from: AgentStatus::Idle,
                to: AgentStatus::Thinking,
            },
        );
        assert_eq!(event.event_type, EventKind::StatusChanged);
        assert_eq!(event.domain, AGENTS_DOMAIN);
        assert_eq!(event.version, 7);
        assert_eq!(event.agent_id(), Some(&AgentId::new("producer")));
        assert!(event.id.starts_with("evt-"));
    }

    #[test]
    fn test_event_kind_strings() {
        for kind in EventKind::ALL {
            assert_eq!(kind.as_str().parse::<EventKind>().unwrap(), kind);
            let json = serde_json::to_value(kind).unwrap();
            assert_eq!(json, kind.as_str());
        }
    }

    #[test]
    fn test_payload_serialization() {
        let payload = EventPayload::CoordinationRequested {
            from: AgentId::new("producer"),
            to: AgentId::new("architect"),
            message_id: "msg-1".into(),
            request: "Design the API".into(),
            depth: 1,
        };
        let json = serde_json::to_value(&payload).unwrap();
        assert_eq!(json["kind"], "coordination-requested");
        assert_eq!(json["to"], "architect");

        let back: EventPayload = serde_json::from_value(json).unwrap();
        assert_eq!(back, payload);
    }
}
