//! Message entities exchanged between the operator and the crew.

use crate::agent::AgentId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Metadata key carrying the number of coordination hops behind a message.
pub const COORDINATION_DEPTH_KEY: &str = "coordination_depth";

/// Metadata key naming the agent that requested a coordination message.
pub const COORDINATED_BY_KEY: &str = "coordinated_by";

/// What the sender expects from the recipient.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum MessageKind {
    Command,
    #[default]
    Request,
    Response,
    Notification,
}

impl MessageKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            MessageKind::Command => "command",
            MessageKind::Request => "request",
            MessageKind::Response => "response",
            MessageKind::Notification => "notification",
        }
    }
}

/// Either end of a message: the human operator or an agent.
///
/// Serialized as a plain string; `"user"` is reserved for the operator.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Participant {
    User,
    Agent(AgentId),
}

impl Participant {
    pub fn as_agent(&self) -> Option<&AgentId> {
        match self {
            Participant::User => None,
            Participant::Agent(id) => Some(id),
        }
    }

    pub fn is_user(&self) -> bool {
        matches!(self, Participant::User)
    }
}

impl From<String> for Participant {
    fn from(s: String) -> Self {
        if s == "user" {
            Participant::User
        } else {
            Participant::Agent(AgentId::new(s))
        }
    }
}

impl From<Participant> for String {
    fn from(p: Participant) -> Self {
        match p {
            Participant::User => "user".to_string(),
            Participant::Agent(id) => id.as_str().to_string(),
        }
    }
}

impl From<AgentId> for Participant {
    fn from(id: AgentId) -> Self {
        Participant::Agent(id)
    }
}

impl std::fmt::Display for Participant {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Participant::User => write!(f, "user"),
            Participant::Agent(id) => write!(f, "{}", id),
        }
    }
}

/// A message addressed to an agent (Entity).
///
/// Never modified after it has been handed to the router; the mailbox keeps
/// its own clone.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentMessage {
    pub id: String,
    pub sender: Participant,
    pub target: Participant,
    pub content: String,
    pub kind: MessageKind,
    /// Thread or project correlation id
    pub thread_id: Option<String>,
    pub timestamp: DateTime<Utc>,
    #[serde(default)]
    pub metadata: HashMap<String, serde_json::Value>,
}

impl AgentMessage {
    pub fn new(
        sender: impl Into<Participant>,
        target: impl Into<Participant>,
        content: impl Into<String>,
        kind: MessageKind,
    ) -> Self {
        Self {
            id: format!("msg-{}", uuid::Uuid::new_v4()),
            sender: sender.into(),
            target: target.into(),
            content: content.into(),
            kind,
            thread_id: None,
            timestamp: Utc::now(),
            metadata: HashMap::new(),
        }
    }

    /// A request from the operator to an agent.
    pub fn from_user(target: impl Into<AgentId>, content: impl Into<String>) -> Self {
        Self::new(
            Participant::User,
            Participant::Agent(target.into()),
            content,
            MessageKind::Request,
        )
    }

    pub fn with_thread(mut self, thread_id: impl Into<String>) -> Self {
        self.thread_id = Some(thread_id.into());
        self
    }

    pub fn with_kind(mut self, kind: MessageKind) -> Self {
        self.kind = kind;
        self
    }

    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<serde_json::Value>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }

    /// Number of coordination hops that led to this message (0 for operator
    /// messages).
    pub fn coordination_depth(&self) -> u32 {
        self.metadata
            .get(COORDINATION_DEPTH_KEY)
            .and_then(|v| v.as_u64())
            .map(|d| d.min(u32::MAX as u64) as u32)
            .unwrap_or(0)
    }

    pub fn with_coordination_depth(self, depth: u32) -> Self {
        self.with_metadata(COORDINATION_DEPTH_KEY, depth)
    }

    /// Target agent id, if addressed to an agent.
    pub fn target_agent(&self) -> Option<&AgentId> {
        self.target.as_agent()
    }
}
