//! Agent lifecycle status and the fixed transition table.
//!
//! ```text
//!            ┌──────────► Offline ──┐
//!            │                      │
//!   ┌───── Idle ◄───────────────────┘
//!   │       │  ▲
//!   │       ▼  │
//!   │    Thinking ──► Working
//!   │       │  ▲        │
//!   │       ▼  │        │
//!   │     Waiting ◄─────┘
//!   ▼
//! Error ──► Idle          (every non-terminal state may fail into Error)
//! ```
//!
//! The table is directed, not symmetric. `Error` and `Offline` only lead back
//! to `Idle`, which is the administrative recovery path.

use crate::core::error::DomainError;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Lifecycle status of an agent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum AgentStatus {
    #[default]
    Idle,
    Thinking,
    Working,
    Waiting,
    Error,
    Offline,
}

impl AgentStatus {
    pub const ALL: [AgentStatus; 6] = [
        AgentStatus::Idle,
        AgentStatus::Thinking,
        AgentStatus::Working,
        AgentStatus::Waiting,
        AgentStatus::Error,
        AgentStatus::Offline,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            AgentStatus::Idle => "idle",
            AgentStatus::Thinking => "thinking",
            AgentStatus::Working => "working",
            AgentStatus::Waiting => "waiting",
            AgentStatus::Error => "error",
            AgentStatus::Offline => "offline",
        }
    }

    /// Statuses reachable in one step from `self`.
    pub fn reachable(&self) -> &'static [AgentStatus] {
        use AgentStatus::*;
        match self {
            Idle => &[Thinking, Error, Offline],
            Thinking => &[Working, Waiting, Idle, Error],
            Working => &[Idle, Waiting, Error],
            Waiting => &[Thinking, Idle, Error],
            Error => &[Idle],
            Offline => &[Idle],
        }
    }

    pub fn can_transition_to(&self, to: AgentStatus) -> bool {
        self.reachable().contains(&to)
    }

    /// Validate a single step against the table.
    ///
    /// A step to the current status is accepted as a no-op.
    pub fn validate_transition(&self, to: AgentStatus) -> Result<(), DomainError> {
        if *self == to || self.can_transition_to(to) {
            Ok(())
        } else {
            Err(DomainError::InvalidTransition { from: *self, to })
        }
    }

    /// Whether the agent is currently computing a response.
    pub fn is_busy(&self) -> bool {
        matches!(self, AgentStatus::Thinking | AgentStatus::Working)
    }
}

impl std::fmt::Display for AgentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for AgentStatus {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        AgentStatus::ALL
            .into_iter()
            .find(|status| status.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| DomainError::UnknownStatus(s.to_string()))
    }
}
