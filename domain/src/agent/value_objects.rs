//! Agent domain value objects - identity types for the crew.
//!
//! # Identifiers
//! - [`AgentId`] - Unique identifier for an agent in the registry
//! - [`AgentType`] - The specialized role an agent plays

use crate::core::error::DomainError;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Unique identifier for an agent.
///
/// The default team uses the lowercase role name (`producer`, `architect`,
/// `engineer`, `qa`); agents spawned on demand get a numeric suffix.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct AgentId(String);

impl AgentId {
    /// Creates an AgentId from an existing string.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Returns the ID as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for AgentId {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<String> for AgentId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl std::fmt::Display for AgentId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The four specialized roles of the crew.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AgentType {
    /// Facilitator: talks to the operator, keeps the plan, hands out work
    Producer,
    /// Designs the system and records technical decisions
    Architect,
    /// Implements features
    Engineer,
    /// Verifies work and reports issues
    #[serde(rename = "qa")]
    Qa,
}

impl AgentType {
    pub const ALL: [AgentType; 4] = [
        AgentType::Producer,
        AgentType::Architect,
        AgentType::Engineer,
        AgentType::Qa,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            AgentType::Producer => "producer",
            AgentType::Architect => "architect",
            AgentType::Engineer => "engineer",
            AgentType::Qa => "qa",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            AgentType::Producer => "Producer",
            AgentType::Architect => "Architect",
            AgentType::Engineer => "Engineer",
            AgentType::Qa => "QA",
        }
    }

    /// Id used for the single agent of this type created at startup.
    pub fn default_id(&self) -> AgentId {
        AgentId::new(self.as_str())
    }
}

impl std::fmt::Display for AgentType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.display_name())
    }
}

impl FromStr for AgentType {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "producer" => Ok(AgentType::Producer),
            "architect" => Ok(AgentType::Architect),
            "engineer" => Ok(AgentType::Engineer),
            "qa" | "quality" | "tester" => Ok(AgentType::Qa),
            other => Err(DomainError::UnknownAgentType(other.to_string())),
        }
    }
}
