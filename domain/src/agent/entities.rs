//! Agent domain entities

use super::configuration::AgentConfiguration;
use super::status::AgentStatus;
use super::value_objects::{AgentId, AgentType};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Running statistics for an agent.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AgentStats {
    /// Inbound messages that produced a response
    pub messages_processed: u64,
    /// Actions that executed successfully
    pub tasks_completed: u64,
    /// Mean response time over all processed messages, in milliseconds
    pub average_response_time_ms: f64,
    /// Provider failures
    pub error_count: u64,
}

impl AgentStats {
    /// Fold one successful exchange into the statistics.
    ///
    /// The average is the arithmetic mean over every processed message,
    /// maintained incrementally.
    pub fn record_response(&mut self, elapsed: Duration, tasks_completed: u64) {
        self.messages_processed += 1;
        self.tasks_completed += tasks_completed;

        let sample = elapsed.as_secs_f64() * 1000.0;
        let n = self.messages_processed as f64;
        self.average_response_time_ms += (sample - self.average_response_time_ms) / n;
    }

    pub fn record_error(&mut self) {
        self.error_count += 1;
    }
}

/// A member of the crew (Entity).
///
/// Owned by the registry in the application layer; everything outside it
/// sees clones.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Agent {
    pub id: AgentId,
    pub agent_type: AgentType,
    pub name: String,
    pub status: AgentStatus,
    pub config: AgentConfiguration,
    pub stats: AgentStats,
    pub created_at: DateTime<Utc>,
    pub last_active_at: DateTime<Utc>,
}

impl Agent {
    /// Creates a new agent in the `Idle` status.
    pub fn new(
        id: impl Into<AgentId>,
        agent_type: AgentType,
        name: impl Into<String>,
        config: AgentConfiguration,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: id.into(),
            agent_type,
            name: name.into(),
            status: AgentStatus::Idle,
            config,
            stats: AgentStats::default(),
            created_at: now,
            last_active_at: now,
        }
    }

    /// Default member of the team for the given role.
    pub fn for_type(agent_type: AgentType, config: AgentConfiguration) -> Self {
        Self::new(
            agent_type.default_id(),
            agent_type,
            agent_type.display_name(),
            config,
        )
    }

    pub fn touch(&mut self) {
        self.last_active_at = Utc::now();
    }
}
