//! Memory port
//!
//! Optional long-term memory for the crew. Personas consult it during the
//! analysis pass and some action handlers write to it. Failures are logged
//! by callers and never abort a response.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use crew_domain::AgentId;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum MemoryError {
    #[error("Memory unavailable: {0}")]
    Unavailable(String),

    #[error("Memory storage error: {0}")]
    Storage(String),
}

/// What a memory entry records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MemoryKind {
    Plan,
    Decision,
    Note,
}

impl MemoryKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            MemoryKind::Plan => "plan",
            MemoryKind::Decision => "decision",
            MemoryKind::Note => "note",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MemoryEntry {
    pub agent_id: AgentId,
    pub kind: MemoryKind,
    pub content: String,
    pub created_at: DateTime<Utc>,
}

impl MemoryEntry {
    pub fn new(agent_id: AgentId, kind: MemoryKind, content: impl Into<String>) -> Self {
        Self {
            agent_id,
            kind,
            content: content.into(),
            created_at: Utc::now(),
        }
    }

    /// One-line rendering used in prompts.
    pub fn to_prompt_line(&self) -> String {
        format!("[{} by {}] {}", self.kind.as_str(), self.agent_id, self.content)
    }
}

#[async_trait]
pub trait MemoryPort: Send + Sync {
    async fn store(&self, entry: MemoryEntry) -> Result<(), MemoryError>;

    /// Entries relevant to `query`, best match first, at most `limit`.
    async fn search(&self, query: &str, limit: usize) -> Result<Vec<MemoryEntry>, MemoryError>;
}
