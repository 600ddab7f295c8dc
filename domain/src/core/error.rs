//! Domain error types

use crate::agent::status::AgentStatus;
use thiserror::Error;

/// Domain-level errors
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DomainError {
    #[error("Invalid transition: {from} -> {to}")]
    InvalidTransition { from: AgentStatus, to: AgentStatus },

    #[error("Configuration error: {field}: {reason}")]
    Configuration { field: String, reason: String },

    #[error("Unknown agent type: {0}")]
    UnknownAgentType(String),

    #[error("Unknown status: {0}")]
    UnknownStatus(String),
}

impl DomainError {
    /// Build a configuration error for the named option.
    pub fn configuration(field: impl Into<String>, reason: impl Into<String>) -> Self {
        DomainError::Configuration {
            field: field.into(),
            reason: reason.into(),
        }
    }

    /// Check if this error represents a rejected lifecycle transition
    pub fn is_invalid_transition(&self) -> bool {
        matches!(self, DomainError::InvalidTransition { .. })
    }
}
