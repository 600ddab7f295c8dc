//! Application error types

use crate::ports::memory::MemoryError;
use crate::ports::model_gateway::GatewayError;
use crew_domain::{AgentId, AgentStatus, DomainError};
use thiserror::Error;

/// Errors returned by router operations.
///
/// Structural errors leave all state untouched. `ProviderError` is the only
/// variant that moves the agent into `Error`.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum RouterError {
    #[error("Agent not found: {0}")]
    AgentNotFound(AgentId),

    #[error("Agent {0} is in error state; recover it first")]
    AgentInErrorState(AgentId),

    #[error("Invalid transition: {from} -> {to}")]
    InvalidTransition { from: AgentStatus, to: AgentStatus },

    #[error("Provider error: {0}")]
    ProviderError(#[from] GatewayError),

    #[error("Configuration error: {0}")]
    ConfigurationError(String),

    #[error("Coordination depth {depth} exceeds the maximum of {max}")]
    CoordinationDepthExceeded { depth: u32, max: u32 },

    #[error("Registry is full ({max} agents)")]
    RegistryFull { max: usize },

    #[error("Dispatch lane for {0} is closed")]
    LaneClosed(AgentId),
}

impl From<DomainError> for RouterError {
    fn from(e: DomainError) -> Self {
        match e {
            DomainError::InvalidTransition { from, to } => RouterError::InvalidTransition { from, to },
            other => RouterError::ConfigurationError(other.to_string()),
        }
    }
}

impl RouterError {
    /// Whether this error forced the agent into `Error`.
    pub fn is_provider_error(&self) -> bool {
        matches!(self, RouterError::ProviderError(_))
    }
}

/// Failure of a single action handler. Recorded in the response, never
/// propagated to the caller.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ActionExecutionError {
    #[error("Unknown target agent: {0}")]
    UnknownTarget(String),

    #[error("An agent cannot coordinate with itself")]
    SelfCoordination,

    #[error("Unexpected payload for {0} handler")]
    PayloadMismatch(crew_domain::ActionKind),

    #[error(transparent)]
    Router(#[from] RouterError),

    #[error(transparent)]
    Memory(#[from] MemoryError),

    #[error("{0}")]
    Failed(String),
}
