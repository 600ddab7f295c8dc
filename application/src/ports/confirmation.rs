//! Confirmation port for actions that need a human go-ahead.
//!
//! Actions extracted with `requires_confirmation` pass through
//! [`ConfirmationPort::confirm`] before their handler runs. A declined action
//! is recorded as skipped, not as an error.
//!
//! # Built-in Implementations
//!
//! - [`AutoApproveConfirmation`] - Always approves
//! - [`AutoDeclineConfirmation`] - Always declines

use async_trait::async_trait;
use crew_domain::{Agent, AgentAction};
use thiserror::Error;

/// Failure while asking for confirmation (not a decision).
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfirmationError {
    #[error("Operation cancelled")]
    Cancelled,

    #[error("I/O error: {0}")]
    IoError(String),
}

/// Outcome of a confirmation request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfirmationDecision {
    Approve,
    Decline(String),
}

#[async_trait]
pub trait ConfirmationPort: Send + Sync {
    /// Ask whether `agent` may run `action`.
    async fn confirm(
        &self,
        agent: &Agent,
        action: &AgentAction,
    ) -> Result<ConfirmationDecision, ConfirmationError>;
}

pub struct AutoApproveConfirmation;

#[async_trait]
impl ConfirmationPort for AutoApproveConfirmation {
    async fn confirm(
        &self,
        _agent: &Agent,
        _action: &AgentAction,
    ) -> Result<ConfirmationDecision, ConfirmationError> {
        Ok(ConfirmationDecision::Approve)
    }
}

/// Declines every flagged action; the safest non-interactive mode.
pub struct AutoDeclineConfirmation;

#[async_trait]
impl ConfirmationPort for AutoDeclineConfirmation {
    async fn confirm(
        &self,
        _agent: &Agent,
        action: &AgentAction,
    ) -> Result<ConfirmationDecision, ConfirmationError> {
        Ok(ConfirmationDecision::Decline(format!(
            "{} requires confirmation and confirmations are auto-declined",
            action.kind()
        )))
    }
}
