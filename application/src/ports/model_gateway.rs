//! Model gateway port
//!
//! Defines the interface for calling the language model. The model is an
//! opaque capability: given role-tagged turns it returns text or fails.

use async_trait::async_trait;
use crew_domain::{AgentConfiguration, Turn};
use std::time::Duration;
use thiserror::Error;

/// Errors that can occur during model calls
#[derive(Error, Debug, Clone, PartialEq)]
pub enum GatewayError {
    #[error("Connection error: {0}")]
    ConnectionError(String),

    #[error("Request failed: {0}")]
    RequestFailed(String),

    #[error("Quota exceeded: {0}")]
    QuotaExceeded(String),

    #[error("Timed out after {0:?}")]
    Timeout(Duration),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Other error: {0}")]
    Other(String),
}

impl GatewayError {
    pub fn is_timeout(&self) -> bool {
        matches!(self, GatewayError::Timeout(_))
    }
}

/// Per-call generation hints derived from the agent's configuration.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GenerationOptions {
    pub temperature: f32,
    /// Upper bound on reply length, in characters
    pub max_response_length: usize,
}

impl Default for GenerationOptions {
    fn default() -> Self {
        Self::from(&AgentConfiguration::default())
    }
}

impl From<&AgentConfiguration> for GenerationOptions {
    fn from(config: &AgentConfiguration) -> Self {
        Self {
            temperature: config.temperature_setting,
            max_response_length: config.max_response_length,
        }
    }
}

/// Gateway for model calls
///
/// Implementations (adapters) live in the infrastructure layer.
#[async_trait]
pub trait ModelGateway: Send + Sync {
    /// Generate a reply for the given conversation turns
    async fn generate(
        &self,
        turns: &[Turn],
        options: &GenerationOptions,
    ) -> Result<String, GatewayError>;
}
