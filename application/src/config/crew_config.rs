//! Crew parameters: router and persona control.
//!
//! [`CrewConfig`] groups the static parameters the router needs at
//! construction: how many agents may exist, how deep coordination chains may
//! go, the prompt context windows, and the configuration each role starts
//! with.

use crate::error::RouterError;
use crew_domain::{AgentConfiguration, AgentType, ContextWindows};
use std::collections::HashMap;

#[derive(Debug, Clone, PartialEq)]
pub struct CrewConfig {
    /// Upper bound on registered agents, default team included.
    pub max_agents: usize,
    /// Maximum coordination hops a message may carry.
    pub max_coordination_depth: u32,
    pub windows: ContextWindows,
    /// Role-specific overrides; roles without an entry use the defaults.
    pub agents: HashMap<AgentType, AgentConfiguration>,
}

impl Default for CrewConfig {
    fn default() -> Self {
        Self {
            max_agents: 8,
            max_coordination_depth: 3,
            windows: ContextWindows::default(),
            agents: HashMap::new(),
        }
    }
}

impl CrewConfig {
    /// Configuration a new agent of `agent_type` starts with.
    pub fn agent_config(&self, agent_type: AgentType) -> AgentConfiguration {
        self.agents.get(&agent_type).cloned().unwrap_or_default()
    }

    /// Reject values the router cannot work with.
    pub fn validate(&self) -> Result<(), RouterError> {
        if self.max_agents < AgentType::ALL.len() {
            return Err(RouterError::ConfigurationError(format!(
                "max_agents must be at least {} to hold the default team",
                AgentType::ALL.len()
            )));
        }
        if self.windows.capacity == 0 {
            return Err(RouterError::ConfigurationError(
                "context capacity must be greater than 0".into(),
            ));
        }
        for config in self.agents.values() {
            config.validate()?;
        }
        Ok(())
    }

    // ==================== Builder Methods ====================

    pub fn with_max_agents(mut self, max: usize) -> Self {
        self.max_agents = max;
        self
    }

    pub fn with_max_coordination_depth(mut self, depth: u32) -> Self {
        self.max_coordination_depth = depth;
        self
    }

    pub fn with_windows(mut self, windows: ContextWindows) -> Self {
        self.windows = windows;
        self
    }

    pub fn with_agent_config(mut self, agent_type: AgentType, config: AgentConfiguration) -> Self {
        self.agents.insert(agent_type, config);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_defaults() {
        let config = CrewConfig::default();
        assert_eq!(config.max_agents, 8);
        assert_eq!(config.max_coordination_depth, 3);
        assert_eq!(config.windows.analysis, 5);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_agent_config_override() {
        let config = CrewConfig::default().with_agent_config(
            AgentType::Qa,
            AgentConfiguration::default().with_timeout(Duration::from_secs(5)),
        );
        assert_eq!(config.agent_config(AgentType::Qa).timeout_seconds, 5);
        assert_eq!(config.agent_config(AgentType::Producer).timeout_seconds, 120);
    }

    #[test]
    fn test_validate_rejects_small_team() {
        let config = CrewConfig::default().with_max_agents(2);
        assert!(matches!(
            config.validate(),
            Err(RouterError::ConfigurationError(_))
        ));
    }

    #[test]
    fn test_validate_rejects_bad_agent_config() {
        let config = CrewConfig::default().with_agent_config(
            AgentType::Architect,
            AgentConfiguration {
                creativity: 140,
                ..Default::default()
            },
        );
        assert!(matches!(
            config.validate(),
            Err(RouterError::ConfigurationError(msg)) if msg.contains("creativity")
        ));
    }
}
