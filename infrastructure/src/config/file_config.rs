//! Raw TOML configuration data types
//!
//! These structs represent the exact structure of the TOML config file.
//! They are deserialized directly and use domain types where appropriate.
//!
//! ```toml
//! [crew]
//! max_agents = 8
//! max_coordination_depth = 3
//!
//! [crew.windows]
//! analysis = 5
//!
//! [defaults]
//! communication_style = "friendly"
//!
//! [agents.qa]
//! risk_tolerance = 10
//!
//! [model]
//! command = "crew-model"
//! args = ["--model", "small"]
//! ```

use crew_application::CrewConfig;
use crew_domain::{
    AgentConfiguration, AgentType, AutonomyLevel, CommunicationStyle, ContextWindows,
    NotificationSettings, QuestionFrequency, Verbosity,
};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::path::PathBuf;
use std::str::FromStr;
use thiserror::Error;

/// Configuration validation errors
#[derive(Debug, Error, PartialEq)]
pub enum ConfigValidationError {
    #[error("unknown agent type in [agents.{0}]")]
    UnknownAgentType(String),

    #[error("{0}")]
    InvalidValue(String),

    #[error("unknown confirmation mode '{0}' (expected auto_approve or auto_decline)")]
    UnknownConfirmationMode(String),

    #[error("[model] command is not set")]
    MissingModelCommand,
}

/// Raw crew-wide configuration from TOML
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FileCrewConfig {
    pub max_agents: usize,
    pub max_coordination_depth: u32,
    pub windows: ContextWindows,
}

impl Default for FileCrewConfig {
    fn default() -> Self {
        let defaults = CrewConfig::default();
        Self {
            max_agents: defaults.max_agents,
            max_coordination_depth: defaults.max_coordination_depth,
            windows: defaults.windows,
        }
    }
}

/// Per-agent overrides. Unset fields keep the value they inherit.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FileAgentConfig {
    pub communication_style: Option<CommunicationStyle>,
    pub verbosity: Option<Verbosity>,
    pub autonomy_level: Option<AutonomyLevel>,
    pub question_frequency: Option<QuestionFrequency>,
    pub proactiveness: Option<u8>,
    pub creativity: Option<u8>,
    pub risk_tolerance: Option<u8>,
    pub max_response_length: Option<usize>,
    pub temperature_setting: Option<f32>,
    pub notifications: Option<NotificationSettings>,
    pub timeout_seconds: Option<u64>,
}

impl FileAgentConfig {
    /// Overlay the fields set here onto `base`.
    pub fn apply(&self, mut base: AgentConfiguration) -> AgentConfiguration {
        if let Some(v) = self.communication_style {
            base.communication_style = v;
        }
        if let Some(v) = self.verbosity {
            base.verbosity = v;
        }
        if let Some(v) = self.autonomy_level {
            base.autonomy_level = v;
        }
        if let Some(v) = self.question_frequency {
            base.question_frequency = v;
        }
        if let Some(v) = self.proactiveness {
            base.proactiveness = v;
        }
        if let Some(v) = self.creativity {
            base.creativity = v;
        }
        if let Some(v) = self.risk_tolerance {
            base.risk_tolerance = v;
        }
        if let Some(v) = self.max_response_length {
            base.max_response_length = v;
        }
        if let Some(v) = self.temperature_setting {
            base.temperature_setting = v;
        }
        if let Some(v) = self.notifications {
            base.notifications = v;
        }
        if let Some(v) = self.timeout_seconds {
            base.timeout_seconds = v;
        }
        base
    }
}

/// Raw model gateway configuration from TOML
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct FileModelConfig {
    /// Executable that answers one generation request per invocation
    pub command: Option<String>,
    pub args: Vec<String>,
}

impl FileModelConfig {
    pub fn command(&self) -> Result<&str, ConfigValidationError> {
        self.command
            .as_deref()
            .map(str::trim)
            .filter(|c| !c.is_empty())
            .ok_or(ConfigValidationError::MissingModelCommand)
    }
}

/// Raw event journal configuration from TOML
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct FileJournalConfig {
    /// JSONL file every domain event is appended to
    pub path: Option<PathBuf>,
}

/// How actions flagged for confirmation are decided.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConfirmationMode {
    AutoApprove,
    #[default]
    AutoDecline,
}

impl FromStr for ConfirmationMode {
    type Err = ConfigValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().replace('-', "_").as_str() {
            "auto_approve" | "approve" => Ok(ConfirmationMode::AutoApprove),
            "auto_decline" | "decline" => Ok(ConfirmationMode::AutoDecline),
            other => Err(ConfigValidationError::UnknownConfirmationMode(other.to_string())),
        }
    }
}

/// Raw confirmation configuration from TOML
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FileConfirmationConfig {
    /// auto_approve or auto_decline
    pub mode: String,
}

impl Default for FileConfirmationConfig {
    fn default() -> Self {
        Self {
            mode: "auto_decline".to_string(),
        }
    }
}

impl FileConfirmationConfig {
    pub fn parse_mode(&self) -> Result<ConfirmationMode, ConfigValidationError> {
        self.mode.parse()
    }
}

/// Raw output configuration from TOML
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FileOutputConfig {
    /// Enable colored terminal output
    pub color: bool,
    /// Print domain events as they happen
    pub show_events: bool,
}

impl Default for FileOutputConfig {
    fn default() -> Self {
        Self {
            color: true,
            show_events: true,
        }
    }
}

/// Raw REPL configuration from TOML
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FileReplConfig {
    /// Show a spinner while an agent is thinking
    pub show_progress: bool,
    /// Path to history file
    pub history_file: Option<PathBuf>,
}

impl Default for FileReplConfig {
    fn default() -> Self {
        Self {
            show_progress: true,
            history_file: None,
        }
    }
}

/// Complete file configuration (raw TOML structure)
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct FileConfig {
    pub crew: FileCrewConfig,
    /// Applied to every agent before its own section
    pub defaults: FileAgentConfig,
    /// Keyed by agent type name
    pub agents: BTreeMap<String, FileAgentConfig>,
    pub model: FileModelConfig,
    pub journal: FileJournalConfig,
    pub confirmation: FileConfirmationConfig,
    pub output: FileOutputConfig,
    pub repl: FileReplConfig,
}

impl FileConfig {
    /// Convert into the application's crew configuration, checking every
    /// value on the way.
    pub fn to_crew_config(&self) -> Result<CrewConfig, ConfigValidationError> {
        let mut overrides = HashMap::new();
        for (key, file_config) in &self.agents {
            let agent_type = AgentType::from_str(key)
                .map_err(|_| ConfigValidationError::UnknownAgentType(key.clone()))?;
            overrides.insert(agent_type, file_config);
        }

        let mut config = CrewConfig::default()
            .with_max_agents(self.crew.max_agents)
            .with_max_coordination_depth(self.crew.max_coordination_depth)
            .with_windows(self.crew.windows);

        for agent_type in AgentType::ALL {
            let mut agent_config = self.defaults.apply(AgentConfiguration::default());
            if let Some(file_config) = overrides.get(&agent_type) {
                agent_config = file_config.apply(agent_config);
            }
            config = config.with_agent_config(agent_type, agent_config);
        }

        config
            .validate()
            .map_err(|e| ConfigValidationError::InvalidValue(e.to_string()))?;
        self.confirmation.parse_mode()?;
        Ok(config)
    }
}
