//! Per-agent behavioural configuration.
//!
//! [`AgentConfiguration`] carries the personality knobs that persona prompt
//! builders read, plus the runtime limits the router enforces (timeout).
//! Values arrive from configuration files as plain numbers and strings, so
//! [`AgentConfiguration::validate`] is the single place where ranges are
//! checked before an agent is registered.

use crate::core::error::DomainError;
use serde::{Deserialize, Serialize};
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum CommunicationStyle {
    Formal,
    Casual,
    #[default]
    Professional,
    Friendly,
}

impl CommunicationStyle {
    pub fn as_str(&self) -> &'static str {
        match self {
            CommunicationStyle::Formal => "formal",
            CommunicationStyle::Casual => "casual",
            CommunicationStyle::Professional => "professional",
            CommunicationStyle::Friendly => "friendly",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Verbosity {
    Concise,
    #[default]
    Balanced,
    Verbose,
}

impl Verbosity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Verbosity::Concise => "concise",
            Verbosity::Balanced => "balanced",
            Verbosity::Verbose => "verbose",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum AutonomyLevel {
    Low,
    #[default]
    Medium,
    High,
}

impl AutonomyLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            AutonomyLevel::Low => "low",
            AutonomyLevel::Medium => "medium",
            AutonomyLevel::High => "high",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum QuestionFrequency {
    Minimal,
    #[default]
    Normal,
    Frequent,
}

impl QuestionFrequency {
    pub fn as_str(&self) -> &'static str {
        match self {
            QuestionFrequency::Minimal => "minimal",
            QuestionFrequency::Normal => "normal",
            QuestionFrequency::Frequent => "frequent",
        }
    }
}

/// Which lifecycle notifications the operator wants surfaced for an agent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NotificationSettings {
    pub status_changes: bool,
    pub task_assignments: bool,
    pub completions: bool,
    pub errors: bool,
}

impl Default for NotificationSettings {
    fn default() -> Self {
        Self {
            status_changes: true,
            task_assignments: true,
            completions: true,
            errors: true,
        }
    }
}

/// Configuration for a single agent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AgentConfiguration {
    pub communication_style: CommunicationStyle,
    pub verbosity: Verbosity,
    pub autonomy_level: AutonomyLevel,
    pub question_frequency: QuestionFrequency,
    /// 0-100
    pub proactiveness: u8,
    /// 0-100
    pub creativity: u8,
    /// 0-100
    pub risk_tolerance: u8,
    /// Upper bound on the length of a reply, in characters
    pub max_response_length: usize,
    /// 0.0-1.0
    pub temperature_setting: f32,
    pub notifications: NotificationSettings,
    /// Model call timeout
    pub timeout_seconds: u64,
}

impl Default for AgentConfiguration {
    fn default() -> Self {
        Self {
            communication_style: CommunicationStyle::default(),
            verbosity: Verbosity::default(),
            autonomy_level: AutonomyLevel::default(),
            question_frequency: QuestionFrequency::default(),
            proactiveness: 50,
            creativity: 50,
            risk_tolerance: 50,
            max_response_length: 2000,
            temperature_setting: 0.7,
            notifications: NotificationSettings::default(),
            timeout_seconds: 120,
        }
    }
}

impl AgentConfiguration {
    /// Check every numeric option against its allowed range.
    pub fn validate(&self) -> Result<(), DomainError> {
        for (field, value) in [
            ("proactiveness", self.proactiveness),
            ("creativity", self.creativity),
            ("risk_tolerance", self.risk_tolerance),
        ] {
            if value > 100 {
                return Err(DomainError::configuration(
                    field,
                    format!("{value} is outside 0..=100"),
                ));
            }
        }

        if !(0.0..=1.0).contains(&self.temperature_setting) {
            return Err(DomainError::configuration(
                "temperature_setting",
                format!("{} is outside 0.0..=1.0", self.temperature_setting),
            ));
        }

        if self.max_response_length == 0 {
            return Err(DomainError::configuration(
                "max_response_length",
                "must be greater than 0",
            ));
        }

        if self.timeout_seconds == 0 {
            return Err(DomainError::configuration(
                "timeout_seconds",
                "must be greater than 0",
            ));
        }

        Ok(())
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_seconds)
    }

    /// Whether actions flagged for confirmation may run without a human.
    pub fn skips_confirmation(&self) -> bool {
        self.autonomy_level == AutonomyLevel::High
    }

    // ==================== Builder Methods ====================

    pub fn with_communication_style(mut self, style: CommunicationStyle) -> Self {
        self.communication_style = style;
        self
    }

    pub fn with_verbosity(mut self, verbosity: Verbosity) -> Self {
        self.verbosity = verbosity;
        self
    }

    pub fn with_autonomy_level(mut self, level: AutonomyLevel) -> Self {
        self.autonomy_level = level;
        self
    }

    pub fn with_timeout_seconds(mut self, seconds: u64) -> Self {
        self.timeout_seconds = seconds;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout_seconds = timeout.as_secs().max(1);
        self
    }
}
