//! Agent domain module
//!
//! Contains agent identity, lifecycle status, configuration and statistics
//! for the crew.

pub mod configuration;
pub mod entities;
pub mod status;
pub mod value_objects;

pub use configuration::{
    AgentConfiguration, AutonomyLevel, CommunicationStyle, NotificationSettings,
    QuestionFrequency, Verbosity,
};
pub use entities::{Agent, AgentStats};
pub use status::AgentStatus;
pub use value_objects::{AgentId, AgentType};
