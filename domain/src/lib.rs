//! Domain layer for agent-crew
//!
//! This crate contains the core business logic, entities, and value objects.
//! It has no dependencies on infrastructure or presentation concerns.
//!
//! # Core Concepts
//!
//! ## Crew
//!
//! A fixed team of four personas (Producer, Architect, Engineer, QA) that
//! talk to the operator and to each other:
//!
//! - **Agent**: identity, lifecycle [`AgentStatus`], configuration, statistics
//! - **AgentMessage**: immutable unit of work delivered to an agent's mailbox
//! - **AgentAction**: structured side effect extracted from a free-form reply
//! - **DomainEvent**: notification published on every observable change
//!
//! ## Status Transitions
//!
//! [`AgentStatus::reachable`] is the single source of truth for which
//! lifecycle moves are legal.

pub mod action;
pub mod agent;
pub mod conversation;
pub mod core;
pub mod event;
pub mod message;
pub mod prompt;
pub mod response;
pub mod session;

// Re-export commonly used types
pub use action::{
    ActionExtraction, ActionKind, ActionPayload, AgentAction, ClarifyingQuestionParams,
    CoordinateParams, CreateTaskParams, DecisionParams, ExtractionError, IssueParams,
    MilestoneParams, Priority, UpdatePlanParams, extract_actions, parse_actions_json,
};
pub use agent::{
    Agent, AgentConfiguration, AgentId, AgentStats, AgentStatus, AgentType, AutonomyLevel,
    CommunicationStyle, NotificationSettings, QuestionFrequency, Verbosity,
};
pub use conversation::{ContextWindows, ConversationContext, ConversationEntry, PendingQuestion};
pub use core::error::DomainError;
pub use event::{DomainEvent, EventKind, EventPayload};
pub use message::{
    AgentMessage, COORDINATED_BY_KEY, COORDINATION_DEPTH_KEY, MessageKind, Participant,
};
pub use prompt::{AgentPromptTemplate, PersonaProfile};
pub use response::{ActionOutcome, AgentResponse, ProcessingError, ProcessingStage};
pub use session::{Role, Turn};
