//! Action domain module
//!
//! The closed vocabulary of structured side effects and the extraction of
//! those actions from free-form agent replies.

pub mod entities;
pub mod parser;

pub use entities::{
    ActionKind, ActionPayload, AgentAction, ClarifyingQuestionParams, CoordinateParams,
    CreateTaskParams, DecisionParams, IssueParams, MilestoneParams, Priority, UpdatePlanParams,
};
pub use parser::{ActionExtraction, ExtractionError, extract_actions, parse_actions_json};
