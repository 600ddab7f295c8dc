//! Message domain module
//!
//! Messages are the unit of work routed into agent mailboxes.

pub mod entities;

pub use entities::{
    AgentMessage, COORDINATED_BY_KEY, COORDINATION_DEPTH_KEY, MessageKind, Participant,
};
