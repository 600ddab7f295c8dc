//! Application layer for agent-crew
//!
//! This crate contains the router, the persona strategies, response
//! processing and the ports the infrastructure layer implements.
//! It depends only on the domain layer.

pub mod bus;
pub mod config;
pub mod error;
pub mod persona;
pub mod ports;
pub mod processor;
pub mod registry;
pub mod router;
pub mod state_machine;

// Re-export commonly used types
pub use bus::{EventBus, EventFilter, EventHandler, Subscription};
pub use config::CrewConfig;
pub use error::{ActionExecutionError, RouterError};
pub use persona::{PersonaStrategy, persona_for};
pub use ports::{
    confirmation::{
        AutoApproveConfirmation, AutoDeclineConfirmation, ConfirmationDecision,
        ConfirmationError, ConfirmationPort,
    },
    event_sink::{EventSink, NoEventSink},
    memory::{MemoryEntry, MemoryError, MemoryKind, MemoryPort},
    model_gateway::{GatewayError, GenerationOptions, ModelGateway},
};
pub use processor::{
    ExecutionReport, Interpretation, ResponseProcessor,
    handlers::{ActionContext, ActionHandler, MessagePoster},
    plan_board::{PlanBoard, PlanRecord},
};
pub use registry::AgentRegistry;
pub use router::{AgentRouter, AgentRouterBuilder};
pub use state_machine::StatusStateMachine;
