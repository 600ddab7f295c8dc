//! Infrastructure layer for agent-crew
//!
//! This crate contains adapters that implement the ports defined
//! in the application layer, including configuration file loading.

pub mod config;
pub mod gateway;
pub mod logging;
pub mod memory;

// Re-export commonly used types
pub use config::{
    ConfigLoader, ConfigValidationError, ConfirmationMode, FileAgentConfig, FileConfig,
    FileModelConfig, FileOutputConfig, FileReplConfig,
};
pub use gateway::ProcessModelGateway;
pub use logging::JsonlEventJournal;
pub use memory::InMemoryMemoryStore;
