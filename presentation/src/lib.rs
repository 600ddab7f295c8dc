//! Presentation layer for agent-crew
//!
//! This crate contains CLI definitions, console formatting of responses
//! and events, progress spinners, and the interactive chat interface.

pub mod chat;
pub mod cli;
pub mod output;
pub mod progress;

// Re-export commonly used types
pub use chat::{ChatRepl, ReplInput, wait_until_settled};
pub use cli::{Cli, Command};
pub use output::{ConsoleFormatter, EventPrinter};
pub use progress::ProgressReporter;
