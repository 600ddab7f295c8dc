//! Interactive chat module
//!
//! Provides a reedline-based chat with the crew: `@agent` routing and
//! slash commands for status, queues and recovery.

mod repl;

pub use repl::{ChatRepl, ReplInput, wait_until_settled};
