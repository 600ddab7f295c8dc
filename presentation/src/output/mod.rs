//! Console output: response/status formatting and live event lines

pub mod console;
pub mod events;

pub use console::ConsoleFormatter;
pub use events::{EventPrinter, should_print};
