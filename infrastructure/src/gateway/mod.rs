//! Model gateway adapters

mod process;

pub use process::ProcessModelGateway;
