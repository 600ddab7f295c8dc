//! Port definitions (interfaces for external adapters)
//!
//! Ports define the contracts that infrastructure adapters must implement.

pub mod confirmation;
pub mod event_sink;
pub mod memory;
pub mod model_gateway;
