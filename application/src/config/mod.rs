//! Application-level configuration.
//!
//! - [`CrewConfig`]: team size, coordination limits, context windows and
//!   per-role agent configuration

pub mod crew_config;

pub use crew_config::CrewConfig;
