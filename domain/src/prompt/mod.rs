//! Prompt domain
//!
//! Persona profiles and the templates used by the two-call
//! (analysis, then response) prompting pattern.

pub mod agent;
pub mod persona;

pub use agent::AgentPromptTemplate;
pub use persona::PersonaProfile;
