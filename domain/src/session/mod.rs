//! Model session domain.
//!
//! - [`entities::Turn`]: a single role-tagged turn sent to the model
//! - [`entities::Role`]: who authored a turn

pub mod entities;

pub use entities::{Role, Turn};
