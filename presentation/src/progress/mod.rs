//! Progress indicators

pub mod reporter;

pub use reporter::ProgressReporter;
