//! Core domain concepts shared across all subdomains.
//!
//! - [`error::DomainError`]: domain-level errors
//! - [`string::clip`]: char-safe truncation used by prompt builders

pub mod error;
pub mod string;
