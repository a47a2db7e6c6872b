//! # Tollgate Domain
//!
//! Domain types and models for the Tollgate access layer.
//!
//! This crate contains:
//! - The canonical response envelope and request description types
//! - Credential kinds and their sensitivity levels
//! - Client configuration structures
//! - Domain error types and Result definitions
//! - Domain constants (endpoint paths, timing defaults)
//!
//! ## Architecture
//! - No dependencies on other Tollgate crates
//! - Only external dependencies allowed
//! - Pure domain models and data structures, no I/O

pub mod config;
pub mod constants;
pub mod errors;
pub mod macros;
pub mod types;

// Re-export commonly used items
pub use config::*;
pub use errors::*;
pub use types::*;
