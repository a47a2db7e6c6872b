//! Testing utilities and helpers
//!
//! - **[`mocks`]**: Mock implementations of common traits
//!
//! ## Usage
//!
//! ```rust
//! # #[cfg(feature = "runtime")]
//! # {
//! use tollgate_common::storage::SecretBackend;
//! use tollgate_common::testing::FlakyBackend;
//!
//! let backend = FlakyBackend::new();
//! backend.set_failing(true);
//! assert!(backend.set("user_token", "jwt").is_err());
//! # }
//! ```

pub mod mocks;

pub use mocks::FlakyBackend;
