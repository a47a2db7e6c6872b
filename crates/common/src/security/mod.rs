//! Security primitives
//!
//! Platform keychain integration for high-sensitivity credentials.

pub mod keychain;

pub use keychain::KeychainBackend;
