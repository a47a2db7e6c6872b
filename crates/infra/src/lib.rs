//! # Tollgate Infrastructure
//!
//! The impure half of the Tollgate access layer.
//!
//! This crate contains:
//! - The reqwest-based HTTP client and response normalization
//! - Connectivity probing
//! - Credential storage and the app/user token managers
//! - The request pipeline (live and mock strategies) and client facade
//! - Configuration loading from environment and files
//!
//! ## Architecture
//! - Pure types live in `tollgate-domain`
//! - Storage backends and retry come from `tollgate-common`
//! - Contains all "impure" code (network, keychain, filesystem)

pub mod api;
pub mod auth;
pub mod config;
pub mod connectivity;
pub mod http;

// Re-export commonly used items
pub use api::{ApiError, ApiErrorCategory, TollgateClient, TollgateClientBuilder};
pub use auth::{AppTokenManager, CredentialStore, TokenIssuer, UserTokenManager};
pub use connectivity::{AlwaysOnline, ConnectivityProbe, StaticConnectivity, TcpConnectivityProbe};
pub use http::HttpClient;
