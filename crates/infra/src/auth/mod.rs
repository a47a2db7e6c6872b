//! Credential management
//!
//! The store persists the three credentials. The app and user token managers
//! obtain new tokens from a [`TokenIssuer`], deduplicating concurrent network
//! operations through [`SingleFlight`].

pub mod app_token;
pub mod issuer;
pub mod jwt;
pub mod single_flight;
pub mod store;
pub mod user_token;

pub use app_token::AppTokenManager;
pub use issuer::{HttpTokenIssuer, MockTokenIssuer, TokenIssuer};
pub use single_flight::SingleFlight;
pub use store::CredentialStore;
pub use user_token::UserTokenManager;
