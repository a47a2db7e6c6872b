//! Domain types and models

pub mod auth;
pub mod credential;
pub mod envelope;
pub mod request;

pub use auth::{AppTokenRequest, AuthTokens, LoginRequest};
pub use credential::{CredentialKind, Sensitivity};
pub use envelope::ApiResponseEnvelope;
pub use request::{HttpMethod, RequestConfig};
