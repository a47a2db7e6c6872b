//! Backend API access
//!
//! The client facade, the request pipeline with its live and mock
//! strategies, the mock response generator, and the error taxonomy with its
//! user-facing messages.
//!
//! # Architecture
//!
//! - Uses the shared `HttpClient` (no direct reqwest in callers)
//! - Two-tier credentials: app token for login, user token for everything else
//! - Bounded exponential retry for transient failures
//! - One refresh-and-replay on 401, never more

pub mod client;
pub mod errors;
pub mod mock;
pub mod pipeline;

pub use client::{TollgateClient, TollgateClientBuilder};
pub use errors::{ApiError, ApiErrorCategory};
pub use mock::MockResponseGenerator;
pub use pipeline::{ApiRetryPolicy, Dispatch, LiveDispatch, MockDispatch};
