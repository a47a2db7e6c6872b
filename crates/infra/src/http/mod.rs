//! HTTP transport
//!
//! A single reqwest client shared by the pipeline and the token issuer, plus
//! normalization of responses into the canonical envelope.

pub mod client;
pub mod response;

pub use client::{method_for, HttpClient, HttpClientBuilder};
pub use response::read_envelope;
