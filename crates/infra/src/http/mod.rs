//! Outbound HTTP with credential-aware retries

pub mod basic_auth;
pub mod client;
pub mod retry_policy;

pub use client::{HttpClient, HttpClientBuilder};
pub use retry_policy::{classify, requires_credential_refresh, AttemptOutcome, Backoff, RetryDecision};
