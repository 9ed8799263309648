//! Shared test helpers for `hubbridge-core` integration tests.
//!
//! In-memory subscriber and producer mocks that record every call so tests
//! can assert on ordering and acknowledgement behaviour.

pub mod mocks;
