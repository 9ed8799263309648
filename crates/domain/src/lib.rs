//! # HubBridge Domain
//!
//! Domain types and models for the notification bridge.
//!
//! This crate contains:
//! - Service users, notification messages and broker batches
//! - Domain error types and Result definitions
//! - Configuration structures
//! - Tenant option keys and other constants
//!
//! ## Architecture
//! - No dependencies on other HubBridge crates
//! - Only external dependencies allowed
//! - Pure domain models and data structures

pub mod config;
pub mod constants;
pub mod errors;
pub mod types;

// Re-export commonly used items
pub use config::*;
pub use errors::*;
pub use types::*;
