//! # HubBridge App
//!
//! Process wiring for the notification bridge.
//!
//! This crate contains:
//! - Application context (bootstrap and dependency wiring)
//! - Health endpoint server
//! - Logging setup and shutdown signal handling
//!
//! ## Architecture
//! - Depends on `domain`, `core`, and `infra`
//! - Wires up the hexagonal architecture
//! - Provides the `hubbridge` binary entry point

pub mod context;
pub mod server;
pub mod utils;

// Re-export for convenience
pub use context::AppContext;
pub use server::HealthServer;
