//! # HubBridge Infrastructure
//!
//! Infrastructure implementations of core ports.
//!
//! This crate contains:
//! - The credential-aware HTTP transport
//! - Platform REST client, service-user listing and notification consumer
//! - Azure Event Hubs producer
//! - Sample event scheduler and configuration loading
//!
//! ## Architecture
//! - Implements traits defined in `hubbridge-core`
//! - Contains all "impure" code (HTTP, websockets, environment)

pub mod config;
pub mod errors;
pub mod eventhub;
pub mod http;
pub mod platform;
pub mod scheduling;

// Re-export commonly used items
pub use errors::InfraError;
pub use eventhub::{EventHubConnection, EventHubProducer};
pub use http::{HttpClient, HttpClientBuilder};
pub use platform::{BootstrapServiceUsers, PlatformClient, WebSocketSubscriber};
pub use scheduling::{SampleEventScheduler, SampleSchedulerConfig, SchedulerError};
