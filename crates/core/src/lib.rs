//! # HubBridge Core
//!
//! Pure bridging logic - no infrastructure dependencies.
//!
//! This crate contains:
//! - Port/adapter interfaces (traits) for the platform and the broker
//! - The credential store shared by all outbound platform calls
//! - The subscribe-forward-acknowledge loop
//!
//! ## Architecture Principles
//! - Only depends on `hubbridge-domain`
//! - No HTTP, websocket or broker code
//! - All external dependencies via traits

pub mod credentials;
pub mod forwarding;

pub use credentials::{CredentialStore, ServiceUserSource};
pub use forwarding::{EventProducer, ForwardingLoop, ForwardingStats, NotificationSubscriber};
