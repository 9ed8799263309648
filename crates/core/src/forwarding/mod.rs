//! Subscribe, forward and acknowledge
//!
//! This module provides the collaborator ports for the notification stream
//! and the broker, and the loop that connects them.

pub mod ports;
pub mod service;

pub use ports::{EventProducer, NotificationSubscriber};
pub use service::{ForwardingLoop, ForwardingStats};
