//! Platform integrations
//!
//! REST client, service-user listing and the notification stream consumer.

pub mod client;
pub mod notification;
pub mod service_users;

pub use client::PlatformClient;
pub use notification::WebSocketSubscriber;
pub use service_users::BootstrapServiceUsers;
