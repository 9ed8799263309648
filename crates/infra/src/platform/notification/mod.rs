//! Notification stream consumer

pub mod frame;
pub mod subscriber;

pub use frame::Pattern;
pub use subscriber::WebSocketSubscriber;
