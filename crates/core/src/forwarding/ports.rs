//! Port interfaces for the notification stream and the broker

use async_trait::async_trait;
use hubbridge_domain::{ForwardBatch, MessageIdentifier, NotificationMessage, Result};
use tokio::sync::mpsc::UnboundedSender;

/// Streaming subscription against the platform.
#[async_trait]
pub trait NotificationSubscriber: Send + Sync {
    /// Open the subscription.
    ///
    /// # Errors
    /// Returns `BridgeError::Connection` when the stream cannot be opened.
    async fn connect(&self) -> Result<()>;

    /// Deliver every message matching `pattern` onto `sender`, in arrival order.
    fn register(&self, pattern: &str, sender: UnboundedSender<NotificationMessage>);

    /// Confirm that a message has been processed.
    ///
    /// # Errors
    /// Returns `BridgeError::Acknowledge`; callers log and continue.
    async fn acknowledge(&self, identifier: &MessageIdentifier) -> Result<()>;

    /// Terminate the subscription. Unacknowledged messages are left to the
    /// upstream redelivery policy.
    async fn close(&self);
}

/// Broker producer
#[async_trait]
pub trait EventProducer: Send + Sync {
    /// Create an empty batch sized for this broker.
    async fn new_batch(&self) -> Result<ForwardBatch>;

    /// Submit a batch in one network call.
    async fn submit(&self, batch: ForwardBatch) -> Result<()>;

    /// Release the producer. Later submissions fail.
    async fn close(&self);
}
