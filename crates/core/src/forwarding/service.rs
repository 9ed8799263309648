//! Forwarding loop - drains the notification channel into the broker

use std::sync::Arc;

use hubbridge_domain::{EventData, NotificationMessage, Result};
use tokio::sync::mpsc::UnboundedReceiver;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, instrument, warn};

use super::ports::{EventProducer, NotificationSubscriber};

/// Counters reported when the loop stops.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ForwardingStats {
    pub received: u64,
    pub forwarded: u64,
    pub failed: u64,
    /// Messages dropped because no producer is configured.
    pub skipped: u64,
    pub ack_failures: u64,
}

/// Subscribe-forward-acknowledge loop.
///
/// Messages are handled one at a time in channel order. A message is
/// acknowledged only after the batch holding its payload was submitted.
/// Failed submissions are logged and never retried here.
pub struct ForwardingLoop {
    subscriber: Arc<dyn NotificationSubscriber>,
    producer: Option<Arc<dyn EventProducer>>,
}

impl ForwardingLoop {
    /// Create a loop. Without a producer every message is skipped.
    pub fn new(
        subscriber: Arc<dyn NotificationSubscriber>,
        producer: Option<Arc<dyn EventProducer>>,
    ) -> Self {
        Self { subscriber, producer }
    }

    /// Run until `cancel` fires or every sender of `messages` is dropped.
    ///
    /// On stop the subscriber is closed exactly once and the producer is
    /// released. Messages still queued are left unacknowledged.
    pub async fn run(
        self,
        mut messages: UnboundedReceiver<NotificationMessage>,
        cancel: CancellationToken,
    ) -> ForwardingStats {
        let mut stats = ForwardingStats::default();

        if self.producer.is_none() {
            warn!("No event producer configured, messages will not be forwarded");
        }
        info!("Forwarding loop started");

        loop {
            tokio::select! {
                biased;
                _ = cancel.cancelled() => {
                    info!("Stop signal received");
                    break;
                }
                next = messages.recv() => match next {
                    Some(message) => self.handle(message, &mut stats).await,
                    None => {
                        info!("Notification channel closed");
                        break;
                    }
                }
            }
        }

        self.shutdown().await;
        info!(
            received = stats.received,
            forwarded = stats.forwarded,
            failed = stats.failed,
            skipped = stats.skipped,
            ack_failures = stats.ack_failures,
            "Forwarding loop stopped"
        );
        stats
    }

    #[instrument(skip_all, fields(identifier = %message.identifier, source = %message.source))]
    async fn handle(&self, message: NotificationMessage, stats: &mut ForwardingStats) {
        stats.received += 1;
        debug!(action = %message.action, payload = %message.payload_text(), "Notification received");

        let Some(producer) = &self.producer else {
            stats.skipped += 1;
            warn!("Skipping message, event producer unavailable");
            return;
        };

        if let Err(err) = forward(producer.as_ref(), &message).await {
            stats.failed += 1;
            error!(error = %err, kind = err.label(), "Failed to forward message");
            return;
        }
        stats.forwarded += 1;

        match self.subscriber.acknowledge(&message.identifier).await {
            Ok(()) => debug!("Message acknowledged"),
            Err(err) => {
                stats.ack_failures += 1;
                warn!(error = %err, "Failed to acknowledge message");
            }
        }
    }

    async fn shutdown(&self) {
        info!("Closing notification subscription");
        self.subscriber.close().await;
        if let Some(producer) = &self.producer {
            producer.close().await;
        }
    }
}

/// Wrap one payload in a fresh batch and submit it.
async fn forward(producer: &dyn EventProducer, message: &NotificationMessage) -> Result<()> {
    let mut batch = producer.new_batch().await?;
    batch.try_add(EventData::new(message.payload.clone()))?;
    producer.submit(batch).await
}
