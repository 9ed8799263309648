//! Websocket consumer for the platform notification stream

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use futures::stream::{SplitSink, SplitStream};
use futures::{SinkExt, StreamExt};
use hubbridge_core::NotificationSubscriber;
use hubbridge_domain::{
    BridgeError, MessageIdentifier, NotificationConfig, NotificationMessage,
    NotificationTokenRequest, Result,
};
use tokio::net::TcpStream;
use tokio::sync::mpsc::UnboundedSender;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument, trace, warn};
use url::Url;

use super::frame::{self, Pattern};
use crate::errors::InfraError;
use crate::http::Backoff;
use crate::platform::PlatformClient;

type Socket = WebSocketStream<MaybeTlsStream<TcpStream>>;
type SocketSink = SplitSink<Socket, Message>;
type SocketStream = SplitStream<Socket>;

const CONSUMER_PATH: &str = "notification2/consumer/";
const CLOSE_TIMEOUT: Duration = Duration::from_secs(5);
const DEFAULT_RECONNECT: Backoff =
    Backoff { base: Duration::from_secs(1), max: Duration::from_secs(60), jitter: true };

struct Registration {
    pattern: Pattern,
    sender: UnboundedSender<NotificationMessage>,
}

/// State shared with the background reader.
struct Shared {
    platform: Arc<PlatformClient>,
    config: NotificationConfig,
    reconnect: Backoff,
    registrations: parking_lot::Mutex<Vec<Registration>>,
    sink: Mutex<Option<SocketSink>>,
}

impl Shared {
    /// Obtain a fresh token and open the socket. The write half is stored,
    /// the read half returned.
    async fn open(&self) -> Result<SocketStream> {
        let token = self
            .platform
            .create_notification_token(&NotificationTokenRequest {
                subscriber: self.config.consumer.clone(),
                subscription: self.config.subscription.clone(),
                expires_in_minutes: self.config.token_expiry_minutes,
                shared: self.config.shared,
            })
            .await
            .map_err(|err| BridgeError::Connection(format!("notification token request failed: {err}")))?;

        let url = self.consumer_url(&token)?;
        let (socket, _) = connect_async(url.as_str())
            .await
            .map_err(|err| BridgeError::from(InfraError::from(err)))?;
        let (sink, stream) = socket.split();
        *self.sink.lock().await = Some(sink);

        info!(subscription = %self.config.subscription, consumer = %self.config.consumer, "Notification socket connected");
        Ok(stream)
    }

    fn consumer_url(&self, token: &str) -> Result<Url> {
        let mut url = match &self.config.websocket_url {
            Some(explicit) => Url::parse(explicit).map_err(|err| BridgeError::from(InfraError::from(err)))?,
            None => {
                let mut url = self
                    .platform
                    .base_url()
                    .join(CONSUMER_PATH)
                    .map_err(|err| BridgeError::from(InfraError::from(err)))?;
                let scheme = if url.scheme() == "http" { "ws" } else { "wss" };
                url.set_scheme(scheme).map_err(|()| {
                    BridgeError::Config(format!("cannot derive websocket URL from {}", url))
                })?;
                url
            }
        };

        url.query_pairs_mut()
            .append_pair("token", token)
            .append_pair("consumer", &self.config.consumer);
        Ok(url)
    }

    /// Push a parsed frame to every matching registration, in arrival order.
    fn dispatch(&self, text: &str) {
        let Some(message) = frame::parse(text) else {
            warn!("Discarding notification frame without identifier");
            return;
        };
        trace!(identifier = %message.identifier, source = %message.source, "Notification frame received");

        let mut registrations = self.registrations.lock();
        let mut delivered = false;
        registrations.retain(|registration| {
            if !registration.pattern.matches(&message.source) {
                return true;
            }
            delivered = true;
            registration.sender.send(message.clone()).is_ok()
        });

        if !delivered {
            debug!(source = %message.source, "No registration matched notification");
        }
    }

    /// Reconnect with exponential backoff until it works or `cancel` fires.
    async fn reconnect(&self, cancel: &CancellationToken) -> Option<SocketStream> {
        self.sink.lock().await.take();

        let mut attempt: u32 = 0;
        loop {
            attempt += 1;
            let delay = self.reconnect.delay(attempt);
            tokio::select! {
                biased;
                _ = cancel.cancelled() => return None,
                _ = tokio::time::sleep(delay) => {}
            }

            match self.open().await {
                Ok(stream) => {
                    info!(attempt, "Notification socket reconnected");
                    return Some(stream);
                }
                Err(err) => warn!(attempt, error = %err, "Notification socket reconnect failed"),
            }
        }
    }
}

/// Notification subscriber over the platform's websocket consumer endpoint.
///
/// A background task reads frames and fans them out to the registered
/// channels. When the socket drops it reconnects with a fresh token until
/// [`close`](NotificationSubscriber::close) is called.
pub struct WebSocketSubscriber {
    shared: Arc<Shared>,
    cancel: CancellationToken,
    reader: parking_lot::Mutex<Option<JoinHandle<()>>>,
    closed: AtomicBool,
}

impl WebSocketSubscriber {
    pub fn new(platform: Arc<PlatformClient>, config: NotificationConfig) -> Self {
        Self::with_backoff(platform, config, DEFAULT_RECONNECT)
    }

    /// Subscriber whose reconnect attempts wait according to `reconnect`.
    pub fn with_backoff(
        platform: Arc<PlatformClient>,
        config: NotificationConfig,
        reconnect: Backoff,
    ) -> Self {
        Self {
            shared: Arc::new(Shared {
                platform,
                config,
                reconnect,
                registrations: parking_lot::Mutex::new(Vec::new()),
                sink: Mutex::new(None),
            }),
            cancel: CancellationToken::new(),
            reader: parking_lot::Mutex::new(None),
            closed: AtomicBool::new(false),
        }
    }

    async fn read_loop(shared: Arc<Shared>, mut stream: SocketStream, cancel: CancellationToken) {
        loop {
            let next = tokio::select! {
                biased;
                _ = cancel.cancelled() => break,
                next = stream.next() => next,
            };

            let dropped = match next {
                Some(Ok(Message::Text(text))) => {
                    shared.dispatch(text.as_str());
                    false
                }
                Some(Ok(Message::Binary(bytes))) => {
                    match std::str::from_utf8(&bytes) {
                        Ok(text) => shared.dispatch(text),
                        Err(_) => warn!("Discarding non UTF-8 notification frame"),
                    }
                    false
                }
                Some(Ok(Message::Close(frame))) => {
                    info!(?frame, "Notification socket closed by server");
                    true
                }
                Some(Ok(_)) => false,
                Some(Err(err)) => {
                    warn!(error = %err, "Notification socket error");
                    true
                }
                None => {
                    info!("Notification socket ended");
                    true
                }
            };

            if dropped {
                match shared.reconnect(&cancel).await {
                    Some(fresh) => stream = fresh,
                    None => break,
                }
            }
        }
        debug!("Notification reader stopped");
    }
}

#[async_trait]
impl NotificationSubscriber for WebSocketSubscriber {
    #[instrument(skip(self), fields(subscription = %self.shared.config.subscription))]
    async fn connect(&self) -> Result<()> {
        if self.closed.load(Ordering::SeqCst) {
            return Err(BridgeError::Connection("subscriber already closed".into()));
        }
        if self.reader.lock().is_some() {
            return Ok(());
        }

        let stream = self.shared.open().await?;
        let handle =
            tokio::spawn(Self::read_loop(Arc::clone(&self.shared), stream, self.cancel.clone()));
        *self.reader.lock() = Some(handle);
        Ok(())
    }

    fn register(&self, pattern: &str, sender: UnboundedSender<NotificationMessage>) {
        debug!(pattern, "Registering notification channel");
        self.shared
            .registrations
            .lock()
            .push(Registration { pattern: Pattern::parse(pattern), sender });
    }

    async fn acknowledge(&self, identifier: &MessageIdentifier) -> Result<()> {
        let mut sink = self.shared.sink.lock().await;
        let Some(sink) = sink.as_mut() else {
            return Err(BridgeError::Acknowledge("notification socket not connected".into()));
        };

        sink.send(Message::Text(identifier.to_string().into()))
            .await
            .map_err(|err| BridgeError::Acknowledge(format!("failed to send acknowledgement: {err}")))
    }

    async fn close(&self) {
        if self.closed.swap(true, Ordering::SeqCst) {
            return;
        }

        info!("Closing notification subscriber");
        self.cancel.cancel();

        if let Some(mut sink) = self.shared.sink.lock().await.take() {
            if let Err(err) = sink.send(Message::Close(None)).await {
                debug!(error = %err, "Close frame not delivered");
            }
            let _ = sink.close().await;
        }

        let handle = self.reader.lock().take();
        if let Some(handle) = handle {
            match tokio::time::timeout(CLOSE_TIMEOUT, handle).await {
                Ok(Ok(())) => {}
                Ok(Err(e)) => warn!("Notification reader panicked: {}", e),
                Err(_) => warn!("Notification reader did not stop within timeout"),
            }
        }
    }
}

impl Drop for WebSocketSubscriber {
    fn drop(&mut self) {
        if !self.cancel.is_cancelled() {
            self.cancel.cancel();
        }
    }
}
