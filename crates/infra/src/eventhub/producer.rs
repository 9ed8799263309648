//! Event Hubs batch producer

use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use chrono::{Duration as ChronoDuration, Utc};
use hubbridge_core::EventProducer;
use hubbridge_domain::constants::{
    OPTION_CATEGORY, OPTION_EVENTHUB_CONNECTION_STRING, OPTION_EVENTHUB_NAME,
};
use hubbridge_domain::{BridgeError, EventData, ForwardBatch, Result};
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE};
use reqwest::Method;
use serde::Serialize;
use tracing::{debug, info, instrument};

use super::connection_string::EventHubConnection;
use super::sas::SasSigner;
use crate::http::HttpClient;
use crate::platform::PlatformClient;

const BATCH_CONTENT_TYPE: &str = "application/vnd.microsoft.servicebus.json";
const TOKEN_LIFETIME_SECS: i64 = 3600;

#[derive(Debug, Serialize)]
struct BatchEntry {
    #[serde(rename = "Body")]
    body: String,
}

impl BatchEntry {
    /// UTF-8 payloads travel as text, anything else base64 encoded.
    fn from_event(event: &EventData) -> Self {
        let body = match std::str::from_utf8(&event.body) {
            Ok(text) => text.to_string(),
            Err(_) => STANDARD.encode(&event.body),
        };
        Self { body }
    }
}

/// Sends batches to one event hub.
pub struct EventHubProducer {
    http: HttpClient,
    signer: SasSigner,
    resource_uri: String,
    messages_url: String,
    hub_name: String,
    closed: AtomicBool,
}

impl EventHubProducer {
    /// Producer for `hub_name`, falling back to the connection's entity path.
    ///
    /// # Errors
    /// Returns `BridgeError::Config` when no hub name is available.
    pub fn new(
        http: HttpClient,
        connection: EventHubConnection,
        hub_name: Option<String>,
    ) -> Result<Self> {
        let hub_name = hub_name
            .filter(|name| !name.trim().is_empty())
            .or_else(|| connection.entity_path.clone())
            .ok_or_else(|| BridgeError::Config("event hub name is not configured".into()))?;

        let resource_uri = format!("https://{}/{}", connection.host, hub_name);
        Ok(Self {
            http,
            signer: SasSigner::new(connection.key_name, connection.key),
            messages_url: format!("{resource_uri}/messages"),
            resource_uri,
            hub_name,
            closed: AtomicBool::new(false),
        })
    }

    /// Build from the connection string and hub name tenant options.
    ///
    /// # Errors
    /// `BridgeError::NotFound` when the connection string option is missing,
    /// `BridgeError::Config` when it is malformed.
    pub async fn from_tenant_options(http: HttpClient, platform: &PlatformClient) -> Result<Self> {
        let raw = platform
            .get_tenant_option(OPTION_CATEGORY, OPTION_EVENTHUB_CONNECTION_STRING)
            .await?
            .value;
        let hub_name = platform.find_tenant_option(OPTION_CATEGORY, OPTION_EVENTHUB_NAME).await?;
        let connection = EventHubConnection::parse(&raw)?;

        let producer = Self::new(http, connection, hub_name)?;
        info!(hub = %producer.hub_name, "Event hub producer created");
        Ok(producer)
    }

    /// Send to `url` instead of the namespace host. The signature still
    /// covers the namespace resource.
    pub fn with_messages_url(mut self, url: impl Into<String>) -> Self {
        self.messages_url = url.into();
        self
    }

    pub fn hub_name(&self) -> &str {
        &self.hub_name
    }
}

#[async_trait]
impl EventProducer for EventHubProducer {
    async fn new_batch(&self) -> Result<ForwardBatch> {
        if self.closed.load(Ordering::SeqCst) {
            return Err(BridgeError::Broker("producer is closed".into()));
        }
        Ok(ForwardBatch::new())
    }

    #[instrument(skip(self, batch), fields(hub = %self.hub_name, events = batch.len()))]
    async fn submit(&self, batch: ForwardBatch) -> Result<()> {
        if self.closed.load(Ordering::SeqCst) {
            return Err(BridgeError::Broker("producer is closed".into()));
        }
        if batch.is_empty() {
            debug!("Empty batch, nothing to send");
            return Ok(());
        }

        let entries: Vec<BatchEntry> = batch.events().iter().map(BatchEntry::from_event).collect();
        let body = serde_json::to_vec(&entries)
            .map_err(|err| BridgeError::Broker(format!("failed to encode batch: {err}")))?;
        let token = self
            .signer
            .token(&self.resource_uri, Utc::now() + ChronoDuration::seconds(TOKEN_LIFETIME_SECS))?;

        let request = self
            .http
            .request(Method::POST, &self.messages_url)
            .header(AUTHORIZATION, token)
            .header(CONTENT_TYPE, BATCH_CONTENT_TYPE)
            .body(body);

        let response = self
            .http
            .send(request)
            .await
            .map_err(|err| BridgeError::Broker(format!("event hub submission failed: {err}")))?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(BridgeError::Broker(format!(
                "event hub rejected batch with status {status}: {text}"
            )));
        }

        debug!(%status, bytes = batch.size_bytes(), "Batch submitted");
        Ok(())
    }

    async fn close(&self) {
        if !self.closed.swap(true, Ordering::SeqCst) {
            info!(hub = %self.hub_name, "Event hub producer closed");
        }
    }
}
