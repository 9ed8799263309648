//! Application context - dependency injection container
//!
//! Builds every collaborator in startup order and owns them until shutdown.

use std::net::SocketAddr;
use std::sync::Arc;

use hubbridge_core::{
    CredentialStore, EventProducer, ForwardingLoop, ForwardingStats, NotificationSubscriber,
    ServiceUserSource,
};
use hubbridge_domain::constants::{OPTION_API_TOKEN, OPTION_CATEGORY, SUBSCRIBE_ALL_PATTERN};
use hubbridge_domain::{Config, NotificationMessage, Result};
use hubbridge_infra::{
    BootstrapServiceUsers, EventHubProducer, HttpClientBuilder, PlatformClient, SampleEventScheduler,
    WebSocketSubscriber,
};
use tokio::sync::mpsc::{self, UnboundedReceiver};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::server::HealthServer;

/// Application context - holds all services and dependencies
pub struct AppContext {
    pub config: Config,
    pub credentials: Arc<CredentialStore>,
    pub platform: Arc<PlatformClient>,
    pub producer: Option<Arc<EventHubProducer>>,
    pub subscriber: Arc<WebSocketSubscriber>,
    scheduler: Option<SampleEventScheduler>,
    health: HealthServer,
    messages: UnboundedReceiver<NotificationMessage>,
}

impl AppContext {
    /// Bootstrap the bridge.
    ///
    /// Credential and broker problems only degrade the bridge. Failing to
    /// connect the notification subscriber aborts startup.
    pub async fn new(config: Config) -> Result<Self> {
        info!(base_url = %config.platform.base_url, tenant = config.platform.effective_tenant(), "Starting bridge");

        // Plain transport: bootstrap listing and broker, never refreshes credentials
        let plain = HttpClientBuilder::from_config(&config.transport).build()?;
        let source: Arc<dyn ServiceUserSource> =
            Arc::new(BootstrapServiceUsers::new(plain.clone(), &config.platform)?);
        let credentials = Arc::new(CredentialStore::new(source));
        match credentials.refresh().await {
            Ok(count) => info!(count, "Service users loaded"),
            Err(err) => error!(error = %err, "Initial service user refresh failed, continuing degraded"),
        }

        let platform_http = HttpClientBuilder::from_config(&config.transport)
            .credential_store(Arc::clone(&credentials))
            .build()?;
        let platform = Arc::new(PlatformClient::new(
            platform_http,
            &config.platform.base_url,
            config.platform.effective_tenant(),
            Arc::clone(&credentials),
        )?);

        match platform.find_tenant_option(OPTION_CATEGORY, OPTION_API_TOKEN).await {
            Ok(Some(token)) => platform.set_api_token(token),
            Ok(None) => debug!(option = OPTION_API_TOKEN, "No API token option, using service user"),
            Err(err) => warn!(error = %err, "Failed to read API token option, using service user"),
        }

        let producer = match EventHubProducer::from_tenant_options(plain, &platform).await {
            Ok(producer) => Some(Arc::new(producer)),
            Err(err) => {
                error!(error = %err, label = err.label(), "Event hub producer unavailable, messages will not be forwarded");
                None
            }
        };

        let health = HealthServer::start(&config.server).await?;
        let scheduler = start_scheduler(&config, &platform).await;

        let subscriber = Arc::new(WebSocketSubscriber::new(
            Arc::clone(&platform),
            config.notification.clone(),
        ));
        let (sender, messages) = mpsc::unbounded_channel();
        subscriber.register(SUBSCRIBE_ALL_PATTERN, sender);

        if let Err(err) = subscriber.connect().await {
            error!(error = %err, "Notification subscriber failed to connect");
            if let Some(mut scheduler) = scheduler {
                if let Err(stop_err) = scheduler.stop().await {
                    warn!(error = %stop_err, "Sample event scheduler did not stop cleanly");
                }
            }
            if let Err(shutdown_err) = health.shutdown().await {
                warn!(error = %shutdown_err, "Health server did not shut down cleanly");
            }
            return Err(err);
        }

        Ok(Self { config, credentials, platform, producer, subscriber, scheduler, health, messages })
    }

    pub fn health_addr(&self) -> SocketAddr {
        self.health.local_addr()
    }

    /// Whether messages are forwarded or only logged.
    pub fn is_forwarding(&self) -> bool {
        self.producer.is_some()
    }

    pub fn has_scheduler(&self) -> bool {
        self.scheduler.is_some()
    }

    /// Forward until `cancel` fires, then stop the background services.
    pub async fn run(self, cancel: CancellationToken) -> Result<ForwardingStats> {
        let Self { subscriber, producer, scheduler, health, messages, .. } = self;

        let subscriber: Arc<dyn NotificationSubscriber> = subscriber;
        let producer = producer.map(|producer| producer as Arc<dyn EventProducer>);
        let stats = ForwardingLoop::new(subscriber, producer).run(messages, cancel).await;

        if let Some(mut scheduler) = scheduler {
            if let Err(err) = scheduler.stop().await {
                warn!(error = %err, "Sample event scheduler did not stop cleanly");
            }
        }
        health.shutdown().await?;

        info!(
            received = stats.received,
            forwarded = stats.forwarded,
            failed = stats.failed,
            skipped = stats.skipped,
            ack_failures = stats.ack_failures,
            "Bridge stopped"
        );
        Ok(stats)
    }
}

async fn start_scheduler(
    config: &Config,
    platform: &Arc<PlatformClient>,
) -> Option<SampleEventScheduler> {
    if !config.sample.enabled {
        info!("Sample events disabled");
        return None;
    }

    let mut scheduler =
        match SampleEventScheduler::from_tenant_options(Arc::clone(platform), &config.sample).await {
            Ok(Some(scheduler)) => scheduler,
            Ok(None) => return None,
            Err(err) => {
                warn!(error = %err, "Failed to read device option, sample events disabled");
                return None;
            }
        };

    match scheduler.start().await {
        Ok(()) => Some(scheduler),
        Err(err) => {
            warn!(error = %err, "Failed to start sample event scheduler");
            None
        }
    }
}
