//! Sample event scheduler
//!
//! Periodically creates demo events on a device so that the notification
//! subscription has traffic to forward.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use hubbridge_domain::constants::{OPTION_CATEGORY, OPTION_DEVICE_ID};
use hubbridge_domain::{PlatformEvent, Result as DomainResult, SampleConfig};
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument, warn};

use super::error::{SchedulerError, SchedulerResult};
use crate::platform::PlatformClient;

/// Type alias for task handle to avoid complexity warnings
type TaskHandle = Arc<Mutex<Option<JoinHandle<()>>>>;

/// Configuration for the sample event scheduler
#[derive(Debug, Clone)]
pub struct SampleSchedulerConfig {
    /// Device the events are created on
    pub device_id: String,
    /// Time between events
    pub interval: Duration,
    /// How long `stop` waits for the task
    pub join_timeout: Duration,
}

impl SampleSchedulerConfig {
    pub fn new(device_id: impl Into<String>, sample: &SampleConfig) -> Self {
        Self { device_id: device_id.into(), interval: sample.interval(), join_timeout: Duration::from_secs(5) }
    }
}

/// Sample event scheduler
pub struct SampleEventScheduler {
    platform: Arc<PlatformClient>,
    config: SampleSchedulerConfig,
    cancellation_token: CancellationToken,
    task_handle: TaskHandle,
}

impl SampleEventScheduler {
    pub fn new(platform: Arc<PlatformClient>, config: SampleSchedulerConfig) -> Self {
        Self {
            platform,
            config,
            cancellation_token: CancellationToken::new(),
            task_handle: Arc::new(Mutex::new(None)),
        }
    }

    /// Build a scheduler for the device named by the `c8y-device-id` option.
    ///
    /// Returns `Ok(None)` when the option is not set.
    pub async fn from_tenant_options(
        platform: Arc<PlatformClient>,
        sample: &SampleConfig,
    ) -> DomainResult<Option<Self>> {
        match platform.find_tenant_option(OPTION_CATEGORY, OPTION_DEVICE_ID).await? {
            Some(device_id) => {
                let config = SampleSchedulerConfig::new(device_id, sample);
                Ok(Some(Self::new(platform, config)))
            }
            None => {
                warn!(
                    option = OPTION_DEVICE_ID,
                    "No device id configured, sample events will not be created"
                );
                Ok(None)
            }
        }
    }

    /// Start the scheduler
    ///
    /// Spawns a background task that creates one event right away and then
    /// one per interval.
    ///
    /// # Errors
    ///
    /// Returns error if scheduler is already running
    #[instrument(skip(self), fields(device_id = %self.config.device_id))]
    pub async fn start(&mut self) -> SchedulerResult<()> {
        if self.is_running().await {
            return Err(SchedulerError::AlreadyRunning);
        }

        info!(interval_secs = self.config.interval.as_secs(), "Starting sample event scheduler");

        // Create a new cancellation token (supports restart after stop)
        self.cancellation_token = CancellationToken::new();

        let platform = Arc::clone(&self.platform);
        let device_id = self.config.device_id.clone();
        let interval = self.config.interval;
        let cancel = self.cancellation_token.clone();

        let handle = tokio::spawn(async move {
            Self::event_loop(platform, device_id, interval, cancel).await;
        });

        *self.task_handle.lock().await = Some(handle);

        Ok(())
    }

    /// Stop the scheduler gracefully
    ///
    /// Cancels the background task and awaits completion.
    ///
    /// # Errors
    ///
    /// Returns error if scheduler is not running or the task does not finish
    #[instrument(skip(self))]
    pub async fn stop(&mut self) -> SchedulerResult<()> {
        if !self.is_running().await {
            return Err(SchedulerError::NotRunning);
        }

        info!("Stopping sample event scheduler");
        self.cancellation_token.cancel();

        if let Some(handle) = self.task_handle.lock().await.take() {
            match tokio::time::timeout(self.config.join_timeout, handle).await {
                Ok(Ok(())) => {}
                Ok(Err(e)) => {
                    warn!("Scheduler task panicked: {}", e);
                    return Err(SchedulerError::TaskJoinFailed(e.to_string()));
                }
                Err(_) => {
                    warn!("Scheduler task did not complete within timeout");
                    return Err(SchedulerError::Timeout {
                        seconds: self.config.join_timeout.as_secs(),
                    });
                }
            }
        }

        info!("Sample event scheduler stopped");
        Ok(())
    }

    /// Check if scheduler is running
    ///
    /// A scheduler is considered running if it has an active task handle.
    pub async fn is_running(&self) -> bool {
        self.task_handle.lock().await.is_some()
    }

    async fn event_loop(
        platform: Arc<PlatformClient>,
        device_id: String,
        interval: Duration,
        cancel: CancellationToken,
    ) {
        // First tick completes immediately; a zero period would panic
        let mut ticker = tokio::time::interval(interval.max(Duration::from_millis(1)));
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = cancel.cancelled() => {
                    debug!("Sample event loop cancelled");
                    break;
                }
                _ = ticker.tick() => {
                    let event = PlatformEvent::sample(device_id.clone(), Utc::now());
                    match platform.create_event(&event).await {
                        Ok(()) => debug!(%device_id, "Sample event created"),
                        Err(err) => warn!(%device_id, error = %err, "Failed to create sample event"),
                    }
                }
            }
        }
    }
}

/// Ensure scheduler is stopped when dropped
impl Drop for SampleEventScheduler {
    fn drop(&mut self) {
        if !self.cancellation_token.is_cancelled() {
            self.cancellation_token.cancel();
        }
    }
}
