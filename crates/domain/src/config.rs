//! Process configuration
//!
//! Only values the process needs before it can talk to the platform live
//! here. Broker parameters are tenant options and are resolved at runtime.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::constants::{
    DEFAULT_CONSUMER, DEFAULT_HTTP_TIMEOUT_SECS, DEFAULT_MAX_RETRIES, DEFAULT_RETRY_BASE_MS,
    DEFAULT_RETRY_MAX_DELAY_MS, DEFAULT_SAMPLE_INTERVAL_SECS, DEFAULT_SERVER_PORT,
    DEFAULT_SUBSCRIPTION, DEFAULT_TOKEN_EXPIRY_MINUTES,
};

/// Root configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Config {
    pub platform: PlatformConfig,
    #[serde(default)]
    pub notification: NotificationConfig,
    #[serde(default)]
    pub transport: TransportConfig,
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub sample: SampleConfig,
}

/// Platform endpoint and bootstrap credentials
#[derive(Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PlatformConfig {
    pub base_url: String,
    pub bootstrap_tenant: String,
    pub bootstrap_user: String,
    pub bootstrap_password: String,
    /// Tenant the bridge works for; defaults to the bootstrap tenant.
    #[serde(default)]
    pub tenant: Option<String>,
}

impl PlatformConfig {
    /// The tenant whose service user performs platform calls.
    pub fn effective_tenant(&self) -> &str {
        self.tenant.as_deref().unwrap_or(&self.bootstrap_tenant)
    }
}

impl std::fmt::Debug for PlatformConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PlatformConfig")
            .field("base_url", &self.base_url)
            .field("bootstrap_tenant", &self.bootstrap_tenant)
            .field("bootstrap_user", &self.bootstrap_user)
            .field("bootstrap_password", &"<redacted>")
            .field("tenant", &self.tenant)
            .finish()
    }
}

/// Notification subscription settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct NotificationConfig {
    pub consumer: String,
    pub subscription: String,
    pub token_expiry_minutes: u32,
    pub shared: bool,
    /// Explicit websocket endpoint, otherwise derived from the base URL.
    pub websocket_url: Option<String>,
}

impl Default for NotificationConfig {
    fn default() -> Self {
        Self {
            consumer: DEFAULT_CONSUMER.to_string(),
            subscription: DEFAULT_SUBSCRIPTION.to_string(),
            token_expiry_minutes: DEFAULT_TOKEN_EXPIRY_MINUTES,
            shared: false,
            websocket_url: None,
        }
    }
}

/// Retry and timeout settings for outbound HTTP
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct TransportConfig {
    /// Retries after the first attempt.
    pub max_retries: u32,
    pub retry_base_ms: u64,
    pub retry_max_delay_ms: u64,
    pub timeout_secs: u64,
}

impl TransportConfig {
    pub fn base_backoff(&self) -> Duration {
        Duration::from_millis(self.retry_base_ms)
    }

    pub fn max_backoff(&self) -> Duration {
        Duration::from_millis(self.retry_max_delay_ms)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            max_retries: DEFAULT_MAX_RETRIES,
            retry_base_ms: DEFAULT_RETRY_BASE_MS,
            retry_max_delay_ms: DEFAULT_RETRY_MAX_DELAY_MS,
            timeout_secs: DEFAULT_HTTP_TIMEOUT_SECS,
        }
    }
}

/// Health server settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self { host: "0.0.0.0".to_string(), port: DEFAULT_SERVER_PORT }
    }
}

/// Sample-event producer settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct SampleConfig {
    pub enabled: bool,
    pub interval_seconds: u64,
}

impl SampleConfig {
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_seconds.max(1))
    }
}

impl Default for SampleConfig {
    fn default() -> Self {
        Self { enabled: true, interval_seconds: DEFAULT_SAMPLE_INTERVAL_SECS }
    }
}
