//! Application constants
//!
//! Tenant option keys, notification defaults and broker limits shared by
//! every layer.

// Tenant options holding the connector settings
pub const OPTION_CATEGORY: &str = "az-eventhub-connector";
pub const OPTION_API_TOKEN: &str = "c8y-token";
pub const OPTION_DEVICE_ID: &str = "c8y-device-id";
pub const OPTION_EVENTHUB_CONNECTION_STRING: &str = "eventhub-connection-string";
pub const OPTION_EVENTHUB_NAME: &str = "eventhub-name";

// Notification subscription defaults
pub const DEFAULT_CONSUMER: &str = "eventHubConsumer";
pub const DEFAULT_SUBSCRIPTION: &str = "AzEventHubHandler";
pub const DEFAULT_TOKEN_EXPIRY_MINUTES: u32 = 1440;
pub const SUBSCRIBE_ALL_PATTERN: &str = "*";

// Transport defaults
pub const DEFAULT_MAX_RETRIES: u32 = 2;
pub const DEFAULT_RETRY_BASE_MS: u64 = 1_000;
pub const DEFAULT_RETRY_MAX_DELAY_MS: u64 = 30_000;
pub const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 30;

// Broker limits
pub const MAX_BATCH_SIZE_BYTES: usize = 1_048_576;
/// Approximate JSON envelope cost of one batch entry.
pub const BATCH_ENTRY_OVERHEAD_BYTES: usize = 16;

// Sample data
pub const SAMPLE_EVENT_TYPE: &str = "eventHubDemo";
pub const SAMPLE_EVENT_TEXT: &str = "Sample Event for showcasing Event Hub integration";
pub const DEFAULT_SAMPLE_INTERVAL_SECS: u64 = 5;

pub const DEFAULT_SERVER_PORT: u16 = 80;
