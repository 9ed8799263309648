//! Platform resources the bridge reads or creates

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::constants::{SAMPLE_EVENT_TEXT, SAMPLE_EVENT_TYPE};

/// Tenant-scoped key/value setting.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TenantOption {
    pub category: String,
    pub key: String,
    pub value: String,
}

/// Reference to a managed object.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceRef {
    pub id: String,
}

/// Event created on a device.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlatformEvent {
    #[serde(rename = "type")]
    pub event_type: String,
    pub text: String,
    pub source: SourceRef,
    pub time: DateTime<Utc>,
}

impl PlatformEvent {
    /// Demo event used to put traffic on the notification stream.
    pub fn sample(device_id: impl Into<String>, time: DateTime<Utc>) -> Self {
        Self {
            event_type: SAMPLE_EVENT_TYPE.to_string(),
            text: SAMPLE_EVENT_TEXT.to_string(),
            source: SourceRef { id: device_id.into() },
            time,
        }
    }
}

/// Parameters of a notification token request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationTokenRequest {
    pub subscriber: String,
    pub subscription: String,
    pub expires_in_minutes: u32,
    pub shared: bool,
}
