//! Messages received from the platform notification stream

use std::borrow::Cow;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Opaque acknowledgement token of one notification.
///
/// It is never parsed; it is handed back verbatim when acknowledging.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MessageIdentifier(String);

impl MessageIdentifier {
    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for MessageIdentifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// One inbound notification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotificationMessage {
    pub identifier: MessageIdentifier,
    /// Source description, e.g. `/t123/events/456`.
    pub source: String,
    /// Platform action such as `CREATE` or `UPDATE`.
    pub action: String,
    pub payload: Vec<u8>,
}

impl NotificationMessage {
    pub fn new(identifier: impl Into<String>, payload: impl Into<Vec<u8>>) -> Self {
        Self {
            identifier: MessageIdentifier::new(identifier),
            source: String::new(),
            action: String::new(),
            payload: payload.into(),
        }
    }

    pub fn with_source(mut self, source: impl Into<String>, action: impl Into<String>) -> Self {
        self.source = source.into();
        self.action = action.into();
        self
    }

    /// Lossy text view of the payload for logging.
    pub fn payload_text(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(&self.payload)
    }
}
