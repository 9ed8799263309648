//! Broker-side batch container

use crate::constants::{BATCH_ENTRY_OVERHEAD_BYTES, MAX_BATCH_SIZE_BYTES};
use crate::errors::{BridgeError, Result};

/// One serialized payload inside a batch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventData {
    pub body: Vec<u8>,
}

impl EventData {
    pub fn new(body: impl Into<Vec<u8>>) -> Self {
        Self { body: body.into() }
    }

    fn encoded_size(&self) -> usize {
        self.body.len() + BATCH_ENTRY_OVERHEAD_BYTES
    }
}

/// A group of payloads submitted to the broker in one call.
///
/// Built fresh for every submission; adding refuses entries that would push
/// the batch over its byte limit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ForwardBatch {
    events: Vec<EventData>,
    size_bytes: usize,
    max_size_bytes: usize,
}

impl ForwardBatch {
    pub fn new() -> Self {
        Self::with_max_size(MAX_BATCH_SIZE_BYTES)
    }

    pub fn with_max_size(max_size_bytes: usize) -> Self {
        Self { events: Vec::new(), size_bytes: 0, max_size_bytes }
    }

    /// Add a payload.
    ///
    /// # Errors
    /// Returns `BridgeError::Broker` when the payload does not fit.
    pub fn try_add(&mut self, event: EventData) -> Result<()> {
        let needed = event.encoded_size();
        if self.size_bytes + needed > self.max_size_bytes {
            return Err(BridgeError::Broker(format!(
                "event of {} bytes does not fit into batch ({} of {} bytes used)",
                event.body.len(),
                self.size_bytes,
                self.max_size_bytes
            )));
        }

        self.size_bytes += needed;
        self.events.push(event);
        Ok(())
    }

    pub fn events(&self) -> &[EventData] {
        &self.events
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn size_bytes(&self) -> usize {
        self.size_bytes
    }

    pub fn max_size_bytes(&self) -> usize {
        self.max_size_bytes
    }
}

impl Default for ForwardBatch {
    fn default() -> Self {
        Self::new()
    }
}
