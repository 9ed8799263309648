//! Notification frame parsing and subscription patterns

use hubbridge_domain::NotificationMessage;

/// Parse one text frame.
///
/// Layout: header lines separated by `\n`, an empty line, then the payload.
/// Header line 0 is the acknowledgement identifier, line 1 the source
/// description and line 2 the action. Returns `None` without an identifier.
pub fn parse(frame: &str) -> Option<NotificationMessage> {
    let (head, payload) = match frame.split_once("\n\n") {
        Some((head, payload)) => (head, payload),
        None => (frame, ""),
    };

    let mut lines = head.lines();
    let identifier = lines.next().filter(|id| !id.trim().is_empty())?;
    let source = lines.next().unwrap_or_default();
    let action = lines.next().unwrap_or_default();

    Some(NotificationMessage::new(identifier, payload.as_bytes().to_vec()).with_source(source, action))
}

/// Subscription pattern over source descriptions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Pattern {
    All,
    Prefix(String),
    Exact(String),
}

impl Pattern {
    /// `*` matches everything, a trailing `*` matches a prefix, anything else
    /// must match exactly.
    pub fn parse(raw: &str) -> Self {
        let raw = raw.trim();
        if raw == "*" || raw.is_empty() {
            Pattern::All
        } else if let Some(prefix) = raw.strip_suffix('*') {
            Pattern::Prefix(prefix.to_string())
        } else {
            Pattern::Exact(raw.to_string())
        }
    }

    pub fn matches(&self, source: &str) -> bool {
        match self {
            Pattern::All => true,
            Pattern::Prefix(prefix) => source.starts_with(prefix.as_str()),
            Pattern::Exact(exact) => source == exact,
        }
    }
}
