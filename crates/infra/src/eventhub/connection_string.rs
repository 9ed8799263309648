//! Event Hubs connection string parsing

use hubbridge_domain::{BridgeError, Result};

/// Parsed `Endpoint=sb://…/;SharedAccessKeyName=…;SharedAccessKey=…[;EntityPath=…]`.
#[derive(Clone, PartialEq, Eq)]
pub struct EventHubConnection {
    /// Namespace host, e.g. `myns.servicebus.windows.net`.
    pub host: String,
    pub key_name: String,
    pub key: String,
    pub entity_path: Option<String>,
}

impl EventHubConnection {
    /// # Errors
    /// Returns `BridgeError::Config` when a required part is missing.
    pub fn parse(raw: &str) -> Result<Self> {
        let mut endpoint = None;
        let mut key_name = None;
        let mut key = None;
        let mut entity_path = None;

        for part in raw.split(';').map(str::trim).filter(|p| !p.is_empty()) {
            let Some((name, value)) = part.split_once('=') else {
                return Err(BridgeError::Config(
                    "malformed connection string segment without '='".into(),
                ));
            };
            match name.trim().to_ascii_lowercase().as_str() {
                "endpoint" => endpoint = Some(value.trim().to_string()),
                "sharedaccesskeyname" => key_name = Some(value.trim().to_string()),
                "sharedaccesskey" => key = Some(value.trim().to_string()),
                "entitypath" => entity_path = Some(value.trim().to_string()).filter(|v| !v.is_empty()),
                _ => {}
            }
        }

        let endpoint = required(endpoint, "Endpoint")?;
        let host = endpoint
            .split_once("://")
            .map(|(_, rest)| rest)
            .unwrap_or(&endpoint)
            .trim_end_matches('/')
            .to_string();
        if host.is_empty() {
            return Err(BridgeError::Config("connection string Endpoint has no host".into()));
        }

        Ok(Self {
            host,
            key_name: required(key_name, "SharedAccessKeyName")?,
            key: required(key, "SharedAccessKey")?,
            entity_path,
        })
    }
}

fn required(value: Option<String>, name: &str) -> Result<String> {
    value
        .filter(|v| !v.is_empty())
        .ok_or_else(|| BridgeError::Config(format!("connection string is missing {name}")))
}

impl std::fmt::Debug for EventHubConnection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventHubConnection")
            .field("host", &self.host)
            .field("key_name", &self.key_name)
            .field("key", &"<redacted>")
            .field("entity_path", &self.entity_path)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const RAW: &str = "Endpoint=sb://myns.servicebus.windows.net/;SharedAccessKeyName=send;SharedAccessKey=abc+def=;EntityPath=telemetry";

    #[test]
    fn parses_all_parts() {
        let conn = EventHubConnection::parse(RAW).unwrap();

        assert_eq!(conn.host, "myns.servicebus.windows.net");
        assert_eq!(conn.key_name, "send");
        assert_eq!(conn.key, "abc+def=");
        assert_eq!(conn.entity_path.as_deref(), Some("telemetry"));
    }

    #[test]
    fn entity_path_is_optional() {
        let conn = EventHubConnection::parse(
            "Endpoint=sb://myns.servicebus.windows.net/;SharedAccessKeyName=send;SharedAccessKey=k",
        )
        .unwrap();
        assert!(conn.entity_path.is_none());
    }

    #[test]
    fn missing_key_is_config_error() {
        let err = EventHubConnection::parse("Endpoint=sb://myns/;SharedAccessKeyName=send").unwrap_err();
        assert!(matches!(err, BridgeError::Config(msg) if msg.contains("SharedAccessKey")));
    }

    #[test]
    fn debug_hides_key() {
        let conn = EventHubConnection::parse(RAW).unwrap();
        assert!(!format!("{conn:?}").contains("abc+def="));
    }
}
