//! Conversions from external infrastructure errors into domain errors.

use hubbridge_domain::BridgeError;
use reqwest::Error as HttpError;
use serde_json::Error as JsonError;
use tokio_tungstenite::tungstenite::Error as WsError;
use url::ParseError as UrlError;

/// Error newtype that keeps conversions on the infrastructure side and can be
/// converted back into the domain error.
#[derive(Debug)]
pub struct InfraError(pub BridgeError);

impl From<InfraError> for BridgeError {
    fn from(value: InfraError) -> Self {
        value.0
    }
}

impl From<BridgeError> for InfraError {
    fn from(value: BridgeError) -> Self {
        InfraError(value)
    }
}

/// Extension trait to make the conversion logic explicit in tests and within
/// this module.
trait IntoBridgeError {
    fn into_bridge(self) -> BridgeError;
}

/* -------------------------------------------------------------------------- */
/* reqwest::Error → BridgeError */
/* -------------------------------------------------------------------------- */

impl IntoBridgeError for HttpError {
    fn into_bridge(self) -> BridgeError {
        if self.is_timeout() {
            return BridgeError::Network("HTTP request timed out".into());
        }

        if self.is_connect() {
            return BridgeError::Network("HTTP connection failure".into());
        }

        if self.is_builder() {
            return BridgeError::InvalidInput(format!("invalid HTTP request: {self}"));
        }

        if self.is_decode() {
            return BridgeError::Platform(format!("undecodable HTTP response: {self}"));
        }

        if let Some(status) = self.status() {
            let code = status.as_u16();
            let message =
                format!("HTTP {} {}", code, status.canonical_reason().unwrap_or("unknown status"));

            return match code {
                401 | 403 => BridgeError::Auth(message),
                404 => BridgeError::NotFound(message),
                429 => BridgeError::Network(message),
                400..=499 => BridgeError::InvalidInput(message),
                _ => BridgeError::Network(message),
            };
        }

        BridgeError::Network(self.to_string())
    }
}

impl From<HttpError> for InfraError {
    fn from(value: HttpError) -> Self {
        InfraError(value.into_bridge())
    }
}

/* -------------------------------------------------------------------------- */
/* tungstenite::Error → BridgeError */
/* -------------------------------------------------------------------------- */

impl IntoBridgeError for WsError {
    fn into_bridge(self) -> BridgeError {
        match self {
            WsError::ConnectionClosed | WsError::AlreadyClosed => {
                BridgeError::Connection("notification socket closed".into())
            }
            WsError::Http(response) => {
                let status = response.status().as_u16();
                match status {
                    401 | 403 => BridgeError::Auth(format!("notification socket rejected: HTTP {status}")),
                    _ => BridgeError::Connection(format!("notification socket handshake failed: HTTP {status}")),
                }
            }
            WsError::Url(err) => BridgeError::Config(format!("invalid notification URL: {err}")),
            other => BridgeError::Connection(other.to_string()),
        }
    }
}

impl From<WsError> for InfraError {
    fn from(value: WsError) -> Self {
        InfraError(value.into_bridge())
    }
}

/* -------------------------------------------------------------------------- */
/* serde_json / url → BridgeError */
/* -------------------------------------------------------------------------- */

impl From<JsonError> for InfraError {
    fn from(value: JsonError) -> Self {
        InfraError(BridgeError::Platform(format!("invalid JSON: {value}")))
    }
}

impl From<UrlError> for InfraError {
    fn from(value: UrlError) -> Self {
        InfraError(BridgeError::Config(format!("invalid URL: {value}")))
    }
}

/* -------------------------------------------------------------------------- */
/* Tests */
/* -------------------------------------------------------------------------- */
