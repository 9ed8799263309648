//! Shared access signature tokens

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use chrono::{DateTime, Utc};
use hmac::{Hmac, Mac};
use hubbridge_domain::{BridgeError, Result};
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

/// Signs resource URIs with a shared access key.
#[derive(Clone)]
pub struct SasSigner {
    key_name: String,
    key: String,
}

impl SasSigner {
    pub fn new(key_name: impl Into<String>, key: impl Into<String>) -> Self {
        Self { key_name: key_name.into(), key: key.into() }
    }

    /// Token for `resource` valid until `expires_at`.
    ///
    /// `SharedAccessSignature sr=<uri>&sig=<sig>&se=<expiry>&skn=<name>` where
    /// `sig = base64(HMAC-SHA256(key, urlencode(uri) + "\n" + expiry))`.
    pub fn token(&self, resource: &str, expires_at: DateTime<Utc>) -> Result<String> {
        let encoded_resource = urlencoding::encode(resource);
        let expiry = expires_at.timestamp();
        let signature = self.sign(&format!("{encoded_resource}\n{expiry}"))?;

        Ok(format!(
            "SharedAccessSignature sr={}&sig={}&se={}&skn={}",
            encoded_resource,
            urlencoding::encode(&signature),
            expiry,
            self.key_name
        ))
    }

    fn sign(&self, message: &str) -> Result<String> {
        let mut mac = HmacSha256::new_from_slice(self.key.as_bytes())
            .map_err(|err| BridgeError::Internal(format!("invalid shared access key: {err}")))?;
        mac.update(message.as_bytes());
        Ok(STANDARD.encode(mac.finalize().into_bytes()))
    }
}

impl std::fmt::Debug for SasSigner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SasSigner").field("key_name", &self.key_name).finish_non_exhaustive()
    }
}
