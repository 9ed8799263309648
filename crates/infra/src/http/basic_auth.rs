//! Basic-Auth header encoding for tenant-qualified users

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;

/// Credentials carried in an `Authorization: Basic` header whose user part is
/// `tenant/username`.
#[derive(Clone, PartialEq, Eq)]
pub struct BasicCredentials {
    pub tenant: String,
    pub username: String,
    pub secret: String,
}

impl std::fmt::Debug for BasicCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BasicCredentials")
            .field("tenant", &self.tenant)
            .field("username", &self.username)
            .finish_non_exhaustive()
    }
}

/// Header value for `tenant/username:secret`.
pub fn encode(tenant: &str, username: &str, secret: &str) -> String {
    format!("Basic {}", STANDARD.encode(format!("{tenant}/{username}:{secret}")))
}

/// Parse a header value. Returns `None` for other schemes and for users
/// without a tenant prefix.
pub fn parse(header: &str) -> Option<BasicCredentials> {
    let (scheme, encoded) = header.trim().split_once(' ')?;
    if !scheme.eq_ignore_ascii_case("basic") {
        return None;
    }

    let decoded = STANDARD.decode(encoded.trim()).ok()?;
    let decoded = String::from_utf8(decoded).ok()?;
    let (user, secret) = decoded.split_once(':')?;
    let (tenant, username) = user.split_once('/')?;

    if tenant.is_empty() || username.is_empty() {
        return None;
    }

    Some(BasicCredentials {
        tenant: tenant.to_string(),
        username: username.to_string(),
        secret: secret.to_string(),
    })
}
