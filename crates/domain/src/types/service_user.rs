//! Tenant-scoped service-user credentials

use serde::{Deserialize, Serialize};

/// Composite lookup key of a service user.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ServiceUserKey {
    pub tenant: String,
    pub username: String,
}

impl ServiceUserKey {
    pub fn new(tenant: impl Into<String>, username: impl Into<String>) -> Self {
        Self { tenant: tenant.into(), username: username.into() }
    }
}

/// Technical credential issued by the platform for one tenant.
///
/// Secrets are rotated out-of-band, so holders should look them up again
/// instead of caching the value.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceUser {
    pub tenant: String,
    pub username: String,
    pub secret: String,
}

impl ServiceUser {
    pub fn new(
        tenant: impl Into<String>,
        username: impl Into<String>,
        secret: impl Into<String>,
    ) -> Self {
        Self { tenant: tenant.into(), username: username.into(), secret: secret.into() }
    }

    pub fn key(&self) -> ServiceUserKey {
        ServiceUserKey::new(self.tenant.clone(), self.username.clone())
    }

    /// User part of a Basic-Auth header: `tenant/username`.
    pub fn qualified_name(&self) -> String {
        format!("{}/{}", self.tenant, self.username)
    }
}

impl std::fmt::Debug for ServiceUser {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServiceUser")
            .field("tenant", &self.tenant)
            .field("username", &self.username)
            .field("secret", &"<redacted>")
            .finish()
    }
}
