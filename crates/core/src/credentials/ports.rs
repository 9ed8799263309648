//! Port interfaces for credential listing

use async_trait::async_trait;
use hubbridge_domain::{Result, ServiceUser};

/// Upstream listing of the service users subscribed to this application.
#[async_trait]
pub trait ServiceUserSource: Send + Sync {
    /// Fetch the complete current set of service users.
    async fn list_service_users(&self) -> Result<Vec<ServiceUser>>;
}
