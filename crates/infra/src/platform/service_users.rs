//! Service-user listing with bootstrap credentials

use async_trait::async_trait;
use hubbridge_core::ServiceUserSource;
use hubbridge_domain::{BridgeError, PlatformConfig, Result, ServiceUser};
use reqwest::header::{ACCEPT, AUTHORIZATION};
use reqwest::Method;
use serde::Deserialize;
use tracing::{debug, instrument};
use url::Url;

use crate::errors::InfraError;
use crate::http::{basic_auth, HttpClient};

const SUBSCRIPTIONS_PATH: &str = "application/currentApplication/subscriptions";

#[derive(Debug, Deserialize)]
struct SubscriptionsResponse {
    #[serde(default)]
    users: Vec<SubscribedUser>,
}

#[derive(Deserialize)]
struct SubscribedUser {
    tenant: String,
    name: String,
    password: String,
}

impl std::fmt::Debug for SubscribedUser {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SubscribedUser").field("tenant", &self.tenant).field("name", &self.name).finish()
    }
}

/// Lists the service users of every tenant subscribed to this application.
///
/// Must be given a transport without a credential store, otherwise a 401
/// here would recurse into another refresh.
pub struct BootstrapServiceUsers {
    http: HttpClient,
    url: Url,
    authorization: String,
}

impl BootstrapServiceUsers {
    /// # Errors
    /// Returns `BridgeError::Config` for an unparsable base URL.
    pub fn new(http: HttpClient, platform: &PlatformConfig) -> Result<Self> {
        let mut base = platform.base_url.trim().to_string();
        if !base.ends_with('/') {
            base.push('/');
        }
        let url = Url::parse(&base)
            .and_then(|base| base.join(SUBSCRIPTIONS_PATH))
            .map_err(|err| BridgeError::from(InfraError::from(err)))?;

        Ok(Self {
            http,
            url,
            authorization: basic_auth::encode(
                &platform.bootstrap_tenant,
                &platform.bootstrap_user,
                &platform.bootstrap_password,
            ),
        })
    }
}

#[async_trait]
impl ServiceUserSource for BootstrapServiceUsers {
    #[instrument(skip(self))]
    async fn list_service_users(&self) -> Result<Vec<ServiceUser>> {
        let request = self
            .http
            .request(Method::GET, self.url.clone())
            .header(AUTHORIZATION, &self.authorization)
            .header(ACCEPT, "application/json");

        let response = self.http.send(request).await?;
        let status = response.status();
        if !status.is_success() {
            return Err(BridgeError::CredentialRefresh(format!(
                "service user listing returned status {status}"
            )));
        }

        let body: SubscriptionsResponse = response.json().await.map_err(|err| {
            BridgeError::CredentialRefresh(format!("invalid service user listing: {err}"))
        })?;
        debug!(count = body.users.len(), "Service users listed");

        Ok(body
            .users
            .into_iter()
            .map(|user| ServiceUser::new(user.tenant, user.name, user.password))
            .collect())
    }
}
