//! Platform REST client
//!
//! Reads tenant options, creates events and issues notification tokens. All
//! calls go through the credential-aware [`HttpClient`].

use std::sync::Arc;

use hubbridge_core::CredentialStore;
use hubbridge_domain::{
    BridgeError, NotificationTokenRequest, PlatformEvent, Result, TenantOption,
};
use parking_lot::RwLock;
use reqwest::header::{ACCEPT, AUTHORIZATION};
use reqwest::{Method, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use tracing::{debug, info, instrument, warn};
use url::Url;

use crate::errors::InfraError;
use crate::http::{basic_auth, HttpClient};

#[derive(Debug, Deserialize)]
struct TokenResponse {
    token: String,
}

/// Client for the tenant-scoped platform REST API.
pub struct PlatformClient {
    http: HttpClient,
    base_url: Url,
    tenant: String,
    credentials: Arc<CredentialStore>,
    api_token: RwLock<Option<String>>,
}

impl PlatformClient {
    /// Create a client acting for `tenant`.
    ///
    /// # Errors
    /// Returns `BridgeError::Config` for an unparsable base URL.
    pub fn new(
        http: HttpClient,
        base_url: &str,
        tenant: impl Into<String>,
        credentials: Arc<CredentialStore>,
    ) -> Result<Self> {
        let base_url = parse_base_url(base_url)?;
        Ok(Self {
            http,
            base_url,
            tenant: tenant.into(),
            credentials,
            api_token: RwLock::new(None),
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    pub fn tenant(&self) -> &str {
        &self.tenant
    }

    /// Use bearer authentication from now on instead of the service user.
    pub fn set_api_token(&self, token: impl Into<String>) {
        *self.api_token.write() = Some(token.into());
        info!("Platform API token configured, using bearer authentication");
    }

    /// Read one tenant option.
    ///
    /// # Errors
    /// `BridgeError::NotFound` when the option does not exist.
    #[instrument(skip(self))]
    pub async fn get_tenant_option(&self, category: &str, key: &str) -> Result<TenantOption> {
        let url = self.endpoint(&format!(
            "tenant/options/{}/{}",
            urlencoding::encode(category),
            urlencoding::encode(key)
        ))?;
        let response = self.send(Method::GET, url.clone(), |req| req).await?;
        let option: TenantOption = Self::json(response, &url).await?;
        debug!(category, key, "Tenant option resolved");
        Ok(option)
    }

    /// Value of an option, `None` when it does not exist.
    pub async fn find_tenant_option(&self, category: &str, key: &str) -> Result<Option<String>> {
        match self.get_tenant_option(category, key).await {
            Ok(option) => Ok(Some(option.value)),
            Err(BridgeError::NotFound(_)) => Ok(None),
            Err(err) => Err(err),
        }
    }

    /// Create an event on a device.
    #[instrument(skip(self, event), fields(source = %event.source.id))]
    pub async fn create_event(&self, event: &PlatformEvent) -> Result<()> {
        let url = self.endpoint("event/events")?;
        let response = self.send(Method::POST, url.clone(), |req| req.json(event)).await?;
        Self::ensure_success(response, &url).await?;
        debug!(event_type = %event.event_type, "Event created");
        Ok(())
    }

    /// Issue a token for the notification consumer endpoint.
    #[instrument(skip(self, request), fields(subscription = %request.subscription))]
    pub async fn create_notification_token(
        &self,
        request: &NotificationTokenRequest,
    ) -> Result<String> {
        let url = self.endpoint("notification2/token")?;
        let response = self.send(Method::POST, url.clone(), |req| req.json(request)).await?;
        let body: TokenResponse = Self::json(response, &url).await?;
        debug!(subscriber = %request.subscriber, "Notification token issued");
        Ok(body.token)
    }

    fn endpoint(&self, path: &str) -> Result<Url> {
        self.base_url.join(path).map_err(|err| BridgeError::from(InfraError::from(err)))
    }

    async fn send<F>(&self, method: Method, url: Url, build: F) -> Result<Response>
    where
        F: FnOnce(RequestBuilder) -> RequestBuilder,
    {
        let request =
            self.authorize(self.http.request(method, url)).await?.header(ACCEPT, "application/json");
        self.http.send(build(request)).await
    }

    /// Bearer token if set, otherwise the tenant's service user. An empty
    /// slot for the tenant triggers one store refresh before giving up.
    async fn authorize(&self, request: RequestBuilder) -> Result<RequestBuilder> {
        let token = self.api_token.read().clone();
        if let Some(token) = token {
            return Ok(request.bearer_auth(token));
        }

        let user = match self.credentials.for_tenant(&self.tenant) {
            Some(user) => Some(user),
            None => {
                debug!(tenant = %self.tenant, "No service user held, refreshing credentials");
                if let Err(err) = self.credentials.refresh().await {
                    warn!(tenant = %self.tenant, error = %err, "Service user refresh failed");
                }
                self.credentials.for_tenant(&self.tenant)
            }
        };
        let user = user.ok_or_else(|| {
            BridgeError::Auth(format!("no service user available for tenant {}", self.tenant))
        })?;
        Ok(request.header(
            AUTHORIZATION,
            basic_auth::encode(&user.tenant, &user.username, &user.secret),
        ))
    }

    async fn ensure_success(response: Response, url: &Url) -> Result<Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().await.unwrap_or_default();
        Err(map_status_error(status, url, body))
    }

    async fn json<T: DeserializeOwned>(response: Response, url: &Url) -> Result<T> {
        let response = Self::ensure_success(response, url).await?;
        response
            .json::<T>()
            .await
            .map_err(|err| BridgeError::Platform(format!("Failed to parse response from {url}: {err}")))
    }
}

/// Ensure the base URL ends with a slash so relative joins keep its path.
fn parse_base_url(raw: &str) -> Result<Url> {
    let mut normalized = raw.trim().to_string();
    if !normalized.ends_with('/') {
        normalized.push('/');
    }
    Url::parse(&normalized).map_err(|err| BridgeError::from(InfraError::from(err)))
}

fn map_status_error(status: StatusCode, url: &Url, body: String) -> BridgeError {
    let message = if body.is_empty() {
        format!("{} returned status {}", url, status)
    } else {
        format!("{} returned status {}: {}", url, status, body)
    };

    if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
        BridgeError::Auth(message)
    } else if status == StatusCode::NOT_FOUND {
        BridgeError::NotFound(message)
    } else if status.is_client_error() {
        BridgeError::InvalidInput(message)
    } else {
        BridgeError::Platform(message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn base_url_keeps_path_prefix() {
        let url = parse_base_url("https://t1.example.com/proxy").unwrap();
        assert_eq!(url.join("event/events").unwrap().as_str(), "https://t1.example.com/proxy/event/events");
    }

    #[test]
    fn status_errors_map_to_domain_variants() {
        let url = Url::parse("https://t1.example.com/x").unwrap();
        assert!(matches!(map_status_error(StatusCode::FORBIDDEN, &url, String::new()), BridgeError::Auth(_)));
        assert!(matches!(map_status_error(StatusCode::NOT_FOUND, &url, String::new()), BridgeError::NotFound(_)));
        assert!(matches!(map_status_error(StatusCode::UNPROCESSABLE_ENTITY, &url, "bad".into()), BridgeError::InvalidInput(m) if m.contains("bad")));
        assert!(matches!(map_status_error(StatusCode::BAD_GATEWAY, &url, String::new()), BridgeError::Platform(_)));
    }
}
