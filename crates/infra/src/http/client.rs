use std::sync::Arc;
use std::time::Duration;

use hubbridge_core::CredentialStore;
use hubbridge_domain::{BridgeError, TransportConfig};
use reqwest::header::{HeaderValue, AUTHORIZATION};
use reqwest::{Client as ReqwestClient, Method, Request, RequestBuilder, Response};
use tracing::{debug, info, warn};

use super::basic_auth;
use super::retry_policy::{classify, requires_credential_refresh, AttemptOutcome, Backoff, RetryDecision};
use crate::errors::InfraError;

/// HTTP client with credential-aware retries.
///
/// Every attempt re-reads the Basic-Auth secret from the credential store,
/// 401/403 responses trigger a store refresh, and responses are classified by
/// [`classify`] to decide whether to send again.
#[derive(Clone)]
pub struct HttpClient {
    client: ReqwestClient,
    max_retries: u32,
    backoff: Backoff,
    credentials: Option<Arc<CredentialStore>>,
}

impl HttpClient {
    /// Start building a new HTTP client.
    pub fn builder() -> HttpClientBuilder {
        HttpClientBuilder::default()
    }

    /// Convenience constructor with default configuration.
    pub fn new() -> Result<Self, BridgeError> {
        Self::builder().build()
    }

    /// Create a request builder using the underlying reqwest client.
    pub fn request<U>(&self, method: Method, url: U) -> RequestBuilder
    where
        U: reqwest::IntoUrl,
    {
        self.client.request(method, url)
    }

    /// Store consulted before each attempt, if any.
    pub fn credential_store(&self) -> Option<&Arc<CredentialStore>> {
        self.credentials.as_ref()
    }

    /// Execute the provided request builder with retry semantics.
    ///
    /// Returns the last response when the policy stops without an error, even
    /// if its status is not a success.
    ///
    /// # Errors
    /// `BridgeError::Network` once retries are exhausted on a recorded error,
    /// `BridgeError::Internal` when the body cannot be replayed.
    pub async fn send(&self, builder: RequestBuilder) -> Result<Response, BridgeError> {
        let mut retry: u32 = 0;

        loop {
            let attempt = retry + 1;
            let cloned_builder = builder.try_clone().ok_or_else(|| {
                BridgeError::Internal(
                    "request body cannot be cloned; buffer the body to enable retries".into(),
                )
            })?;

            let mut request = cloned_builder.build().map_err(|err| {
                let infra: InfraError = err.into();
                BridgeError::from(infra)
            })?;
            self.apply_current_secret(&mut request);

            let method = request.method().clone();
            let url = request.url().clone();
            debug!(attempt, %method, %url, "sending HTTP request");

            let (outcome, response) = match self.client.execute(request).await {
                Ok(response) => {
                    let status = response.status();
                    debug!(attempt, %method, %url, %status, "received HTTP response");
                    (AttemptOutcome::Status(status.as_u16()), Some(response))
                }
                Err(err) => {
                    debug!(attempt, %method, %url, error = %err, "HTTP request failed");
                    let infra: InfraError = err.into();
                    (AttemptOutcome::Transport(BridgeError::from(infra).to_string()), None)
                }
            };

            if requires_credential_refresh(&outcome) {
                self.refresh_credentials().await;
            }

            let decision = classify(&outcome);
            if decision.is_retry() && retry < self.max_retries {
                retry += 1;
                let delay = response
                    .as_ref()
                    .and_then(|r| self.backoff.server_hint(r.status().as_u16(), r.headers()))
                    .unwrap_or_else(|| self.backoff.delay(retry));

                if let RetryDecision::Retry { reason: Some(reason) } = &decision {
                    warn!(attempt, %method, %url, reason = %reason, delay_ms = delay.as_millis() as u64, "retrying HTTP request");
                } else {
                    debug!(attempt, %method, %url, delay_ms = delay.as_millis() as u64, "retrying HTTP request");
                }

                if !delay.is_zero() {
                    tokio::time::sleep(delay).await;
                }
                continue;
            }

            let decision = if decision.is_retry() { decision.exhausted() } else { decision };
            return match decision {
                RetryDecision::Fatal(reason) => {
                    warn!(attempts = attempt, %method, %url, reason = %reason, "HTTP request failed permanently");
                    Err(BridgeError::Network(format!("giving up after {attempt} attempts: {reason}")))
                }
                _ => response.ok_or_else(|| {
                    BridgeError::Network(format!("{method} {url} produced no response"))
                }),
            };
        }
    }

    /// Replace the secret of a `tenant/username` Basic header with the one
    /// currently in the store.
    fn apply_current_secret(&self, request: &mut Request) {
        let Some(store) = &self.credentials else {
            return;
        };

        let Some(creds) = request
            .headers()
            .get(AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .and_then(basic_auth::parse)
        else {
            return;
        };

        let Some(secret) = store.lookup(&creds.tenant, &creds.username) else {
            return;
        };
        if secret == creds.secret {
            return;
        }

        match HeaderValue::from_str(&basic_auth::encode(&creds.tenant, &creds.username, &secret)) {
            Ok(mut value) => {
                value.set_sensitive(true);
                request.headers_mut().insert(AUTHORIZATION, value);
                debug!(tenant = %creds.tenant, username = %creds.username, "applied rotated service user secret");
            }
            Err(err) => warn!(error = %err, "rotated secret is not a valid header value"),
        }
    }

    async fn refresh_credentials(&self) {
        let Some(store) = &self.credentials else {
            return;
        };

        match store.refresh().await {
            Ok(count) => info!(count, "service users refreshed after authorization failure"),
            Err(err) => warn!(error = %err, "service user refresh failed, retrying with current credentials"),
        }
    }
}

/// Builder for [`HttpClient`].
pub struct HttpClientBuilder {
    timeout: Duration,
    max_retries: u32,
    base_backoff: Duration,
    max_backoff: Duration,
    jitter: bool,
    user_agent: Option<String>,
    default_headers: Option<reqwest::header::HeaderMap>,
    credentials: Option<Arc<CredentialStore>>,
}

impl Default for HttpClientBuilder {
    fn default() -> Self {
        Self::from_config(&TransportConfig::default())
    }
}

impl HttpClientBuilder {
    /// Seed the builder from transport settings. Jitter is on.
    pub fn from_config(config: &TransportConfig) -> Self {
        Self {
            timeout: config.timeout(),
            max_retries: config.max_retries,
            base_backoff: config.base_backoff(),
            max_backoff: config.max_backoff(),
            jitter: true,
            user_agent: Some(concat!("hubbridge/", env!("CARGO_PKG_VERSION")).to_string()),
            default_headers: None,
            credentials: None,
        }
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Configure the number of retries after the first attempt.
    pub fn max_retries(mut self, retries: u32) -> Self {
        self.max_retries = retries;
        self
    }

    pub fn base_backoff(mut self, backoff: Duration) -> Self {
        self.base_backoff = backoff;
        self
    }

    pub fn max_backoff(mut self, backoff: Duration) -> Self {
        self.max_backoff = backoff;
        self
    }

    pub fn jitter(mut self, enabled: bool) -> Self {
        self.jitter = enabled;
        self
    }

    pub fn user_agent(mut self, agent: impl Into<String>) -> Self {
        self.user_agent = Some(agent.into());
        self
    }

    pub fn default_headers(mut self, headers: reqwest::header::HeaderMap) -> Self {
        self.default_headers = Some(headers);
        self
    }

    /// Rewrite Basic-Auth headers from `store` and refresh it on 401/403.
    pub fn credential_store(mut self, store: Arc<CredentialStore>) -> Self {
        self.credentials = Some(store);
        self
    }

    pub fn build(self) -> Result<HttpClient, BridgeError> {
        let mut builder = ReqwestClient::builder().timeout(self.timeout).no_proxy();

        if let Some(agent) = self.user_agent {
            builder = builder.user_agent(agent);
        }

        if let Some(headers) = self.default_headers {
            builder = builder.default_headers(headers);
        }

        let client = builder.build().map_err(|err| {
            let infra: InfraError = err.into();
            BridgeError::from(infra)
        })?;

        Ok(HttpClient {
            client,
            max_retries: self.max_retries,
            backoff: Backoff {
                base: self.base_backoff,
                max: self.max_backoff.max(self.base_backoff),
                jitter: self.jitter,
            },
            credentials: self.credentials,
        })
    }
}

#[cfg(test)]
mod tests {
    use std::net::TcpListener;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use reqwest::{Method, StatusCode};
    use wiremock::matchers::method;
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;

    fn client_with_defaults() -> HttpClient {
        HttpClient::builder()
            .base_backoff(Duration::from_millis(10))
            .jitter(false)
            .max_retries(2)
            .build()
            .expect("http client")
    }

    #[tokio::test]
    async fn returns_successful_response_without_retry() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_string("ok"))
            .expect(1)
            .mount(&server)
            .await;

        let client = client_with_defaults();
        let response =
            client.send(client.request(Method::GET, server.uri())).await.expect("response");

        assert_eq!(response.status(), StatusCode::OK);
        let requests = server.received_requests().await.unwrap();
        assert_eq!(requests.len(), 1);
    }

    #[tokio::test]
    async fn retries_server_errors_until_success() {
        let server = MockServer::start().await;
        let attempts = Arc::new(AtomicUsize::new(0));
        let attempts_clone = attempts.clone();
        Mock::given(method("GET"))
            .respond_with(move |_req: &wiremock::Request| -> ResponseTemplate {
                let current = attempts_clone.fetch_add(1, Ordering::SeqCst);
                if current < 2 {
                    ResponseTemplate::new(500)
                } else {
                    ResponseTemplate::new(200)
                }
            })
            .expect(3)
            .mount(&server)
            .await;

        let client = client_with_defaults();
        let response =
            client.send(client.request(Method::GET, server.uri())).await.expect("response");

        assert_eq!(response.status(), StatusCode::OK);
        let requests = server.received_requests().await.unwrap();
        assert_eq!(requests.len(), 3);
    }

    #[tokio::test]
    async fn does_not_retry_client_errors() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(404))
            .expect(1)
            .mount(&server)
            .await;

        let client = client_with_defaults();
        let response =
            client.send(client.request(Method::GET, server.uri())).await.expect("response");

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        let requests = server.received_requests().await.unwrap();
        assert_eq!(requests.len(), 1);
    }

    #[tokio::test]
    async fn exhausted_server_errors_become_network_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(502))
            .expect(3)
            .mount(&server)
            .await;

        let client = client_with_defaults();
        let err = client.send(client.request(Method::GET, server.uri())).await.unwrap_err();

        match err {
            BridgeError::Network(msg) => {
                assert!(msg.contains("giving up after 3 attempts"));
                assert!(msg.contains("502"));
            }
            other => panic!("expected network error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn retries_on_network_failure() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener); // release the port so that requests fail with ECONNREFUSED
        let url = format!("http://{}", addr);

        let client = HttpClient::builder()
            .base_backoff(Duration::from_millis(5))
            .jitter(false)
            .max_retries(1)
            .build()
            .expect("http client");

        let result = client.send(client.request(Method::GET, &url)).await;
        match result {
            Err(BridgeError::Network(msg)) => {
                assert!(msg.contains("giving up after 2 attempts"));
                assert!(msg.to_lowercase().contains("http"));
            }
            other => panic!("expected network error, got {:?}", other),
        }
    }
}
