//! Shared fixtures for `hubbridge-infra` integration tests.

#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use hubbridge_core::{CredentialStore, ServiceUserSource};
use hubbridge_domain::{BridgeError, Result as DomainResult, ServiceUser};
use hubbridge_infra::HttpClient;

/// Service-user source that hands out a scripted sequence of listings and
/// counts how often it was asked.
pub struct ScriptedUsers {
    listings: Mutex<Vec<DomainResult<Vec<ServiceUser>>>>,
    calls: AtomicUsize,
}

impl ScriptedUsers {
    /// Listings are returned in order; the last one repeats.
    pub fn new(listings: Vec<DomainResult<Vec<ServiceUser>>>) -> Arc<Self> {
        Arc::new(Self { listings: Mutex::new(listings), calls: AtomicUsize::new(0) })
    }

    pub fn fixed(users: Vec<ServiceUser>) -> Arc<Self> {
        Self::new(vec![Ok(users)])
    }

    pub fn failing() -> Arc<Self> {
        Self::new(vec![Err(BridgeError::Network("listing unavailable".into()))])
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ServiceUserSource for ScriptedUsers {
    async fn list_service_users(&self) -> DomainResult<Vec<ServiceUser>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let mut listings = self.listings.lock().unwrap();
        if listings.len() > 1 {
            listings.remove(0)
        } else {
            listings[0].clone()
        }
    }
}

/// Transport with tiny deterministic backoff and two retries.
pub fn fast_client(store: Option<Arc<CredentialStore>>) -> HttpClient {
    let mut builder = HttpClient::builder()
        .base_backoff(Duration::from_millis(5))
        .max_backoff(Duration::from_millis(20))
        .jitter(false)
        .max_retries(2)
        .timeout(Duration::from_secs(5));
    if let Some(store) = store {
        builder = builder.credential_store(store);
    }
    builder.build().expect("http client")
}

/// Store pre-filled with `users`, refreshing from `source`.
pub fn store_with(source: Arc<ScriptedUsers>, users: Vec<ServiceUser>) -> Arc<CredentialStore> {
    let store = Arc::new(CredentialStore::new(source));
    store.replace(users);
    store
}
