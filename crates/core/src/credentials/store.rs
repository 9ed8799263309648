//! Atomically replaceable set of service users

use std::collections::HashMap;
use std::sync::Arc;

use arc_swap::ArcSwap;
use hubbridge_domain::{BridgeError, Result, ServiceUser, ServiceUserKey};
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use super::ports::ServiceUserSource;

type UserMap = HashMap<ServiceUserKey, ServiceUser>;

/// Latest known service-user secrets, keyed by `(tenant, username)`.
///
/// Readers load a complete snapshot without locking. A refresh builds a new
/// map and swaps it in, so a lookup sees either the old set or the new one.
/// Refreshes are serialized but never rate limited.
pub struct CredentialStore {
    users: ArcSwap<UserMap>,
    source: Arc<dyn ServiceUserSource>,
    refresh_lock: Mutex<()>,
}

impl CredentialStore {
    /// Create an empty store backed by `source`.
    pub fn new(source: Arc<dyn ServiceUserSource>) -> Self {
        Self { users: ArcSwap::from_pointee(HashMap::new()), source, refresh_lock: Mutex::new(()) }
    }

    /// Current secret of `tenant/username`.
    pub fn lookup(&self, tenant: &str, username: &str) -> Option<String> {
        let key = ServiceUserKey::new(tenant, username);
        self.users.load().get(&key).map(|user| user.secret.clone())
    }

    /// Service user of `tenant`. With several users per tenant the
    /// alphabetically first username is returned.
    pub fn for_tenant(&self, tenant: &str) -> Option<ServiceUser> {
        self.users
            .load()
            .values()
            .filter(|user| user.tenant == tenant)
            .min_by(|a, b| a.username.cmp(&b.username))
            .cloned()
    }

    /// Reload the full set from the upstream listing.
    ///
    /// Returns the number of users now held. On failure the previous set is
    /// kept.
    ///
    /// # Errors
    /// Returns `BridgeError::CredentialRefresh` when the listing fails.
    pub async fn refresh(&self) -> Result<usize> {
        let _guard = self.refresh_lock.lock().await;

        let users = self.source.list_service_users().await.map_err(|err| match err {
            BridgeError::CredentialRefresh(_) => err,
            other => BridgeError::CredentialRefresh(other.to_string()),
        });

        match users {
            Ok(users) => {
                let count = self.replace(users);
                info!(count, "Service users refreshed");
                Ok(count)
            }
            Err(err) => {
                warn!(error = %err, "Service user refresh failed, keeping previous set");
                Err(err)
            }
        }
    }

    /// Replace the whole set. Later duplicates of a key win.
    pub fn replace(&self, users: Vec<ServiceUser>) -> usize {
        let map: UserMap = users.into_iter().map(|user| (user.key(), user)).collect();
        let count = map.len();
        self.users.store(Arc::new(map));
        debug!(count, "Service user set replaced");
        count
    }

    pub fn len(&self) -> usize {
        self.users.load().len()
    }

    pub fn is_empty(&self) -> bool {
        self.users.load().is_empty()
    }
}

impl std::fmt::Debug for CredentialStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let users = self.users.load();
        let mut keys: Vec<&ServiceUserKey> = users.keys().collect();
        keys.sort();
        f.debug_struct("CredentialStore").field("users", &keys).finish()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex as StdMutex;

    use async_trait::async_trait;

    use super::*;

    /// Returns scripted listings in order, repeating the last one.
    struct ScriptedSource {
        listings: StdMutex<Vec<Result<Vec<ServiceUser>>>>,
        calls: AtomicUsize,
    }

    impl ScriptedSource {
        fn new(listings: Vec<Result<Vec<ServiceUser>>>) -> Self {
            Self { listings: StdMutex::new(listings), calls: AtomicUsize::new(0) }
        }
    }

    #[async_trait]
    impl ServiceUserSource for ScriptedSource {
        async fn list_service_users(&self) -> Result<Vec<ServiceUser>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let mut listings = self.listings.lock().unwrap();
            if listings.len() > 1 {
                listings.remove(0)
            } else {
                listings[0].clone()
            }
        }
    }

    fn user(tenant: &str, name: &str, secret: &str) -> ServiceUser {
        ServiceUser::new(tenant, name, secret)
    }

    #[tokio::test]
    async fn lookup_is_empty_before_refresh() {
        let source = Arc::new(ScriptedSource::new(vec![Ok(vec![])]));
        let store = CredentialStore::new(source);

        assert!(store.is_empty());
        assert_eq!(store.lookup("t1", "svc"), None);
    }

    #[tokio::test]
    async fn refresh_replaces_whole_set() {
        let source = Arc::new(ScriptedSource::new(vec![
            Ok(vec![user("t1", "svc", "a"), user("t2", "svc", "b")]),
            Ok(vec![user("t1", "svc", "c")]),
        ]));
        let store = CredentialStore::new(source);

        assert_eq!(store.refresh().await.unwrap(), 2);
        assert_eq!(store.lookup("t2", "svc").as_deref(), Some("b"));

        assert_eq!(store.refresh().await.unwrap(), 1);
        assert_eq!(store.lookup("t1", "svc").as_deref(), Some("c"));
        assert_eq!(store.lookup("t2", "svc"), None);
    }

    #[tokio::test]
    async fn refresh_is_idempotent_without_upstream_change() {
        let source = Arc::new(ScriptedSource::new(vec![Ok(vec![
            user("t1", "svc", "a"),
            user("t2", "other", "b"),
        ])]));
        let store = CredentialStore::new(source);

        store.refresh().await.unwrap();
        let first = (store.lookup("t1", "svc"), store.lookup("t2", "other"), store.len());
        store.refresh().await.unwrap();
        let second = (store.lookup("t1", "svc"), store.lookup("t2", "other"), store.len());

        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn failed_refresh_keeps_previous_set() {
        let source = Arc::new(ScriptedSource::new(vec![
            Ok(vec![user("t1", "svc", "a")]),
            Err(BridgeError::Network("connection refused".into())),
        ]));
        let store = CredentialStore::new(source.clone());

        store.refresh().await.unwrap();
        let err = store.refresh().await.unwrap_err();

        assert!(matches!(err, BridgeError::CredentialRefresh(msg) if msg.contains("connection refused")));
        assert_eq!(store.lookup("t1", "svc").as_deref(), Some("a"));
        assert_eq!(source.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn duplicate_keys_keep_last_entry() {
        let source = Arc::new(ScriptedSource::new(vec![Ok(vec![])]));
        let store = CredentialStore::new(source);

        let count = store.replace(vec![user("t1", "svc", "old"), user("t1", "svc", "new")]);

        assert_eq!(count, 1);
        assert_eq!(store.lookup("t1", "svc").as_deref(), Some("new"));
    }

    #[tokio::test]
    async fn for_tenant_picks_first_username() {
        let source = Arc::new(ScriptedSource::new(vec![Ok(vec![])]));
        let store = CredentialStore::new(source);
        store.replace(vec![user("t1", "zeta", "z"), user("t1", "alpha", "a"), user("t2", "x", "x")]);

        let found = store.for_tenant("t1").unwrap();
        assert_eq!(found.username, "alpha");
        assert!(store.for_tenant("t3").is_none());
    }

    #[tokio::test]
    async fn debug_lists_keys_only() {
        let source = Arc::new(ScriptedSource::new(vec![Ok(vec![])]));
        let store = CredentialStore::new(source);
        store.replace(vec![user("t1", "svc", "topsecret")]);

        let rendered = format!("{store:?}");
        assert!(rendered.contains("svc"));
        assert!(!rendered.contains("topsecret"));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_lookups_see_complete_sets() {
        let source = Arc::new(ScriptedSource::new(vec![Ok(vec![])]));
        let store = Arc::new(CredentialStore::new(source));
        store.replace(vec![user("t1", "a", "v0"), user("t1", "b", "v0")]);

        let writer = {
            let store = store.clone();
            tokio::spawn(async move {
                for i in 1..200 {
                    let v = format!("v{i}");
                    store.replace(vec![user("t1", "a", &v), user("t1", "b", &v)]);
                    tokio::task::yield_now().await;
                }
            })
        };

        for _ in 0..500 {
            let snapshot = store.users.load();
            let a = &snapshot[&ServiceUserKey::new("t1", "a")].secret;
            let b = &snapshot[&ServiceUserKey::new("t1", "b")].secret;
            assert_eq!(a, b);
            tokio::task::yield_now().await;
        }

        writer.await.unwrap();
    }
}
