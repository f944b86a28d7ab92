//! Identity cache
//!
//! One [`IdentityCache`] exists per entity kind (users, groups, assets, ...)
//! and maps a remote id to the single shared in-memory instance backing all
//! handles for that id. Entities live for the process; there is no eviction.
//! Each access rebinds the caller's session onto the instance, so two
//! callers with different sessions share entity data while acting under
//! their own credentials. Concurrent rebinding is last-write-wins.
//!
//! The cache never constructs entities. Callers either `add` instances they
//! built from their own fetch flow, or hand `resolve_with` a typed factory
//! to run on a miss.
//!
//! # Example
//!
//! ```rust,ignore
//! use arcadia_client::IdentityCache;
//!
//! let users: IdentityCache<u64, User> = IdentityCache::new("user");
//!
//! let user = users
//!     .resolve_with(42, &session, || fetch_user(&dispatcher, 42))
//!     .await?;
//! println!("hello {}", user.display_name());
//! ```

use std::fmt::Display;
use std::future::Future;
use std::hash::Hash;
use std::sync::Arc;

use arcadia_domain::{ArcadiaError, Result};
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use tracing::debug;

use crate::session::Session;

/// Implemented by entity types whose handles carry the session they were
/// last accessed under.
pub trait SessionBound: Send + Sync + 'static {
    /// Swap the bound session. Racing binds are last-write-wins; entity
    /// data must not change here.
    fn bind_session(&self, session: Arc<Session>);
}

/// Per-kind map from remote id to the one shared instance.
pub struct IdentityCache<K, T>
where
    K: Eq + Hash + Clone + Display + Send + Sync + 'static,
    T: SessionBound,
{
    kind: &'static str,
    entries: DashMap<K, Arc<T>>,
}

impl<K, T> IdentityCache<K, T>
where
    K: Eq + Hash + Clone + Display + Send + Sync + 'static,
    T: SessionBound,
{
    /// Create an empty cache for one entity kind. The label only feeds
    /// diagnostics and `KeyNotFound` errors.
    pub fn new(kind: &'static str) -> Self {
        Self { kind, entries: DashMap::new() }
    }

    /// Upsert an instance and return the now-canonical shared handle.
    ///
    /// A later `add` for the same id repoints the id at the new instance;
    /// handles returned earlier keep the old one alive until dropped.
    pub fn add(&self, id: K, instance: T) -> Arc<T> {
        let shared = Arc::new(instance);
        self.entries.insert(id, Arc::clone(&shared));
        shared
    }

    /// Fetch the shared instance for `id` with `session` bound.
    ///
    /// # Errors
    ///
    /// `KeyNotFound` on a miss; the cache never constructs entities.
    pub fn get(&self, id: &K, session: &Arc<Session>) -> Result<Arc<T>> {
        let shared = match self.entries.get(id) {
            Some(entry) => Arc::clone(entry.value()),
            None => {
                debug!(kind = self.kind, id = %id, "identity cache miss");
                return Err(ArcadiaError::KeyNotFound {
                    kind: self.kind.to_owned(),
                    id: id.to_string(),
                });
            }
        };

        shared.bind_session(Arc::clone(session));
        debug!(kind = self.kind, id = %id, "identity cache hit");
        Ok(shared)
    }

    /// Fetch the shared instance for `id`, running `fetch` on a miss.
    ///
    /// The factory runs with no cache lock held, so racing resolvers may
    /// both fetch; whichever insert lands first wins and the other resolver
    /// adopts it, keeping one instance per id.
    pub async fn resolve_with<F, Fut>(
        &self,
        id: K,
        session: &Arc<Session>,
        fetch: F,
    ) -> Result<Arc<T>>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        if let Some(entry) = self.entries.get(&id) {
            let shared = Arc::clone(entry.value());
            drop(entry);
            shared.bind_session(Arc::clone(session));
            debug!(kind = self.kind, id = %id, "identity cache hit");
            return Ok(shared);
        }

        debug!(kind = self.kind, id = %id, "identity cache miss, running fetch");
        let fetched = fetch().await?;

        let shared = match self.entries.entry(id) {
            Entry::Occupied(existing) => Arc::clone(existing.get()),
            Entry::Vacant(slot) => {
                let fresh = Arc::new(fetched);
                slot.insert(Arc::clone(&fresh));
                fresh
            }
        };

        shared.bind_session(Arc::clone(session));
        Ok(shared)
    }

    /// Whether an instance is cached for `id`.
    pub fn contains(&self, id: &K) -> bool {
        self.entries.contains_key(id)
    }

    /// Number of cached instances.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use parking_lot::RwLock;

    use super::*;

    #[derive(Debug)]
    struct TestEntity {
        display_name: String,
        bound: RwLock<Option<Arc<Session>>>,
    }

    impl TestEntity {
        fn new(display_name: &str) -> Self {
            Self { display_name: display_name.to_owned(), bound: RwLock::new(None) }
        }

        fn bound_session(&self) -> Option<Arc<Session>> {
            self.bound.read().clone()
        }
    }

    impl SessionBound for TestEntity {
        fn bind_session(&self, session: Arc<Session>) {
            *self.bound.write() = Some(session);
        }
    }

    #[test]
    fn get_misses_with_key_not_found() {
        let cache: IdentityCache<u64, TestEntity> = IdentityCache::new("user");
        let session = Session::from_cookie("secret");

        let err = cache.get(&42, &session).unwrap_err();
        match err {
            ArcadiaError::KeyNotFound { kind, id } => {
                assert_eq!(kind, "user");
                assert_eq!(id, "42");
            }
            other => panic!("expected KeyNotFound, got {other:?}"),
        }
    }

    #[test]
    fn get_returns_the_shared_instance_with_the_caller_session_bound() {
        let cache: IdentityCache<u64, TestEntity> = IdentityCache::new("user");
        let session_a = Session::from_cookie("cookie-a");
        let session_b = Session::from_cookie("cookie-b");

        let added = cache.add(42, TestEntity::new("avery"));

        let from_a = cache.get(&42, &session_a).unwrap();
        assert!(Arc::ptr_eq(&added, &from_a));
        assert!(Arc::ptr_eq(&from_a.bound_session().unwrap(), &session_a));

        let from_b = cache.get(&42, &session_b).unwrap();
        assert!(Arc::ptr_eq(&from_a, &from_b));
        assert_eq!(from_b.display_name, "avery");
        // Last bind wins for every handle; the data is shared.
        assert!(Arc::ptr_eq(&from_a.bound_session().unwrap(), &session_b));
    }

    #[test]
    fn add_overwrites_and_returns_the_new_canonical_instance() {
        let cache: IdentityCache<u64, TestEntity> = IdentityCache::new("group");
        let session = Session::from_cookie("secret");

        let first = cache.add(7, TestEntity::new("old"));
        let second = cache.add(7, TestEntity::new("new"));
        assert!(!Arc::ptr_eq(&first, &second));

        let fetched = cache.get(&7, &session).unwrap();
        assert!(Arc::ptr_eq(&second, &fetched));
        assert_eq!(fetched.display_name, "new");
        assert_eq!(cache.len(), 1);
    }

    #[tokio::test]
    async fn resolve_with_fetches_once_then_serves_hits() {
        let cache: IdentityCache<u64, TestEntity> = IdentityCache::new("asset");
        let session = Session::from_cookie("secret");
        let fetches = AtomicUsize::new(0);

        let first = cache
            .resolve_with(99, &session, || {
                fetches.fetch_add(1, Ordering::SeqCst);
                async { Ok(TestEntity::new("sword")) }
            })
            .await
            .unwrap();
        assert_eq!(fetches.load(Ordering::SeqCst), 1);

        let second = cache
            .resolve_with(99, &session, || {
                fetches.fetch_add(1, Ordering::SeqCst);
                async { Ok(TestEntity::new("should not run")) }
            })
            .await
            .unwrap();

        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(fetches.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn resolve_with_propagates_fetch_failures_without_caching() {
        let cache: IdentityCache<u64, TestEntity> = IdentityCache::new("asset");
        let session = Session::from_cookie("secret");

        let err = cache
            .resolve_with(5, &session, || async {
                Err(ArcadiaError::Api { status: 500, message: "upstream".into() })
            })
            .await
            .unwrap_err();
        assert!(matches!(err, ArcadiaError::Api { .. }));
        assert!(!cache.contains(&5));
    }

    #[tokio::test]
    async fn racing_resolvers_converge_on_one_instance() {
        let cache: Arc<IdentityCache<u64, TestEntity>> = Arc::new(IdentityCache::new("user"));
        let session = Session::from_cookie("secret");

        let left = {
            let cache = Arc::clone(&cache);
            let session = Arc::clone(&session);
            tokio::spawn(async move {
                cache
                    .resolve_with(1, &session, || async {
                        tokio::task::yield_now().await;
                        Ok(TestEntity::new("left"))
                    })
                    .await
            })
        };
        let right = {
            let cache = Arc::clone(&cache);
            let session = Arc::clone(&session);
            tokio::spawn(async move {
                cache
                    .resolve_with(1, &session, || async {
                        tokio::task::yield_now().await;
                        Ok(TestEntity::new("right"))
                    })
                    .await
            })
        };

        let left = left.await.unwrap().unwrap();
        let right = right.await.unwrap().unwrap();

        assert!(Arc::ptr_eq(&left, &right));
        assert_eq!(cache.len(), 1);
    }
}
