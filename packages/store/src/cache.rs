//! At-most-once fetching per request key.
//!
//! The first caller for a signature claims it by inserting a shared future
//! before anything is awaited; later callers, concurrent or not, await a
//! clone of that same future. Successful payloads stay cached for the life
//! of the cache. A failed fetch (transport error or unusable payload)
//! removes its own entry so the next call for the signature starts a new
//! fetch.

use std::collections::BTreeMap;
use std::fmt::Display;
use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard};

use futures::FutureExt as _;
use futures::future::{BoxFuture, Shared};
use crate::{LoadFailure, RequestSignature};

/// Outcome of a fetch, shared by every waiter.
pub type FetchResult<V> = Result<V, LoadFailure>;

type SharedFetch<V> = Shared<BoxFuture<'static, FetchResult<V>>>;
type Entries<K, V> = Mutex<BTreeMap<K, SharedFetch<V>>>;

/// A claimed or cached fetch.
pub struct CacheEntry<V: Clone> {
    /// `true` when this lookup started the fetch.
    pub fresh: bool,
    future: SharedFetch<V>,
}

impl<V: Clone> CacheEntry<V> {
    /// Waits for the payload.
    ///
    /// # Errors
    ///
    /// Returns the fetch error, shared with every other waiter.
    pub async fn resolve(self) -> FetchResult<V> {
        self.future.await
    }
}

/// Deduplicating, memoizing fetch layer, keyed by [`RequestSignature`]
/// unless another key type is given.
pub struct FetchCache<V: Clone, K = RequestSignature> {
    entries: Arc<Entries<K, V>>,
}

impl<V: Clone, K> Default for FetchCache<V, K> {
    fn default() -> Self {
        Self {
            entries: Arc::new(Mutex::new(BTreeMap::new())),
        }
    }
}

impl<V, K> FetchCache<V, K>
where
    V: Clone + Send + Sync + 'static,
    K: Ord + Clone + Display + Send + Sync + 'static,
{
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the entry for `signature`, claiming it with `fetch` if there
    /// is none yet. `fetch` is only invoked when claiming.
    ///
    /// # Panics
    ///
    /// Panics if the cache `Mutex` is poisoned.
    pub fn entry<F, Fut>(&self, signature: &K, fetch: F) -> CacheEntry<V>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = FetchResult<V>> + Send + 'static,
    {
        let mut entries = lock(&self.entries);

        if let Some(existing) = entries.get(signature) {
            log::debug!("Cache hit for {signature}");
            return CacheEntry {
                fresh: false,
                future: existing.clone(),
            };
        }

        log::debug!("Claiming {signature}");
        let request = fetch();
        let handle = Arc::clone(&self.entries);
        let key = signature.clone();

        let future = async move {
            let result = request.await;
            if let Err(e) = &result {
                log::warn!("Fetch for {key} failed, releasing claim: {e}");
                lock(&handle).remove(&key);
            }
            result
        }
        .boxed()
        .shared();

        entries.insert(signature.clone(), future.clone());

        CacheEntry {
            fresh: true,
            future,
        }
    }

    /// Fetches through the cache and waits for the payload.
    ///
    /// # Errors
    ///
    /// Returns the fetch error if the (possibly shared) fetch failed.
    pub async fn get_or_fetch<F, Fut>(
        &self,
        signature: &K,
        fetch: F,
    ) -> FetchResult<V>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = FetchResult<V>> + Send + 'static,
    {
        self.entry(signature, fetch).resolve().await
    }

    /// Whether `signature` is claimed (in flight or fetched).
    #[must_use]
    pub fn contains(&self, signature: &K) -> bool {
        lock(&self.entries).contains_key(signature)
    }

    /// Payload for `signature` if its fetch already succeeded.
    #[must_use]
    pub fn peek(&self, signature: &K) -> Option<V> {
        lock(&self.entries)
            .get(signature)
            .and_then(Shared::peek)
            .and_then(|result| result.as_ref().ok().cloned())
    }

    /// Claimed signatures, in order.
    #[must_use]
    pub fn signatures(&self) -> Vec<K> {
        lock(&self.entries).keys().cloned().collect()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        lock(&self.entries).len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        lock(&self.entries).is_empty()
    }
}

fn lock<K, V>(entries: &Entries<K, V>) -> MutexGuard<'_, BTreeMap<K, SharedFetch<V>>> {
    entries.lock().expect("fetch cache mutex poisoned")
}
