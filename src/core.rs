//! Shared engine configuration.
//!
//! Every policy engine embeds a [`CacheCore`]: the immutable attributes a
//! cache is built with (name, id, capacity, default TTL, clock, loader,
//! eviction hook). The engine's mutable index structures live behind its
//! own lock; `CacheCore` is read-only after construction and therefore
//! never needs one.
//!
//! [`CacheId`] is the stable identity handle minted for each cache at build
//! time. The background purger keys its process-wide table by `CacheId`
//! rather than by pointer identity on a trait object.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::clock::Clock;
use crate::error::{KeyNotFoundError, LoaderError};
use crate::item::Expiration;

/// Callback consulted on a cache miss to materialize a fallback value.
pub type LoaderFn<K, V> = Arc<dyn Fn(&K) -> Result<V, LoaderError> + Send + Sync>;

/// Callback fired, with the engine lock held, just before an entry leaves
/// the cache via `remove`, `clean_expired`, or a policy eviction.
pub type BeforeEvictedFn<K, V> = Arc<dyn Fn(&K, &V) + Send + Sync>;

static NEXT_CACHE_ID: AtomicU64 = AtomicU64::new(1);

/// Stable, process-unique identity of a cache instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CacheId(u64);

impl CacheId {
    /// Mints the next id from the process-wide counter.
    pub(crate) fn mint() -> Self {
        Self(NEXT_CACHE_ID.fetch_add(1, Ordering::Relaxed))
    }

    /// Returns the numeric value of the id.
    pub fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for CacheId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Immutable shared attributes of a cache engine.
pub struct CacheCore<K, V> {
    name: String,
    id: CacheId,
    capacity: usize,
    default_ttl: Option<Duration>,
    clock: Arc<dyn Clock>,
    loader: Option<LoaderFn<K, V>>,
    before_evicted: Option<BeforeEvictedFn<K, V>>,
}

impl<K, V> CacheCore<K, V> {
    pub(crate) fn new(
        name: String,
        id: CacheId,
        capacity: usize,
        default_ttl: Option<Duration>,
        clock: Arc<dyn Clock>,
        loader: Option<LoaderFn<K, V>>,
        before_evicted: Option<BeforeEvictedFn<K, V>>,
    ) -> Self {
        Self {
            name,
            id,
            capacity,
            default_ttl,
            clock,
            loader,
            before_evicted,
        }
    }

    /// Builds a core with defaults suitable for direct engine construction:
    /// a counter-derived name, no default TTL, no loader, no eviction hook,
    /// and the system clock.
    pub(crate) fn with_capacity(capacity: usize) -> Self {
        let id = CacheId::mint();
        Self::new(
            format!("cache: {}", id.get()),
            id,
            capacity,
            None,
            crate::clock::system_clock(),
            None,
            None,
        )
    }

    /// The cache's name, used in error messages.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The cache's stable identity.
    pub fn id(&self) -> CacheId {
        self.id
    }

    /// Maximum number of entries.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// The configured default TTL, if entries expire by default.
    pub fn default_ttl(&self) -> Option<Duration> {
        self.default_ttl
    }

    /// Current instant from the injected clock.
    pub fn now(&self) -> Instant {
        self.clock.now()
    }

    /// Resolves an [`Expiration`] selector into an absolute expiry instant.
    pub fn expires_at(&self, expiration: Expiration) -> Option<Instant> {
        match expiration {
            Expiration::Default => self.default_ttl.map(|ttl| self.clock.now() + ttl),
            Expiration::Never => None,
            Expiration::After(d) => Some(self.clock.now() + d),
        }
    }

    /// Fires the eviction hook for an entry about to leave the cache.
    ///
    /// Runs under the engine's exclusive lock; the hook must not call back
    /// into the same cache.
    pub(crate) fn notify_evicted(&self, key: &K, value: &V) {
        if let Some(hook) = &self.before_evicted {
            hook(key, value);
        }
    }
}

impl<K: fmt::Debug, V> CacheCore<K, V> {
    /// Builds the miss error for `get`, consulting the loader if present.
    ///
    /// Must be called with no engine lock held: the loader is user code.
    pub(crate) fn miss(&self, key: &K) -> KeyNotFoundError<V> {
        match &self.loader {
            Some(loader) => match loader(key) {
                Ok(value) => KeyNotFoundError::with_fallback(self.name.as_str(), key, value),
                Err(err) => KeyNotFoundError::with_loader_error(self.name.as_str(), key, err),
            },
            None => KeyNotFoundError::new(self.name.as_str(), key),
        }
    }

    /// Runs the loader for `get_or_load`; a missing loader is a plain miss.
    ///
    /// Must be called with no engine lock held.
    pub(crate) fn load(&self, key: &K) -> Result<V, KeyNotFoundError<V>> {
        match &self.loader {
            Some(loader) => loader(key)
                .map_err(|err| KeyNotFoundError::with_loader_error(self.name.as_str(), key, err)),
            None => Err(KeyNotFoundError::new(self.name.as_str(), key)),
        }
    }
}

impl<K, V> fmt::Debug for CacheCore<K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CacheCore")
            .field("name", &self.name)
            .field("id", &self.id)
            .field("capacity", &self.capacity)
            .field("default_ttl", &self.default_ttl)
            .field("has_loader", &self.loader.is_some())
            .field("has_before_evicted", &self.before_evicted.is_some())
            .finish()
    }
}
