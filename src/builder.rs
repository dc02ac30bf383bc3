//! Cache construction: the policy registry and the fluent builder.
//!
//! Policies are looked up by name — [`SIMPLE`], [`LRU`], [`LFU`], [`ARC`] —
//! in a registry of constructor functions; [`new_builder`] resolves the
//! name, validates the capacity, and hands back a [`CacheBuilder`] whose
//! setters chain. `build()` mints the cache's identity, fills in defaults,
//! and constructs the engine behind an `Arc<dyn Cache<K, V>>`.
//!
//! ## Defaults
//!
//! | Option | Unset behavior at `build()` |
//! |--------|------------------------------|
//! | name | `"cache: <counter>"` from a process-wide counter |
//! | default expiration | [`DEFAULT_TTL`] (60 seconds) |
//! | clock | [`SystemClock`](crate::clock::SystemClock) |
//! | loader / before-evicted hook | none |
//!
//! ## Example
//!
//! ```
//! use evictkit::{new_builder, Cache, Expiration, LFU};
//!
//! let cache = new_builder::<u64, String>(LFU, 128)
//!     .unwrap()
//!     .set_name("sessions")
//!     .set_default_expiration(Expiration::Never)
//!     .set_before_evicted(|key, _value| println!("dropping {key}"))
//!     .build();
//!
//! cache.set(1, "alpha".to_string());
//! assert_eq!(cache.name(), "sessions");
//! ```

use std::fmt;
use std::hash::Hash;
use std::sync::Arc;
use std::time::Duration;

use crate::clock::Clock;
use crate::core::{BeforeEvictedFn, CacheCore, CacheId, LoaderFn};
use crate::error::{BuildError, LoaderError};
use crate::item::Expiration;
use crate::policy::{ArcCache, LfuCache, LruCache, SimpleCache};
use crate::traits::Cache;

/// Policy name: flat map with expiration-driven eviction.
pub const SIMPLE: &str = "simpleCache";
/// Policy name: least recently used.
pub const LRU: &str = "lru";
/// Policy name: least frequently used.
pub const LFU: &str = "lfu";
/// Policy name: adaptive replacement cache.
pub const ARC: &str = "arc";

/// Default TTL substituted when no default expiration is configured.
pub const DEFAULT_TTL: Duration = Duration::from_secs(60);

type Constructor<K, V> = fn(CacheCore<K, V>) -> Arc<dyn Cache<K, V>>;

/// The policy registry: name → engine constructor.
fn registry<K, V>() -> [(&'static str, Constructor<K, V>); 4]
where
    K: Eq + Hash + Clone + fmt::Debug + Send + Sync + 'static,
    V: Clone + Send + Sync + 'static,
{
    [
        (SIMPLE, |core| Arc::new(SimpleCache::with_core(core))),
        (LRU, |core| Arc::new(LruCache::with_core(core))),
        (LFU, |core| Arc::new(LfuCache::with_core(core))),
        (ARC, |core| Arc::new(ArcCache::with_core(core))),
    ]
}

/// Starts building a cache with the named policy and capacity.
///
/// Fails with [`BuildError::NoSuchPolicy`] for an unknown name and
/// [`BuildError::ZeroCapacity`] when `capacity == 0`. Nothing is allocated
/// on failure.
///
/// # Example
///
/// ```
/// use evictkit::{new_builder, BuildError, Cache, ARC};
///
/// let cache = new_builder::<u64, u64>(ARC, 256).unwrap().build();
/// assert_eq!(cache.capacity(), 256);
///
/// let err = new_builder::<u64, u64>("mru", 256).unwrap_err();
/// assert!(matches!(err, BuildError::NoSuchPolicy { .. }));
/// ```
pub fn new_builder<K, V>(policy: &str, capacity: usize) -> Result<CacheBuilder<K, V>, BuildError>
where
    K: Eq + Hash + Clone + fmt::Debug + Send + Sync + 'static,
    V: Clone + Send + Sync + 'static,
{
    if capacity == 0 {
        return Err(BuildError::ZeroCapacity);
    }
    let constructor = registry::<K, V>()
        .iter()
        .find(|(name, _)| *name == policy)
        .map(|(_, constructor)| *constructor)
        .ok_or_else(|| BuildError::NoSuchPolicy {
            name: policy.to_string(),
        })?;

    Ok(CacheBuilder {
        constructor,
        capacity,
        name: None,
        default_expiration: Expiration::Default,
        clock: crate::clock::system_clock(),
        loader: None,
        before_evicted: None,
    })
}

/// Fluent configuration for a cache under construction.
///
/// Every setter consumes and returns the builder, so calls chain. The
/// configuration is immutable once `build()` runs.
pub struct CacheBuilder<K, V> {
    constructor: Constructor<K, V>,
    capacity: usize,
    name: Option<String>,
    default_expiration: Expiration,
    clock: Arc<dyn Clock>,
    loader: Option<LoaderFn<K, V>>,
    before_evicted: Option<BeforeEvictedFn<K, V>>,
}

impl<K, V> CacheBuilder<K, V>
where
    K: Eq + Hash + Clone + fmt::Debug + Send + Sync + 'static,
    V: Clone + Send + Sync + 'static,
{
    /// Names the cache; the name appears in `KeyNotFoundError` messages.
    pub fn set_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Sets the default expiration applied by `set`.
    ///
    /// Leaving this as [`Expiration::Default`] substitutes [`DEFAULT_TTL`]
    /// at build time; [`Expiration::Never`] disables default expiry.
    pub fn set_default_expiration(mut self, expiration: Expiration) -> Self {
        self.default_expiration = expiration;
        self
    }

    /// Registers a loader consulted on `get` misses.
    ///
    /// The loader runs with no engine lock held. Its successful result is
    /// returned to the `get` caller inside the `KeyNotFoundError` and is
    /// not inserted; only `get_or_load` inserts loaded values.
    pub fn set_loader<F>(mut self, loader: F) -> Self
    where
        F: Fn(&K) -> Result<V, LoaderError> + Send + Sync + 'static,
    {
        self.loader = Some(Arc::new(loader));
        self
    }

    /// Registers a hook fired just before any entry leaves the cache.
    ///
    /// The hook runs synchronously under the engine's exclusive lock; it
    /// must not call back into the same cache.
    pub fn set_before_evicted<F>(mut self, hook: F) -> Self
    where
        F: Fn(&K, &V) + Send + Sync + 'static,
    {
        self.before_evicted = Some(Arc::new(hook));
        self
    }

    /// Injects a clock; tests use [`ManualClock`](crate::clock::ManualClock)
    /// for deterministic expiry.
    pub fn set_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Constructs the cache.
    pub fn build(self) -> Arc<dyn Cache<K, V>> {
        let id = CacheId::mint();
        let name = self
            .name
            .unwrap_or_else(|| format!("cache: {}", id.get()));
        let default_ttl = match self.default_expiration {
            Expiration::Default => Some(DEFAULT_TTL),
            Expiration::Never => None,
            Expiration::After(d) => Some(d),
        };

        let core = CacheCore::new(
            name,
            id,
            self.capacity,
            default_ttl,
            self.clock,
            self.loader,
            self.before_evicted,
        );
        (self.constructor)(core)
    }
}

impl<K, V> fmt::Debug for CacheBuilder<K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CacheBuilder")
            .field("capacity", &self.capacity)
            .field("name", &self.name)
            .field("default_expiration", &self.default_expiration)
            .field("has_loader", &self.loader.is_some())
            .field("has_before_evicted", &self.before_evicted.is_some())
            .finish()
    }
}
