//! # The Uniform Cache Contract
//!
//! This module defines the single trait every eviction-policy engine
//! exposes, so callers can swap policies without touching call sites.
//!
//! ## Architecture
//!
//! ```text
//!                    ┌───────────────────────────────────────┐
//!                    │            Cache<K, V>                │
//!                    │                                       │
//!                    │  get(&K)            → V | KeyNotFound │
//!                    │  get_if_present(&K) → Option<V>       │
//!                    │  get_or_load(&K)    → V | KeyNotFound │
//!                    │  set(K, V)                            │
//!                    │  set_with_expire(K, V, Expiration)    │
//!                    │  has / remove / keys / len            │
//!                    │  clean_expired / flush                │
//!                    └──────────────────┬────────────────────┘
//!                                       │
//!            ┌──────────────┬───────────┴──┬──────────────┐
//!            ▼              ▼              ▼              ▼
//!      SimpleCache      LruCache       LfuCache       ArcCache
//!      (expiry scan)    (recency)      (frequency)    (adaptive)
//! ```
//!
//! ## Contract Notes
//!
//! | Operation | Registers access | Consults loader | Lock |
//! |-----------|------------------|-----------------|------|
//! | `get` | yes | yes | write (read for Simple) |
//! | `get_if_present` | yes | no | write (read for Simple) |
//! | `get_or_load` | yes | yes, inserts on load | write |
//! | `has` / `keys` / `len` | no | no | read |
//! | `set` / `set_with_expire` / `remove` | — | no | write |
//! | `clean_expired` / `flush` | — | no | write |
//!
//! Every engine clones values across the boundary; no references to cache
//! internals escape. Operations are linearizable with respect to the
//! engine's lock: observers see a total order consistent with
//! lock-acquisition order. No ordering holds across distinct caches.
//!
//! The loader always runs with **no** engine lock held. The before-evicted
//! hook always runs **with** the exclusive lock held and must not re-enter
//! the cache it was registered on.

use std::time::Duration;

use crate::core::CacheId;
use crate::error::KeyNotFoundError;
use crate::item::Expiration;

/// Uniform contract implemented by every eviction-policy engine.
///
/// Obtain an implementation through
/// [`new_builder`](crate::builder::new_builder); the builder hands back an
/// `Arc<dyn Cache<K, V>>` so the cache can be shared across threads and
/// registered with the [purger](crate::purge).
///
/// # Example
///
/// ```
/// use evictkit::{new_builder, Cache, LRU};
///
/// let cache = new_builder::<u32, String>(LRU, 2).unwrap().build();
///
/// cache.set(1, "one".to_string());
/// cache.set(2, "two".to_string());
/// assert_eq!(cache.get(&1).unwrap(), "one");
///
/// cache.set(3, "three".to_string()); // evicts 2: least recently touched
/// assert!(!cache.has(&2));
/// assert!(cache.has(&1));
/// ```
pub trait Cache<K, V>: Send + Sync {
    /// Looks up `key`, registering an access on hit.
    ///
    /// On a miss (absent or expired), the loader — if configured — is
    /// invoked with no lock held; its successful result is returned inside
    /// the error's `fallback` and is **not** inserted. See
    /// [`KeyNotFoundError`].
    fn get(&self, key: &K) -> Result<V, KeyNotFoundError<V>>;

    /// Looks up `key`, registering an access on hit, never consulting the
    /// loader. Expired entries are treated as absent.
    fn get_if_present(&self, key: &K) -> Option<V>;

    /// Looks up `key`; on miss, runs the loader and **inserts** the loaded
    /// value with the default TTL before returning it.
    fn get_or_load(&self, key: &K) -> Result<V, KeyNotFoundError<V>>;

    /// Inserts or updates `key` with the cache's default expiration.
    fn set(&self, key: K, value: V);

    /// Inserts or updates `key` with an explicit [`Expiration`].
    fn set_with_expire(&self, key: K, value: V, expiration: Expiration);

    /// Returns `true` if `key` is present and unexpired. Does not register
    /// an access.
    fn has(&self, key: &K) -> bool;

    /// Removes `key`, firing the before-evicted hook if the key existed.
    ///
    /// Returns `true` iff the key was present **and unexpired** at removal
    /// time; removing an expired entry fires the hook but returns `false`.
    fn remove(&self, key: &K) -> bool;

    /// Snapshot of the unexpired keys, in unspecified order.
    fn keys(&self) -> Vec<K>;

    /// Removes every expired entry, firing the before-evicted hook for
    /// each, and returns how many were removed.
    fn clean_expired(&self) -> usize;

    /// Resets the cache to its freshly-built state. Fires no hooks.
    fn flush(&self);

    /// Number of entries currently stored. Expired entries count until a
    /// sweep removes them.
    fn len(&self) -> usize;

    /// Returns `true` if the cache holds no entries.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Maximum number of entries.
    fn capacity(&self) -> usize;

    /// The cache's name, as used in error messages.
    fn name(&self) -> &str;

    /// The cache's stable identity (used by the purger registry).
    fn id(&self) -> CacheId;

    /// The configured default TTL, if entries expire by default.
    fn default_ttl(&self) -> Option<Duration>;
}
