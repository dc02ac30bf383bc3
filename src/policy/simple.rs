//! Simple cache: a flat map with expiration-driven eviction.
//!
//! No access ordering is tracked; `get` is a plain lookup and may run under
//! the shared lock. When an insert finds the cache full, the engine first
//! tries to drop one expired entry; if nothing has expired it evicts an
//! arbitrary live entry (map iteration order) so the capacity bound always
//! holds.
//!
//! Best for workloads where TTL, not access pattern, decides residency.

use std::fmt;
use std::hash::Hash;

use parking_lot::RwLock;
use rustc_hash::FxHashMap;

use crate::core::{CacheCore, CacheId};
use crate::error::KeyNotFoundError;
use crate::item::{Expiration, Item};
use crate::traits::Cache;

/// Expiration-driven cache engine over a flat hash map.
///
/// # Example
///
/// ```
/// use evictkit::policy::simple::SimpleCache;
/// use evictkit::Cache;
///
/// let cache = SimpleCache::new(2);
/// cache.set("a", 1);
/// cache.set("b", 2);
/// assert_eq!(cache.get_if_present(&"a"), Some(1));
///
/// // Full and nothing expired: an arbitrary entry makes room.
/// cache.set("c", 3);
/// assert_eq!(cache.len(), 2);
/// ```
pub struct SimpleCache<K, V> {
    core: CacheCore<K, V>,
    items: RwLock<FxHashMap<K, Item<K, V>>>,
}

impl<K, V> SimpleCache<K, V>
where
    K: Eq + Hash + Clone + fmt::Debug,
    V: Clone,
{
    /// Creates a cache with the given capacity and default configuration
    /// (no TTL, no loader, no eviction hook, system clock).
    pub fn new(capacity: usize) -> Self {
        Self::with_core(CacheCore::with_capacity(capacity))
    }

    pub(crate) fn with_core(core: CacheCore<K, V>) -> Self {
        let capacity = core.capacity();
        Self {
            core,
            items: RwLock::new(FxHashMap::with_capacity_and_hasher(
                capacity,
                Default::default(),
            )),
        }
    }

    fn set_inner(&self, key: K, value: V, expiration: Expiration) {
        let expires_at = self.core.expires_at(expiration);
        let mut items = self.items.write();

        if let Some(item) = items.get_mut(&key) {
            item.refresh(value, expires_at);
            return;
        }

        if items.len() >= self.core.capacity() {
            self.evict_one(&mut items);
        }
        items.insert(key.clone(), Item::new(key, value, expires_at));
    }

    /// Makes room for one insert: an expired entry if any, otherwise an
    /// arbitrary live one.
    fn evict_one(&self, items: &mut FxHashMap<K, Item<K, V>>) {
        let now = self.core.now();
        let victim = items
            .iter()
            .find(|(_, item)| item.is_expired(now))
            .or_else(|| items.iter().next())
            .map(|(key, _)| key.clone());

        if let Some(key) = victim {
            if let Some(item) = items.remove(&key) {
                self.core.notify_evicted(&key, item.value());
            }
        }
    }
}

impl<K, V> Cache<K, V> for SimpleCache<K, V>
where
    K: Eq + Hash + Clone + fmt::Debug + Send + Sync,
    V: Clone + Send + Sync,
{
    fn get(&self, key: &K) -> Result<V, KeyNotFoundError<V>> {
        {
            let items = self.items.read();
            if let Some(item) = items.get(key) {
                if !item.is_expired(self.core.now()) {
                    return Ok(item.value().clone());
                }
            }
        }
        // Lock released: the loader is user code.
        Err(self.core.miss(key))
    }

    fn get_if_present(&self, key: &K) -> Option<V> {
        let items = self.items.read();
        let item = items.get(key)?;
        if item.is_expired(self.core.now()) {
            return None;
        }
        Some(item.value().clone())
    }

    fn get_or_load(&self, key: &K) -> Result<V, KeyNotFoundError<V>> {
        if let Some(value) = self.get_if_present(key) {
            return Ok(value);
        }
        let value = self.core.load(key)?;
        self.set(key.clone(), value.clone());
        Ok(value)
    }

    fn set(&self, key: K, value: V) {
        self.set_inner(key, value, Expiration::Default);
    }

    fn set_with_expire(&self, key: K, value: V, expiration: Expiration) {
        self.set_inner(key, value, expiration);
    }

    fn has(&self, key: &K) -> bool {
        let items = self.items.read();
        items
            .get(key)
            .map(|item| !item.is_expired(self.core.now()))
            .unwrap_or(false)
    }

    fn remove(&self, key: &K) -> bool {
        let mut items = self.items.write();
        match items.remove(key) {
            Some(item) => {
                self.core.notify_evicted(key, item.value());
                !item.is_expired(self.core.now())
            }
            None => false,
        }
    }

    fn keys(&self) -> Vec<K> {
        let items = self.items.read();
        let now = self.core.now();
        items
            .iter()
            .filter(|(_, item)| !item.is_expired(now))
            .map(|(key, _)| key.clone())
            .collect()
    }

    fn clean_expired(&self) -> usize {
        let mut items = self.items.write();
        let now = self.core.now();
        let expired: Vec<K> = items
            .iter()
            .filter(|(_, item)| item.is_expired(now))
            .map(|(key, _)| key.clone())
            .collect();

        for key in &expired {
            if let Some(item) = items.remove(key) {
                self.core.notify_evicted(key, item.value());
            }
        }
        expired.len()
    }

    fn flush(&self) {
        let mut items = self.items.write();
        *items = FxHashMap::with_capacity_and_hasher(self.core.capacity(), Default::default());
    }

    fn len(&self) -> usize {
        self.items.read().len()
    }

    fn capacity(&self) -> usize {
        self.core.capacity()
    }

    fn name(&self) -> &str {
        self.core.name()
    }

    fn id(&self) -> CacheId {
        self.core.id()
    }

    fn default_ttl(&self) -> Option<std::time::Duration> {
        self.core.default_ttl()
    }
}

impl<K, V> fmt::Debug for SimpleCache<K, V>
where
    K: Eq + Hash + Clone + fmt::Debug,
    V: Clone,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SimpleCache")
            .field("core", &self.core)
            .field("len", &self.items.read().len())
            .finish()
    }
}
