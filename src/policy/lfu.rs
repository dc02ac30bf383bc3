//! Least-frequently-used cache engine.
//!
//! Entries live in a [`FreqHeap`]: an indexed min-heap ordered by access
//! count, so the eviction victim is always at the root. A hit bumps the
//! entry's frequency and repairs the heap in O(log n); a `set` on an
//! existing key refreshes value and expiry in place without touching the
//! frequency; a `set` at capacity pops the heap root.
//!
//! New entries start at frequency 0. Ties between equal frequencies break
//! by heap position, so among never-touched entries the victim is
//! unspecified but always minimal.

use std::fmt;
use std::hash::Hash;

use parking_lot::RwLock;

use crate::core::{CacheCore, CacheId};
use crate::ds::FreqHeap;
use crate::error::KeyNotFoundError;
use crate::item::{Expiration, Item};
use crate::traits::Cache;

/// Frequency-ordered cache engine.
///
/// # Example
///
/// ```
/// use evictkit::policy::lfu::LfuCache;
/// use evictkit::Cache;
///
/// let cache = LfuCache::new(2);
/// cache.set(1, "a");
/// cache.set(2, "b");
///
/// cache.get(&1).unwrap(); // freq(1) = 1, freq(2) = 0
/// cache.set(3, "c");      // evicts 2: minimum frequency
///
/// assert!(cache.has(&1));
/// assert!(!cache.has(&2));
/// ```
pub struct LfuCache<K, V> {
    core: CacheCore<K, V>,
    heap: RwLock<FreqHeap<K, Item<K, V>>>,
}

impl<K, V> LfuCache<K, V>
where
    K: Eq + Hash + Clone + fmt::Debug,
    V: Clone,
{
    /// Creates a cache with the given capacity and default configuration.
    pub fn new(capacity: usize) -> Self {
        Self::with_core(CacheCore::with_capacity(capacity))
    }

    pub(crate) fn with_core(core: CacheCore<K, V>) -> Self {
        let capacity = core.capacity();
        Self {
            core,
            heap: RwLock::new(FreqHeap::with_capacity(capacity)),
        }
    }

    /// Returns the access frequency recorded for `key`, if present.
    pub fn frequency(&self, key: &K) -> Option<u64> {
        self.heap.read().freq(key)
    }

    /// Hit path shared by `get` and `get_if_present`: bump the frequency
    /// and clone the value.
    fn touch(&self, key: &K) -> Option<V> {
        let mut heap = self.heap.write();
        let live = match heap.get(key) {
            Some(item) => !item.is_expired(self.core.now()),
            None => return None,
        };
        if !live {
            return None;
        }
        let _ = heap.bump(key);
        heap.get(key).map(|item| item.value().clone())
    }

    fn set_inner(&self, key: K, value: V, expiration: Expiration) {
        let expires_at = self.core.expires_at(expiration);
        let mut heap = self.heap.write();

        if let Some(item) = heap.get_mut(&key) {
            // Frequency is deliberately untouched on update.
            item.refresh(value, expires_at);
            return;
        }

        if heap.len() >= self.core.capacity() {
            if let Some((victim, item, _)) = heap.pop_min() {
                self.core.notify_evicted(&victim, item.value());
            }
        }
        heap.push(key.clone(), Item::new(key, value, expires_at));
    }
}

impl<K, V> Cache<K, V> for LfuCache<K, V>
where
    K: Eq + Hash + Clone + fmt::Debug + Send + Sync,
    V: Clone + Send + Sync,
{
    fn get(&self, key: &K) -> Result<V, KeyNotFoundError<V>> {
        match self.touch(key) {
            Some(value) => Ok(value),
            // Lock released: the loader is user code.
            None => Err(self.core.miss(key)),
        }
    }

    fn get_if_present(&self, key: &K) -> Option<V> {
        self.touch(key)
    }

    fn get_or_load(&self, key: &K) -> Result<V, KeyNotFoundError<V>> {
        if let Some(value) = self.touch(key) {
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
        let heap = self.heap.read();
        heap.get(key)
            .map(|item| !item.is_expired(self.core.now()))
            .unwrap_or(false)
    }

    fn remove(&self, key: &K) -> bool {
        let mut heap = self.heap.write();
        match heap.remove(key) {
            Some(item) => {
                self.core.notify_evicted(key, item.value());
                !item.is_expired(self.core.now())
            }
            None => false,
        }
    }

    fn keys(&self) -> Vec<K> {
        let heap = self.heap.read();
        let now = self.core.now();
        heap.iter()
            .filter(|(_, item)| !item.is_expired(now))
            .map(|(key, _)| key.clone())
            .collect()
    }

    fn clean_expired(&self) -> usize {
        let mut heap = self.heap.write();
        let now = self.core.now();
        let expired: Vec<K> = heap
            .iter()
            .filter(|(_, item)| item.is_expired(now))
            .map(|(key, _)| key.clone())
            .collect();

        for key in &expired {
            if let Some(item) = heap.remove(key) {
                self.core.notify_evicted(key, item.value());
            }
        }
        expired.len()
    }

    fn flush(&self) {
        let mut heap = self.heap.write();
        *heap = FreqHeap::with_capacity(self.core.capacity());
    }

    fn len(&self) -> usize {
        self.heap.read().len()
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

impl<K, V> fmt::Debug for LfuCache<K, V>
where
    K: Eq + Hash + Clone + fmt::Debug,
    V: Clone,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LfuCache")
            .field("core", &self.core)
            .field("len", &self.heap.read().len())
            .finish()
    }
}
