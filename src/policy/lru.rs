//! Least-recently-used cache engine.
//!
//! Classic LRU over an [`OrderedIndex`]: the list front is the MRU
//! position, the back is the eviction victim. A hit — `get` or
//! `get_if_present` — moves the entry to the front, as does `set` on an
//! existing key (which also refreshes value and expiry in place). A `set`
//! at capacity pops the back entry and fires the before-evicted hook.
//!
//! Because hits reorder the list, every access path takes the exclusive
//! lock; only `has`, `keys`, and `len` run under the shared lock.

use std::fmt;
use std::hash::Hash;

use parking_lot::RwLock;

use crate::core::{CacheCore, CacheId};
use crate::ds::OrderedIndex;
use crate::error::KeyNotFoundError;
use crate::item::{Expiration, Item};
use crate::traits::Cache;

/// Recency-ordered cache engine.
///
/// # Example
///
/// ```
/// use evictkit::policy::lru::LruCache;
/// use evictkit::Cache;
///
/// let cache = LruCache::new(2);
/// cache.set(1, "a");
/// cache.set(2, "b");
///
/// cache.get(&1).unwrap(); // 1 becomes MRU
/// cache.set(3, "c");      // evicts 2
///
/// assert!(cache.has(&1));
/// assert!(!cache.has(&2));
/// ```
pub struct LruCache<K, V> {
    core: CacheCore<K, V>,
    index: RwLock<OrderedIndex<K, Item<K, V>>>,
}

impl<K, V> LruCache<K, V>
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
            index: RwLock::new(OrderedIndex::with_capacity(capacity)),
        }
    }

    /// Hit path shared by `get` and `get_if_present`: promote to MRU and
    /// clone the value.
    fn touch(&self, key: &K) -> Option<V> {
        let mut index = self.index.write();
        let live = match index.get(key) {
            Some(item) => !item.is_expired(self.core.now()),
            None => return None,
        };
        if !live {
            return None;
        }
        index.move_to_front(key);
        index.get(key).map(|item| item.value().clone())
    }

    fn set_inner(&self, key: K, value: V, expiration: Expiration) {
        let expires_at = self.core.expires_at(expiration);
        let mut index = self.index.write();

        if let Some(item) = index.get_mut(&key) {
            item.refresh(value, expires_at);
            index.move_to_front(&key);
            return;
        }

        if index.len() >= self.core.capacity() {
            if let Some((victim, item)) = index.pop_back() {
                self.core.notify_evicted(&victim, item.value());
            }
        }
        index.push_front(key.clone(), Item::new(key, value, expires_at));
    }
}

impl<K, V> Cache<K, V> for LruCache<K, V>
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
        let index = self.index.read();
        index
            .get(key)
            .map(|item| !item.is_expired(self.core.now()))
            .unwrap_or(false)
    }

    fn remove(&self, key: &K) -> bool {
        let mut index = self.index.write();
        match index.remove(key) {
            Some(item) => {
                self.core.notify_evicted(key, item.value());
                !item.is_expired(self.core.now())
            }
            None => false,
        }
    }

    fn keys(&self) -> Vec<K> {
        let index = self.index.read();
        let now = self.core.now();
        index
            .iter()
            .filter(|(_, item)| !item.is_expired(now))
            .map(|(key, _)| key.clone())
            .collect()
    }

    fn clean_expired(&self) -> usize {
        let mut index = self.index.write();
        let now = self.core.now();
        let expired: Vec<K> = index
            .iter()
            .filter(|(_, item)| item.is_expired(now))
            .map(|(key, _)| key.clone())
            .collect();

        for key in &expired {
            if let Some(item) = index.remove(key) {
                self.core.notify_evicted(key, item.value());
            }
        }
        expired.len()
    }

    fn flush(&self) {
        let mut index = self.index.write();
        *index = OrderedIndex::with_capacity(self.core.capacity());
    }

    fn len(&self) -> usize {
        self.index.read().len()
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

impl<K, V> fmt::Debug for LruCache<K, V>
where
    K: Eq + Hash + Clone + fmt::Debug,
    V: Clone,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LruCache")
            .field("core", &self.core)
            .field("len", &self.index.read().len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::core::BeforeEvictedFn;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use std::time::Duration;

    #[test]
    fn evicts_least_recently_touched() {
        let cache = LruCache::new(3);
        cache.set("a", 1);
        cache.set("b", 2);
        cache.set("c", 3);
        cache.get(&"a").unwrap();

        cache.set("d", 4); // b is LRU

        assert!(cache.has(&"a"));
        assert!(!cache.has(&"b"));
        assert!(cache.has(&"c"));
        assert!(cache.has(&"d"));
    }

    #[test]
    fn set_existing_updates_and_promotes() {
        let cache = LruCache::new(3);
        cache.set("a", 1);
        cache.set("b", 2);
        cache.set("c", 3);
        cache.set("a", 99); // a becomes MRU, value replaced

        cache.set("d", 4); // b is LRU

        assert_eq!(cache.get_if_present(&"a"), Some(99));
        assert!(!cache.has(&"b"));
        assert!(cache.has(&"c"));
        assert!(cache.has(&"d"));
        assert_eq!(cache.len(), 3);
    }

    #[test]
    fn get_if_present_registers_an_access() {
        let cache = LruCache::new(2);
        cache.set("a", 1);
        cache.set("b", 2);
        assert_eq!(cache.get_if_present(&"a"), Some(1));

        cache.set("c", 3); // b is LRU now, not a
        assert!(cache.has(&"a"));
        assert!(!cache.has(&"b"));
    }

    #[test]
    fn expired_hit_falls_through_to_miss() {
        let clock = Arc::new(ManualClock::new());
        let cache: LruCache<&'static str, i32> = LruCache::with_core(CacheCore::new(
            "lru-test".into(),
            crate::core::CacheId::mint(),
            4,
            Some(Duration::from_secs(1)),
            clock.clone(),
            None,
            None,
        ));

        cache.set("x", 1);
        clock.advance(Duration::from_secs(2));

        assert!(cache.get(&"x").is_err());
        assert_eq!(cache.get_if_present(&"x"), None);
        assert_eq!(cache.len(), 1);
        assert_eq!(cache.clean_expired(), 1);
        assert_eq!(cache.len(), 0);
    }

    #[test]
    fn eviction_hook_sees_victim() {
        let evicted = Arc::new(std::sync::Mutex::new(Vec::new()));
        let hook: BeforeEvictedFn<&'static str, i32> = {
            let evicted = evicted.clone();
            Arc::new(move |key, value| {
                evicted.lock().unwrap().push((*key, *value));
            })
        };
        let cache: LruCache<&'static str, i32> = LruCache::with_core(CacheCore::new(
            "hooked".into(),
            crate::core::CacheId::mint(),
            2,
            None,
            crate::clock::system_clock(),
            None,
            Some(hook),
        ));

        cache.set("a", 1);
        cache.set("b", 2);
        cache.set("c", 3); // evicts a
        cache.remove(&"b");

        assert_eq!(*evicted.lock().unwrap(), vec![("a", 1), ("b", 2)]);
    }

    #[test]
    fn eviction_hook_counts_each_removal_once() {
        let count = Arc::new(AtomicUsize::new(0));
        let hook: BeforeEvictedFn<u32, u32> = {
            let count = count.clone();
            Arc::new(move |_, _| {
                count.fetch_add(1, Ordering::SeqCst);
            })
        };
        let clock = Arc::new(ManualClock::new());
        let cache: LruCache<u32, u32> = LruCache::with_core(CacheCore::new(
            "hooked".into(),
            crate::core::CacheId::mint(),
            8,
            Some(Duration::from_secs(1)),
            clock.clone(),
            None,
            Some(hook),
        ));

        cache.set(1, 1);
        cache.set(2, 2);
        clock.advance(Duration::from_secs(2));
        assert_eq!(cache.clean_expired(), 2);
        assert_eq!(count.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn flush_resets_order_and_contents() {
        let cache = LruCache::new(2);
        cache.set("a", 1);
        cache.set("b", 2);
        cache.flush();
        assert_eq!(cache.len(), 0);

        cache.set("c", 3);
        cache.set("d", 4);
        cache.set("e", 5);
        assert!(!cache.has(&"c"));
        assert_eq!(cache.len(), 2);
    }
}
