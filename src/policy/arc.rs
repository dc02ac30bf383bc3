//! Adaptive Replacement Cache (ARC) engine.
//!
//! ARC balances recency against frequency automatically by splitting the
//! cache into four lists and tuning a target parameter from ghost-hit
//! feedback.
//!
//! ## Architecture
//!
//! ```text
//! ┌────────────────────────────────────────────────────────────────────────┐
//! │                          ArcCache<K, V>                                │
//! │                                                                        │
//! │   T1 (seen once, recency)            T2 (seen twice+, frequency)       │
//! │   ┌─────────────────────────┐        ┌─────────────────────────┐       │
//! │   │ MRU               LRU   │        │ MRU               LRU   │       │
//! │   │ [item] ◄──► [item] ◄─┐  │        │ [item] ◄──► [item] ◄─┐  │       │
//! │   └──────────────────────┼──┘        └──────────────────────┼──┘       │
//! │                        evict                              evict        │
//! │                          │                                  │          │
//! │                          ▼                                  ▼          │
//! │   B1 (ghosts of T1)                  B2 (ghosts of T2)                 │
//! │   ┌─────────────────────────┐        ┌─────────────────────────┐       │
//! │   │ keys only, no values    │        │ keys only, no values    │       │
//! │   └─────────────────────────┘        └─────────────────────────┘       │
//! │                                                                        │
//! │   p: target size of T1 ∈ [0, capacity], initially capacity / 2         │
//! │   • hit in B1 → p grows  (workload favors recency)                     │
//! │   • hit in B2 → p shrinks (workload favors frequency)                  │
//! └────────────────────────────────────────────────────────────────────────┘
//!
//! Access Flow (key resident in T1/T2)
//! ────────────────────────────────────
//!   get(key):
//!     in T1 → promote to T2 MRU (the entry has now been seen twice)
//!     in T2 → move to T2 MRU
//!
//! Ghost Hit Flow (key in B1/B2)
//! ─────────────────────────────
//!   set(key, v):
//!     in B1 → p += max(|B2|/|B1|, 1); replace; insert at T2 MRU
//!     in B2 → p -= max(|B1|/|B2|, 1); replace; insert at T2 MRU
//!
//! Replace (make room by ghosting one resident entry)
//! ──────────────────────────────────────────────────
//!   if |T1| > 0 and (|T1| > p, or key ∈ B2 and |T1| == p):
//!     pop T1 LRU → push key into B1
//!   else:
//!     pop T2 LRU → push key into B2
//! ```
//!
//! ## Size Invariants
//!
//! At every quiescent moment: `|T1|+|T2| <= N`, `|T1|+|B1| <= N`,
//! `|T1|+|T2|+|B1|+|B2| <= 2N`, and `0 <= p <= N`. The complete-miss flow
//! enforces them: when `|T1|+|B1| == N` with T1 full, the T1 victim is
//! dropped *without* a ghost; when the directory reaches `2N`, B2's oldest
//! ghost is discarded before replacement.
//!
//! ## References
//!
//! - Megiddo & Modha, "ARC: A Self-Tuning, Low Overhead Replacement
//!   Cache", FAST 2003

use std::fmt;
use std::hash::Hash;

use parking_lot::RwLock;

use crate::core::{CacheCore, CacheId};
use crate::ds::OrderedIndex;
use crate::error::KeyNotFoundError;
use crate::item::{Expiration, Item};
use crate::traits::Cache;

/// The four ARC lists plus the adaptation parameter.
///
/// T1 and T2 own the resident items (the "items map" of classic ARC
/// write-ups is their union); B1 and B2 carry keys only, so the type system
/// guarantees ghosts hold no values.
struct ArcState<K, V> {
    t1: OrderedIndex<K, Item<K, V>>,
    t2: OrderedIndex<K, Item<K, V>>,
    b1: OrderedIndex<K, ()>,
    b2: OrderedIndex<K, ()>,
    p: usize,
}

impl<K, V> ArcState<K, V>
where
    K: Eq + Hash + Clone,
{
    fn new(capacity: usize) -> Self {
        Self {
            t1: OrderedIndex::with_capacity(capacity),
            t2: OrderedIndex::with_capacity(capacity),
            b1: OrderedIndex::with_capacity(capacity),
            b2: OrderedIndex::with_capacity(capacity),
            p: capacity / 2,
        }
    }

    fn resident_len(&self) -> usize {
        self.t1.len() + self.t2.len()
    }

    fn directory_len(&self) -> usize {
        self.resident_len() + self.b1.len() + self.b2.len()
    }
}

/// Adaptive replacement cache engine.
///
/// # Example
///
/// ```
/// use evictkit::policy::arc::ArcCache;
/// use evictkit::Cache;
///
/// let cache = ArcCache::new(4);
/// cache.set(1, "a");
/// assert_eq!(cache.t1_len(), 1); // new entries land in T1
///
/// cache.get(&1).unwrap(); // second touch promotes to T2
/// assert_eq!(cache.t1_len(), 0);
/// assert_eq!(cache.t2_len(), 1);
/// ```
pub struct ArcCache<K, V> {
    core: CacheCore<K, V>,
    state: RwLock<ArcState<K, V>>,
}

impl<K, V> ArcCache<K, V>
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
            state: RwLock::new(ArcState::new(capacity)),
        }
    }

    /// Number of entries in T1 (seen once recently).
    pub fn t1_len(&self) -> usize {
        self.state.read().t1.len()
    }

    /// Number of entries in T2 (seen at least twice).
    pub fn t2_len(&self) -> usize {
        self.state.read().t2.len()
    }

    /// Number of ghost keys in B1.
    pub fn b1_len(&self) -> usize {
        self.state.read().b1.len()
    }

    /// Number of ghost keys in B2.
    pub fn b2_len(&self) -> usize {
        self.state.read().b2.len()
    }

    /// Current value of the adaptation parameter `p` (target size of T1).
    pub fn p_value(&self) -> usize {
        self.state.read().p
    }

    /// Hit path shared by `get` and `get_if_present`: a T1 hit promotes to
    /// T2 MRU, a T2 hit moves to T2 MRU.
    fn touch(&self, key: &K) -> Option<V> {
        let now = self.core.now();
        let mut state = self.state.write();

        if let Some(item) = state.t1.get(key) {
            if item.is_expired(now) {
                return None;
            }
            if let Some(item) = state.t1.remove(key) {
                state.t2.push_front(key.clone(), item);
            }
            return state.t2.get(key).map(|item| item.value().clone());
        }

        if let Some(item) = state.t2.get(key) {
            if item.is_expired(now) {
                return None;
            }
            let value = item.value().clone();
            state.t2.move_to_front(key);
            return Some(value);
        }

        None
    }

    fn set_inner(&self, key: K, value: V, expiration: Expiration) {
        if self.core.capacity() == 0 {
            return;
        }
        let expires_at = self.core.expires_at(expiration);
        let mut state = self.state.write();

        // Resident in T1: refresh and promote (an update is a second touch).
        if state.t1.contains(&key) {
            if let Some(mut item) = state.t1.remove(&key) {
                item.refresh(value, expires_at);
                state.t2.push_front(key, item);
            }
            return;
        }

        // Resident in T2: refresh in place and move to MRU.
        if state.t2.contains(&key) {
            if let Some(item) = state.t2.get_mut(&key) {
                item.refresh(value, expires_at);
            }
            state.t2.move_to_front(&key);
            return;
        }

        let item = Item::new(key.clone(), value, expires_at);

        // Ghost hit in B1: the workload wants more recency room.
        if state.b1.contains(&key) {
            let delta = (state.b2.len() / state.b1.len()).max(1);
            state.p = (state.p + delta).min(self.core.capacity());
            self.replace(&mut state, &key);
            state.b1.remove(&key);
            state.t2.push_front(key, item);
            return;
        }

        // Ghost hit in B2: the workload wants more frequency room.
        if state.b2.contains(&key) {
            let delta = (state.b1.len() / state.b2.len()).max(1);
            state.p = state.p.saturating_sub(delta);
            self.replace(&mut state, &key);
            state.b2.remove(&key);
            state.t2.push_front(key, item);
            return;
        }

        // Complete miss.
        let capacity = self.core.capacity();
        if state.t1.len() + state.b1.len() == capacity {
            if state.t1.len() < capacity {
                state.b1.pop_back();
                self.replace(&mut state, &key);
            } else {
                // B1 is empty and T1 full: the victim leaves without a ghost.
                if let Some((victim, old)) = state.t1.pop_back() {
                    self.core.notify_evicted(&victim, old.value());
                }
            }
        } else if state.directory_len() >= capacity {
            if state.directory_len() >= 2 * capacity {
                state.b2.pop_back();
            }
            self.replace(&mut state, &key);
        }

        state.t1.push_front(key, item);
    }

    /// Makes room by ghosting one resident entry, steered by `p`.
    fn replace(&self, state: &mut ArcState<K, V>, key: &K) {
        let prefer_t1 = !state.t1.is_empty()
            && (state.t1.len() > state.p
                || (state.b2.contains(key) && state.t1.len() == state.p));

        if prefer_t1 {
            if let Some((victim, item)) = state.t1.pop_back() {
                self.core.notify_evicted(&victim, item.value());
                state.b1.push_front(victim, ());
                return;
            }
        }

        if let Some((victim, item)) = state.t2.pop_back() {
            self.core.notify_evicted(&victim, item.value());
            state.b2.push_front(victim, ());
        } else if let Some((victim, item)) = state.t1.pop_back() {
            // T2 empty: fall back to T1 so the insert still finds room.
            self.core.notify_evicted(&victim, item.value());
            state.b1.push_front(victim, ());
        }
    }

    #[cfg(any(test, debug_assertions))]
    pub fn debug_validate_invariants(&self) {
        let state = self.state.read();
        let capacity = self.core.capacity();

        assert!(state.resident_len() <= capacity, "resident overflow");
        assert!(state.t1.len() + state.b1.len() <= capacity, "L1 overflow");
        assert!(state.directory_len() <= 2 * capacity, "directory overflow");
        assert!(state.p <= capacity, "p out of range");

        for (key, _) in state.t1.iter() {
            assert!(!state.t2.contains(key), "key resident in both T1 and T2");
            assert!(!state.b1.contains(key), "resident key ghosted in B1");
            assert!(!state.b2.contains(key), "resident key ghosted in B2");
        }
        for (key, _) in state.t2.iter() {
            assert!(!state.b1.contains(key), "resident key ghosted in B1");
            assert!(!state.b2.contains(key), "resident key ghosted in B2");
        }
    }
}

impl<K, V> Cache<K, V> for ArcCache<K, V>
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
        let state = self.state.read();
        let now = self.core.now();
        state
            .t1
            .get(key)
            .or_else(|| state.t2.get(key))
            .map(|item| !item.is_expired(now))
            .unwrap_or(false)
    }

    fn remove(&self, key: &K) -> bool {
        let mut state = self.state.write();
        let item = match state.t1.remove(key) {
            Some(item) => item,
            None => match state.t2.remove(key) {
                Some(item) => item,
                None => return false,
            },
        };
        self.core.notify_evicted(key, item.value());
        !item.is_expired(self.core.now())
    }

    fn keys(&self) -> Vec<K> {
        let state = self.state.read();
        let now = self.core.now();
        state
            .t1
            .iter()
            .chain(state.t2.iter())
            .filter(|(_, item)| !item.is_expired(now))
            .map(|(key, _)| key.clone())
            .collect()
    }

    fn clean_expired(&self) -> usize {
        let mut state = self.state.write();
        let now = self.core.now();
        let expired: Vec<K> = state
            .t1
            .iter()
            .chain(state.t2.iter())
            .filter(|(_, item)| item.is_expired(now))
            .map(|(key, _)| key.clone())
            .collect();

        for key in &expired {
            let item = state.t1.remove(key).or_else(|| state.t2.remove(key));
            if let Some(item) = item {
                self.core.notify_evicted(key, item.value());
            }
        }
        expired.len()
    }

    fn flush(&self) {
        let mut state = self.state.write();
        *state = ArcState::new(self.core.capacity());
    }

    fn len(&self) -> usize {
        self.state.read().resident_len()
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

impl<K, V> fmt::Debug for ArcCache<K, V>
where
    K: Eq + Hash + Clone + fmt::Debug,
    V: Clone,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.state.read();
        f.debug_struct("ArcCache")
            .field("capacity", &self.core.capacity())
            .field("t1_len", &state.t1.len())
            .field("t2_len", &state.t2.len())
            .field("b1_len", &state.b1.len())
            .field("b2_len", &state.b2.len())
            .field("p", &state.p)
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
    fn new_cache_starts_balanced() {
        let cache: ArcCache<u32, u32> = ArcCache::new(10);
        assert_eq!(cache.len(), 0);
        assert_eq!(cache.t1_len(), 0);
        assert_eq!(cache.t2_len(), 0);
        assert_eq!(cache.b1_len(), 0);
        assert_eq!(cache.b2_len(), 0);
        assert_eq!(cache.p_value(), 5);
    }

    #[test]
    fn get_promotes_t1_to_t2() {
        let cache = ArcCache::new(10);
        cache.set("k", 1);
        assert_eq!(cache.t1_len(), 1);

        assert_eq!(cache.get(&"k").unwrap(), 1);
        assert_eq!(cache.t1_len(), 0);
        assert_eq!(cache.t2_len(), 1);

        // Subsequent hits stay in T2.
        assert_eq!(cache.get(&"k").unwrap(), 1);
        assert_eq!(cache.t2_len(), 1);
        cache.debug_validate_invariants();
    }

    #[test]
    fn set_existing_in_t1_promotes() {
        let cache = ArcCache::new(10);
        cache.set("k", 1);
        cache.set("k", 2);

        assert_eq!(cache.len(), 1);
        assert_eq!(cache.t1_len(), 0);
        assert_eq!(cache.t2_len(), 1);
        assert_eq!(cache.get_if_present(&"k"), Some(2));
    }

    #[test]
    fn insert_only_workload_drops_t1_victim_without_ghost() {
        let cache = ArcCache::new(2);
        cache.set("a", 1);
        cache.set("b", 2);
        cache.set("c", 3);

        assert_eq!(cache.len(), 2);
        assert!(!cache.has(&"a"));
        // |T1|+|B1| == N with T1 full: "a" left the directory entirely.
        assert_eq!(cache.b1_len(), 0);
        cache.debug_validate_invariants();
    }

    #[test]
    fn replace_ghosts_t1_victim_into_b1() {
        let cache = ArcCache::new(4);
        cache.set("a", 1);
        cache.set("b", 2);
        cache.set("c", 3);
        cache.set("d", 4);
        cache.get(&"a").unwrap(); // T1=[d,c,b], T2=[a]

        cache.set("e", 5); // |T1|=3 > p=2: b ghosts into B1

        assert!(!cache.has(&"b"));
        assert_eq!(cache.b1_len(), 1);
        assert_eq!(cache.t1_len(), 3);
        assert_eq!(cache.t2_len(), 1);
        cache.debug_validate_invariants();
    }

    #[test]
    fn b1_ghost_hit_promotes_to_t2_and_grows_p() {
        let cache = ArcCache::new(4);
        cache.set("a", 1);
        cache.set("b", 2);
        cache.set("c", 3);
        cache.set("d", 4);
        cache.get(&"a").unwrap();
        cache.set("e", 5); // b → B1
        assert!(cache.b1_len() > 0);
        let p_before = cache.p_value();

        cache.set("b", 20); // ghost hit in B1

        assert!(cache.p_value() > p_before);
        assert_eq!(cache.get_if_present(&"b"), Some(20));
        assert_eq!(cache.b1_len(), 0);
        // b re-entered as a frequent entry.
        assert!(cache.t2_len() >= 1);
        cache.debug_validate_invariants();
    }

    #[test]
    fn b2_ghost_hit_shrinks_p() {
        let cache = ArcCache::new(4);
        cache.set("a", 1);
        cache.set("b", 2);
        cache.set("c", 3);
        cache.set("d", 4);
        cache.get(&"a").unwrap();
        cache.set("e", 5); // b → B1
        cache.set("b", 20); // B1 hit: p grows, T2 LRU (a) → B2
        assert!(cache.b2_len() > 0);
        let p_before = cache.p_value();

        cache.set("a", 10); // ghost hit in B2

        assert!(cache.p_value() < p_before);
        assert_eq!(cache.get_if_present(&"a"), Some(10));
        assert_eq!(cache.b2_len(), 0);
        cache.debug_validate_invariants();
    }

    #[test]
    fn remove_touches_only_resident_lists() {
        let cache = ArcCache::new(4);
        cache.set("a", 1);
        cache.set("b", 2);
        cache.get(&"a").unwrap();

        assert!(cache.remove(&"a")); // from T2
        assert!(cache.remove(&"b")); // from T1
        assert!(!cache.remove(&"a"));
        assert_eq!(cache.len(), 0);
        cache.debug_validate_invariants();
    }

    #[test]
    fn expired_entries_hidden_until_swept() {
        let clock = Arc::new(ManualClock::new());
        let cache: ArcCache<&'static str, i32> = ArcCache::with_core(CacheCore::new(
            "arc-test".into(),
            crate::core::CacheId::mint(),
            4,
            Some(Duration::from_secs(1)),
            clock.clone(),
            None,
            None,
        ));

        cache.set("x", 1);
        cache.get(&"x").unwrap(); // now in T2
        cache.set("y", 2); // stays in T1
        clock.advance(Duration::from_secs(2));

        assert!(!cache.has(&"x"));
        assert!(!cache.has(&"y"));
        assert!(cache.keys().is_empty());
        assert_eq!(cache.len(), 2);

        assert_eq!(cache.clean_expired(), 2);
        assert_eq!(cache.len(), 0);
        cache.debug_validate_invariants();
    }

    #[test]
    fn eviction_hook_fires_on_replace() {
        let count = Arc::new(AtomicUsize::new(0));
        let hook: BeforeEvictedFn<u32, u32> = {
            let count = count.clone();
            Arc::new(move |_, _| {
                count.fetch_add(1, Ordering::SeqCst);
            })
        };
        let cache: ArcCache<u32, u32> = ArcCache::with_core(CacheCore::new(
            "hooked".into(),
            crate::core::CacheId::mint(),
            2,
            None,
            crate::clock::system_clock(),
            None,
            Some(hook),
        ));

        cache.set(1, 1);
        cache.set(2, 2);
        cache.set(3, 3); // one eviction
        assert_eq!(count.load(Ordering::SeqCst), 1);

        cache.remove(&3);
        assert_eq!(count.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn flush_resets_all_lists_and_p() {
        let cache = ArcCache::new(4);
        for i in 0..8u32 {
            cache.set(i, i);
        }
        cache.get(&7).unwrap();
        cache.flush();

        assert_eq!(cache.len(), 0);
        assert_eq!(cache.t1_len(), 0);
        assert_eq!(cache.t2_len(), 0);
        assert_eq!(cache.b1_len(), 0);
        assert_eq!(cache.b2_len(), 0);
        assert_eq!(cache.p_value(), 2);
    }

    #[test]
    fn zero_capacity_accepts_nothing() {
        let cache: ArcCache<u32, u32> = ArcCache::new(0);
        cache.set(1, 1);
        assert_eq!(cache.len(), 0);
        assert!(!cache.has(&1));
    }

    #[test]
    fn mixed_workload_preserves_invariants() {
        let cache = ArcCache::new(8);
        for round in 0u32..6 {
            for i in 0..12u32 {
                cache.set(i, i + round);
                if i % 3 == 0 {
                    let _ = cache.get(&i);
                }
                cache.debug_validate_invariants();
            }
        }
    }
}
