//! Cache entry envelope and expiration selection.
//!
//! ## Key Components
//!
//! - [`Item`]: the `(key, value, optional absolute expiry)` triple every
//!   engine stores.
//! - [`Expiration`]: how a `set` chooses an entry's lifetime — the cache
//!   default, never, or an explicit duration.
//!
//! An item with no expiry lives until evicted. An item with expiry `t` is
//! expired exactly when `now > t`; expired items remain in the engine (and
//! are counted by `len`) until a sweep, an eviction, or a `remove` takes
//! them out, but are invisible to `get`, `has`, and `keys`.

use std::time::{Duration, Instant};

/// Selects the lifetime of an entry at insertion time.
///
/// Replaces the sentinel durations of classic TTL-cache APIs with an enum:
/// `Default` defers to the cache-wide TTL configured at build time, `Never`
/// disables expiry for the entry, and `After(d)` sets an explicit TTL.
///
/// # Example
///
/// ```
/// use std::time::Duration;
/// use evictkit::item::Expiration;
///
/// let e = Expiration::default();
/// assert_eq!(e, Expiration::Default);
///
/// let _ttl = Expiration::After(Duration::from_secs(30));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Expiration {
    /// Use the cache's configured default TTL.
    #[default]
    Default,
    /// The entry never expires.
    Never,
    /// The entry expires this long after insertion.
    After(Duration),
}

/// A single cache entry: key, value, and optional absolute expiry instant.
#[derive(Debug, Clone)]
pub struct Item<K, V> {
    pub(crate) key: K,
    pub(crate) value: V,
    pub(crate) expires_at: Option<Instant>,
}

impl<K, V> Item<K, V> {
    /// Creates an item with the given expiry (`None` = never expires).
    pub fn new(key: K, value: V, expires_at: Option<Instant>) -> Self {
        Self {
            key,
            value,
            expires_at,
        }
    }

    /// Returns the entry's key.
    pub fn key(&self) -> &K {
        &self.key
    }

    /// Returns the entry's value.
    pub fn value(&self) -> &V {
        &self.value
    }

    /// Returns the absolute expiry instant, if the entry expires at all.
    pub fn expires_at(&self) -> Option<Instant> {
        self.expires_at
    }

    /// Returns `true` if the entry has expired as of `now`.
    pub fn is_expired(&self, now: Instant) -> bool {
        match self.expires_at {
            Some(at) => now > at,
            None => false,
        }
    }

    /// Replaces the value and expiry in place; used by `set` on an existing key.
    pub(crate) fn refresh(&mut self, value: V, expires_at: Option<Instant>) {
        self.value = value;
        self.expires_at = expires_at;
    }
}
