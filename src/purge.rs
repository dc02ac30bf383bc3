//! Background expiration sweeping.
//!
//! [`start_purge`] spawns a thread that calls
//! [`clean_expired`](crate::traits::Cache::clean_expired) on a cache every
//! `period`, until [`stop_purge`] signals it. A process-wide table keyed by
//! [`CacheId`] guarantees at most one purger per cache; starting a second
//! one fails with [`AlreadyPurgingError`].
//!
//! Stopping is cooperative: an in-flight sweep finishes, the thread exits
//! at its next loop iteration and deregisters itself. `stop_purge` is
//! idempotent — stopping a cache that has no purger is a no-op.
//!
//! # Example
//!
//! ```
//! use std::time::Duration;
//! use evictkit::{new_builder, start_purge, stop_purge, SIMPLE};
//!
//! let cache = new_builder::<u64, u64>(SIMPLE, 16).unwrap().build();
//!
//! start_purge(cache.clone(), Duration::from_millis(100)).unwrap();
//! assert!(start_purge(cache.clone(), Duration::from_millis(100)).is_err());
//!
//! stop_purge(cache.as_ref());
//! stop_purge(cache.as_ref()); // idempotent
//! ```

use std::sync::Arc;
use std::thread;
use std::time::Duration;

use crossbeam_channel::{bounded, select, tick, Sender};
use log::{debug, trace};
use once_cell::sync::Lazy;
use parking_lot::Mutex;
use rustc_hash::FxHashMap;

use crate::core::CacheId;
use crate::error::AlreadyPurgingError;
use crate::traits::Cache;

/// One stop signal per purging cache, keyed by cache identity.
static PURGERS: Lazy<Mutex<FxHashMap<CacheId, Sender<()>>>> =
    Lazy::new(|| Mutex::new(FxHashMap::default()));

/// Starts a background purger sweeping `cache` every `period`.
///
/// Returns [`AlreadyPurgingError`] if the cache already has a purger. The
/// spawned thread holds a clone of the `Arc`, so the cache stays alive
/// until the purger is stopped.
pub fn start_purge<K, V>(
    cache: Arc<dyn Cache<K, V>>,
    period: Duration,
) -> Result<(), AlreadyPurgingError>
where
    K: 'static,
    V: 'static,
{
    let id = cache.id();
    let (stop_tx, stop_rx) = bounded::<()>(1);
    {
        let mut purgers = PURGERS.lock();
        if purgers.contains_key(&id) {
            return Err(AlreadyPurgingError::new(cache.name()));
        }
        purgers.insert(id, stop_tx);
    }

    debug!(
        "starting purger for `{}` with period {:?}",
        cache.name(),
        period
    );

    thread::spawn(move || {
        let ticker = tick(period);
        loop {
            select! {
                recv(stop_rx) -> _ => break,
                recv(ticker) -> _ => {
                    let removed = cache.clean_expired();
                    if removed > 0 {
                        trace!("purger swept {} expired entries from `{}`", removed, cache.name());
                    }
                }
            }
        }
        PURGERS.lock().remove(&id);
        debug!("purger for `{}` stopped", cache.name());
    });

    Ok(())
}

/// Signals the purger for `cache` to stop, if one is running.
///
/// Returns immediately; the purger finishes any in-flight sweep and exits
/// at its next loop iteration. Calling this without a running purger does
/// nothing.
pub fn stop_purge<K, V>(cache: &dyn Cache<K, V>) {
    let purgers = PURGERS.lock();
    if let Some(stop) = purgers.get(&cache.id()) {
        // A full buffer means a stop is already pending.
        let _ = stop.try_send(());
    }
}
