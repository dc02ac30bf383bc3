// ==============================================
// CROSS-POLICY CONTRACT TESTS (integration)
// ==============================================
//
// Every engine exposes the same contract; these tests run the universal
// invariants and the end-to-end scenarios against all four policies through
// the public builder. Policy-specific internals (ARC list sizes, LFU
// frequencies) are covered by unit tests inside the policy modules.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use evictkit::clock::ManualClock;
use evictkit::{new_builder, Cache, Expiration, ARC, LFU, LRU, SIMPLE};

const POLICIES: [&str; 4] = [SIMPLE, LRU, LFU, ARC];

fn build(policy: &str, capacity: usize) -> Arc<dyn Cache<&'static str, i32>> {
    new_builder(policy, capacity)
        .unwrap()
        .set_name(format!("contract-{policy}"))
        .set_default_expiration(Expiration::Never)
        .build()
}

fn build_with_clock(
    policy: &str,
    capacity: usize,
    ttl: Duration,
    clock: Arc<ManualClock>,
) -> Arc<dyn Cache<&'static str, i32>> {
    new_builder(policy, capacity)
        .unwrap()
        .set_default_expiration(Expiration::After(ttl))
        .set_clock(clock)
        .build()
}

// ==============================================
// Universal Invariants
// ==============================================

#[test]
fn flush_leaves_cache_empty() {
    for policy in POLICIES {
        let cache = build(policy, 4);
        cache.set("a", 1);
        cache.set("b", 2);
        cache.get(&"a").ok();

        cache.flush();
        assert_eq!(cache.len(), 0, "{policy}");
        assert!(cache.keys().is_empty(), "{policy}");
        assert!(cache.is_empty(), "{policy}");
    }
}

#[test]
fn len_never_exceeds_capacity_after_set() {
    let keys = [
        "k0", "k1", "k2", "k3", "k4", "k5", "k6", "k7", "k8", "k9", "k0", "k3", "k5",
    ];
    for policy in POLICIES {
        let cache = build(policy, 3);
        for (i, key) in keys.iter().enumerate() {
            cache.set(key, i as i32);
            assert!(cache.len() <= 3, "{policy}: len {} after set", cache.len());
        }
    }
}

#[test]
fn has_keys_and_get_if_present_agree() {
    for policy in POLICIES {
        let cache = build(policy, 4);
        cache.set("a", 1);
        cache.set("b", 2);

        for key in ["a", "b", "missing"] {
            let via_has = cache.has(&key);
            let via_keys = cache.keys().contains(&key);
            let via_get = cache.get_if_present(&key).is_some();
            assert_eq!(via_has, via_keys, "{policy}/{key}");
            assert_eq!(via_has, via_get, "{policy}/{key}");
        }
    }
}

#[test]
fn expired_keys_are_invisible_before_sweep() {
    for policy in POLICIES {
        let clock = Arc::new(ManualClock::new());
        let cache = build_with_clock(policy, 4, Duration::from_secs(1), clock.clone());

        cache.set("gone", 1);
        cache.set_with_expire("kept", 2, Expiration::Never);
        clock.advance(Duration::from_secs(3));

        assert!(!cache.has(&"gone"), "{policy}");
        assert_eq!(cache.get_if_present(&"gone"), None, "{policy}");
        assert_eq!(cache.keys(), vec!["kept"], "{policy}");
        // Unswept, so still counted.
        assert_eq!(cache.len(), 2, "{policy}");
    }
}

#[test]
fn clean_expired_counts_and_clears() {
    for policy in POLICIES {
        let clock = Arc::new(ManualClock::new());
        let cache = build_with_clock(policy, 8, Duration::from_secs(1), clock.clone());

        cache.set("a", 1);
        cache.set("b", 2);
        cache.set_with_expire("c", 3, Expiration::Never);
        clock.advance(Duration::from_secs(2));

        assert_eq!(cache.clean_expired(), 2, "{policy}");
        assert_eq!(cache.len(), 1, "{policy}");
        assert_eq!(cache.clean_expired(), 0, "{policy}");
    }
}

#[test]
fn before_evicted_fires_exactly_once_per_removal() {
    for policy in POLICIES {
        let clock = Arc::new(ManualClock::new());
        let count = Arc::new(AtomicUsize::new(0));
        let cache: Arc<dyn Cache<&'static str, i32>> = {
            let count = count.clone();
            new_builder(policy, 3)
                .unwrap()
                .set_default_expiration(Expiration::Never)
                .set_clock(clock.clone())
                .set_before_evicted(move |_, _| {
                    count.fetch_add(1, Ordering::SeqCst);
                })
                .build()
        };

        cache.set("a", 1);
        cache.set("b", 2);
        cache.set("c", 3);
        cache.set("d", 4); // one policy eviction
        assert_eq!(count.load(Ordering::SeqCst), 1, "{policy}: policy eviction");

        assert!(cache.remove(&"d"), "{policy}");
        assert_eq!(count.load(Ordering::SeqCst), 2, "{policy}: remove");

        cache.set_with_expire("x", 5, Expiration::After(Duration::from_secs(1)));
        clock.advance(Duration::from_secs(2));
        assert_eq!(cache.clean_expired(), 1, "{policy}");
        assert_eq!(count.load(Ordering::SeqCst), 3, "{policy}: sweep");
    }
}

#[test]
fn remove_is_true_only_for_live_entries() {
    for policy in POLICIES {
        let clock = Arc::new(ManualClock::new());
        let cache = build_with_clock(policy, 4, Duration::from_secs(1), clock.clone());

        cache.set("stale", 1);
        cache.set_with_expire("live", 2, Expiration::Never);
        clock.advance(Duration::from_secs(2));

        assert!(cache.remove(&"live"), "{policy}");
        assert!(!cache.remove(&"stale"), "{policy}: expired entry");
        assert!(!cache.remove(&"absent"), "{policy}");
    }
}

// ==============================================
// End-to-End Scenarios
// ==============================================

#[test]
fn scenario_lru_eviction_order() {
    let cache = build(LRU, 3);
    cache.set("a", 1);
    cache.set("b", 2);
    cache.set("c", 3);
    cache.get(&"a").unwrap();
    cache.set("d", 4);

    let mut keys = cache.keys();
    keys.sort_unstable();
    assert_eq!(keys, vec!["a", "c", "d"]);
    assert!(!cache.has(&"b"));
}

#[test]
fn scenario_lru_update_on_existing() {
    let cache = build(LRU, 3);
    cache.set("a", 1);
    cache.set("b", 2);
    cache.set("c", 3);
    cache.set("a", 99);
    cache.set("d", 4);

    assert_eq!(cache.get_if_present(&"a"), Some(99));
    assert!(cache.has(&"c"));
    assert!(cache.has(&"d"));
    assert!(!cache.has(&"b"));
    assert_eq!(cache.len(), 3);
}

#[test]
fn scenario_lfu_zero_frequency_is_evicted_first() {
    let cache = build(LFU, 3);
    cache.set("a", 1);
    cache.set("b", 2);
    cache.set("c", 3);
    cache.get(&"a").unwrap();
    cache.get(&"a").unwrap();
    cache.get(&"b").unwrap();
    cache.set("d", 4);

    assert!(cache.has(&"a"));
    assert!(cache.has(&"b"));
    assert!(!cache.has(&"c"));
    assert!(cache.has(&"d"));
}

#[test]
fn scenario_expiration_sweep() {
    for policy in POLICIES {
        let clock = Arc::new(ManualClock::new());
        let cache = build_with_clock(policy, 3, Duration::from_secs(1), clock.clone());

        cache.set("x", 1);
        clock.advance(Duration::from_secs(2));

        assert!(!cache.has(&"x"), "{policy}");
        assert_eq!(cache.clean_expired(), 1, "{policy}");
        assert_eq!(cache.len(), 0, "{policy}");
    }
}

#[test]
fn scenario_arc_ghost_promotion() {
    let cache = build(ARC, 4);
    cache.set("a", 1);
    cache.set("b", 2);
    cache.set("c", 3);
    cache.set("d", 4);
    cache.get(&"a").unwrap(); // a joins the frequent list
    cache.set("e", 5); // recency list over target: b is ghosted

    assert!(!cache.has(&"b"));

    // Re-setting the ghosted key is a ghost hit: it re-enters as frequent.
    cache.set("b", 20);
    assert_eq!(cache.get_if_present(&"b"), Some(20));
    assert!(cache.len() <= 4);
}

#[test]
fn scenario_loader_fallback_does_not_insert() {
    for policy in POLICIES {
        let cache: Arc<dyn Cache<&'static str, String>> = new_builder(policy, 3)
            .unwrap()
            .set_name(format!("loader-{policy}"))
            .set_default_expiration(Expiration::Never)
            .set_loader(|key: &&str| Ok(format!("LOADED:{key}")))
            .build();

        let err = cache.get(&"missing").unwrap_err();
        assert_eq!(
            err.fallback(),
            Some(&"LOADED:missing".to_string()),
            "{policy}"
        );
        assert!(err.loader_error().is_none(), "{policy}");
        assert_eq!(cache.len(), 0, "{policy}: contents unchanged");
        assert!(!cache.has(&"missing"), "{policy}");
    }
}

#[test]
fn scenario_failing_loader_surfaces_its_error() {
    for policy in POLICIES {
        let cache: Arc<dyn Cache<&'static str, String>> = new_builder(policy, 3)
            .unwrap()
            .set_name("flaky")
            .set_loader(|_: &&str| Err("origin down".into()))
            .build();

        let err = cache.get(&"k").unwrap_err();
        assert!(err.fallback().is_none(), "{policy}");
        assert_eq!(
            err.to_string(),
            "`flaky`: key `\"k\"` not found in the cache store \
             with loader function error: origin down",
            "{policy}"
        );
    }
}

#[test]
fn get_or_load_inserts_loaded_values() {
    for policy in POLICIES {
        let cache: Arc<dyn Cache<&'static str, String>> = new_builder(policy, 3)
            .unwrap()
            .set_default_expiration(Expiration::Never)
            .set_loader(|key: &&str| Ok(format!("LOADED:{key}")))
            .build();

        let value = cache.get_or_load(&"page").unwrap();
        assert_eq!(value, "LOADED:page", "{policy}");
        assert!(cache.has(&"page"), "{policy}: inserted on load");

        // Second call is a plain hit.
        assert_eq!(cache.get_or_load(&"page").unwrap(), "LOADED:page");
        assert_eq!(cache.len(), 1, "{policy}");
    }
}
