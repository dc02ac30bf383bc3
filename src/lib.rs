//! evictkit: bounded in-process key/value caches with interchangeable
//! eviction policies.
//!
//! Four engines — [`SIMPLE`], [`LRU`], [`LFU`], and [`ARC`] — share one
//! [`Cache`] contract, per-entry TTL expiration, a loader fallback, an
//! eviction hook, and a background [purger](crate::purge).
//!
//! ```
//! use std::time::Duration;
//! use evictkit::{new_builder, Cache, Expiration, LRU};
//!
//! let cache = new_builder::<String, String>(LRU, 1024)
//!     .unwrap()
//!     .set_name("pages")
//!     .set_default_expiration(Expiration::After(Duration::from_secs(300)))
//!     .build();
//!
//! cache.set("home".to_string(), "<html>...".to_string());
//! assert_eq!(cache.get(&"home".to_string()).unwrap(), "<html>...");
//! ```
//!
//! See `DESIGN.md` for internal architecture and invariants.

pub mod builder;
pub mod clock;
pub mod core;
pub mod ds;
pub mod error;
pub mod item;
pub mod policy;
pub mod purge;
pub mod traits;

pub use self::builder::{new_builder, CacheBuilder, ARC, DEFAULT_TTL, LFU, LRU, SIMPLE};
pub use self::core::CacheId;
pub use self::error::{AlreadyPurgingError, BuildError, KeyNotFoundError, LoaderError};
pub use self::item::Expiration;
pub use self::purge::{start_purge, stop_purge};
pub use self::traits::Cache;
