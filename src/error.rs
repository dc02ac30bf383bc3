//! Error types for the evictkit library.
//!
//! ## Key Components
//!
//! - [`KeyNotFoundError`]: returned by `get` when a key is absent, expired,
//!   or the loader failed. Carries the cache name, the offending key, an
//!   optional loader-produced fallback value, and an optional loader error.
//! - [`BuildError`]: returned by [`new_builder`](crate::builder::new_builder)
//!   when the policy name is unknown or the capacity is zero.
//! - [`AlreadyPurgingError`]: returned by
//!   [`start_purge`](crate::purge::start_purge) when the cache already has a
//!   background purger.
//!
//! Errors are returned to the caller immediately; nothing in the library
//! retries, logs an error, or panics on user input.

use std::error::Error;
use std::fmt;

/// Boxed error produced by a user-supplied loader.
pub type LoaderError = Box<dyn Error + Send + Sync + 'static>;

// ---------------------------------------------------------------------------
// KeyNotFoundError
// ---------------------------------------------------------------------------

/// Error returned when a `get` finds no live entry for a key.
///
/// If the cache has a loader, a *successful* load still produces this error:
/// the loaded value rides in [`fallback`](Self::fallback) and is **not**
/// inserted into the cache. A failed load carries the loader's error in
/// [`loader_error`](Self::loader_error) instead.
///
/// # Example
///
/// ```
/// use evictkit::{new_builder, Cache, LRU};
///
/// let cache = new_builder::<u32, String>(LRU, 8)
///     .unwrap()
///     .set_name("pages")
///     .set_loader(|key| Ok(format!("page-{key}")))
///     .build();
///
/// let err = cache.get(&7).unwrap_err();
/// assert_eq!(err.fallback(), Some(&"page-7".to_string()));
/// assert_eq!(
///     err.to_string(),
///     "`pages`: key `7` not found in the cache store"
/// );
/// assert_eq!(cache.len(), 0); // the loaded value was not inserted
/// ```
pub struct KeyNotFoundError<V> {
    cache: String,
    key: String,
    fallback: Option<V>,
    source: Option<LoaderError>,
}

impl<V> KeyNotFoundError<V> {
    /// Creates a plain miss error (no loader involved).
    pub fn new(cache: impl Into<String>, key: &impl fmt::Debug) -> Self {
        Self {
            cache: cache.into(),
            key: format!("{key:?}"),
            fallback: None,
            source: None,
        }
    }

    /// Creates a miss error carrying a loader-produced fallback value.
    pub fn with_fallback(cache: impl Into<String>, key: &impl fmt::Debug, value: V) -> Self {
        Self {
            fallback: Some(value),
            ..Self::new(cache, key)
        }
    }

    /// Creates a miss error carrying a loader failure.
    pub fn with_loader_error(
        cache: impl Into<String>,
        key: &impl fmt::Debug,
        err: LoaderError,
    ) -> Self {
        Self {
            source: Some(err),
            ..Self::new(cache, key)
        }
    }

    /// Name of the cache that reported the miss.
    pub fn cache(&self) -> &str {
        &self.cache
    }

    /// The missing key, rendered with `Debug`.
    pub fn key(&self) -> &str {
        &self.key
    }

    /// The loader's fallback value, if the loader ran and succeeded.
    pub fn fallback(&self) -> Option<&V> {
        self.fallback.as_ref()
    }

    /// Consumes the error, returning the fallback value if any.
    pub fn into_fallback(self) -> Option<V> {
        self.fallback
    }

    /// The loader's error, if the loader ran and failed.
    pub fn loader_error(&self) -> Option<&(dyn Error + Send + Sync + 'static)> {
        self.source.as_deref()
    }
}

impl<V> fmt::Display for KeyNotFoundError<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "`{}`: key `{}` not found in the cache store",
            self.cache, self.key
        )?;
        if let Some(err) = &self.source {
            write!(f, " with loader function error: {err}")?;
        }
        Ok(())
    }
}

// Hand-written so V does not need Debug.
impl<V> fmt::Debug for KeyNotFoundError<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KeyNotFoundError")
            .field("cache", &self.cache)
            .field("key", &self.key)
            .field("has_fallback", &self.fallback.is_some())
            .field("source", &self.source)
            .finish()
    }
}

impl<V> Error for KeyNotFoundError<V> {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        self.source
            .as_ref()
            .map(|err| err.as_ref() as &(dyn Error + 'static))
    }
}

// ---------------------------------------------------------------------------
// BuildError
// ---------------------------------------------------------------------------

/// Error returned when a cache cannot be configured.
///
/// Nothing is allocated when this fires; the builder rejects the
/// configuration before constructing an engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BuildError {
    /// No engine is registered under the given policy name.
    NoSuchPolicy {
        /// The name that failed to resolve.
        name: String,
    },
    /// The requested capacity was zero; every policy needs room for at
    /// least one entry.
    ZeroCapacity,
}

impl fmt::Display for BuildError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BuildError::NoSuchPolicy { name } => {
                write!(f, "no cache policy registered under `{name}`")
            }
            BuildError::ZeroCapacity => f.write_str("cache capacity must be at least 1"),
        }
    }
}

impl Error for BuildError {}

// ---------------------------------------------------------------------------
// AlreadyPurgingError
// ---------------------------------------------------------------------------

/// Error returned when a second purger is started for the same cache.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AlreadyPurgingError {
    cache: String,
}

impl AlreadyPurgingError {
    pub(crate) fn new(cache: impl Into<String>) -> Self {
        Self {
            cache: cache.into(),
        }
    }

    /// Name of the cache that is already being purged.
    pub fn cache(&self) -> &str {
        &self.cache
    }
}

impl fmt::Display for AlreadyPurgingError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "`{}` is already being purged", self.cache)
    }
}

impl Error for AlreadyPurgingError {}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
