//! Run-wide cache of introduction times.
//!
//! Each key maps to a shared once-cell. The map lock is held only long
//! enough to fetch or insert the cell; the history walk itself runs inside
//! `OnceCell::get_or_init`, so a second caller for the same key blocks until
//! the first walk finishes instead of repeating it.

use once_cell::sync::OnceCell;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use super::Introduction;

/// Cache key: a symbol and the repository-relative path declaring it.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct IntroductionKey {
    pub symbol: String,
    pub path: String,
}

impl IntroductionKey {
    pub fn new(symbol: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            symbol: symbol.into(),
            path: path.into(),
        }
    }
}

/// In-memory cache for introduction lookups, scoped to one run.
#[derive(Default)]
pub struct IntroductionCache {
    entries: Mutex<HashMap<IntroductionKey, Arc<OnceCell<Introduction>>>>,
}

impl IntroductionCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Get a resolved entry.
    pub fn get(&self, key: &IntroductionKey) -> Option<Introduction> {
        let entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        entries.get(key).and_then(|cell| cell.get().copied())
    }

    /// Number of resolved entries.
    pub fn len(&self) -> usize {
        let entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        entries.values().filter(|cell| cell.get().is_some()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Return the cached value for `key`, running `resolve` at most once
    /// per key for the lifetime of the cache.
    pub(crate) fn get_or_resolve<F>(&self, key: IntroductionKey, resolve: F) -> Introduction
    where
        F: FnOnce() -> Introduction,
    {
        let cell = {
            let mut entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
            Arc::clone(entries.entry(key).or_default())
        };
        *cell.get_or_init(resolve)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    fn found() -> Introduction {
        Introduction::Found(Utc.with_ymd_and_hms(2022, 3, 1, 0, 0, 0).unwrap())
    }

    #[test]
    fn test_second_lookup_uses_cache() {
        let cache = IntroductionCache::new();
        let calls = AtomicUsize::new(0);
        let key = IntroductionKey::new("NewCheckout", "flags/flags.go");

        let first = cache.get_or_resolve(key.clone(), || {
            calls.fetch_add(1, Ordering::SeqCst);
            found()
        });
        let second = cache.get_or_resolve(key.clone(), || {
            calls.fetch_add(1, Ordering::SeqCst);
            Introduction::NotFound
        });

        assert_eq!(first, second);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(cache.get(&key), Some(found()));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_not_found_is_cached_too() {
        let cache = IntroductionCache::new();
        let key = IntroductionKey::new("Gone", "flags/flags.go");

        cache.get_or_resolve(key.clone(), || Introduction::NotFound);
        let again = cache.get_or_resolve(key, found);
        assert_eq!(again, Introduction::NotFound);
    }

    #[test]
    fn test_keys_differ_by_path() {
        let cache = IntroductionCache::new();
        cache.get_or_resolve(IntroductionKey::new("Flag", "a.go"), found);

        assert!(cache.get(&IntroductionKey::new("Flag", "b.go")).is_none());
        assert!(cache.get(&IntroductionKey::new("Flag", "a.go")).is_some());
    }

    #[test]
    fn test_concurrent_callers_share_one_resolution() {
        let cache = IntroductionCache::new();
        let calls = AtomicUsize::new(0);
        let key = IntroductionKey::new("Flag", "flags.go");

        std::thread::scope(|s| {
            for _ in 0..8 {
                s.spawn(|| {
                    let value = cache.get_or_resolve(key.clone(), || {
                        calls.fetch_add(1, Ordering::SeqCst);
                        std::thread::sleep(Duration::from_millis(50));
                        found()
                    });
                    assert_eq!(value, found());
                });
            }
        });

        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
