//! Memoization of authorization decisions
//!
//! Decisions are pure functions of `(role name, resource, verb, names)`, so
//! the first answer for a key is cached and replayed. The cache is a bounded
//! LRU behind a mutex: the store itself can never be corrupted by concurrent
//! callers, and a benign race that recomputes the same boolean just
//! overwrites it with an identical value.
//!
//! There is no per-entry invalidation. A role replaced wholesale under a new
//! name never collides with stale entries; editing a role's policies in place
//! while keeping its name requires [`DecisionCache::clear`].

use std::num::NonZeroUsize;

use lru::LruCache;
use parking_lot::Mutex;

/// Cache key for one authorization query
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub(crate) struct DecisionKey {
    role: String,
    resource: String,
    verb: String,
    names: Vec<String>,
}

impl DecisionKey {
    /// Build a key from the query after empty names have been filtered out
    ///
    /// Names keep their query order: reordering may change which entry is
    /// populated, never which boolean it holds.
    pub(crate) fn new(role: &str, resource: &str, verb: &str, names: &[&str]) -> Self {
        DecisionKey {
            role: role.to_string(),
            resource: resource.to_string(),
            verb: verb.to_string(),
            names: names.iter().map(|n| n.to_string()).collect(),
        }
    }
}

/// Bounded LRU cache of authorization decisions
pub struct DecisionCache {
    entries: Mutex<LruCache<DecisionKey, bool>>,
}

impl DecisionCache {
    /// Create a cache holding up to `capacity` decisions
    ///
    /// A zero capacity is bumped to one entry.
    pub fn new(capacity: usize) -> Self {
        let capacity = NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN);
        DecisionCache {
            entries: Mutex::new(LruCache::new(capacity)),
        }
    }

    /// Get a cached decision
    pub(crate) fn get(&self, key: &DecisionKey) -> Option<bool> {
        self.entries.lock().get(key).copied()
    }

    /// Store a decision
    pub(crate) fn put(&self, key: DecisionKey, decision: bool) {
        self.entries.lock().put(key, decision);
    }

    /// Drop every cached decision
    pub fn clear(&self) {
        self.entries.lock().clear();
    }

    /// Number of cached decisions
    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    /// Check if the cache is empty
    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }
}

impl Default for DecisionCache {
    fn default() -> Self {
        Self::new(crate::evaluator::DEFAULT_CACHE_CAPACITY)
    }
}
