//! Definition cache backends

use crate::config::{CacheConfig, CachePolicy};
use lru::LruCache;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::num::NonZeroUsize;
use std::sync::Arc;

/// Word → formatted definition cache.
///
/// Keys are normalized (lower-cased) words. Only successful lookups are
/// stored. Implementations are shared between concurrent pipeline runs, so
/// every method takes `&self` and locks internally; a `get` followed by a
/// `put` is not atomic.
pub trait DefinitionStore: Send + Sync {
    fn get(&self, word: &str) -> Option<String>;
    fn put(&self, word: String, definition: String);
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Build the store selected by configuration
pub fn build_store(config: &CacheConfig) -> Arc<dyn DefinitionStore> {
    match config.policy {
        CachePolicy::Unbounded => Arc::new(UnboundedStore::new()),
        CachePolicy::Lru => Arc::new(LruStore::new(config.max_entries, config.max_bytes)),
    }
}

/// Grows for the life of the process, never evicts
#[derive(Default)]
pub struct UnboundedStore {
    inner: Mutex<HashMap<String, String>>,
}

impl UnboundedStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl DefinitionStore for UnboundedStore {
    fn get(&self, word: &str) -> Option<String> {
        self.inner.lock().get(word).cloned()
    }

    fn put(&self, word: String, definition: String) {
        self.inner.lock().insert(word, definition);
    }

    fn len(&self) -> usize {
        self.inner.lock().len()
    }
}

struct LruInner {
    lru: LruCache<String, String>,
    total_bytes: usize,
}

/// Least-recently-used store with entry count and byte budget limits
pub struct LruStore {
    inner: Mutex<LruInner>,
    max_bytes: usize,
}

impl LruStore {
    /// Create a store holding at most `capacity` words and `max_bytes` of text
    pub fn new(capacity: usize, max_bytes: usize) -> Self {
        let capacity = NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN);
        Self {
            inner: Mutex::new(LruInner {
                lru: LruCache::new(capacity),
                total_bytes: 0,
            }),
            max_bytes,
        }
    }

    /// Bytes of definition text currently held
    pub fn total_bytes(&self) -> usize {
        self.inner.lock().total_bytes
    }

    pub fn contains(&self, word: &str) -> bool {
        self.inner.lock().lru.contains(word)
    }
}

impl DefinitionStore for LruStore {
    fn get(&self, word: &str) -> Option<String> {
        self.inner.lock().lru.get(word).cloned()
    }

    /// Definitions larger than the whole budget are not stored.
    fn put(&self, word: String, definition: String) {
        let new_size = definition.len();
        if new_size > self.max_bytes {
            return;
        }

        let mut inner = self.inner.lock();

        if let Some(old) = inner.lru.pop(&word) {
            inner.total_bytes = inner.total_bytes.saturating_sub(old.len());
        }

        while inner.total_bytes + new_size > self.max_bytes {
            match inner.lru.pop_lru() {
                Some((_, evicted)) => {
                    inner.total_bytes = inner.total_bytes.saturating_sub(evicted.len());
                }
                None => break,
            }
        }

        // Entry-count eviction inside `push` must release its bytes too
        inner.total_bytes += new_size;
        if let Some((_, evicted)) = inner.lru.push(word, definition) {
            inner.total_bytes = inner.total_bytes.saturating_sub(evicted.len());
        }
    }

    fn len(&self) -> usize {
        self.inner.lock().lru.len()
    }
}
