//! In-process read cache with a fixed time-to-live
//!
//! Read endpoints store their serialized responses here keyed by route and
//! parameters. Writes clear the whole cache: detail views embed other
//! entities, so per-key invalidation would miss nested reads.
//!
//! Each clear bumps a generation counter. A reader records the generation
//! before loading and stores through [`TtlCache::insert_if_current`], so a
//! load that raced with a write never lands after the clear.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use dashmap::DashMap;
use tokio::time::Instant;

/// Concurrent map whose entries expire after `ttl`
pub struct TtlCache<V> {
    entries: DashMap<String, (Instant, V)>,
    ttl: Duration,
    generation: AtomicU64,
}

impl<V: Clone> TtlCache<V> {
    pub fn new(ttl: Duration) -> Self {
        Self {
            entries: DashMap::new(),
            ttl,
            generation: AtomicU64::new(0),
        }
    }

    /// Fresh value for `key`; expired entries are dropped on the way.
    pub fn get(&self, key: &str) -> Option<V> {
        let expired = match self.entries.get(key) {
            Some(entry) if entry.0.elapsed() < self.ttl => return Some(entry.1.clone()),
            Some(_) => true,
            None => false,
        };
        if expired {
            self.entries.remove(key);
        }
        None
    }

    pub fn insert(&self, key: String, value: V) {
        self.entries.insert(key, (Instant::now(), value));
    }

    /// Current generation, to be read before loading a value.
    pub fn generation(&self) -> u64 {
        self.generation.load(Ordering::SeqCst)
    }

    /// Store `value` only if no clear happened since `generation` was read.
    pub fn insert_if_current(&self, key: String, value: V, generation: u64) -> bool {
        if self.generation() != generation {
            return false;
        }
        self.entries.insert(key.clone(), (Instant::now(), value));

        // A clear that slipped in between the check and the insert
        if self.generation() != generation {
            self.entries.remove(&key);
            return false;
        }
        true
    }

    /// Drop every entry.
    pub fn clear(&self) {
        self.generation.fetch_add(1, Ordering::SeqCst);
        if !self.entries.is_empty() {
            tracing::debug!(entries = self.entries.len(), "read cache cleared");
            self.entries.clear();
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
