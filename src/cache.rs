//! Filter-keyed cache of fetched snapshots.

use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use std::time::{Duration, Instant};

use tracing::debug;

use crate::config::CacheConfig;
use crate::model::GraphSnapshot;

/// Source of "now"; injected so freshness can be tested without sleeping.
pub trait Clock {
    fn now(&self) -> Instant;
}

#[derive(Clone, Copy, Debug, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }
}

/// Whether a lookup was served from memory. Informational only.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CacheStatus {
    Hit,
    Miss,
}

struct CacheEntry {
    snapshot: Arc<GraphSnapshot>,
    fetched_at: Instant,
}

/// Page-session scoped cache with a TTL and FIFO eviction.
///
/// Eviction removes the oldest insertion, not the least recently read entry.
pub struct ResultCache<C: Clock = SystemClock> {
    clock: C,
    ttl: Duration,
    capacity: usize,
    entries: HashMap<String, CacheEntry>,
    insertion_order: VecDeque<String>,
}

impl ResultCache<SystemClock> {
    pub fn new(config: CacheConfig) -> Self {
        Self::with_clock(config, SystemClock)
    }
}

impl<C: Clock> ResultCache<C> {
    pub fn with_clock(config: CacheConfig, clock: C) -> Self {
        Self {
            clock,
            ttl: config.ttl(),
            capacity: config.capacity.max(1),
            entries: HashMap::new(),
            insertion_order: VecDeque::new(),
        }
    }

    /// Fresh snapshot for `key`, if any. Stale entries are dropped on the way.
    pub fn get(&mut self, key: &str) -> Option<Arc<GraphSnapshot>> {
        let now = self.clock.now();
        let entry = self.entries.get(key)?;
        if now.saturating_duration_since(entry.fetched_at) < self.ttl {
            return Some(Arc::clone(&entry.snapshot));
        }

        debug!(key, "cache entry expired");
        self.remove(key);
        None
    }

    pub fn lookup(&mut self, key: &str) -> (CacheStatus, Option<Arc<GraphSnapshot>>) {
        match self.get(key) {
            Some(snapshot) => (CacheStatus::Hit, Some(snapshot)),
            None => (CacheStatus::Miss, None),
        }
    }

    /// Stores `snapshot` under `key` with a fresh timestamp. Re-inserting a key
    /// moves it to the back of the eviction queue.
    pub fn put(&mut self, key: &str, snapshot: Arc<GraphSnapshot>) {
        if self.entries.contains_key(key) {
            self.insertion_order.retain(|existing| existing != key);
        }

        self.entries.insert(
            key.to_owned(),
            CacheEntry {
                snapshot,
                fetched_at: self.clock.now(),
            },
        );
        self.insertion_order.push_back(key.to_owned());

        while self.entries.len() > self.capacity {
            let Some(oldest) = self.insertion_order.pop_front() else {
                break;
            };
            debug!(key = %oldest, "evicting oldest cache entry");
            self.entries.remove(&oldest);
        }
    }

    pub fn remove(&mut self, key: &str) {
        if self.entries.remove(key).is_some() {
            self.insertion_order.retain(|existing| existing != key);
        }
    }

    pub fn clear(&mut self) {
        self.entries.clear();
        self.insertion_order.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn contains(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }
}
