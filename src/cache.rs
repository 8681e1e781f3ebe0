//! # Feed Cache
//! Process-wide snapshot of the last successful aggregation pass.
//!
//! The snapshot is replaced wholesale, never merged. It is fresh while
//! `now - fetched_at < ttl` and stale afterwards; a stale snapshot stays in
//! place until the next successful pass overwrites it. Concurrent refreshes
//! are allowed and the last writer wins.

use std::sync::{Arc, Mutex, RwLock};
use std::time::{Duration, Instant};

use crate::ingest::types::NormalizedItem;

/// Monotonic time source, swappable in tests.
pub trait Clock: Send + Sync {
    fn now(&self) -> Instant;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }
}

/// Clock that only moves when told to.
#[derive(Debug)]
pub struct ManualClock {
    base: Instant,
    offset: Mutex<Duration>,
}

impl ManualClock {
    pub fn new() -> Self {
        Self {
            base: Instant::now(),
            offset: Mutex::new(Duration::ZERO),
        }
    }

    pub fn advance(&self, by: Duration) {
        let mut off = self.offset.lock().unwrap_or_else(|p| p.into_inner());
        *off += by;
    }
}

impl Default for ManualClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Instant {
        let off = *self.offset.lock().unwrap_or_else(|p| p.into_inner());
        self.base + off
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheState {
    Empty,
    Fresh,
    Stale,
}

impl CacheState {
    pub fn as_str(self) -> &'static str {
        match self {
            CacheState::Empty => "empty",
            CacheState::Fresh => "fresh",
            CacheState::Stale => "stale",
        }
    }
}

#[derive(Debug, Clone)]
struct Snapshot {
    items: Arc<Vec<NormalizedItem>>,
    fetched_at: Instant,
}

pub struct FeedCache {
    slot: RwLock<Option<Snapshot>>,
    ttl: Duration,
    clock: Arc<dyn Clock>,
}

impl FeedCache {
    pub fn new(ttl: Duration, clock: Arc<dyn Clock>) -> Self {
        Self {
            slot: RwLock::new(None),
            ttl,
            clock,
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Items of the current snapshot if it is still fresh.
    pub fn fresh(&self) -> Option<Arc<Vec<NormalizedItem>>> {
        let now = self.clock.now();
        let guard = self.slot.read().unwrap_or_else(|p| p.into_inner());
        guard
            .as_ref()
            .filter(|s| now.saturating_duration_since(s.fetched_at) < self.ttl)
            .map(|s| Arc::clone(&s.items))
    }

    /// Replace the snapshot in a single assignment.
    pub fn store(&self, items: Vec<NormalizedItem>) -> Arc<Vec<NormalizedItem>> {
        let items = Arc::new(items);
        let snap = Snapshot {
            items: Arc::clone(&items),
            fetched_at: self.clock.now(),
        };
        *self.slot.write().unwrap_or_else(|p| p.into_inner()) = Some(snap);
        items
    }

    pub fn state(&self) -> CacheState {
        let now = self.clock.now();
        let guard = self.slot.read().unwrap_or_else(|p| p.into_inner());
        match guard.as_ref() {
            None => CacheState::Empty,
            Some(s) if now.saturating_duration_since(s.fetched_at) < self.ttl => CacheState::Fresh,
            Some(_) => CacheState::Stale,
        }
    }

    /// Number of items in the snapshot, fresh or stale.
    pub fn len(&self) -> usize {
        let guard = self.slot.read().unwrap_or_else(|p| p.into_inner());
        guard.as_ref().map_or(0, |s| s.items.len())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn age(&self) -> Option<Duration> {
        let now = self.clock.now();
        let guard = self.slot.read().unwrap_or_else(|p| p.into_inner());
        guard
            .as_ref()
            .map(|s| now.saturating_duration_since(s.fetched_at))
    }
}
