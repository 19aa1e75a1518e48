//! Bounded most-recently-used frame cache.
//!
//! Entries are kept in insertion-recency order with at most one entry per
//! key. Only [`FrameCache::insert`] changes the order; lookups are
//! read-only, so a frame that is looked up repeatedly but never
//! re-inserted still ages out.

use std::collections::VecDeque;
use std::sync::Arc;

use parking_lot::{Mutex, MutexGuard};

use interframe_frame_model::frame::FrameDescriptor;

/// Default number of frames held by a cache.
pub const DEFAULT_CACHE_CAPACITY: usize = 32;

/// MRU-ordered frame cache. Not synchronized; see [`SharedFrameCache`].
#[derive(Debug)]
pub struct FrameCache {
    /// Most recently inserted first.
    entries: VecDeque<Arc<FrameDescriptor>>,
    capacity: usize,
}

impl FrameCache {
    /// Create a cache holding [`DEFAULT_CACHE_CAPACITY`] frames.
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CACHE_CAPACITY)
    }

    /// Create a cache with a custom capacity (at least one entry).
    pub fn with_capacity(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            entries: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Insert or refresh a frame at the most-recently-used position.
    ///
    /// An existing entry with the same key is replaced wherever it sits.
    /// Otherwise, when full, the least recently inserted entry is evicted
    /// and returned.
    pub fn insert(&mut self, frame: impl Into<Arc<FrameDescriptor>>) -> Option<Arc<FrameDescriptor>> {
        let frame = frame.into();
        let mut evicted = None;

        if let Some(pos) = self.position(frame.key()) {
            self.entries.remove(pos);
        } else if self.entries.len() >= self.capacity {
            evicted = self.entries.pop_back();
            if let Some(old) = &evicted {
                tracing::debug!(key = old.key(), "Evicted frame from cache");
            }
        }

        self.entries.push_front(frame);
        evicted
    }

    /// Find a frame by key without touching recency.
    pub fn lookup(&self, key: &str) -> Option<Arc<FrameDescriptor>> {
        self.entries.iter().find(|f| f.key() == key).cloned()
    }

    pub fn contains(&self, key: &str) -> bool {
        self.position(key).is_some()
    }

    fn position(&self, key: &str) -> Option<usize> {
        self.entries.iter().position(|f| f.key() == key)
    }

    /// Keys from most to least recently inserted.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|f| f.key())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

impl Default for FrameCache {
    fn default() -> Self {
        Self::new()
    }
}

/// A [`FrameCache`] behind a single mutex, shareable across worker threads.
#[derive(Debug, Clone, Default)]
pub struct SharedFrameCache {
    inner: Arc<Mutex<FrameCache>>,
}

impl SharedFrameCache {
    pub fn new(cache: FrameCache) -> Self {
        Self {
            inner: Arc::new(Mutex::new(cache)),
        }
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self::new(FrameCache::with_capacity(capacity))
    }

    /// See [`FrameCache::insert`].
    pub fn insert(&self, frame: impl Into<Arc<FrameDescriptor>>) -> Option<Arc<FrameDescriptor>> {
        self.lock().insert(frame)
    }

    /// See [`FrameCache::lookup`].
    pub fn lookup(&self, key: &str) -> Option<Arc<FrameDescriptor>> {
        self.lock().lookup(key)
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// Snapshot of the keys, most recent first.
    pub fn keys(&self) -> Vec<String> {
        self.lock().keys().map(str::to_owned).collect()
    }

    /// Run several operations under one lock acquisition.
    pub fn with<R>(&self, f: impl FnOnce(&mut FrameCache) -> R) -> R {
        f(&mut self.lock())
    }

    fn lock(&self) -> MutexGuard<'_, FrameCache> {
        self.inner.lock()
    }
}
