//! Memoized placement transforms.
//!
//! DESIGN
//! ======
//! Entries are keyed by `"{element_id}_{left}_{top}"` and stamped with the viewport
//! scale they were computed under. A lookup under a different scale is a miss, so a
//! missed [`TransformCache::invalidate_all`] can never serve a stale coordinate.
//!
//! Eviction is FIFO by first insertion: once the cache holds more than `capacity`
//! entries, the oldest-inserted key goes. Lookups do not refresh position, and
//! re-storing an existing key keeps its original slot.

#[cfg(test)]
#[path = "transform_cache_test.rs"]
mod transform_cache_test;

use std::collections::{HashMap, VecDeque};

use crate::transform::{Rounding, TransformEngine, TransformResult};
use crate::viewport::Viewport;

/// Build the cache key for a placement at a logical position.
#[must_use]
pub fn cache_key(element_id: &str, left: f64, top: f64) -> String {
    format!("{element_id}_{left}_{top}")
}

/// One memoized transform plus the scale it is valid for.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CacheEntry {
    pub result: TransformResult,
    pub scale_x_at_insertion: f64,
    pub scale_y_at_insertion: f64,
    pub inserted_at_ms: f64,
}

impl CacheEntry {
    #[allow(clippy::float_cmp)]
    fn is_valid_for(&self, viewport: &Viewport) -> bool {
        self.scale_x_at_insertion == viewport.scale_x && self.scale_y_at_insertion == viewport.scale_y
    }
}

/// Bounded FIFO cache of sub-pixel transforms.
#[derive(Debug)]
pub struct TransformCache {
    entries: HashMap<String, CacheEntry>,
    order: VecDeque<String>,
    capacity: usize,
    computations: u64,
}

impl TransformCache {
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        Self { entries: HashMap::new(), order: VecDeque::new(), capacity: capacity.max(1), computations: 0 }
    }

    /// Return the cached result if it was computed under the viewport's current scale.
    #[must_use]
    pub fn get(&self, key: &str, viewport: &Viewport) -> Option<TransformResult> {
        self.entries
            .get(key)
            .filter(|entry| entry.is_valid_for(viewport))
            .map(|entry| entry.result)
    }

    /// Return the cached result or compute, store, and return a fresh one.
    pub fn get_or_compute(
        &mut self,
        key: &str,
        left: f64,
        top: f64,
        viewport: &Viewport,
        engine: &TransformEngine,
        now_ms: f64,
    ) -> TransformResult {
        if let Some(hit) = self.get(key, viewport) {
            return hit;
        }

        self.computations += 1;
        let result = engine.device_coordinates(left, top, viewport, Rounding::SubPixel);
        let entry = CacheEntry {
            result,
            scale_x_at_insertion: viewport.scale_x,
            scale_y_at_insertion: viewport.scale_y,
            inserted_at_ms: now_ms,
        };
        if self.entries.insert(key.to_owned(), entry).is_none() {
            self.order.push_back(key.to_owned());
            self.evict_overflow();
        }
        result
    }

    /// Drop every entry.
    pub fn invalidate_all(&mut self) {
        self.entries.clear();
        self.order.clear();
    }

    /// Number of entries currently stored (including stale-scale ones).
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    #[must_use]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Number of times the engine has been invoked on a miss.
    #[must_use]
    pub fn computations(&self) -> u64 {
        self.computations
    }

    /// Whether `key` is stored, regardless of scale validity.
    #[must_use]
    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    fn evict_overflow(&mut self) {
        while self.entries.len() > self.capacity {
            let Some(oldest) = self.order.pop_front() else {
                break;
            };
            self.entries.remove(&oldest);
        }
    }
}
