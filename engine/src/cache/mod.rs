//! Per-node dirty-region state driven by invalidation propagation.
//!
//! The engine does not own frame or audio caches — those belong to external
//! collaborators. What it owns is the bookkeeping of *which time ranges* of a
//! node's output are stale, updated synchronously by every graph mutation so
//! a traversal issued immediately afterwards observes consistent state.

use std::collections::HashMap;

use crate::time::{TimeRange, TimeRangeList};

/// Extra options threaded through an invalidation walk. Opaque to the engine;
/// external cache layers can use them to scope what they discard.
pub type InvalidateOptions = HashMap<String, serde_json::Value>;

/// Dirty-region state for one node's cached output.
///
/// Backed by a coalescing range list, so marking the same range stale twice
/// is a no-op — the idempotence the invalidation contract requires.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PlaybackCacheState {
    dirty: TimeRangeList,
}

impl PlaybackCacheState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark `range` stale.
    pub fn invalidate(&mut self, range: TimeRange) {
        self.dirty.insert(range);
    }

    /// Mark `range` freshly rendered (reported by the external renderer).
    pub fn validate(&mut self, range: &TimeRange) {
        self.dirty.remove(range);
    }

    pub fn is_dirty(&self, range: &TimeRange) -> bool {
        self.dirty.overlaps(range)
    }

    pub fn dirty_ranges(&self) -> &TimeRangeList {
        &self.dirty
    }

    pub fn clear(&mut self) {
        self.dirty.clear();
    }
}

/// Observer invoked for every `(node, range)` pair an invalidation walk
/// touches. UI layers subscribe here; correctness never depends on it.
pub type InvalidationObserver<'a> = dyn FnMut(uuid::Uuid, &TimeRange) + 'a;
