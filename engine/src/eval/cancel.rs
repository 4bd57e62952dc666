//! Cooperative cancellation shared between a traversal and its caller.

use std::sync::atomic::{AtomicBool, Ordering};

/// A cancellation flag checked at node boundaries.
///
/// The caller raises the flag from any thread; the traversal polls it between
/// nodes and unwinds without caching partial results. `heard` records whether
/// the worker observed the flag, so the caller can tell a cancelled run from
/// one that finished before the signal landed.
#[derive(Debug, Default)]
pub struct CancelAtom {
    cancelled: AtomicBool,
    heard: AtomicBool,
}

impl CancelAtom {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    /// Poll from the worker side. Marks the signal as heard.
    pub fn is_cancelled(&self) -> bool {
        let cancelled = self.cancelled.load(Ordering::SeqCst);
        if cancelled {
            self.heard.store(true, Ordering::SeqCst);
        }
        cancelled
    }

    pub fn heard(&self) -> bool {
        self.heard.load(Ordering::SeqCst)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_heard_only_after_poll() {
        let atom = CancelAtom::new();
        assert!(!atom.is_cancelled());
        atom.cancel();
        assert!(!atom.heard());
        assert!(atom.is_cancelled());
        assert!(atom.heard());
    }
}
