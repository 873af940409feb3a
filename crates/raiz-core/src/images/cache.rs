//! Ledger of URLs known to load and URLs known to fail.

use std::collections::HashSet;
use std::sync::{Mutex, MutexGuard, PoisonError};

#[derive(Debug, Default)]
struct Ledger {
    loadable: HashSet<String>,
    failed: HashSet<String>,
}

/// Session-scoped preload cache.
///
/// A URL sits in at most one of the two sets. Entries are only removed by
/// [`PreloadCache::retry`]. Check-and-insert happens under one lock so the
/// invariant holds across threads.
#[derive(Debug, Default)]
pub struct PreloadCache {
    ledger: Mutex<Ledger>,
}

impl PreloadCache {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Ledger> {
        // The ledger holds plain sets; a panic mid-update cannot leave it torn.
        self.ledger.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn is_loaded(&self, url: &str) -> bool {
        self.lock().loadable.contains(url)
    }

    pub fn has_failed(&self, url: &str) -> bool {
        self.lock().failed.contains(url)
    }

    pub fn mark_loaded(&self, url: &str) {
        let mut ledger = self.lock();
        ledger.failed.remove(url);
        ledger.loadable.insert(url.to_string());
    }

    pub fn mark_failed(&self, url: &str) {
        let mut ledger = self.lock();
        ledger.loadable.remove(url);
        ledger.failed.insert(url.to_string());
    }

    /// Evicts `url` from both sets so the next load starts unbiased.
    pub fn retry(&self, url: &str) {
        let mut ledger = self.lock();
        ledger.loadable.remove(url);
        ledger.failed.remove(url);
    }
}
