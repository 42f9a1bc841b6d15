//! Query cache statistics
//!
//! Counters are atomics so readers on any task can record without taking
//! the entry lock.

use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};

/// Snapshot of cache activity
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CacheStats {
    /// Reads served from a fresh entry
    pub hits: u64,
    /// Reads served from a stale entry (background refetch scheduled)
    pub stale_hits: u64,
    /// Reads that had to wait for a fetch
    pub misses: u64,
    /// Fetches actually started
    pub fetches: u64,
    /// Fetches that returned an error
    pub fetch_errors: u64,
    /// Entries marked stale by invalidation
    pub invalidations: u64,
    /// Entries dropped after their retain window
    pub evictions: u64,
    /// Entries currently held
    pub entries: u64,
}

impl CacheStats {
    /// Fraction of reads answered without waiting on the network
    pub fn hit_rate(&self) -> f64 {
        let served = self.hits + self.stale_hits;
        let total = served + self.misses;
        if total == 0 {
            0.0
        } else {
            served as f64 / total as f64
        }
    }
}

#[derive(Debug, Default)]
pub(crate) struct CacheStatsTracker {
    hits: AtomicU64,
    stale_hits: AtomicU64,
    misses: AtomicU64,
    fetches: AtomicU64,
    fetch_errors: AtomicU64,
    invalidations: AtomicU64,
    evictions: AtomicU64,
}

impl CacheStatsTracker {
    pub fn increment_hits(&self) {
        self.hits.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_stale_hits(&self) {
        self.stale_hits.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_misses(&self) {
        self.misses.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_fetches(&self) {
        self.fetches.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_fetch_errors(&self) {
        self.fetch_errors.fetch_add(1, Ordering::Relaxed);
    }

    pub fn add_invalidations(&self, count: u64) {
        self.invalidations.fetch_add(count, Ordering::Relaxed);
    }

    pub fn add_evictions(&self, count: u64) {
        self.evictions.fetch_add(count, Ordering::Relaxed);
    }

    pub fn snapshot(&self, entries: u64) -> CacheStats {
        CacheStats {
            hits: self.hits.load(Ordering::Relaxed),
            stale_hits: self.stale_hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            fetches: self.fetches.load(Ordering::Relaxed),
            fetch_errors: self.fetch_errors.load(Ordering::Relaxed),
            invalidations: self.invalidations.load(Ordering::Relaxed),
            evictions: self.evictions.load(Ordering::Relaxed),
            entries,
        }
    }
}
