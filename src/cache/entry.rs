//! Cache entry and freshness classification
//!
//! Values are stored type-erased so one engine can hold every query's result
//! type; the typed query handle downcasts on the way out.

use std::any::Any;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;

use super::policy::QueryPolicy;

/// Type-erased cached value
pub type CachedValue = Arc<dyn Any + Send + Sync>;

/// How a read should treat an entry
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Freshness {
    /// Serve without I/O
    Fresh,
    /// Serve, and refetch in the background
    Stale,
    /// Past retention: evictable, reads block on a fetch
    Expired,
}

/// Cached query result with its policy deadlines.
///
/// Invariant: `fresh_until <= retained_until` (None means unbounded).
#[derive(Clone)]
pub struct CacheEntry {
    value: CachedValue,
    /// When the value was stored
    pub fetched_at: Instant,
    /// End of the fresh window
    pub fresh_until: Option<Instant>,
    /// End of the retain window
    pub retained_until: Option<Instant>,
}

impl CacheEntry {
    pub fn new(value: CachedValue, policy: QueryPolicy, now: Instant) -> Self {
        let retained_until = policy.retain.deadline(now);
        let fresh_until = clamp_deadline(policy.fresh.deadline(now), retained_until);
        Self {
            value,
            fetched_at: now,
            fresh_until,
            retained_until,
        }
    }

    /// Classify the entry at `now`. Boundaries are exclusive: a read exactly
    /// at `fresh_until` is already stale.
    pub fn freshness(&self, now: Instant) -> Freshness {
        if is_before(now, self.fresh_until) {
            Freshness::Fresh
        } else if is_before(now, self.retained_until) {
            Freshness::Stale
        } else {
            Freshness::Expired
        }
    }

    /// End the fresh window at `now`; retention is untouched
    pub fn mark_stale(&mut self, now: Instant) {
        let fresh_until = match self.fresh_until {
            Some(current) if current < now => current,
            _ => now,
        };
        self.fresh_until = clamp_deadline(Some(fresh_until), self.retained_until);
    }

    pub fn value(&self) -> &CachedValue {
        &self.value
    }

    /// Downcast a clone of the value. None if the stored type differs.
    pub fn downcast<T: Clone + 'static>(&self) -> Option<T> {
        self.value.downcast_ref::<T>().cloned()
    }

    pub fn age(&self, now: Instant) -> Duration {
        now.saturating_duration_since(self.fetched_at)
    }
}

impl std::fmt::Debug for CacheEntry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CacheEntry")
            .field("fetched_at", &self.fetched_at)
            .field("fresh_until", &self.fresh_until)
            .field("retained_until", &self.retained_until)
            .finish_non_exhaustive()
    }
}

fn is_before(now: Instant, deadline: Option<Instant>) -> bool {
    match deadline {
        None => true,
        Some(deadline) => now < deadline,
    }
}

fn clamp_deadline(fresh: Option<Instant>, retained: Option<Instant>) -> Option<Instant> {
    match (fresh, retained) {
        (Some(fresh), Some(retained)) => Some(fresh.min(retained)),
        (None, Some(retained)) => Some(retained),
        (fresh, None) => fresh,
    }
}
