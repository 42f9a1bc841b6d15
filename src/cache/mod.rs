//! Query cache engine
//!
//! One generic engine serves every query. A [`Query`] bundles its identity,
//! its [`QueryPolicy`] and the fetch function; the engine decides per read
//! whether to answer from memory, answer and refresh in the background, or
//! block on a fetch. Concurrent fetches for one identity are coalesced.

pub mod coalescing;
pub mod entry;
pub mod identity;
pub mod policy;
pub mod stats;

pub use coalescing::{CoalescingSlot, RequestCoalescer};
pub use entry::{CacheEntry, CachedValue, Freshness};
pub use identity::{KeyPart, QueryIdentity};
pub use policy::{Lifetime, QueryPolicy};
pub use stats::CacheStats;

use futures::future::BoxFuture;
use futures::FutureExt;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::future::Future;
use std::sync::{Arc, Weak};
use std::time::Duration;
use tokio::sync::oneshot;
use tokio::time::Instant;

use crate::error::AppError;
use coalescing::{wait_for_outcome, FetchOutcome, LeaderGuard, OutcomeReceiver};
use stats::CacheStatsTracker;

/// Boxed future returned by a query's fetch function
pub type FetchFuture<T> = BoxFuture<'static, Result<T, AppError>>;

/// Shared fetch function
pub type Fetcher<T> = Arc<dyn Fn() -> FetchFuture<T> + Send + Sync>;

/// A cacheable read: identity, policy, and how to fetch it
pub struct Query<T> {
    identity: QueryIdentity,
    policy: QueryPolicy,
    fetcher: Fetcher<T>,
}

impl<T> Clone for Query<T> {
    fn clone(&self) -> Self {
        Self {
            identity: self.identity.clone(),
            policy: self.policy,
            fetcher: self.fetcher.clone(),
        }
    }
}

impl<T: Send + 'static> Query<T> {
    pub fn new<F, Fut>(identity: QueryIdentity, policy: QueryPolicy, fetch: F) -> Self
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<T, AppError>> + Send + 'static,
    {
        Self {
            identity,
            policy,
            fetcher: Arc::new(move || fetch().boxed()),
        }
    }

    pub fn identity(&self) -> &QueryIdentity {
        &self.identity
    }

    pub fn policy(&self) -> QueryPolicy {
        self.policy
    }
}

impl<T> std::fmt::Debug for Query<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Query")
            .field("identity", &self.identity)
            .field("policy", &self.policy)
            .finish_non_exhaustive()
    }
}

struct Inner {
    entries: Mutex<HashMap<QueryIdentity, CacheEntry>>,
    coalescer: RequestCoalescer,
    stats: CacheStatsTracker,
    cleanup_shutdown: Mutex<Option<oneshot::Sender<()>>>,
}

impl Inner {
    fn purge_expired(&self) -> usize {
        let purged = sweep_expired(&mut self.entries.lock(), Instant::now());
        if purged > 0 {
            self.stats.add_evictions(purged as u64);
            tracing::debug!(purged, "Purged expired queries");
        }
        purged
    }
}

/// Drop entries past their retain window
fn sweep_expired(entries: &mut HashMap<QueryIdentity, CacheEntry>, now: Instant) -> usize {
    let before = entries.len();
    entries.retain(|_, entry| entry.freshness(now) != Freshness::Expired);
    before - entries.len()
}

/// In-memory query cache. Cheap to clone; clones share state.
#[derive(Clone)]
pub struct QueryCache {
    inner: Arc<Inner>,
}

impl Default for QueryCache {
    fn default() -> Self {
        Self::new()
    }
}

impl QueryCache {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Inner {
                entries: Mutex::new(HashMap::new()),
                coalescer: RequestCoalescer::new(),
                stats: CacheStatsTracker::default(),
                cleanup_shutdown: Mutex::new(None),
            }),
        }
    }

    /// Read a query.
    ///
    /// - fresh entry: returned with no I/O
    /// - stale entry: returned immediately, one background refetch scheduled
    /// - missing or expired: blocks on a (coalesced) fetch
    pub async fn get<T>(&self, query: &Query<T>) -> Result<T, AppError>
    where
        T: Clone + Send + Sync + 'static,
    {
        match self.lookup::<T>(&query.identity) {
            Some((value, Freshness::Fresh)) => {
                self.inner.stats.increment_hits();
                Ok(value)
            }
            Some((value, _)) => {
                self.inner.stats.increment_stale_hits();
                self.refetch_in_background(query);
                Ok(value)
            }
            None => {
                self.inner.stats.increment_misses();
                self.fetch_blocking(query).await
            }
        }
    }

    /// Read a query, waiting for a refetch unless the entry is fresh
    pub async fn fetch<T>(&self, query: &Query<T>) -> Result<T, AppError>
    where
        T: Clone + Send + Sync + 'static,
    {
        match self.lookup::<T>(&query.identity) {
            Some((value, Freshness::Fresh)) => {
                self.inner.stats.increment_hits();
                Ok(value)
            }
            _ => {
                self.inner.stats.increment_misses();
                self.fetch_blocking(query).await
            }
        }
    }

    /// Mark every entry under `prefix` stale. Entries stay readable until
    /// refetched. Returns the number of entries marked.
    pub fn invalidate(&self, prefix: &QueryIdentity) -> usize {
        let now = Instant::now();
        let mut entries = self.inner.entries.lock();
        let mut count = 0;
        for (identity, entry) in entries.iter_mut() {
            if identity.starts_with(prefix) {
                entry.mark_stale(now);
                count += 1;
            }
        }
        drop(entries);

        self.inner.stats.add_invalidations(count as u64);
        tracing::debug!(prefix = %prefix, count, "Invalidated queries");
        count
    }

    /// Mark every entry stale
    pub fn invalidate_all(&self) -> usize {
        self.invalidate(&QueryIdentity::root())
    }

    /// Overwrite an entry directly, without fetching
    pub fn set_query_data<T>(&self, identity: QueryIdentity, value: T, policy: QueryPolicy)
    where
        T: Send + Sync + 'static,
    {
        tracing::debug!(identity = %identity, "Query data set explicitly");
        self.store(identity, Arc::new(value), policy);
    }

    /// Peek at a cached value without any I/O. Expired entries read as None.
    pub fn get_query_data<T>(&self, identity: &QueryIdentity) -> Option<T>
    where
        T: Clone + 'static,
    {
        self.lookup::<T>(identity).map(|(value, _)| value)
    }

    pub fn freshness(&self, identity: &QueryIdentity) -> Option<Freshness> {
        let now = Instant::now();
        self.inner
            .entries
            .lock()
            .get(identity)
            .map(|entry| entry.freshness(now))
    }

    pub fn remove(&self, identity: &QueryIdentity) -> bool {
        self.inner.entries.lock().remove(identity).is_some()
    }

    /// Drop every entry past its retain window. Returns the number dropped.
    pub fn purge_expired(&self) -> usize {
        self.inner.purge_expired()
    }

    /// Purge expired entries every `interval` on a background task.
    ///
    /// The task holds only a weak reference and ends once every clone of the
    /// cache is gone. Starting it twice is a no-op.
    pub fn start_cleanup_task(&self, interval: Duration) {
        let (shutdown_tx, mut shutdown_rx) = oneshot::channel();
        {
            let mut guard = self.inner.cleanup_shutdown.lock();
            if guard.is_some() {
                tracing::debug!("Query cache cleanup task already running");
                return;
            }
            *guard = Some(shutdown_tx);
        }

        let inner: Weak<Inner> = Arc::downgrade(&self.inner);
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

            loop {
                tokio::select! {
                    _ = ticker.tick() => {
                        match inner.upgrade() {
                            Some(inner) => {
                                inner.purge_expired();
                            }
                            None => break,
                        }
                    }
                    _ = &mut shutdown_rx => {
                        tracing::debug!("Query cache cleanup task shutting down");
                        break;
                    }
                }
            }
        });

        tracing::debug!(interval_secs = interval.as_secs(), "Started query cache cleanup task");
    }

    pub fn stop_cleanup_task(&self) {
        if let Some(shutdown_tx) = self.inner.cleanup_shutdown.lock().take() {
            let _ = shutdown_tx.send(());
        }
    }

    pub fn is_cleanup_running(&self) -> bool {
        self.inner.cleanup_shutdown.lock().is_some()
    }

    pub fn clear(&self) {
        self.inner.entries.lock().clear();
    }

    pub fn len(&self) -> usize {
        self.inner.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn is_fetching(&self, identity: &QueryIdentity) -> bool {
        self.inner.coalescer.is_in_flight(identity)
    }

    /// Number of identities with a fetch in flight
    pub fn in_flight(&self) -> usize {
        self.inner.coalescer.in_flight_count()
    }

    pub fn stats(&self) -> CacheStats {
        self.inner.stats.snapshot(self.len() as u64)
    }

    /// Typed lookup. Expired entries are evicted on the way.
    fn lookup<T: Clone + 'static>(&self, identity: &QueryIdentity) -> Option<(T, Freshness)> {
        let now = Instant::now();
        let mut entries = self.inner.entries.lock();
        let freshness = entries.get(identity)?.freshness(now);
        if freshness == Freshness::Expired {
            entries.remove(identity);
            self.inner.stats.add_evictions(1);
            return None;
        }

        let value = entries.get(identity).and_then(CacheEntry::downcast::<T>);
        if value.is_none() {
            tracing::warn!(identity = %identity, "Cached value has an unexpected type, refetching");
        }
        value.map(|value| (value, freshness))
    }

    /// Insert or replace an entry, sweeping expired ones on the way
    fn store(&self, identity: QueryIdentity, value: CachedValue, policy: QueryPolicy) {
        let now = Instant::now();
        let entry = CacheEntry::new(value, policy, now);
        let mut entries = self.inner.entries.lock();
        let swept = sweep_expired(&mut entries, now);
        entries.insert(identity, entry);
        drop(entries);

        if swept > 0 {
            self.inner.stats.add_evictions(swept as u64);
        }
    }

    fn refetch_in_background<T>(&self, query: &Query<T>)
    where
        T: Clone + Send + Sync + 'static,
    {
        // A fetch already in flight covers this read
        if let CoalescingSlot::Leader(guard) = self.inner.coalescer.acquire(&query.identity) {
            tracing::debug!(identity = %query.identity, "Refetching stale query in background");
            self.spawn_fetch(query, guard);
        }
    }

    async fn fetch_blocking<T>(&self, query: &Query<T>) -> Result<T, AppError>
    where
        T: Clone + Send + Sync + 'static,
    {
        let receiver: OutcomeReceiver = match self.inner.coalescer.acquire(&query.identity) {
            CoalescingSlot::Leader(guard) => {
                // Double-check: a fetch may have landed between lookup and acquire
                if let Some((value, Freshness::Fresh)) = self.lookup::<T>(&query.identity) {
                    guard.complete(Ok(Arc::new(value.clone())));
                    return Ok(value);
                }
                let receiver = guard.subscribe();
                self.spawn_fetch(query, guard);
                receiver
            }
            CoalescingSlot::Follower(receiver) => {
                tracing::debug!(identity = %query.identity, "Joining in-flight fetch");
                receiver
            }
        };

        let value = wait_for_outcome(receiver).await?;
        value.downcast_ref::<T>().cloned().ok_or_else(|| {
            AppError::unknown(format!(
                "Query {} resolved to an unexpected type",
                query.identity
            ))
        })
    }

    /// Run the fetch on its own task so that dropping a waiting caller never
    /// cancels a fetch other readers share.
    fn spawn_fetch<T>(&self, query: &Query<T>, guard: LeaderGuard)
    where
        T: Clone + Send + Sync + 'static,
    {
        let cache = self.clone();
        let identity = query.identity.clone();
        let policy = query.policy;
        let fetch = (query.fetcher)();

        self.inner.stats.increment_fetches();
        tokio::spawn(async move {
            let outcome: FetchOutcome = match fetch.await {
                Ok(value) => {
                    let value: CachedValue = Arc::new(value);
                    // Last write wins against concurrent invalidation or overwrite
                    cache.store(identity.clone(), value.clone(), policy);
                    Ok(value)
                }
                Err(err) => {
                    cache.inner.stats.increment_fetch_errors();
                    tracing::warn!(
                        identity = %identity,
                        kind = %err.kind(),
                        error = %err,
                        "Query fetch failed"
                    );
                    Err(err)
                }
            };
            guard.complete(outcome);
        });
    }
}

impl std::fmt::Debug for QueryCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("QueryCache")
            .field("entries", &self.len())
            .field("in_flight", &self.in_flight())
            .field("cleanup_running", &self.is_cleanup_running())
            .finish()
    }
}
