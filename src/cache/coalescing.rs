// Request Coalescing
//
// Deduplicates concurrent fetches for the same query identity:
// - First read (leader): performs the fetch, publishes the outcome
// - Concurrent reads (followers): wait on the leader's channel
// - Everyone observes the same value or the same error

use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::watch;

use super::entry::CachedValue;
use super::identity::QueryIdentity;
use crate::error::AppError;

/// Outcome shared by every reader of one fetch
pub type FetchOutcome = Result<CachedValue, AppError>;

type OutcomeSender = watch::Sender<Option<FetchOutcome>>;

/// Receiver side handed to followers (and to the leader's own caller)
pub type OutcomeReceiver = watch::Receiver<Option<FetchOutcome>>;

/// Tracks in-flight fetches per identity
#[derive(Clone, Default)]
pub struct RequestCoalescer {
    in_flight: Arc<Mutex<HashMap<QueryIdentity, OutcomeSender>>>,
}

impl RequestCoalescer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Claim the fetch for `identity`, or join the one already running.
    pub fn acquire(&self, identity: &QueryIdentity) -> CoalescingSlot {
        let mut in_flight = self.in_flight.lock();
        if let Some(sender) = in_flight.get(identity) {
            return CoalescingSlot::Follower(sender.subscribe());
        }

        let (sender, _receiver) = watch::channel(None);
        in_flight.insert(identity.clone(), sender.clone());
        CoalescingSlot::Leader(LeaderGuard {
            identity: identity.clone(),
            coalescer: self.clone(),
            sender,
            completed: false,
        })
    }

    /// Whether a fetch for `identity` is running
    pub fn is_in_flight(&self, identity: &QueryIdentity) -> bool {
        self.in_flight.lock().contains_key(identity)
    }

    pub fn in_flight_count(&self) -> usize {
        self.in_flight.lock().len()
    }

    fn remove_in_flight(&self, identity: &QueryIdentity) {
        self.in_flight.lock().remove(identity);
    }
}

impl std::fmt::Debug for RequestCoalescer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RequestCoalescer")
            .field("in_flight", &self.in_flight_count())
            .finish()
    }
}

/// Result of acquiring a coalescing slot
pub enum CoalescingSlot {
    /// No fetch was running; this caller must perform it
    Leader(LeaderGuard),
    /// A fetch is running; wait on the receiver for its outcome
    Follower(OutcomeReceiver),
}

impl CoalescingSlot {
    pub fn is_leader(&self) -> bool {
        matches!(self, CoalescingSlot::Leader(_))
    }

    pub fn is_follower(&self) -> bool {
        matches!(self, CoalescingSlot::Follower(_))
    }
}

/// Held by the leader. Completing it publishes the outcome; dropping it
/// without completing wakes followers with an "abandoned" error.
pub struct LeaderGuard {
    identity: QueryIdentity,
    coalescer: RequestCoalescer,
    sender: OutcomeSender,
    completed: bool,
}

impl LeaderGuard {
    pub fn subscribe(&self) -> OutcomeReceiver {
        self.sender.subscribe()
    }

    /// Publish the outcome to every follower and leave the in-flight map
    pub fn complete(mut self, outcome: FetchOutcome) {
        // send_replace stores the value even with no receivers attached
        self.sender.send_replace(Some(outcome));
        self.coalescer.remove_in_flight(&self.identity);
        self.completed = true;
    }
}

impl Drop for LeaderGuard {
    fn drop(&mut self) {
        if !self.completed {
            tracing::warn!(identity = %self.identity, "Fetch abandoned before completion");
            self.coalescer.remove_in_flight(&self.identity);
        }
    }
}

/// Wait for the leader's outcome
pub async fn wait_for_outcome(mut receiver: OutcomeReceiver) -> FetchOutcome {
    let outcome = receiver
        .wait_for(|outcome| outcome.is_some())
        .await
        .map(|outcome| outcome.clone());
    match outcome {
        Ok(Some(outcome)) => outcome,
        // Sender dropped before publishing
        Ok(None) | Err(_) => Err(AppError::unknown("Fetch was abandoned before completing")),
    }
}
