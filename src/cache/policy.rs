//! Staleness and retention policy
//!
//! A [`QueryPolicy`] pairs a fresh window with a retain window:
//! - read before `fresh` elapses: served from cache, no I/O
//! - read between `fresh` and `retain`: served from cache, background refetch
//! - read after `retain`: blocking fetch

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::time::Duration;
use tokio::time::Instant;

/// Length of a policy window
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Lifetime {
    /// Never elapses on its own
    Unbounded,
    For(Duration),
}

impl Lifetime {
    pub fn secs(secs: u64) -> Self {
        Lifetime::For(Duration::from_secs(secs))
    }

    /// Deadline for a window starting at `start`; None when unbounded
    pub fn deadline(&self, start: Instant) -> Option<Instant> {
        match self {
            Lifetime::Unbounded => None,
            Lifetime::For(duration) => start.checked_add(*duration),
        }
    }

    pub fn is_unbounded(&self) -> bool {
        matches!(self, Lifetime::Unbounded)
    }
}

impl PartialOrd for Lifetime {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Lifetime {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        use std::cmp::Ordering;
        match (self, other) {
            (Lifetime::Unbounded, Lifetime::Unbounded) => Ordering::Equal,
            (Lifetime::Unbounded, Lifetime::For(_)) => Ordering::Greater,
            (Lifetime::For(_), Lifetime::Unbounded) => Ordering::Less,
            (Lifetime::For(a), Lifetime::For(b)) => a.cmp(b),
        }
    }
}

impl fmt::Display for Lifetime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Lifetime::Unbounded => write!(f, "unbounded"),
            Lifetime::For(duration) => write!(f, "{}s", duration.as_secs()),
        }
    }
}

// On the wire a lifetime is either a number of seconds or "unbounded"
#[derive(Serialize, Deserialize)]
#[serde(untagged)]
enum LifetimeRepr {
    Seconds(u64),
    Keyword(String),
}

impl Serialize for Lifetime {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let repr = match self {
            Lifetime::Unbounded => LifetimeRepr::Keyword("unbounded".to_string()),
            Lifetime::For(duration) => LifetimeRepr::Seconds(duration.as_secs()),
        };
        repr.serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for Lifetime {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        match LifetimeRepr::deserialize(deserializer)? {
            LifetimeRepr::Seconds(secs) => Ok(Lifetime::secs(secs)),
            LifetimeRepr::Keyword(word) if word.eq_ignore_ascii_case("unbounded") => {
                Ok(Lifetime::Unbounded)
            }
            LifetimeRepr::Keyword(word) => Err(serde::de::Error::custom(format!(
                "invalid lifetime '{}': expected seconds or \"unbounded\"",
                word
            ))),
        }
    }
}

/// Fresh and retain windows for one query
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryPolicy {
    pub fresh: Lifetime,
    pub retain: Lifetime,
}

impl QueryPolicy {
    pub const UNBOUNDED: QueryPolicy = QueryPolicy {
        fresh: Lifetime::Unbounded,
        retain: Lifetime::Unbounded,
    };

    pub fn new(fresh: Duration, retain: Duration) -> Self {
        Self {
            fresh: Lifetime::For(fresh),
            retain: Lifetime::For(retain),
        }
    }

    /// Fresh window must not outlive the retain window
    pub fn validate(&self) -> Result<(), String> {
        if self.fresh > self.retain {
            return Err(format!(
                "fresh ({}) must not exceed retain ({})",
                self.fresh, self.retain
            ));
        }
        Ok(())
    }
}
