//! Per-query policy table
//!
//! Maps each query kind to its fresh/retain windows. The defaults below are
//! the contract; config may override individual entries.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use crate::cache::QueryPolicy;
use crate::constants::{
    COMMENTS_FRESH, COMMENTS_RETAIN, POSTS_FRESH, POSTS_RETAIN, POST_FRESH, POST_RETAIN,
};

/// Every cacheable query the client issues
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum QueryKind {
    CurrentUser,
    Forums,
    Users,
    Posts,
    Post,
    Comments,
}

impl QueryKind {
    pub const ALL: [QueryKind; 6] = [
        QueryKind::CurrentUser,
        QueryKind::Forums,
        QueryKind::Users,
        QueryKind::Posts,
        QueryKind::Post,
        QueryKind::Comments,
    ];

    /// Resource name used as the first identity part
    pub fn as_str(&self) -> &'static str {
        match self {
            QueryKind::CurrentUser => "currentUser",
            QueryKind::Forums => "forums",
            QueryKind::Users => "users",
            QueryKind::Posts => "posts",
            QueryKind::Post => "post",
            QueryKind::Comments => "comments",
        }
    }

    pub fn default_policy(&self) -> QueryPolicy {
        match self {
            QueryKind::CurrentUser | QueryKind::Forums | QueryKind::Users => {
                QueryPolicy::UNBOUNDED
            }
            QueryKind::Posts => QueryPolicy::new(POSTS_FRESH, POSTS_RETAIN),
            QueryKind::Post => QueryPolicy::new(POST_FRESH, POST_RETAIN),
            QueryKind::Comments => QueryPolicy::new(COMMENTS_FRESH, COMMENTS_RETAIN),
        }
    }
}

impl fmt::Display for QueryKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for QueryKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        QueryKind::ALL
            .into_iter()
            .find(|kind| kind.as_str() == s)
            .ok_or_else(|| format!("unknown query '{}'", s))
    }
}

/// Resolved policy for every query kind
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PolicyTable {
    policies: HashMap<QueryKind, QueryPolicy>,
}

impl Default for PolicyTable {
    fn default() -> Self {
        Self {
            policies: QueryKind::ALL
                .into_iter()
                .map(|kind| (kind, kind.default_policy()))
                .collect(),
        }
    }
}

impl PolicyTable {
    /// Defaults with `overrides` applied on top
    pub fn with_overrides(overrides: &HashMap<QueryKind, QueryPolicy>) -> Self {
        let mut table = Self::default();
        for (kind, policy) in overrides {
            table.policies.insert(*kind, *policy);
        }
        table
    }

    pub fn get(&self, kind: QueryKind) -> QueryPolicy {
        self.policies
            .get(&kind)
            .copied()
            .unwrap_or_else(|| kind.default_policy())
    }

    pub fn set(&mut self, kind: QueryKind, policy: QueryPolicy) {
        self.policies.insert(kind, policy);
    }
}
