//! Query cache configuration.
//!
//! Only overrides live here. Kinds without an entry keep the default policy
//! from `crate::queries::QueryKind::default_policy`.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use super::ConfigError;
use crate::cache::QueryPolicy;
use crate::queries::{PolicyTable, QueryKind};

/// Cache configuration (YAML format)
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CacheSettings {
    /// Per-query overrides keyed by query name (`posts`, `currentUser`, ...)
    #[serde(default)]
    pub policies: HashMap<QueryKind, QueryPolicy>,
}

impl CacheSettings {
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (kind, policy) in &self.policies {
            policy.validate().map_err(|reason| ConfigError::InvalidValue {
                field: format!("cache.policies.{}", kind),
                reason,
            })?;
        }
        Ok(())
    }

    /// Resolved table: defaults with these overrides applied
    pub fn policy_table(&self) -> PolicyTable {
        PolicyTable::with_overrides(&self.policies)
    }
}
