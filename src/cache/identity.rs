//! Query identity
//!
//! A `QueryIdentity` is an ordered tuple of primitive parts naming one
//! cached result, e.g. `["posts", "tech", 1, 10]`. A shorter identity acts
//! as a prefix matching every identity that begins with the same parts.

use serde::Serialize;
use std::fmt;

/// One element of a query identity
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(untagged)]
pub enum KeyPart {
    Str(String),
    Int(i64),
}

impl From<&str> for KeyPart {
    fn from(value: &str) -> Self {
        KeyPart::Str(value.to_string())
    }
}

impl From<String> for KeyPart {
    fn from(value: String) -> Self {
        KeyPart::Str(value)
    }
}

impl From<&String> for KeyPart {
    fn from(value: &String) -> Self {
        KeyPart::Str(value.clone())
    }
}

impl From<i64> for KeyPart {
    fn from(value: i64) -> Self {
        KeyPart::Int(value)
    }
}

impl From<i32> for KeyPart {
    fn from(value: i32) -> Self {
        KeyPart::Int(i64::from(value))
    }
}

impl From<u32> for KeyPart {
    fn from(value: u32) -> Self {
        KeyPart::Int(i64::from(value))
    }
}

impl From<u64> for KeyPart {
    fn from(value: u64) -> Self {
        KeyPart::Int(i64::try_from(value).unwrap_or(i64::MAX))
    }
}

impl fmt::Display for KeyPart {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            KeyPart::Str(s) => write!(f, "{:?}", s),
            KeyPart::Int(n) => write!(f, "{}", n),
        }
    }
}

/// Structured cache key. Immutable once built: the builder consumes `self`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct QueryIdentity(Vec<KeyPart>);

impl QueryIdentity {
    /// Single-part identity, usually the resource name
    pub fn new(resource: impl Into<KeyPart>) -> Self {
        Self(vec![resource.into()])
    }

    /// The empty identity: a prefix of every identity
    pub fn root() -> Self {
        Self(Vec::new())
    }

    pub fn with(mut self, part: impl Into<KeyPart>) -> Self {
        self.0.push(part.into());
        self
    }

    pub fn parts(&self) -> &[KeyPart] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// True when `prefix` equals the first `prefix.len()` parts of `self`
    pub fn starts_with(&self, prefix: &QueryIdentity) -> bool {
        self.0.starts_with(&prefix.0)
    }
}

impl fmt::Display for QueryIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[")?;
        for (i, part) in self.0.iter().enumerate() {
            if i > 0 {
                write!(f, ",")?;
            }
            write!(f, "{}", part)?;
        }
        write!(f, "]")
    }
}
