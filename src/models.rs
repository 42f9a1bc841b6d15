//! Server-owned read models and request bodies
//!
//! Everything here mirrors the REST contract (camelCase JSON). Read models
//! are never mutated in place; a refetch replaces them wholesale.

use chrono::{DateTime, Utc};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::OnceLock;
use uuid::Uuid;

use crate::constants::{CREDENTIAL_MAX_LEN, CREDENTIAL_MIN_LEN};
use crate::error::AppError;

/// Lowercase words joined by single dashes
static SLUG_PATTERN: OnceLock<Regex> = OnceLock::new();

fn slug_pattern() -> &'static Regex {
    SLUG_PATTERN.get_or_init(|| {
        // Constant pattern; covered by test_slug_pattern_is_valid
        Regex::new(r"^[a-z0-9]+(?:-[a-z0-9]+)*$").expect("Invalid slug regex")
    })
}

/// Forum category
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Category {
    Technology,
    Science,
    Art,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Forum {
    pub id: Uuid,
    pub slug: String,
    pub title: String,
    pub description: String,
    pub category: Category,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Post {
    pub id: Uuid,
    pub forum_id: Uuid,
    /// Per-forum sequence assigned by the server, used in URLs
    pub number: u64,
    pub title: String,
    pub content: String,
    #[serde(default)]
    pub tags: Vec<String>,
    pub author_id: Uuid,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Comment {
    pub id: Uuid,
    pub post_id: Uuid,
    pub content: String,
    pub author_id: Uuid,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    User,
}

/// A forum member; the authenticated principal when returned by `api/profile`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: Uuid,
    pub username: String,
    pub role: Role,
}

impl User {
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }
}

/// One page of a server-ordered collection
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaginatedResponse<T> {
    pub items: Vec<T>,
    pub total_count: u64,
    pub page: u32,
    pub page_size: u32,
    #[serde(default)]
    pub total_pages: u32,
}

impl<T> PaginatedResponse<T> {
    /// Page count normalized to `max(1, ceil(total_count / page_size))`.
    ///
    /// An empty collection still has one (empty) page.
    pub fn total_pages(&self) -> u32 {
        if self.page_size == 0 {
            return 1;
        }
        let pages = self.total_count.div_ceil(u64::from(self.page_size));
        u32::try_from(pages).unwrap_or(u32::MAX).max(1)
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

impl LoginRequest {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }

    /// Length checks the login form applies before submitting
    pub fn validate(&self) -> Result<(), AppError> {
        check_length("username", &self.username)?;
        check_length("password", &self.password)?;
        Ok(())
    }
}

fn check_length(field: &str, value: &str) -> Result<(), AppError> {
    let len = value.chars().count();
    if len < CREDENTIAL_MIN_LEN {
        return Err(AppError::validation(format!(
            "{} must be at least {} characters",
            field, CREDENTIAL_MIN_LEN
        )));
    }
    if len > CREDENTIAL_MAX_LEN {
        return Err(AppError::validation(format!(
            "{} must be at most {} characters",
            field, CREDENTIAL_MAX_LEN
        )));
    }
    Ok(())
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateForum {
    pub title: String,
    pub slug: String,
    pub description: String,
    pub category: Category,
}

impl CreateForum {
    /// Reject slugs that could not appear in a forum URL
    pub fn validate(&self) -> Result<(), AppError> {
        if self.title.trim().is_empty() {
            return Err(AppError::validation("title must not be empty"));
        }
        if !slug_pattern().is_match(&self.slug) {
            return Err(AppError::validation(format!(
                "slug '{}' must be lowercase letters, digits and single dashes",
                self.slug
            )));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreatePost {
    pub title: String,
    pub content: String,
    #[serde(default)]
    pub tags: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateComment {
    pub content: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangePassword {
    pub current_password: String,
    pub new_password: String,
}

/// Group forums by category for the index view.
///
/// Categories appear in order of first occurrence and forums keep the
/// server's order within each group.
pub fn group_by_category(forums: &[Forum]) -> Vec<(Category, Vec<Forum>)> {
    let mut groups: Vec<(Category, Vec<Forum>)> = Vec::new();
    for forum in forums {
        match groups.iter_mut().find(|(category, _)| *category == forum.category) {
            Some((_, members)) => members.push(forum.clone()),
            None => groups.push((forum.category, vec![forum.clone()])),
        }
    }
    groups
}
