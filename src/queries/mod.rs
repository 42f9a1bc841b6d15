//! Query factories
//!
//! Each factory pairs an identity with the policy for its kind and a fetch
//! closure over the shared [`ApiClient`]. Identities are built here and
//! nowhere else so that mutation invalidation prefixes line up with them.

pub mod policy;

pub use policy::{PolicyTable, QueryKind};

use std::sync::Arc;

use crate::api::ApiClient;
use crate::cache::{Query, QueryIdentity};
use crate::error::AppError;
use crate::models::{Comment, Forum, PaginatedResponse, Post, User};

/// `["currentUser"]`
pub fn current_user_identity() -> QueryIdentity {
    QueryIdentity::new(QueryKind::CurrentUser.as_str())
}

/// `["forums"]`
pub fn forums_identity() -> QueryIdentity {
    QueryIdentity::new(QueryKind::Forums.as_str())
}

/// `["users"]`
pub fn users_identity() -> QueryIdentity {
    QueryIdentity::new(QueryKind::Users.as_str())
}

/// `["posts", slug]`: every page of one forum's post list
pub fn forum_posts_prefix(slug: &str) -> QueryIdentity {
    QueryIdentity::new(QueryKind::Posts.as_str()).with(slug)
}

/// `["posts", slug, page, pageSize]`
pub fn posts_identity(slug: &str, page: u32, page_size: u32) -> QueryIdentity {
    forum_posts_prefix(slug).with(page).with(page_size)
}

/// `["post", slug, number]`
pub fn post_identity(slug: &str, number: u64) -> QueryIdentity {
    QueryIdentity::new(QueryKind::Post.as_str())
        .with(slug)
        .with(number)
}

/// `["comments", slug, number]`
pub fn comments_identity(slug: &str, number: u64) -> QueryIdentity {
    QueryIdentity::new(QueryKind::Comments.as_str())
        .with(slug)
        .with(number)
}

/// Builds the cacheable reads of the forum API
#[derive(Debug, Clone)]
pub struct Queries {
    api: Arc<ApiClient>,
    policies: PolicyTable,
}

impl Queries {
    pub fn new(api: Arc<ApiClient>, policies: PolicyTable) -> Self {
        Self { api, policies }
    }

    pub fn policies(&self) -> &PolicyTable {
        &self.policies
    }

    /// The session principal. An unauthenticated profile read resolves to
    /// `None` instead of failing so the cache can hold "logged out".
    pub fn current_user(&self) -> Query<Option<User>> {
        let api = self.api.clone();
        Query::new(
            current_user_identity(),
            self.policies.get(QueryKind::CurrentUser),
            move || {
                let api = api.clone();
                async move { resolve_profile(api.get_profile().await) }
            },
        )
    }

    pub fn forums(&self) -> Query<Vec<Forum>> {
        let api = self.api.clone();
        Query::new(
            forums_identity(),
            self.policies.get(QueryKind::Forums),
            move || {
                let api = api.clone();
                async move { api.get_forums().await }
            },
        )
    }

    pub fn users(&self) -> Query<Vec<User>> {
        let api = self.api.clone();
        Query::new(
            users_identity(),
            self.policies.get(QueryKind::Users),
            move || {
                let api = api.clone();
                async move { api.get_users().await }
            },
        )
    }

    pub fn posts(&self, slug: &str, page: u32, page_size: u32) -> Query<PaginatedResponse<Post>> {
        let api = self.api.clone();
        let slug = slug.to_string();
        Query::new(
            posts_identity(&slug, page, page_size),
            self.policies.get(QueryKind::Posts),
            move || {
                let api = api.clone();
                let slug = slug.clone();
                async move { api.get_posts(&slug, page, page_size).await }
            },
        )
    }

    pub fn post(&self, slug: &str, number: u64) -> Query<Post> {
        let api = self.api.clone();
        let slug = slug.to_string();
        Query::new(
            post_identity(&slug, number),
            self.policies.get(QueryKind::Post),
            move || {
                let api = api.clone();
                let slug = slug.clone();
                async move { api.get_post(&slug, number).await }
            },
        )
    }

    pub fn comments(&self, slug: &str, number: u64) -> Query<Vec<Comment>> {
        let api = self.api.clone();
        let slug = slug.to_string();
        Query::new(
            comments_identity(&slug, number),
            self.policies.get(QueryKind::Comments),
            move || {
                let api = api.clone();
                let slug = slug.clone();
                async move { api.get_comments(&slug, number).await }
            },
        )
    }
}

fn resolve_profile(result: Result<User, AppError>) -> Result<Option<User>, AppError> {
    match result {
        Ok(user) => Ok(Some(user)),
        Err(err) if err.is_unauthorized() => Ok(None),
        Err(err) => Err(err),
    }
}
