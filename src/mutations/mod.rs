//! Mutations and the cache entries they invalidate
//!
//! | mutation        | on success                                  |
//! |-----------------|---------------------------------------------|
//! | login           | invalidate everything, refetch currentUser  |
//! | logout          | overwrite `["currentUser"]` with `None`     |
//! | create forum    | invalidate `["forums"]`                     |
//! | create post     | invalidate `["posts", slug]`                |
//! | create comment  | invalidate `["comments", slug, number]`     |
//! | change password | nothing                                     |
//!
//! A failed mutation leaves the cache untouched. Mutations are never
//! coalesced: two submissions are two requests.

use std::sync::Arc;

use crate::api::ApiClient;
use crate::cache::QueryCache;
use crate::error::AppError;
use crate::models::{ChangePassword, Comment, CreateForum, CreatePost, Forum, LoginRequest, Post, User};
use crate::queries::{
    comments_identity, current_user_identity, forum_posts_prefix, forums_identity, PolicyTable,
    Queries, QueryKind,
};

#[derive(Debug, Clone)]
pub struct Mutations {
    api: Arc<ApiClient>,
    cache: QueryCache,
    queries: Queries,
}

impl Mutations {
    pub fn new(api: Arc<ApiClient>, cache: QueryCache, policies: PolicyTable) -> Self {
        Self {
            queries: Queries::new(api.clone(), policies),
            api,
            cache,
        }
    }

    /// Log in. Credentials are length-checked before any request.
    ///
    /// Resolves only after `["currentUser"]` has been refetched for the new
    /// session. A failed profile read does not fail the login; the entry is
    /// left stale for the next reader.
    pub async fn login(&self, credentials: &LoginRequest) -> Result<(), AppError> {
        credentials.validate()?;
        self.api.login(credentials).await?;

        // Every cached read may differ for the new principal
        let marked = self.cache.invalidate_all();
        match self.cache.fetch(&self.queries.current_user()).await {
            Ok(user) => tracing::info!(
                username = %credentials.username,
                invalidated = marked,
                resolved = user.is_some(),
                "Logged in"
            ),
            Err(err) => tracing::warn!(
                username = %credentials.username,
                invalidated = marked,
                kind = %err.kind(),
                error = %err,
                "Logged in, but the profile could not be loaded"
            ),
        }
        Ok(())
    }

    pub async fn logout(&self) -> Result<(), AppError> {
        self.api.logout().await?;

        self.cache.set_query_data::<Option<User>>(
            current_user_identity(),
            None,
            self.queries.policies().get(QueryKind::CurrentUser),
        );
        tracing::info!("Logged out");
        Ok(())
    }

    pub async fn create_forum(&self, body: &CreateForum) -> Result<Forum, AppError> {
        body.validate()?;
        let forum = self.api.create_forum(body).await?;
        self.cache.invalidate(&forums_identity());
        tracing::info!(slug = %forum.slug, "Forum created");
        Ok(forum)
    }

    pub async fn create_post(&self, slug: &str, body: &CreatePost) -> Result<Post, AppError> {
        let post = self.api.create_post(slug, body).await?;
        self.cache.invalidate(&forum_posts_prefix(slug));
        tracing::info!(slug, number = post.number, "Post created");
        Ok(post)
    }

    pub async fn create_comment(
        &self,
        slug: &str,
        number: u64,
        content: &str,
    ) -> Result<Comment, AppError> {
        let comment = self.api.create_comment(slug, number, content).await?;
        self.cache.invalidate(&comments_identity(slug, number));
        tracing::debug!(slug, number, "Comment created");
        Ok(comment)
    }

    pub async fn change_password(&self, body: &ChangePassword) -> Result<(), AppError> {
        self.api.change_password(body).await
    }
}
