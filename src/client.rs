//! ForumClient: config, gateway, cache and session boundary wired together
//!
//! Reads go through the cache; writes go through [`Mutations`] so their
//! invalidations always happen.

use std::sync::Arc;

use crate::api::ApiClient;
use crate::cache::{CacheStats, QueryCache};
use crate::config::{ClientConfig, ConfigError};
use crate::constants::CACHE_CLEANUP_INTERVAL;
use crate::error::AppError;
use crate::models::{
    ChangePassword, Comment, CreateForum, CreatePost, Forum, LoginRequest, PaginatedResponse,
    Post, User,
};
use crate::mutations::Mutations;
use crate::navigation::NavigationGateway;
use crate::pagination::Paginator;
use crate::queries::Queries;
use crate::session::{BoundaryError, SessionBoundary, SessionContext};

#[derive(Debug)]
pub struct ForumClient {
    api: Arc<ApiClient>,
    cache: QueryCache,
    queries: Queries,
    mutations: Mutations,
    session: SessionBoundary,
}

impl ForumClient {
    pub fn new(config: &ClientConfig, navigation: NavigationGateway) -> Result<Self, ConfigError> {
        config.validate()?;
        let api = Arc::new(ApiClient::new(config, navigation.clone())?);
        let policies = config.cache.policy_table();
        let cache = QueryCache::new();
        if tokio::runtime::Handle::try_current().is_ok() {
            cache.start_cleanup_task(CACHE_CLEANUP_INTERVAL);
        } else {
            tracing::warn!("No tokio runtime; expired queries are only swept on write");
        }
        let queries = Queries::new(api.clone(), policies.clone());
        let mutations = Mutations::new(api.clone(), cache.clone(), policies);
        let session = SessionBoundary::new(
            cache.clone(),
            queries.clone(),
            navigation,
            config.login_path.clone(),
        );

        tracing::info!(
            base_url = %api.base_url(),
            login_path = %config.login_path,
            "Forum client initialized"
        );

        Ok(Self {
            api,
            cache,
            queries,
            mutations,
            session,
        })
    }

    pub fn api(&self) -> &ApiClient {
        &self.api
    }

    pub fn cache(&self) -> &QueryCache {
        &self.cache
    }

    pub fn queries(&self) -> &Queries {
        &self.queries
    }

    pub fn session(&self) -> &SessionBoundary {
        &self.session
    }

    pub fn stats(&self) -> CacheStats {
        self.cache.stats()
    }

    // Reads

    pub async fn current_user(&self) -> Result<Option<User>, AppError> {
        self.cache.get(&self.queries.current_user()).await
    }

    pub async fn forums(&self) -> Result<Vec<Forum>, AppError> {
        self.cache.get(&self.queries.forums()).await
    }

    pub async fn users(&self) -> Result<Vec<User>, AppError> {
        self.cache.get(&self.queries.users()).await
    }

    pub async fn posts(
        &self,
        slug: &str,
        page: u32,
        page_size: u32,
    ) -> Result<PaginatedResponse<Post>, AppError> {
        self.cache.get(&self.queries.posts(slug, page, page_size)).await
    }

    /// Open page `page` of a forum's posts through a [`Paginator`].
    ///
    /// The first page is read to learn the page count, so a page outside
    /// `1..=total_pages` is rejected without requesting it.
    pub async fn browse_posts(
        &self,
        slug: &str,
        page: u32,
        page_size: u32,
    ) -> Result<(PaginatedResponse<Post>, Paginator), AppError> {
        let mut paginator = Paginator::new();
        paginator.set_page_size(page_size)?;
        let first = paginator.current();
        let response = self.posts(slug, first.page, first.page_size).await?;
        paginator.observe(&response);

        if page == paginator.current().page {
            return Ok((response, paginator));
        }
        let request = paginator.go_to(page).ok_or_else(|| {
            AppError::validation(format!(
                "page {} is out of range 1..={}",
                page,
                paginator.total_pages()
            ))
        })?;

        let response = self.posts(slug, request.page, request.page_size).await?;
        paginator.observe(&response);
        Ok((response, paginator))
    }

    pub async fn post(&self, slug: &str, number: u64) -> Result<Post, AppError> {
        self.cache.get(&self.queries.post(slug, number)).await
    }

    pub async fn comments(&self, slug: &str, number: u64) -> Result<Vec<Comment>, AppError> {
        self.cache.get(&self.queries.comments(slug, number)).await
    }

    // Writes

    pub async fn login(&self, credentials: &LoginRequest) -> Result<(), AppError> {
        self.mutations.login(credentials).await
    }

    pub async fn logout(&self) -> Result<(), AppError> {
        self.mutations.logout().await
    }

    pub async fn create_forum(&self, body: &CreateForum) -> Result<Forum, AppError> {
        self.mutations.create_forum(body).await
    }

    pub async fn create_post(&self, slug: &str, body: &CreatePost) -> Result<Post, AppError> {
        self.mutations.create_post(slug, body).await
    }

    pub async fn create_comment(
        &self,
        slug: &str,
        number: u64,
        content: &str,
    ) -> Result<Comment, AppError> {
        self.mutations.create_comment(slug, number, content).await
    }

    pub async fn change_password(&self, body: &ChangePassword) -> Result<(), AppError> {
        self.mutations.change_password(body).await
    }

    /// Gate a protected view
    pub async fn enter(&self, requested_path: &str) -> Result<SessionContext, BoundaryError> {
        self.session.enter(requested_path).await
    }
}

impl Drop for ForumClient {
    fn drop(&mut self) {
        self.cache.stop_cleanup_task();
    }
}
