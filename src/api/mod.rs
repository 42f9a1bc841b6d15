//! Request Gateway
//!
//! `ApiClient` exposes one typed operation per (resource, verb) of the forum
//! REST API. Every response passes through the same two steps before the
//! caller sees it:
//!
//! 1. a 401 redirects to the login view (unless already there)
//! 2. any non-2xx becomes an [`AppError`] via [`normalize`]
//!
//! Credentials travel as cookies held by the client's cookie store. There
//! are no retries and no request timeout.

pub mod normalize;

use reqwest::header::ACCEPT;
use reqwest::{Method, RequestBuilder, Response, StatusCode, Url};
use serde::de::DeserializeOwned;

use crate::config::{ClientConfig, ConfigError};
use crate::error::AppError;
use crate::models::{
    ChangePassword, Comment, CreateComment, CreateForum, CreatePost, Forum, LoginRequest,
    PaginatedResponse, Post, User,
};
use crate::navigation::{NavigateOptions, NavigationGateway};

pub struct ApiClient {
    http: reqwest::Client,
    base_url: Url,
    login_path: String,
    navigation: NavigationGateway,
}

impl ApiClient {
    /// Build a client with its own cookie store
    pub fn new(config: &ClientConfig, navigation: NavigationGateway) -> Result<Self, ConfigError> {
        let http = reqwest::Client::builder()
            .cookie_store(true)
            .build()
            .map_err(|e| ConfigError::HttpClient(e.to_string()))?;

        Ok(Self::with_http_client(
            http,
            config.base_url()?,
            config.login_path.clone(),
            navigation,
        ))
    }

    pub fn with_http_client(
        http: reqwest::Client,
        base_url: Url,
        login_path: impl Into<String>,
        navigation: NavigationGateway,
    ) -> Self {
        Self {
            http,
            base_url,
            login_path: login_path.into(),
            navigation,
        }
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    pub fn login_path(&self) -> &str {
        &self.login_path
    }

    pub fn navigation(&self) -> &NavigationGateway {
        &self.navigation
    }

    // ========================================================================
    // Profile
    // ========================================================================

    /// The authenticated principal
    pub async fn get_profile(&self) -> Result<User, AppError> {
        let response = self.execute(Method::GET, &["api", "profile"], |r| r).await?;
        decode(response).await
    }

    pub async fn change_password(&self, body: &ChangePassword) -> Result<(), AppError> {
        self.execute(
            Method::POST,
            &["api", "profile", "change-password"],
            |r| r.json(body),
        )
        .await?;
        Ok(())
    }

    // ========================================================================
    // Forums
    // ========================================================================

    pub async fn get_forums(&self) -> Result<Vec<Forum>, AppError> {
        let response = self.execute(Method::GET, &["api", "forums"], |r| r).await?;
        decode(response).await
    }

    pub async fn create_forum(&self, body: &CreateForum) -> Result<Forum, AppError> {
        let response = self
            .execute(Method::POST, &["api", "forums"], |r| r.json(body))
            .await?;
        decode(response).await
    }

    // ========================================================================
    // Posts
    // ========================================================================

    pub async fn get_posts(
        &self,
        slug: &str,
        page: u32,
        page_size: u32,
    ) -> Result<PaginatedResponse<Post>, AppError> {
        let response = self
            .execute(Method::GET, &["api", "forums", slug, "posts"], |r| {
                r.query(&[("page", page), ("pageSize", page_size)])
            })
            .await?;
        decode(response).await
    }

    pub async fn create_post(&self, slug: &str, body: &CreatePost) -> Result<Post, AppError> {
        let response = self
            .execute(Method::POST, &["api", "forums", slug, "posts"], |r| {
                r.json(body)
            })
            .await?;
        decode(response).await
    }

    pub async fn get_post(&self, slug: &str, number: u64) -> Result<Post, AppError> {
        let number = number.to_string();
        let response = self
            .execute(
                Method::GET,
                &["api", "forums", slug, "posts", &number],
                |r| r,
            )
            .await?;
        decode(response).await
    }

    // ========================================================================
    // Comments
    // ========================================================================

    pub async fn get_comments(&self, slug: &str, number: u64) -> Result<Vec<Comment>, AppError> {
        let number = number.to_string();
        let response = self
            .execute(
                Method::GET,
                &["api", "forums", slug, "posts", &number, "comments"],
                |r| r,
            )
            .await?;
        decode(response).await
    }

    pub async fn create_comment(
        &self,
        slug: &str,
        number: u64,
        content: &str,
    ) -> Result<Comment, AppError> {
        let number = number.to_string();
        let body = CreateComment {
            content: content.to_string(),
        };
        let response = self
            .execute(
                Method::POST,
                &["api", "forums", slug, "posts", &number, "comments"],
                |r| r.json(&body),
            )
            .await?;
        decode(response).await
    }

    // ========================================================================
    // Users & auth
    // ========================================================================

    pub async fn get_users(&self) -> Result<Vec<User>, AppError> {
        let response = self.execute(Method::GET, &["api", "users"], |r| r).await?;
        decode(response).await
    }

    /// Establish a session. The server sets the session cookie.
    pub async fn login(&self, credentials: &LoginRequest) -> Result<(), AppError> {
        self.execute(Method::POST, &["api", "auth", "login"], |r| {
            r.json(credentials)
        })
        .await?;
        Ok(())
    }

    pub async fn logout(&self) -> Result<(), AppError> {
        self.execute(Method::POST, &["api", "auth", "logout"], |r| r)
            .await?;
        Ok(())
    }

    // ========================================================================
    // Plumbing
    // ========================================================================

    /// Resolve path segments against the base URL, percent-encoding each one
    pub fn endpoint(&self, segments: &[&str]) -> Result<Url, AppError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| AppError::unknown(format!("Base URL {} cannot hold a path", self.base_url)))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    async fn execute<F>(
        &self,
        method: Method,
        segments: &[&str],
        build: F,
    ) -> Result<Response, AppError>
    where
        F: FnOnce(RequestBuilder) -> RequestBuilder,
    {
        let url = self.endpoint(segments)?;
        let request = build(
            self.http
                .request(method.clone(), url.clone())
                .header(ACCEPT, "application/json"),
        );

        let response = request.send().await.map_err(|e| {
            let err = AppError::from(e);
            tracing::warn!(method = %method, path = url.path(), error = %err, "Request failed");
            err
        })?;

        let status = response.status();
        tracing::debug!(
            method = %method,
            path = url.path(),
            status = status.as_u16(),
            "API response"
        );

        if status == StatusCode::UNAUTHORIZED {
            self.redirect_to_login();
        }

        if !status.is_success() {
            return Err(normalize::from_response(response).await);
        }
        Ok(response)
    }

    /// Session expired: send the user to the login view. No-op when already
    /// there so a failed login does not stack redirects.
    fn redirect_to_login(&self) {
        let current = self.navigation.current_path();
        if current == self.login_path {
            return;
        }
        tracing::info!(from = %current, to = %self.login_path, "Session expired, redirecting to login");
        self.navigation
            .go(&self.login_path, NavigateOptions::replace());
    }
}

impl std::fmt::Debug for ApiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiClient")
            .field("base_url", &self.base_url.as_str())
            .field("login_path", &self.login_path)
            .finish_non_exhaustive()
    }
}

async fn decode<T: DeserializeOwned>(response: Response) -> Result<T, AppError> {
    let bytes = response.bytes().await?;
    serde_json::from_slice(&bytes)
        .map_err(|e| AppError::unknown(format!("Invalid response body: {}", e)))
}
