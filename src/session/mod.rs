//! Session Boundary
//!
//! Gate in front of every protected area. Entering resolves the current
//! principal through the `["currentUser"]` query; anything other than a
//! resolved user redirects to the login view, carrying the requested path
//! so the login flow can send the user back.
//!
//! The boundary fails closed: a network error looks the same as "logged
//! out". It keeps no user of its own between entries.

use parking_lot::Mutex;
use serde::Serialize;

use crate::cache::{Freshness, QueryCache};
use crate::constants::{DEFAULT_HOME_PATH, REDIRECT_PARAM};
use crate::error::AppError;
use crate::models::User;
use crate::navigation::{NavigateOptions, NavigationGateway};
use crate::queries::Queries;

/// Where the boundary stands for the most recent entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum BoundaryState {
    Unresolved,
    Resolved { user: User },
    Redirecting { to: String },
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BoundaryError {
    /// No session; navigation to `to` has already been issued
    #[error("Not signed in, redirecting to {to}")]
    Redirect { to: String },
}

/// What a protected area receives once the principal is resolved
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionContext {
    user: User,
}

impl SessionContext {
    pub fn new(user: User) -> Self {
        Self { user }
    }

    pub fn user(&self) -> &User {
        &self.user
    }

    pub fn is_admin(&self) -> bool {
        self.user.is_admin()
    }

    /// Gate for admin-only views. Authorization proper is the server's job.
    pub fn require_admin(&self) -> Result<(), AppError> {
        if self.is_admin() {
            Ok(())
        } else {
            Err(AppError::forbidden(format!(
                "{} is not an administrator",
                self.user.username
            )))
        }
    }
}

pub struct SessionBoundary {
    cache: QueryCache,
    queries: Queries,
    navigation: NavigationGateway,
    login_path: String,
    state: Mutex<BoundaryState>,
}

impl SessionBoundary {
    pub fn new(
        cache: QueryCache,
        queries: Queries,
        navigation: NavigationGateway,
        login_path: impl Into<String>,
    ) -> Self {
        Self {
            cache,
            queries,
            navigation,
            login_path: login_path.into(),
            state: Mutex::new(BoundaryState::Unresolved),
        }
    }

    pub fn state(&self) -> BoundaryState {
        self.state.lock().clone()
    }

    /// Resolve the principal before `requested_path` loads
    pub async fn enter(&self, requested_path: &str) -> Result<SessionContext, BoundaryError> {
        *self.state.lock() = BoundaryState::Unresolved;

        let query = self.queries.current_user();
        let resolved = match self.cache.get(&query).await {
            // A stale "logged out" is confirmed with the server first
            Ok(None) if self.cache.freshness(query.identity()) != Some(Freshness::Fresh) => {
                self.cache.fetch(&query).await
            }
            other => other,
        };

        match resolved {
            Ok(Some(user)) => {
                tracing::debug!(path = requested_path, username = %user.username, "Session resolved");
                *self.state.lock() = BoundaryState::Resolved { user: user.clone() };
                Ok(SessionContext::new(user))
            }
            Ok(None) => {
                tracing::debug!(path = requested_path, "No session");
                Err(self.redirect(requested_path))
            }
            Err(err) => {
                tracing::warn!(path = requested_path, kind = %err.kind(), error = %err, "Session check failed");
                Err(self.redirect(requested_path))
            }
        }
    }

    fn redirect(&self, requested_path: &str) -> BoundaryError {
        let to = login_redirect(&self.login_path, requested_path);
        *self.state.lock() = BoundaryState::Redirecting { to: to.clone() };
        self.navigation.go(&to, NavigateOptions::replace());
        BoundaryError::Redirect { to }
    }
}

impl std::fmt::Debug for SessionBoundary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionBoundary")
            .field("login_path", &self.login_path)
            .field("state", &*self.state.lock())
            .finish_non_exhaustive()
    }
}

/// `<login_path>?redirect=<encoded path>`
pub fn login_redirect(login_path: &str, requested_path: &str) -> String {
    format!(
        "{}?{}={}",
        login_path,
        REDIRECT_PARAM,
        urlencoding::encode(requested_path)
    )
}

/// Where to go after a successful login, read from the login view's query
/// string. Only same-origin absolute paths are honored.
pub fn return_target(query: &str) -> String {
    query
        .trim_start_matches('?')
        .split('&')
        .filter_map(|pair| pair.split_once('='))
        .find(|(key, _)| *key == REDIRECT_PARAM)
        .and_then(|(_, value)| urlencoding::decode(value).ok())
        .map(|value| value.into_owned())
        .filter(|target| target.starts_with('/') && !target.starts_with("//"))
        .unwrap_or_else(|| DEFAULT_HOME_PATH.to_string())
}
