// Error types module

use std::fmt;

use serde::Serialize;

/// Stable classification of every failure the client can surface.
///
/// Derived from an HTTP status via [`ErrorKind::from_status`], or assigned
/// directly for transport (`Network`) and decode (`Unknown`) failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// 400 - request rejected as invalid (also used for client-side form checks)
    Validation,
    /// 401 - no valid session
    Unauthorized,
    /// 403 - session lacks permission
    Forbidden,
    /// 404 - resource does not exist
    NotFound,
    /// 409 - resource already exists / state conflict
    Conflict,
    /// 5xx - backend failure
    Server,
    /// No response was received
    Network,
    /// Anything else
    Unknown,
}

impl ErrorKind {
    /// Map an HTTP status code to an error kind.
    ///
    /// Total over `u16`: unmapped codes fall to `Server` for the 5xx range
    /// and `Unknown` otherwise.
    pub fn from_status(status: u16) -> Self {
        match status {
            400 => ErrorKind::Validation,
            401 => ErrorKind::Unauthorized,
            403 => ErrorKind::Forbidden,
            404 => ErrorKind::NotFound,
            409 => ErrorKind::Conflict,
            500..=599 => ErrorKind::Server,
            _ => ErrorKind::Unknown,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::Validation => "validation",
            ErrorKind::Unauthorized => "unauthorized",
            ErrorKind::Forbidden => "forbidden",
            ErrorKind::NotFound => "not_found",
            ErrorKind::Conflict => "conflict",
            ErrorKind::Server => "server",
            ErrorKind::Network => "network",
            ErrorKind::Unknown => "unknown",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The one error type every gateway, cache and mutation operation returns.
///
/// `message` is display-ready; callers render it inline. `status` is kept
/// when the error came from an HTTP response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, thiserror::Error)]
#[error("{message}")]
pub struct AppError {
    kind: ErrorKind,
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    status: Option<u16>,
}

impl AppError {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            status: None,
        }
    }

    /// Build an error for an HTTP status with an already-extracted message
    pub fn from_status(status: u16, message: impl Into<String>) -> Self {
        Self {
            kind: ErrorKind::from_status(status),
            message: message.into(),
            status: Some(status),
        }
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Validation, message)
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Forbidden, message)
    }

    pub fn network(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Network, message)
    }

    pub fn unknown(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Unknown, message)
    }

    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn status(&self) -> Option<u16> {
        self.status
    }

    pub fn is_unauthorized(&self) -> bool {
        self.kind == ErrorKind::Unauthorized
    }
}

impl From<reqwest::Error> for AppError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            AppError::unknown(format!("Invalid response body: {}", err))
        } else if err.is_connect() {
            AppError::network(format!("Connection failed: {}", err))
        } else {
            AppError::network(format!("Request failed: {}", err))
        }
    }
}
