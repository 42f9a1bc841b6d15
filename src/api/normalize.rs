//! Error Normalizer
//!
//! Turns a non-success HTTP response into an [`AppError`]. Message
//! extraction is best effort: a JSON body with a non-blank string `message`
//! wins, anything else falls back to the status line. Never fails.

use reqwest::header::CONTENT_TYPE;
use reqwest::{Response, StatusCode};

use crate::error::AppError;

/// Build an error from the pieces of a response
pub fn from_parts(status: StatusCode, content_type: Option<&str>, body: &[u8]) -> AppError {
    let message = content_type
        .filter(|ct| ct.contains("application/json"))
        .and_then(|_| extract_message(body))
        .unwrap_or_else(|| status_line(status));
    AppError::from_status(status.as_u16(), message)
}

/// Build an error from a response, consuming its body.
///
/// A body that cannot be read is treated like one without a message.
pub async fn from_response(response: Response) -> AppError {
    let status = response.status();
    let content_type = response
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .map(str::to_string);

    let body = match response.bytes().await {
        Ok(bytes) => bytes.to_vec(),
        Err(e) => {
            tracing::debug!(status = status.as_u16(), error = %e, "Failed to read error body");
            Vec::new()
        }
    };

    from_parts(status, content_type.as_deref(), &body)
}

/// `"HTTP <status> <reason>"`. The reason is the canonical phrase for the
/// code; the server's own status text is not available from reqwest.
pub fn status_line(status: StatusCode) -> String {
    format!(
        "HTTP {} {}",
        status.as_u16(),
        status.canonical_reason().unwrap_or("")
    )
    .trim_end()
    .to_string()
}

fn extract_message(body: &[u8]) -> Option<String> {
    let value: serde_json::Value = serde_json::from_slice(body).ok()?;
    let message = value.get("message")?.as_str()?;
    if message.trim().is_empty() {
        None
    } else {
        Some(message.to_string())
    }
}
