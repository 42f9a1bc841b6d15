// Error taxonomy tests

use forum_client::api::normalize;
use forum_client::{AppError, ErrorKind};
use reqwest::StatusCode;
use rstest::rstest;

#[rstest]
#[case(400, ErrorKind::Validation)]
#[case(401, ErrorKind::Unauthorized)]
#[case(403, ErrorKind::Forbidden)]
#[case(404, ErrorKind::NotFound)]
#[case(409, ErrorKind::Conflict)]
#[case(500, ErrorKind::Server)]
#[case(503, ErrorKind::Server)]
#[case(599, ErrorKind::Server)]
#[case(418, ErrorKind::Unknown)]
#[case(302, ErrorKind::Unknown)]
#[case(0, ErrorKind::Unknown)]
fn test_status_classification(#[case] status: u16, #[case] expected: ErrorKind) {
    assert_eq!(ErrorKind::from_status(status), expected);
}

#[test]
fn test_error_display_is_the_message() {
    // Test: AppError renders as its message alone so views can show it inline
    let err = AppError::from_status(404, "Forum not found");
    assert_eq!(err.to_string(), "Forum not found");
    assert_eq!(err.kind().to_string(), "not_found");
}

#[test]
fn test_error_serializes_for_the_cli() {
    let err = AppError::from_status(409, "Slug taken");
    let value = serde_json::to_value(&err).unwrap();
    assert_eq!(value["kind"], "conflict");
    assert_eq!(value["message"], "Slug taken");
    assert_eq!(value["status"], 409);
}

#[test]
fn test_normalizer_prefers_server_message() {
    let err = normalize::from_parts(
        StatusCode::FORBIDDEN,
        Some("application/json"),
        br#"{"message":"Admins only","code":"E_ADMIN"}"#,
    );
    assert_eq!(err.kind(), ErrorKind::Forbidden);
    assert_eq!(err.message(), "Admins only");
}

#[test]
fn test_normalizer_never_exposes_raw_body() {
    let err = normalize::from_parts(
        StatusCode::BAD_GATEWAY,
        Some("text/plain"),
        b"upstream stack trace ...",
    );
    assert_eq!(err.message(), "HTTP 502 Bad Gateway");
    assert_eq!(err.kind(), ErrorKind::Server);
}
