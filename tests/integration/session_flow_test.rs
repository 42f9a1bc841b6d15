// Session flow tests: login, logout and the session boundary against a mock backend

use super::test_harness::{forum_json, user_json, ClientTestHarness};
use forum_client::cache::Freshness;
use forum_client::models::LoginRequest;
use forum_client::queries::{current_user_identity, forums_identity};
use forum_client::session::{return_target, BoundaryError, BoundaryState};
use forum_client::ErrorKind;
use serde_json::json;
use wiremock::matchers::{body_json, header, method, path};
use wiremock::{Mock, ResponseTemplate};

// Test: Successful login populates currentUser and forums can be fetched
#[tokio::test]
async fn test_login_then_current_user_and_forums() {
    let harness = ClientTestHarness::start("/login").await;

    Mock::given(method("POST"))
        .and(path("/api/auth/login"))
        .and(body_json(json!({ "username": "alice", "password": "correct-horse" })))
        .respond_with(
            ResponseTemplate::new(204).insert_header("set-cookie", "session=abc123; Path=/; HttpOnly"),
        )
        .expect(1)
        .mount(&harness.server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/profile"))
        .and(header("cookie", "session=abc123"))
        .respond_with(ResponseTemplate::new(200).set_body_json(user_json("alice", "admin")))
        .expect(1)
        .mount(&harness.server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/forums"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            forum_json("tech", "Technology", "Technology")
        ])))
        .expect(1)
        .mount(&harness.server)
        .await;

    harness
        .client
        .login(&LoginRequest::new("alice", "correct-horse"))
        .await
        .unwrap();

    let user = harness.client.current_user().await.unwrap().unwrap();
    assert_eq!(user.username, "alice");
    assert!(user.is_admin());

    let forums = harness.client.forums().await.unwrap();
    assert_eq!(forums.len(), 1);
    assert_eq!(forums[0].slug, "tech");

    // Second reads are served from cache
    harness.client.current_user().await.unwrap();
    harness.client.forums().await.unwrap();
    assert_eq!(harness.history.entries(), vec!["/login".to_string()]);
}

// Test: Bad credentials surface as Unauthorized without navigating away from /login
#[tokio::test]
async fn test_bad_credentials_stay_on_login_page() {
    let harness = ClientTestHarness::start("/login").await;

    Mock::given(method("POST"))
        .and(path("/api/auth/login"))
        .respond_with(
            ResponseTemplate::new(401).set_body_json(json!({ "message": "Invalid username or password" })),
        )
        .mount(&harness.server)
        .await;

    let err = harness
        .client
        .login(&LoginRequest::new("alice", "wrong-password"))
        .await
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::Unauthorized);
    assert_eq!(err.message(), "Invalid username or password");
    assert_eq!(harness.history.entries(), vec!["/login".to_string()]);
    assert_eq!(harness.client.stats().invalidations, 0);
}

// Test: Login invalidates every cached query
#[tokio::test]
async fn test_login_invalidates_everything() {
    let harness = ClientTestHarness::start("/login").await;

    Mock::given(method("GET"))
        .and(path("/api/forums"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&harness.server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/profile"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&harness.server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/auth/login"))
        .respond_with(ResponseTemplate::new(204))
        .mount(&harness.server)
        .await;

    harness.client.forums().await.unwrap();
    assert_eq!(harness.client.current_user().await.unwrap(), None);

    harness
        .client
        .login(&LoginRequest::new("alice", "correct-horse"))
        .await
        .unwrap();

    let cache = harness.client.cache();
    assert_eq!(cache.freshness(&forums_identity()), Some(Freshness::Stale));
    // currentUser was refetched before login returned
    assert_eq!(cache.freshness(&current_user_identity()), Some(Freshness::Fresh));
}

// Test: Logout overwrites only currentUser and the boundary then redirects
#[tokio::test]
async fn test_logout_then_boundary_redirects() {
    let harness = ClientTestHarness::start("/forums").await;

    Mock::given(method("GET"))
        .and(path("/api/profile"))
        .respond_with(ResponseTemplate::new(200).set_body_json(user_json("alice", "user")))
        .expect(1)
        .mount(&harness.server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/forums"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .expect(1)
        .mount(&harness.server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/auth/logout"))
        .respond_with(ResponseTemplate::new(204))
        .mount(&harness.server)
        .await;

    let session = harness.client.enter("/forums").await.unwrap();
    assert!(!session.is_admin());
    harness.client.forums().await.unwrap();

    harness.client.logout().await.unwrap();

    assert_eq!(
        harness.client.cache().freshness(&forums_identity()),
        Some(Freshness::Fresh)
    );

    let err = harness.client.enter("/forums/tech").await.unwrap_err();
    let expected = "/login?redirect=%2Fforums%2Ftech".to_string();
    assert_eq!(err, BoundaryError::Redirect { to: expected.clone() });
    assert_eq!(harness.client.session().state(), BoundaryState::Redirecting { to: expected.clone() });
    assert_eq!(harness.history.current(), expected);
}

// Test: Unauthenticated entry into a protected area redirects with the requested path
#[tokio::test]
async fn test_boundary_redirects_when_profile_unauthorized() {
    let harness = ClientTestHarness::start("/admin/forums/new").await;

    Mock::given(method("GET"))
        .and(path("/api/profile"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&harness.server)
        .await;

    let result = harness.client.enter("/admin/forums/new").await;

    assert!(matches!(result, Err(BoundaryError::Redirect { .. })));
    // Both navigations replace the entry the user tried to open
    assert_eq!(
        harness.history.entries(),
        vec!["/login?redirect=%2Fadmin%2Fforums%2Fnew".to_string()]
    );
}

// Test: The boundary fails closed when the profile request cannot complete
#[tokio::test]
async fn test_boundary_fails_closed_on_server_error() {
    let harness = ClientTestHarness::start("/forums").await;

    Mock::given(method("GET"))
        .and(path("/api/profile"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&harness.server)
        .await;

    let err = harness.client.enter("/forums").await.unwrap_err();
    assert_eq!(
        err,
        BoundaryError::Redirect {
            to: "/login?redirect=%2Fforums".to_string()
        }
    );
    assert!(harness
        .client
        .cache()
        .get_query_data::<Option<forum_client::models::User>>(&current_user_identity())
        .is_none());
}

// Test: Logging back in after a logout lets the boundary through again
#[tokio::test]
async fn test_logout_then_login_then_enter() {
    let harness = ClientTestHarness::start("/forums").await;

    Mock::given(method("GET"))
        .and(path("/api/profile"))
        .respond_with(ResponseTemplate::new(200).set_body_json(user_json("alice", "user")))
        .expect(2)
        .mount(&harness.server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/auth/logout"))
        .respond_with(ResponseTemplate::new(204))
        .mount(&harness.server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/auth/login"))
        .respond_with(ResponseTemplate::new(204))
        .mount(&harness.server)
        .await;

    harness.client.enter("/forums").await.unwrap();
    harness.client.logout().await.unwrap();
    assert_eq!(harness.client.current_user().await.unwrap(), None);

    harness
        .client
        .login(&LoginRequest::new("alice", "correct-horse"))
        .await
        .unwrap();

    let session = harness.client.enter("/forums").await.unwrap();
    assert_eq!(session.user().username, "alice");
    assert_eq!(
        harness.client.session().state(),
        BoundaryState::Resolved {
            user: session.user().clone()
        }
    );
    assert_eq!(harness.history.entries(), vec!["/forums".to_string()]);
}

// Test: A first anonymous visit, then login, returns the user to the page they asked for
#[tokio::test]
async fn test_unauthorized_visit_then_login_returns_to_target() {
    let harness = ClientTestHarness::start("/forums/tech").await;

    Mock::given(method("GET"))
        .and(path("/api/profile"))
        .respond_with(ResponseTemplate::new(401))
        .up_to_n_times(1)
        .expect(1)
        .mount(&harness.server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/profile"))
        .respond_with(ResponseTemplate::new(200).set_body_json(user_json("alice", "user")))
        .expect(1)
        .mount(&harness.server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/auth/login"))
        .respond_with(ResponseTemplate::new(204))
        .mount(&harness.server)
        .await;

    let err = harness.client.enter("/forums/tech").await.unwrap_err();
    assert_eq!(
        err,
        BoundaryError::Redirect {
            to: "/login?redirect=%2Fforums%2Ftech".to_string()
        }
    );

    harness
        .client
        .login(&LoginRequest::new("alice", "correct-horse"))
        .await
        .unwrap();

    let location = harness.history.current();
    let (_, query) = location.split_once('?').unwrap();
    let target = return_target(query);
    assert_eq!(target, "/forums/tech");

    let session = harness.client.enter(&target).await.unwrap();
    assert_eq!(session.user().username, "alice");
}
