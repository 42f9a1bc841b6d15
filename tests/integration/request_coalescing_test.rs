// Request coalescing tests: concurrent reads of one query share one request

use super::test_harness::{forum_json, ClientTestHarness};
use futures::future::join_all;
use forum_client::ErrorKind;
use serde_json::json;
use std::time::Duration;
use wiremock::matchers::{method, path};
use wiremock::{Mock, ResponseTemplate};

// Test: Concurrent reads during a fetch issue exactly one network call
#[tokio::test]
async fn test_concurrent_reads_share_one_request() {
    let harness = ClientTestHarness::start("/").await;
    Mock::given(method("GET"))
        .and(path("/api/forums"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!([forum_json("art", "Art", "Art")]))
                .set_delay(Duration::from_millis(100)),
        )
        .expect(1)
        .mount(&harness.server)
        .await;

    let reads = (0..10).map(|_| harness.client.forums());
    let results = join_all(reads).await;

    for result in &results {
        let forums = result.as_ref().unwrap();
        assert_eq!(forums.len(), 1);
        assert_eq!(forums[0].slug, "art");
    }
    assert_eq!(harness.client.stats().fetches, 1);
}

// Test: Every waiter on a failed fetch receives the same error
#[tokio::test]
async fn test_concurrent_reads_share_one_error() {
    let harness = ClientTestHarness::start("/").await;
    Mock::given(method("GET"))
        .and(path("/api/users"))
        .respond_with(
            ResponseTemplate::new(403)
                .set_body_json(json!({ "message": "Admins only" }))
                .set_delay(Duration::from_millis(100)),
        )
        .expect(1)
        .mount(&harness.server)
        .await;

    let results = join_all((0..5).map(|_| harness.client.users())).await;

    for result in results {
        let err = result.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Forbidden);
        assert_eq!(err.message(), "Admins only");
    }
    assert_eq!(harness.client.stats().fetch_errors, 1);
}

// Test: Mutations are never coalesced
#[tokio::test]
async fn test_mutations_are_not_coalesced() {
    let harness = ClientTestHarness::start("/forums/tech/posts/1").await;
    Mock::given(method("POST"))
        .and(path("/api/forums/tech/posts/1/comments"))
        .respond_with(
            ResponseTemplate::new(201)
                .set_body_json(json!({
                    "id": "0b9a8f5e-5a8a-4f6e-9a36-3c1f3f4ad001",
                    "postId": "0b9a8f5e-5a8a-4f6e-9a36-3c1f3f4ad002",
                    "content": "Same",
                    "authorId": "6d3b0a8e-4c4e-4a57-9d1f-0f6f1f0c2a11",
                    "createdAt": "2024-03-01T12:00:00Z"
                }))
                .set_delay(Duration::from_millis(50)),
        )
        .expect(2)
        .mount(&harness.server)
        .await;

    let (first, second) = tokio::join!(
        harness.client.create_comment("tech", 1, "Same"),
        harness.client.create_comment("tech", 1, "Same"),
    );
    assert!(first.is_ok());
    assert!(second.is_ok());
}
