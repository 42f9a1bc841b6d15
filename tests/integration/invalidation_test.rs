// Mutation invalidation tests: each write marks exactly its dependent queries stale

use super::test_harness::{forum_json, post_json, posts_page_json, ClientTestHarness};
use forum_client::cache::Freshness;
use forum_client::models::{Category, CreateForum, CreatePost};
use forum_client::queries::{comments_identity, forums_identity, post_identity, posts_identity};
use serde_json::json;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, ResponseTemplate};

async fn mount_posts(harness: &ClientTestHarness, slug: &str, expected_calls: u64) {
    Mock::given(method("GET"))
        .and(path(format!("/api/forums/{}/posts", slug)))
        .and(query_param("page", "1"))
        .and(query_param("pageSize", "10"))
        .respond_with(ResponseTemplate::new(200).set_body_json(posts_page_json(
            1,
            10,
            1,
            vec![post_json(1, "First")],
        )))
        .expect(expected_calls)
        .mount(&harness.server)
        .await;
}

// Test: Creating a post in tech leaves science post lists fresh
#[tokio::test]
async fn test_create_post_only_invalidates_its_forum() {
    let harness = ClientTestHarness::start("/forums/tech").await;
    mount_posts(&harness, "tech", 2).await;
    mount_posts(&harness, "science", 1).await;
    Mock::given(method("POST"))
        .and(path("/api/forums/tech/posts"))
        .respond_with(ResponseTemplate::new(201).set_body_json(post_json(2, "Second")))
        .expect(1)
        .mount(&harness.server)
        .await;

    let client = &harness.client;
    client.posts("tech", 1, 10).await.unwrap();
    client.posts("science", 1, 10).await.unwrap();

    let body = CreatePost {
        title: "Second".to_string(),
        content: "More".to_string(),
        tags: vec!["rust".to_string()],
    };
    let post = client.create_post("tech", &body).await.unwrap();
    assert_eq!(post.number, 2);

    let cache = client.cache();
    assert_eq!(
        cache.freshness(&posts_identity("tech", 1, 10)),
        Some(Freshness::Stale)
    );
    assert_eq!(
        cache.freshness(&posts_identity("science", 1, 10)),
        Some(Freshness::Fresh)
    );

    // Science is served from cache; tech is refetched
    client.posts("science", 1, 10).await.unwrap();
    cache.fetch(&client.queries().posts("tech", 1, 10)).await.unwrap();
    assert_eq!(
        cache.freshness(&posts_identity("tech", 1, 10)),
        Some(Freshness::Fresh)
    );
}

// Test: A stale read returns the cached page and refreshes it in the background
#[tokio::test]
async fn test_stale_read_refreshes_in_background() {
    let harness = ClientTestHarness::start("/forums/tech").await;
    mount_posts(&harness, "tech", 2).await;
    Mock::given(method("POST"))
        .and(path("/api/forums/tech/posts"))
        .respond_with(ResponseTemplate::new(201).set_body_json(post_json(2, "Second")))
        .mount(&harness.server)
        .await;

    let client = &harness.client;
    let first = client.posts("tech", 1, 10).await.unwrap();
    let body = CreatePost {
        title: "Second".to_string(),
        content: "More".to_string(),
        tags: vec![],
    };
    client.create_post("tech", &body).await.unwrap();

    let stale = client.posts("tech", 1, 10).await.unwrap();
    assert_eq!(stale, first);

    harness.settle().await;
    assert_eq!(
        client.cache().freshness(&posts_identity("tech", 1, 10)),
        Some(Freshness::Fresh)
    );
    assert_eq!(client.stats().stale_hits, 1);
}

// Test: Creating a forum invalidates only the forum list
#[tokio::test]
async fn test_create_forum_invalidates_forum_list() {
    let harness = ClientTestHarness::start("/admin/forums/new").await;
    Mock::given(method("GET"))
        .and(path("/api/forums"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&harness.server)
        .await;
    mount_posts(&harness, "tech", 1).await;
    Mock::given(method("POST"))
        .and(path("/api/forums"))
        .respond_with(
            ResponseTemplate::new(201).set_body_json(forum_json("gardening", "Gardening", "Science")),
        )
        .mount(&harness.server)
        .await;

    let client = &harness.client;
    client.forums().await.unwrap();
    client.posts("tech", 1, 10).await.unwrap();

    let forum = client
        .create_forum(&CreateForum {
            title: "Gardening".to_string(),
            slug: "gardening".to_string(),
            description: "Plants".to_string(),
            category: Category::Science,
        })
        .await
        .unwrap();
    assert_eq!(forum.category, Category::Science);

    assert_eq!(
        client.cache().freshness(&forums_identity()),
        Some(Freshness::Stale)
    );
    assert_eq!(
        client.cache().freshness(&posts_identity("tech", 1, 10)),
        Some(Freshness::Fresh)
    );
}

// Test: A comment invalidates its own post's comments and nothing else
#[tokio::test]
async fn test_create_comment_invalidates_only_that_thread() {
    let harness = ClientTestHarness::start("/forums/tech/posts/1").await;
    for number in [1, 2] {
        Mock::given(method("GET"))
            .and(path(format!("/api/forums/tech/posts/{}/comments", number)))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
            .mount(&harness.server)
            .await;
    }
    Mock::given(method("GET"))
        .and(path("/api/forums/tech/posts/1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(post_json(1, "First")))
        .mount(&harness.server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/forums/tech/posts/1/comments"))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({
            "id": "0b9a8f5e-5a8a-4f6e-9a36-3c1f3f4ad001",
            "postId": "0b9a8f5e-5a8a-4f6e-9a36-3c1f3f4ad002",
            "content": "Agreed",
            "authorId": "6d3b0a8e-4c4e-4a57-9d1f-0f6f1f0c2a11",
            "createdAt": "2024-03-01T12:00:00Z"
        })))
        .mount(&harness.server)
        .await;

    let client = &harness.client;
    client.post("tech", 1).await.unwrap();
    client.comments("tech", 1).await.unwrap();
    client.comments("tech", 2).await.unwrap();

    client.create_comment("tech", 1, "Agreed").await.unwrap();

    let cache = client.cache();
    assert_eq!(cache.freshness(&comments_identity("tech", 1)), Some(Freshness::Stale));
    assert_eq!(cache.freshness(&comments_identity("tech", 2)), Some(Freshness::Fresh));
    assert_eq!(cache.freshness(&post_identity("tech", 1)), Some(Freshness::Fresh));
}

// Test: The client sweeps expired queries in the background
#[tokio::test]
async fn test_client_runs_cache_cleanup() {
    let harness = ClientTestHarness::start("/forums").await;
    assert!(harness.client.cache().is_cleanup_running());
}
