// Navigation gateway tests using a mocked Navigator capability

use forum_client::navigation::{MemoryHistory, NavigateOptions, NavigationGateway, Navigator};
use mockall::mock;
use mockall::predicate::eq;
use std::sync::Arc;

mock! {
    pub Router {}

    impl Navigator for Router {
        fn navigate(&self, path: &str, options: NavigateOptions);
    }
}

#[test]
fn test_go_delegates_to_registered_navigator() {
    let mut router = MockRouter::new();
    router
        .expect_navigate()
        .with(eq("/login"), eq(NavigateOptions::replace()))
        .times(1)
        .return_const(());

    let document = Arc::new(MemoryHistory::new("/forums"));
    let gateway = NavigationGateway::new(document.clone());
    gateway.register(Arc::new(router));

    gateway.go("/login", NavigateOptions::replace());

    // The router handled it; the document was never touched
    assert_eq!(document.full_loads(), 0);
    assert_eq!(document.current(), "/forums");
}

#[test]
fn test_last_registration_wins() {
    let mut first = MockRouter::new();
    first.expect_navigate().times(0);
    let mut second = MockRouter::new();
    second
        .expect_navigate()
        .with(eq("/forums/tech"), eq(NavigateOptions::push()))
        .times(1)
        .return_const(());

    let gateway = NavigationGateway::new(Arc::new(MemoryHistory::new("/")));
    gateway.register(Arc::new(first));
    gateway.register(Arc::new(second));

    gateway.go("/forums/tech", NavigateOptions::push());
}

#[test]
fn test_calls_before_registration_are_not_queued() {
    let document = Arc::new(MemoryHistory::new("/"));
    let gateway = NavigationGateway::new(document.clone());

    gateway.go("/login", NavigateOptions::replace());
    assert_eq!(document.full_loads(), 1);

    let mut router = MockRouter::new();
    router.expect_navigate().times(0);
    gateway.register(Arc::new(router));
    assert!(gateway.is_registered());
}

#[test]
fn test_clones_share_registration() {
    let gateway = NavigationGateway::new(Arc::new(MemoryHistory::new("/")));
    let clone = gateway.clone();

    let mut router = MockRouter::new();
    router
        .expect_navigate()
        .with(eq("/profile"), eq(NavigateOptions::push()))
        .times(1)
        .return_const(());
    gateway.register(Arc::new(router));

    clone.go("/profile", NavigateOptions::push());
}

#[test]
fn test_current_path_ignores_query_string() {
    let history = Arc::new(MemoryHistory::new("/login?redirect=%2Fforums"));
    let gateway = NavigationGateway::with_navigator(history.clone(), history);
    assert_eq!(gateway.current_path(), "/login");
}
