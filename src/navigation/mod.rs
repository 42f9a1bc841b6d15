//! Navigation Gateway
//!
//! Lets non-UI code (the request gateway's 401 interception, the session
//! boundary) trigger page navigation without depending on a routing
//! framework. The router's navigate function is injected as a [`Navigator`]
//! capability; until one is registered, navigation degrades to a
//! full-document load through the [`Document`] host.

mod history;

pub use history::MemoryHistory;

use parking_lot::RwLock;
use std::sync::Arc;

/// Options for a single navigation
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct NavigateOptions {
    /// Replace the current history entry instead of pushing a new one
    pub replace: bool,
}

impl NavigateOptions {
    pub fn push() -> Self {
        Self { replace: false }
    }

    pub fn replace() -> Self {
        Self { replace: true }
    }
}

/// In-app (router) navigation capability
pub trait Navigator: Send + Sync {
    fn navigate(&self, path: &str, options: NavigateOptions);
}

/// The document host: current location plus full-document navigation
pub trait Document: Send + Sync {
    /// Path component of the current location (no query string)
    fn pathname(&self) -> String;

    /// Full-document navigation to `path`
    fn assign(&self, path: &str);
}

/// Single indirection point for navigation side effects.
///
/// Cheap to clone; clones share the registered navigator.
#[derive(Clone)]
pub struct NavigationGateway {
    navigator: Arc<RwLock<Option<Arc<dyn Navigator>>>>,
    document: Arc<dyn Document>,
}

impl NavigationGateway {
    /// Gateway with no navigator yet; `go` degrades until `register` is called
    pub fn new(document: Arc<dyn Document>) -> Self {
        Self {
            navigator: Arc::new(RwLock::new(None)),
            document,
        }
    }

    pub fn with_navigator(document: Arc<dyn Document>, navigator: Arc<dyn Navigator>) -> Self {
        Self {
            navigator: Arc::new(RwLock::new(Some(navigator))),
            document,
        }
    }

    /// Store the navigator. Registering again replaces it (last write wins).
    pub fn register(&self, navigator: Arc<dyn Navigator>) {
        *self.navigator.write() = Some(navigator);
    }

    pub fn is_registered(&self) -> bool {
        self.navigator.read().is_some()
    }

    /// Navigate to `path`.
    ///
    /// Without a registered navigator this performs a full-document
    /// navigation and logs a warning. Nothing is queued.
    pub fn go(&self, path: &str, options: NavigateOptions) {
        // Clone out so the navigator runs without the lock held
        let navigator = self.navigator.read().clone();
        match navigator {
            Some(navigator) => {
                tracing::debug!(path = %path, replace = options.replace, "Navigating");
                navigator.navigate(path, options);
            }
            None => {
                tracing::warn!(
                    path = %path,
                    "Navigation requested before a navigator was registered, falling back to full-document navigation"
                );
                self.document.assign(path);
            }
        }
    }

    /// Path of the current location
    pub fn current_path(&self) -> String {
        self.document.pathname()
    }
}

impl std::fmt::Debug for NavigationGateway {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NavigationGateway")
            .field("registered", &self.is_registered())
            .field("current_path", &self.current_path())
            .finish()
    }
}
