// Constants module - centralized default values for the forum client
//
// Query policy defaults, paths and pagination values live here so the
// policy table and the config layer agree on one source.

use std::time::Duration;

// =============================================================================
// Environment
// =============================================================================

/// Environment variable holding the API base URL (required)
pub const BASE_URL_ENV_VAR: &str = "FORUM_API_BASE_URL";

/// Environment variable pointing at an optional YAML config file
pub const CONFIG_PATH_ENV_VAR: &str = "FORUM_CLIENT_CONFIG";

// =============================================================================
// Navigation
// =============================================================================

/// Default path of the login view
pub const DEFAULT_LOGIN_PATH: &str = "/login";

/// Query parameter carrying the return target after login
pub const REDIRECT_PARAM: &str = "redirect";

/// Where a successful login lands when no return target is known
pub const DEFAULT_HOME_PATH: &str = "/";

// =============================================================================
// Query policy defaults
// =============================================================================

/// posts(slug, page, pageSize): fresh for one minute
pub const POSTS_FRESH: Duration = Duration::from_secs(60);

/// posts(slug, page, pageSize): retained for five minutes
pub const POSTS_RETAIN: Duration = Duration::from_secs(5 * 60);

/// post(slug, number): fresh for one minute
pub const POST_FRESH: Duration = Duration::from_secs(60);

/// post(slug, number): retained for five minutes
pub const POST_RETAIN: Duration = Duration::from_secs(5 * 60);

/// comments(slug, number): fresh for thirty seconds
pub const COMMENTS_FRESH: Duration = Duration::from_secs(30);

/// comments(slug, number): retained for two minutes
pub const COMMENTS_RETAIN: Duration = Duration::from_secs(2 * 60);

/// How often entries past their retain window are swept from the cache
pub const CACHE_CLEANUP_INTERVAL: Duration = Duration::from_secs(60);

// =============================================================================
// Pagination
// =============================================================================

/// First page (pages are 1-based)
pub const DEFAULT_PAGE: u32 = 1;

/// Default number of posts per page
pub const DEFAULT_PAGE_SIZE: u32 = 10;

/// Page sizes offered by the paginator
pub const PAGE_SIZE_OPTIONS: [u32; 4] = [5, 10, 20, 50];

// =============================================================================
// Form limits
// =============================================================================

/// Minimum username/password length accepted by the login form
pub const CREDENTIAL_MIN_LEN: usize = 2;

/// Maximum username/password length accepted by the login form
pub const CREDENTIAL_MAX_LEN: usize = 100;
