// =============================================================================
// Application Identity
// =============================================================================

/// Application name in lowercase (for paths, identifiers and the log target)
pub const APP_NAME_LOWER: &str = "spanquery";

/// Unix-style dotfile folder name
pub const APP_DOT_FOLDER: &str = ".spanquery";

// =============================================================================
// Configuration Files
// =============================================================================

/// Config file name
pub const CONFIG_FILE_NAME: &str = "spanquery.json";

/// Environment variable for config file path
pub const ENV_CONFIG: &str = "SPANQUERY_CONFIG";

/// Environment variable for log level/filter
pub const ENV_LOG: &str = "SPANQUERY_LOG";

// =============================================================================
// Environment Variables - Database
// =============================================================================

/// Environment variable for the span database path
pub const ENV_DB_PATH: &str = "SPANQUERY_DB_PATH";

/// Environment variable for the connection pool size
pub const ENV_DB_MAX_CONNECTIONS: &str = "SPANQUERY_DB_MAX_CONNECTIONS";

// =============================================================================
// Environment Variables - Query
// =============================================================================

/// Environment variable for the default search page size
pub const ENV_DEFAULT_PAGE_SIZE: &str = "SPANQUERY_DEFAULT_PAGE_SIZE";

/// Environment variable for the maximum search page size
pub const ENV_MAX_PAGE_SIZE: &str = "SPANQUERY_MAX_PAGE_SIZE";

/// Environment variable for the per-request query timeout in seconds
pub const ENV_QUERY_TIMEOUT_SECS: &str = "SPANQUERY_QUERY_TIMEOUT_SECS";

/// Environment variable for the continuation token policy
pub const ENV_CURSOR_POLICY: &str = "SPANQUERY_CURSOR_POLICY";

/// Environment variable bounding the number of values per tag
pub const ENV_MAX_TAG_VALUES: &str = "SPANQUERY_MAX_TAG_VALUES";

// =============================================================================
// SQLite Configuration
// =============================================================================

/// SQLite database filename (inside the dotfile folder)
pub const SQLITE_DB_FILENAME: &str = "spans.db";

/// Maximum number of connections in the pool
pub const SQLITE_MAX_CONNECTIONS: u32 = 4;

/// Busy timeout in seconds (wait for locks held by the ingestion writer)
pub const SQLITE_BUSY_TIMEOUT_SECS: u64 = 5;

// =============================================================================
// Query Configuration
// =============================================================================

/// Page size used when a search request omits one
pub const DEFAULT_PAGE_SIZE: u32 = 100;

/// Upper bound on search page size; larger requests are clamped
pub const MAX_PAGE_SIZE: u32 = 1000;

/// Per-request query timeout in seconds (0 disables)
pub const DEFAULT_QUERY_TIMEOUT_SECS: u64 = 30;
