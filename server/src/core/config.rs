use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::data::filters::QueryLimits;

use super::cli::CliConfig;
use super::constants::{
    APP_DOT_FOLDER, CONFIG_FILE_NAME, DEFAULT_PAGE_SIZE, DEFAULT_QUERY_TIMEOUT_SECS, MAX_PAGE_SIZE,
    SQLITE_BUSY_TIMEOUT_SECS, SQLITE_DB_FILENAME, SQLITE_MAX_CONNECTIONS,
};

// =============================================================================
// Cursor Policy Enum
// =============================================================================

/// When a search response carries a continuation token
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CursorPolicy {
    /// Whenever at least one span was returned
    #[default]
    AnyRows,
    /// Only when the page reached the page size
    FullPage,
}

impl fmt::Display for CursorPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CursorPolicy::AnyRows => write!(f, "any_rows"),
            CursorPolicy::FullPage => write!(f, "full_page"),
        }
    }
}

// =============================================================================
// File Config (JSON)
// =============================================================================

/// Database configuration section (from JSON config file)
#[derive(Debug, Default, Clone, Deserialize)]
pub struct DatabaseFileConfig {
    pub path: Option<String>,
    pub max_connections: Option<u32>,
    pub busy_timeout_secs: Option<u64>,
}

/// Query configuration section (from JSON config file)
#[derive(Debug, Default, Clone, Deserialize)]
pub struct QueryFileConfig {
    pub default_page_size: Option<u32>,
    pub max_page_size: Option<u32>,
    pub timeout_secs: Option<u64>,
    pub cursor_policy: Option<CursorPolicy>,
    pub max_tag_values: Option<u32>,
}

/// File-based configuration (JSON)
#[derive(Debug, Default, Deserialize)]
pub struct FileConfig {
    pub database: Option<DatabaseFileConfig>,
    pub query: Option<QueryFileConfig>,
    #[serde(flatten)]
    pub extra: serde_json::Value,
}

impl FileConfig {
    /// Load configuration from a JSON file
    fn load_from_file(path: &Path) -> Result<Self> {
        tracing::debug!(path = %path.display(), "Loading config file");
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        let config: Self = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;
        tracing::trace!(config = ?config, "Parsed config file");
        Ok(config)
    }

    /// Warn about unknown fields in the config
    fn warn_unknown_fields(&self) {
        if let serde_json::Value::Object(map) = &self.extra
            && !map.is_empty()
        {
            let keys_str: String = map
                .keys()
                .map(|k| k.as_str())
                .collect::<Vec<_>>()
                .join(", ");
            tracing::warn!(
                fields = %keys_str,
                "Unknown fields in config file (possible typos)"
            );
        }
    }

    /// Merge another FileConfig into this one (other takes precedence)
    fn merge(&mut self, other: FileConfig) {
        // Database
        if let Some(database) = other.database {
            let current = self
                .database
                .get_or_insert_with(DatabaseFileConfig::default);
            if database.path.is_some() {
                tracing::trace!(path = ?database.path, "Merging database.path");
                current.path = database.path;
            }
            if database.max_connections.is_some() {
                current.max_connections = database.max_connections;
            }
            if database.busy_timeout_secs.is_some() {
                current.busy_timeout_secs = database.busy_timeout_secs;
            }
        }

        // Query
        if let Some(query) = other.query {
            let current = self.query.get_or_insert_with(QueryFileConfig::default);
            if query.default_page_size.is_some() {
                current.default_page_size = query.default_page_size;
            }
            if query.max_page_size.is_some() {
                current.max_page_size = query.max_page_size;
            }
            if query.timeout_secs.is_some() {
                current.timeout_secs = query.timeout_secs;
            }
            if query.cursor_policy.is_some() {
                tracing::trace!(cursor_policy = ?query.cursor_policy, "Merging query.cursor_policy");
                current.cursor_policy = query.cursor_policy;
            }
            if query.max_tag_values.is_some() {
                current.max_tag_values = query.max_tag_values;
            }
        }
    }
}

// =============================================================================
// Resolved Config
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DatabaseConfig {
    pub path: PathBuf,
    pub max_connections: u32,
    pub busy_timeout_secs: u64,
}

/// Query engine settings shared by every reader call
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryConfig {
    pub default_page_size: u32,
    pub max_page_size: u32,
    /// 0 disables the per-request timeout
    pub timeout_secs: u64,
    pub cursor_policy: CursorPolicy,
    pub max_tag_values: Option<u32>,
}

impl Default for QueryConfig {
    fn default() -> Self {
        Self {
            default_page_size: DEFAULT_PAGE_SIZE,
            max_page_size: MAX_PAGE_SIZE,
            timeout_secs: DEFAULT_QUERY_TIMEOUT_SECS,
            cursor_policy: CursorPolicy::default(),
            max_tag_values: None,
        }
    }
}

impl QueryConfig {
    pub fn limits(&self) -> QueryLimits {
        QueryLimits {
            default_page_size: self.default_page_size,
            max_page_size: self.max_page_size,
        }
    }

    pub fn timeout(&self) -> Option<Duration> {
        (self.timeout_secs > 0).then(|| Duration::from_secs(self.timeout_secs))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    pub database: DatabaseConfig,
    pub query: QueryConfig,
}

impl AppConfig {
    /// Load configuration with priority (lowest to highest):
    /// 1. Built-in defaults
    /// 2. Profile directory config (~/.spanquery/spanquery.json)
    /// 3. Local directory config OR CLI-specified config path
    /// 4. CLI arguments (which include env var fallbacks via clap)
    pub fn load(cli: &CliConfig) -> Result<Self> {
        let profile = get_profile_config_path();
        Self::load_from(cli, profile.as_deref())
    }

    fn load_from(cli: &CliConfig, profile_path: Option<&Path>) -> Result<Self> {
        tracing::debug!("Loading application configuration");
        tracing::trace!(cli = ?cli, "CLI config");

        let mut file_config = FileConfig::default();
        let mut found_configs: Vec<String> = Vec::new();

        // 1. Load from profile dir - skip if not exists
        if let Some(profile_path) = profile_path
            && profile_path.exists()
        {
            let profile_config = FileConfig::load_from_file(profile_path)?;
            profile_config.warn_unknown_fields();
            file_config.merge(profile_config);
            found_configs.push(profile_path.display().to_string());
        }

        // 2. Load from CLI-specified path OR local directory
        let overlay_path = if let Some(ref path) = cli.config {
            let expanded = expand_path(&path.to_string_lossy());
            if !expanded.exists() {
                anyhow::bail!("Config file not found: {}", expanded.display());
            }
            Some(expanded)
        } else {
            let local = PathBuf::from(CONFIG_FILE_NAME);
            if local.exists() { Some(local) } else { None }
        };

        if let Some(path) = overlay_path {
            let overlay_config = FileConfig::load_from_file(&path)?;
            overlay_config.warn_unknown_fields();
            file_config.merge(overlay_config);
            found_configs.push(path.display().to_string());
        }

        tracing::debug!(configs = ?found_configs, "Config files loaded");

        // 3. Extract file config values with defaults
        let file_database = file_config.database.unwrap_or_default();
        let file_query = file_config.query.unwrap_or_default();

        // 4. Layer configs: defaults -> file config -> CLI/env overrides
        let path = cli
            .db_path
            .clone()
            .map(|p| expand_path(&p.to_string_lossy()))
            .or_else(|| file_database.path.as_deref().map(expand_path))
            .unwrap_or_else(default_db_path);

        let database = DatabaseConfig {
            path,
            max_connections: cli
                .max_connections
                .or(file_database.max_connections)
                .unwrap_or(SQLITE_MAX_CONNECTIONS),
            busy_timeout_secs: file_database
                .busy_timeout_secs
                .unwrap_or(SQLITE_BUSY_TIMEOUT_SECS),
        };

        let query = QueryConfig {
            default_page_size: cli
                .default_page_size
                .or(file_query.default_page_size)
                .unwrap_or(DEFAULT_PAGE_SIZE),
            max_page_size: cli
                .max_page_size
                .or(file_query.max_page_size)
                .unwrap_or(MAX_PAGE_SIZE),
            timeout_secs: cli
                .timeout_secs
                .or(file_query.timeout_secs)
                .unwrap_or(DEFAULT_QUERY_TIMEOUT_SECS),
            cursor_policy: cli
                .cursor_policy
                .or(file_query.cursor_policy)
                .unwrap_or_default(),
            max_tag_values: cli.max_tag_values.or(file_query.max_tag_values),
        };

        let config = Self { database, query };
        config.validate()?;
        tracing::debug!(config = ?config, "Configuration loaded");
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        if self.database.max_connections == 0 {
            anyhow::bail!("Configuration error: database.max_connections must be greater than 0");
        }
        if self.query.max_page_size == 0 {
            anyhow::bail!("Configuration error: query.max_page_size must be greater than 0");
        }
        if self.query.default_page_size == 0 {
            anyhow::bail!("Configuration error: query.default_page_size must be greater than 0");
        }
        if self.query.default_page_size > self.query.max_page_size {
            anyhow::bail!(
                "Configuration error: query.default_page_size ({}) exceeds query.max_page_size ({})",
                self.query.default_page_size,
                self.query.max_page_size
            );
        }
        if self.query.max_tag_values == Some(0) {
            anyhow::bail!("Configuration error: query.max_tag_values must be greater than 0");
        }
        Ok(())
    }
}

/// Get the profile config path (~/.spanquery/spanquery.json)
fn get_profile_config_path() -> Option<PathBuf> {
    dirs::home_dir().map(|h| h.join(APP_DOT_FOLDER).join(CONFIG_FILE_NAME))
}

/// Default span database location (~/.spanquery/spans.db)
fn default_db_path() -> PathBuf {
    dirs::home_dir()
        .map(|h| h.join(APP_DOT_FOLDER))
        .unwrap_or_else(|| PathBuf::from(APP_DOT_FOLDER))
        .join(SQLITE_DB_FILENAME)
}

/// Expand `~` and make relative paths absolute against the working directory
fn expand_path(path: &str) -> PathBuf {
    let path = path.trim();
    let expanded = if path == "~" {
        dirs::home_dir().unwrap_or_else(|| PathBuf::from(path))
    } else if let Some(rest) = path.strip_prefix("~/") {
        dirs::home_dir()
            .map(|home| home.join(rest))
            .unwrap_or_else(|| PathBuf::from(path))
    } else {
        PathBuf::from(path)
    };

    if expanded.is_relative() {
        std::env::current_dir()
            .map(|cwd| cwd.join(&expanded))
            .unwrap_or(expanded)
    } else {
        expanded
    }
}
