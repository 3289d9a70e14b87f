use clap::{Parser, Subcommand};

use std::path::PathBuf;

use chrono::DateTime;

use crate::data::types::SortDirection;

use super::config::CursorPolicy;
use super::constants::{
    ENV_CONFIG, ENV_CURSOR_POLICY, ENV_DB_MAX_CONNECTIONS, ENV_DB_PATH, ENV_DEFAULT_PAGE_SIZE,
    ENV_MAX_PAGE_SIZE, ENV_MAX_TAG_VALUES, ENV_QUERY_TIMEOUT_SECS,
};

#[derive(Parser)]
#[command(name = "spanquery")]
#[command(version, about = "Query recorded trace spans", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Path to config file
    #[arg(long, short = 'c', global = true, env = ENV_CONFIG)]
    pub config: Option<PathBuf>,

    // Database options
    /// Path to the span database
    #[arg(long, global = true, env = ENV_DB_PATH)]
    pub db_path: Option<PathBuf>,

    /// Maximum number of database connections
    #[arg(long, global = true, env = ENV_DB_MAX_CONNECTIONS)]
    pub max_connections: Option<u32>,

    // Query options
    /// Page size used when a search omits --limit
    #[arg(long, global = true, env = ENV_DEFAULT_PAGE_SIZE)]
    pub default_page_size: Option<u32>,

    /// Upper bound on search page size
    #[arg(long, global = true, env = ENV_MAX_PAGE_SIZE)]
    pub max_page_size: Option<u32>,

    /// Per-request timeout in seconds (0 = no timeout)
    #[arg(long, global = true, env = ENV_QUERY_TIMEOUT_SECS)]
    pub timeout_secs: Option<u64>,

    /// When to emit a continuation token (any-rows or full-page)
    #[arg(long, global = true, env = ENV_CURSOR_POLICY, value_parser = parse_cursor_policy)]
    pub cursor_policy: Option<CursorPolicy>,

    /// Maximum number of values returned per tag
    #[arg(long, global = true, env = ENV_MAX_TAG_VALUES)]
    pub max_tag_values: Option<u32>,
}

/// Parse cursor policy from CLI/env string
fn parse_cursor_policy(s: &str) -> Result<CursorPolicy, String> {
    match s.to_lowercase().replace('-', "_").as_str() {
        "any_rows" => Ok(CursorPolicy::AnyRows),
        "full_page" => Ok(CursorPolicy::FullPage),
        _ => Err(format!(
            "Invalid cursor policy '{}'. Valid options: any-rows, full-page",
            s
        )),
    }
}

/// Parse sort direction from CLI string
fn parse_sort_direction(s: &str) -> Result<SortDirection, String> {
    match s.to_lowercase().as_str() {
        "asc" => Ok(SortDirection::Asc),
        "desc" => Ok(SortDirection::Desc),
        _ => Err(format!(
            "Invalid sort direction '{}'. Valid options: asc, desc",
            s
        )),
    }
}

/// Parse an RFC 3339 timestamp into unix nanoseconds
fn parse_timestamp(s: &str) -> Result<u64, String> {
    let parsed = DateTime::parse_from_rfc3339(s)
        .map_err(|e| format!("Invalid RFC 3339 timestamp '{}': {}", s, e))?;
    parsed
        .timestamp_nanos_opt()
        .and_then(|n| u64::try_from(n).ok())
        .ok_or_else(|| format!("Timestamp '{}' is outside the supported range", s))
}

/// Filter and time range options shared by search and tag-values
#[derive(clap::Args, Clone, Debug, Default)]
pub struct ScopeArgs {
    /// Filters as a JSON array, e.g. '[{"key":"http.status_code","operator":"gte","value":500}]'
    #[arg(long)]
    pub filters: Option<String>,

    /// Only spans starting at or after this time (RFC 3339)
    #[arg(long, value_parser = parse_timestamp)]
    pub from: Option<u64>,

    /// Only spans ending at or before this time (RFC 3339)
    #[arg(long, value_parser = parse_timestamp)]
    pub to: Option<u64>,
}

#[derive(Subcommand, Clone, Debug)]
pub enum Commands {
    /// Search spans
    Search {
        #[command(flatten)]
        scope: ScopeArgs,

        /// Sort field: start_time (default), end_time, duration, ingestion_time
        #[arg(long)]
        sort: Option<String>,

        /// Sort direction (asc or desc)
        #[arg(long, value_parser = parse_sort_direction, default_value = "desc")]
        direction: SortDirection,

        /// Continuation token from a previous page
        #[arg(long)]
        cursor: Option<String>,

        /// Page size
        #[arg(long, short = 'n')]
        limit: Option<u32>,
    },
    /// List queryable tags
    Tags,
    /// Distinct values of one or more tags with counts
    TagValues {
        /// Tag names, e.g. http.method resource.service.name
        #[arg(required = true, num_args = 1..)]
        tags: Vec<String>,

        #[command(flatten)]
        scope: ScopeArgs,
    },
}

/// Configuration derived from CLI arguments
#[derive(Debug, Clone, Default)]
pub struct CliConfig {
    pub config: Option<PathBuf>,
    pub db_path: Option<PathBuf>,
    pub max_connections: Option<u32>,
    pub default_page_size: Option<u32>,
    pub max_page_size: Option<u32>,
    pub timeout_secs: Option<u64>,
    pub cursor_policy: Option<CursorPolicy>,
    pub max_tag_values: Option<u32>,
}

/// Parse CLI arguments and return config with command
pub fn parse() -> (CliConfig, Commands) {
    let cli = Cli::parse();
    let config = CliConfig {
        config: cli.config,
        db_path: cli.db_path,
        max_connections: cli.max_connections,
        default_page_size: cli.default_page_size,
        max_page_size: cli.max_page_size,
        timeout_secs: cli.timeout_secs,
        cursor_policy: cli.cursor_policy,
        max_tag_values: cli.max_tag_values,
    };
    (config, cli.command)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_cursor_policy() {
        assert_eq!(parse_cursor_policy("any-rows"), Ok(CursorPolicy::AnyRows));
        assert_eq!(parse_cursor_policy("FULL_PAGE"), Ok(CursorPolicy::FullPage));
        assert!(parse_cursor_policy("sometimes").is_err());
    }

    #[test]
    fn test_parse_timestamp() {
        assert_eq!(parse_timestamp("1970-01-01T00:00:01Z"), Ok(1_000_000_000));
        assert!(parse_timestamp("yesterday").is_err());
        assert!(parse_timestamp("1960-01-01T00:00:00Z").is_err());
    }

    #[test]
    fn test_search_command_parses() {
        let cli = Cli::try_parse_from([
            "spanquery",
            "--db-path",
            "/tmp/spans.db",
            "search",
            "--filters",
            r#"[{"key":"span.name","operator":"exists"}]"#,
            "--direction",
            "asc",
            "--cursor",
            "50",
            "-n",
            "10",
        ])
        .unwrap();
        assert_eq!(cli.db_path, Some(PathBuf::from("/tmp/spans.db")));
        match cli.command {
            Commands::Search {
                scope,
                direction,
                cursor,
                limit,
                ..
            } => {
                assert!(scope.filters.is_some());
                assert_eq!(direction, SortDirection::Asc);
                assert_eq!(cursor.as_deref(), Some("50"));
                assert_eq!(limit, Some(10));
            }
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[test]
    fn test_tag_values_requires_tags() {
        assert!(Cli::try_parse_from(["spanquery", "tag-values"]).is_err());
        let cli = Cli::try_parse_from(["spanquery", "tag-values", "http.method", "span.name"])
            .unwrap();
        match cli.command {
            Commands::TagValues { tags, .. } => assert_eq!(tags, vec!["http.method", "span.name"]),
            other => panic!("unexpected command {:?}", other),
        }
    }
}
