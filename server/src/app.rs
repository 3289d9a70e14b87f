//! Core application

use std::collections::BTreeMap;
use std::sync::Arc;

use anyhow::{Context, Result};
use serde::Serialize;
use tokio_util::sync::CancellationToken;

use crate::core::cli::{self, CliConfig, Commands, ScopeArgs};
use crate::core::config::AppConfig;
use crate::core::constants::{APP_NAME_LOWER, ENV_LOG};
use crate::data::SqliteService;
use crate::data::context::RequestContext;
use crate::data::filters::{SortField, StaticTagRegistry, parse_filters};
use crate::data::traits::SpanReader;
use crate::data::types::{
    ContinuationToken, GetAvailableTagsRequest, SearchFilter, SearchRequest, SortDirection,
    SortSpec, TagValuesRequest, Timeframe,
};
use crate::domain::SqliteSpanReader;

pub struct CoreApp {
    pub config: AppConfig,
    pub database: Arc<SqliteService>,
    pub reader: SqliteSpanReader<Arc<SqliteService>>,
}

impl CoreApp {
    /// Run the application with CLI argument parsing
    pub async fn run() -> Result<()> {
        dotenvy::dotenv().ok();
        Self::init_logging();

        tracing::debug!("Application starting");

        let (cli_config, command) = cli::parse();
        tracing::trace!(command = ?command, "Parsed command");

        let app = Self::init(&cli_config).await?;
        let result = app.execute(command).await;
        app.database.close().await;
        result
    }

    async fn init(cli: &CliConfig) -> Result<Self> {
        let config = AppConfig::load(cli)?;

        let database = Arc::new(
            SqliteService::init(&config.database)
                .await
                .with_context(|| {
                    format!(
                        "Failed to open span database: {}",
                        config.database.path.display()
                    )
                })?,
        );

        let registry = Arc::new(StaticTagRegistry::default());
        tracing::debug!(static_tags = registry.len(), "Static tag registry built");

        let reader = SqliteSpanReader::new(Arc::clone(&database), registry, config.query.clone());

        Ok(Self {
            config,
            database,
            reader,
        })
    }

    /// Run one command; Ctrl-C cancels the in-flight query
    async fn execute(&self, command: Commands) -> Result<()> {
        let token = CancellationToken::new();
        let ctx = RequestContext::with_token(token.clone());
        let signal_task = tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                tracing::warn!("Interrupted, cancelling query");
                token.cancel();
            }
        });

        let result = self.dispatch(command, &ctx).await;
        signal_task.abort();
        result
    }

    async fn dispatch(&self, command: Commands, ctx: &RequestContext) -> Result<()> {
        match command {
            Commands::Search {
                scope,
                sort,
                direction,
                cursor,
                limit,
            } => {
                let request = search_request(&scope, sort, direction, cursor, limit)?;
                let response = self
                    .reader
                    .search(&request, ctx)
                    .await
                    .context("Span search failed")?;
                if !response.diagnostics.skipped_rows.is_empty() {
                    tracing::warn!(
                        skipped = response.diagnostics.skipped_rows.len(),
                        "Some span rows could not be decoded and were left out"
                    );
                }
                print_json(&response)
            }
            Commands::Tags => {
                let response = self
                    .reader
                    .get_available_tags(&GetAvailableTagsRequest::default(), ctx)
                    .await
                    .context("Listing tags failed")?;
                print_json(&response)
            }
            Commands::TagValues { tags, scope } => {
                let request = TagValuesRequest {
                    filters: scope_filters(&scope)?,
                    timeframe: scope_timeframe(&scope),
                };
                if let [tag] = tags.as_slice() {
                    let response = self
                        .reader
                        .get_tag_values(&request, tag, ctx)
                        .await
                        .with_context(|| format!("Fetching values of '{}' failed", tag))?;
                    print_json(&response)
                } else {
                    let responses = self
                        .reader
                        .get_tags_values(&request, &tags, ctx)
                        .await
                        .context("Fetching tag values failed")?;
                    let sorted: BTreeMap<_, _> = responses.into_iter().collect();
                    print_json(&sorted)
                }
            }
        }
    }

    fn init_logging() {
        let default_filter = format!("info,{}=info", APP_NAME_LOWER);

        let filter = std::env::var(ENV_LOG)
            .or_else(|_| std::env::var("RUST_LOG"))
            .unwrap_or(default_filter);

        tracing_subscriber::fmt()
            .with_target(false)
            .with_thread_ids(false)
            .with_level(true)
            .with_ansi(true)
            .with_writer(std::io::stderr)
            .compact()
            .with_env_filter(filter)
            .init();
    }
}

fn search_request(
    scope: &ScopeArgs,
    sort: Option<String>,
    direction: SortDirection,
    cursor: Option<String>,
    limit: Option<u32>,
) -> Result<SearchRequest> {
    Ok(SearchRequest {
        filters: scope_filters(scope)?,
        timeframe: scope_timeframe(scope),
        sort: Some(SortSpec {
            field: sort.unwrap_or_else(|| SortField::default().name().to_string()),
            direction,
        }),
        next_token: cursor.map(ContinuationToken::new),
        limit,
    })
}

fn scope_filters(scope: &ScopeArgs) -> Result<Vec<SearchFilter>> {
    match &scope.filters {
        Some(json) => parse_filters(json).context("Invalid --filters"),
        None => Ok(Vec::new()),
    }
}

fn scope_timeframe(scope: &ScopeArgs) -> Option<Timeframe> {
    (scope.from.is_some() || scope.to.is_some()).then_some(Timeframe {
        start_time_unix_nano: scope.from,
        end_time_unix_nano: scope.to,
    })
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    let json = serde_json::to_string_pretty(value).context("Failed to serialize response")?;
    println!("{}", json);
    Ok(())
}
