//! SQLite span store
//!
//! Owns the connection pool and implements [`QueryExecutor`] over it:
//! statements are prepared with their bound parameters and rows are streamed
//! back as dynamically typed [`RawRow`]s.

pub mod error;
pub mod schema;

#[cfg(test)]
pub mod testing;

pub use error::SqliteError;
pub use sqlx::SqlitePool;

use std::time::Duration;

use futures::StreamExt;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions, SqliteRow};
use sqlx::{ConnectOptions, Row, TypeInfo, ValueRef};
use tracing::log::LevelFilter;

use crate::core::config::DatabaseConfig;
use crate::data::filters::{BindValue, SqlStatement};
use crate::data::traits::{QueryExecutor, RowStream};
use crate::data::types::{ColumnValue, RawRow};

use schema::SCHEMA;

/// SQLite database service
///
/// Should be created once at startup and shared by every reader.
pub struct SqliteService {
    pool: SqlitePool,
}

impl SqliteService {
    /// Open (or create) the span database and ensure the span table exists
    pub async fn init(config: &DatabaseConfig) -> Result<Self, SqliteError> {
        if let Some(parent) = config.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|source| SqliteError::CreateDir {
                path: parent.display().to_string(),
                source,
            })?;
        }

        let options = SqliteConnectOptions::new()
            .filename(&config.path)
            .create_if_missing(true)
            .busy_timeout(Duration::from_secs(config.busy_timeout_secs))
            .pragma("temp_store", "MEMORY")
            .log_statements(LevelFilter::Trace);

        let pool = SqlitePoolOptions::new()
            .max_connections(config.max_connections)
            .connect_with(options)
            .await?;

        sqlx::query(SCHEMA).execute(&pool).await?;

        tracing::debug!(path = %config.path.display(), "SqliteService initialized");
        Ok(Self { pool })
    }

    /// Create a SqliteService from an existing pool (primarily for testing)
    pub fn from_pool(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Close the connection pool gracefully
    pub async fn close(&self) {
        self.pool.close().await;
        tracing::debug!("SQLite pool closed");
    }
}

impl QueryExecutor for SqliteService {
    fn fetch<'a>(&'a self, statement: &'a SqlStatement) -> RowStream<'a> {
        let mut query = sqlx::query(&statement.sql);
        for value in &statement.params {
            query = match value {
                BindValue::Integer(v) => query.bind(*v),
                BindValue::Real(v) => query.bind(*v),
                BindValue::Text(v) => query.bind(v.as_str()),
            };
        }
        query
            .fetch(&self.pool)
            .map(|row| row.and_then(|row| raw_row(&row)))
            .boxed()
    }
}

/// Convert a driver row into storage-class tagged values
fn raw_row(row: &SqliteRow) -> Result<RawRow, sqlx::Error> {
    (0..row.len())
        .map(|index| column_value(row, index))
        .collect::<Result<Vec<_>, _>>()
        .map(RawRow::new)
}

fn column_value(row: &SqliteRow, index: usize) -> Result<ColumnValue, sqlx::Error> {
    let raw = row.try_get_raw(index)?;
    if raw.is_null() {
        return Ok(ColumnValue::Null);
    }
    let type_name = raw.type_info().name().to_ascii_uppercase();

    // Storage class of the value itself, not the declared column type
    match type_name.as_str() {
        "INTEGER" | "BIGINT" | "INT4" | "INT8" | "BOOLEAN" => {
            row.try_get_unchecked::<i64, _>(index).map(ColumnValue::Integer)
        }
        "REAL" | "FLOAT" | "DOUBLE" | "NUMERIC" => {
            row.try_get_unchecked::<f64, _>(index).map(ColumnValue::Real)
        }
        "BLOB" => row.try_get_unchecked::<Vec<u8>, _>(index).map(ColumnValue::Blob),
        _ => row.try_get_unchecked::<String, _>(index).map(ColumnValue::Text),
    }
}
