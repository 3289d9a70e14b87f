//! Test helpers: in-memory span store and span row fixtures

use serde_json::{Value, json};
use sqlx::SqlitePool;
use sqlx::sqlite::SqlitePoolOptions;

use super::SqliteService;
use super::schema::SCHEMA;

/// In-memory store with the span table created
///
/// A single connection keeps every query on the same in-memory database.
pub async fn setup_test_service() -> SqliteService {
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect("sqlite::memory:")
        .await
        .unwrap();
    sqlx::query(SCHEMA).execute(&pool).await.unwrap();
    SqliteService::from_pool(pool)
}

/// Builder for one `spans` row
#[derive(Debug, Clone)]
pub struct SpanFixture {
    pub span_id: String,
    pub trace_id: String,
    pub name: String,
    pub kind: i64,
    pub start: i64,
    pub end: i64,
    pub ingestion: i64,
    pub status_code: i64,
    pub span_attributes: Value,
    pub scope_name: Option<String>,
    pub scope_attributes: Value,
    pub resource_attributes: Value,
    pub events: Value,
    pub links: Value,
}

impl SpanFixture {
    pub fn new(span_id: &str, start: i64, end: i64) -> Self {
        Self {
            span_id: span_id.to_string(),
            trace_id: format!("trace-{}", span_id),
            name: format!("op-{}", span_id),
            kind: 1,
            start,
            end,
            ingestion: end,
            status_code: 0,
            span_attributes: json!({}),
            scope_name: None,
            scope_attributes: json!({}),
            resource_attributes: json!({}),
            events: json!([]),
            links: json!([]),
        }
    }

    pub fn name(mut self, name: &str) -> Self {
        self.name = name.to_string();
        self
    }

    pub fn attributes(mut self, attributes: Value) -> Self {
        self.span_attributes = attributes;
        self
    }

    pub fn resource(mut self, attributes: Value) -> Self {
        self.resource_attributes = attributes;
        self
    }

    pub fn scope(mut self, name: &str, attributes: Value) -> Self {
        self.scope_name = Some(name.to_string());
        self.scope_attributes = attributes;
        self
    }

    pub fn events(mut self, events: Value) -> Self {
        self.events = events;
        self
    }

    pub fn links(mut self, links: Value) -> Self {
        self.links = links;
        self
    }

    pub async fn insert(&self, pool: &SqlitePool) {
        sqlx::query(
            "INSERT INTO spans (span_id, trace_id, name, kind, start_time_unix_nano, \
             end_time_unix_nano, ingestion_time_unix_nano, status_code, span_attributes, \
             scope_name, scope_attributes, resource_attributes, events, links) \
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(&self.span_id)
        .bind(&self.trace_id)
        .bind(&self.name)
        .bind(self.kind)
        .bind(self.start)
        .bind(self.end)
        .bind(self.ingestion)
        .bind(self.status_code)
        .bind(self.span_attributes.to_string())
        .bind(&self.scope_name)
        .bind(self.scope_attributes.to_string())
        .bind(self.resource_attributes.to_string())
        .bind(self.events.to_string())
        .bind(self.links.to_string())
        .execute(pool)
        .await
        .unwrap();
    }
}
