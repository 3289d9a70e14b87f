//! SQLite span table layout
//!
//! One row per span. Attribute maps, events and links are stored as JSON
//! text; everything else is a plain column.

/// Complete schema SQL
pub const SCHEMA: &str = r#"
-- =============================================================================
-- Spans
-- =============================================================================
CREATE TABLE IF NOT EXISTS spans (
    span_id TEXT NOT NULL,
    trace_id TEXT NOT NULL,
    trace_state TEXT,
    parent_span_id TEXT,
    name TEXT NOT NULL DEFAULT '',
    kind INTEGER NOT NULL DEFAULT 0,
    start_time_unix_nano INTEGER NOT NULL,
    end_time_unix_nano INTEGER NOT NULL,
    dropped_attributes_count INTEGER NOT NULL DEFAULT 0,
    status_message TEXT,
    status_code INTEGER NOT NULL DEFAULT 0,
    dropped_events_count INTEGER NOT NULL DEFAULT 0,
    dropped_links_count INTEGER NOT NULL DEFAULT 0,
    duration_nano INTEGER GENERATED ALWAYS AS (end_time_unix_nano - start_time_unix_nano) STORED,
    ingestion_time_unix_nano INTEGER NOT NULL DEFAULT 0,
    span_attributes TEXT NOT NULL DEFAULT '{}',
    scope_name TEXT,
    scope_version TEXT,
    scope_dropped_attributes_count INTEGER NOT NULL DEFAULT 0,
    scope_attributes TEXT NOT NULL DEFAULT '{}',
    resource_dropped_attributes_count INTEGER NOT NULL DEFAULT 0,
    resource_attributes TEXT NOT NULL DEFAULT '{}',
    events TEXT NOT NULL DEFAULT '[]',
    links TEXT NOT NULL DEFAULT '[]',
    PRIMARY KEY (trace_id, span_id)
);

CREATE INDEX IF NOT EXISTS idx_spans_start_time ON spans(start_time_unix_nano DESC);
CREATE INDEX IF NOT EXISTS idx_spans_end_time ON spans(end_time_unix_nano DESC);
CREATE INDEX IF NOT EXISTS idx_spans_duration ON spans(duration_nano DESC);
CREATE INDEX IF NOT EXISTS idx_spans_ingestion_time ON spans(ingestion_time_unix_nano DESC);
"#;
