//! Span domain types returned by the reader

use serde::{Deserialize, Serialize};

/// Open attribute map (arbitrary key to JSON value)
pub type Attributes = serde_json::Map<String, serde_json::Value>;

/// A recorded unit of work, materialized from one result row
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Span {
    pub span_id: String,
    pub trace_id: String,
    pub trace_state: Option<String>,
    pub parent_span_id: Option<String>,
    pub name: String,
    pub kind: i32,
    pub status: SpanStatus,
    pub start_time_unix_nano: u64,
    pub end_time_unix_nano: u64,
    pub duration_nano: u64,
    pub ingestion_time_unix_nano: u64,
    pub attributes: Attributes,
    pub dropped_attributes_count: u32,
    pub events: Vec<SpanEvent>,
    pub dropped_events_count: u32,
    pub links: Vec<SpanLink>,
    pub dropped_links_count: u32,
    pub scope: InstrumentationScope,
    pub resource: Resource,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SpanStatus {
    pub code: i32,
    pub message: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SpanEvent {
    #[serde(default)]
    pub time_unix_nano: u64,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub attributes: Attributes,
    #[serde(default)]
    pub dropped_attributes_count: u32,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SpanLink {
    #[serde(default)]
    pub trace_id: String,
    #[serde(default)]
    pub span_id: String,
    #[serde(default)]
    pub trace_state: Option<String>,
    #[serde(default)]
    pub attributes: Attributes,
    #[serde(default)]
    pub dropped_attributes_count: u32,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct InstrumentationScope {
    pub name: Option<String>,
    pub version: Option<String>,
    pub attributes: Attributes,
    pub dropped_attributes_count: u32,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Resource {
    pub attributes: Attributes,
    pub dropped_attributes_count: u32,
}
