//! Shared data types for the span query engine
//!
//! Request/response types are serde-serializable so any transport can carry
//! them; rows are the engine's view of what the execution capability yields.

mod metadata;
mod query;
mod row;
mod span;
mod tags;

// Re-export span domain types
pub use span::{Attributes, InstrumentationScope, Resource, Span, SpanEvent, SpanLink, SpanStatus};

// Re-export search types
pub use query::{
    ContinuationToken, Diagnostics, FilterValue, Scalar, SearchFilter, SearchMetadata,
    SearchRequest, SearchResponse, SkippedRow, SortDirection, SortSpec, Timeframe,
};

// Re-export tag types
pub use tags::{
    GetAvailableTagsRequest, GetAvailableTagsResponse, TagInfo, TagStatisticsRequest,
    TagStatisticsResponse, TagType, TagValue, TagValueInfo, TagValuesRequest, TagValuesResponse,
};

// Re-export metadata types
pub use metadata::{GetSystemIdRequest, GetSystemIdResponse, SetSystemIdRequest, SetSystemIdResponse};

// Re-export row types (execution capability output)
pub use row::{ColumnValue, RawRow};
