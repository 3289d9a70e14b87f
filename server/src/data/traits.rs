//! Storage and reader traits
//!
//! [`QueryExecutor`] is the only path from the engine to storage: it runs a
//! parameterized statement and yields dynamically typed rows. [`SpanReader`]
//! is the read API served on top of it.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use futures::TryStreamExt;
use futures::stream::BoxStream;

use crate::data::context::RequestContext;
use crate::data::error::{QueryError, QueryStage};
use crate::data::filters::SqlStatement;
use crate::data::types::{
    GetAvailableTagsRequest, GetAvailableTagsResponse, GetSystemIdRequest, GetSystemIdResponse,
    RawRow, SearchRequest, SearchResponse, SetSystemIdRequest, SetSystemIdResponse,
    TagStatisticsRequest, TagStatisticsResponse, TagValuesRequest, TagValuesResponse,
};

// ============================================================================
// Execution Capability
// ============================================================================

/// Stream of rows produced by one statement
pub type RowStream<'a> = BoxStream<'a, Result<RawRow, sqlx::Error>>;

/// Runs a parameterized statement and yields its rows
///
/// Dropping the stream releases the statement.
pub trait QueryExecutor: Send + Sync {
    fn fetch<'a>(&'a self, statement: &'a SqlStatement) -> RowStream<'a>;
}

impl<T: QueryExecutor + ?Sized> QueryExecutor for Arc<T> {
    fn fetch<'a>(&'a self, statement: &'a SqlStatement) -> RowStream<'a> {
        (**self).fetch(statement)
    }
}

/// Collect every row of `statement` under the request context
pub async fn fetch_rows<E>(
    executor: &E,
    statement: &SqlStatement,
    stage: QueryStage,
    ctx: &RequestContext,
) -> Result<Vec<RawRow>, QueryError>
where
    E: QueryExecutor + ?Sized,
{
    ctx.run(stage, async {
        executor
            .fetch(statement)
            .try_collect::<Vec<_>>()
            .await
            .map_err(|e| QueryError::execution(stage, e))
    })
    .await
}

// ============================================================================
// Span Reader Trait
// ============================================================================

/// Read API over recorded spans
#[async_trait]
pub trait SpanReader: Send + Sync {
    /// Filtered, sorted, paginated span search
    async fn search(
        &self,
        request: &SearchRequest,
        ctx: &RequestContext,
    ) -> Result<SearchResponse, QueryError>;

    /// Static and discovered tag names with their types
    async fn get_available_tags(
        &self,
        request: &GetAvailableTagsRequest,
        ctx: &RequestContext,
    ) -> Result<GetAvailableTagsResponse, QueryError>;

    /// Distinct values of one tag with occurrence counts
    async fn get_tag_values(
        &self,
        request: &TagValuesRequest,
        tag: &str,
        ctx: &RequestContext,
    ) -> Result<TagValuesResponse, QueryError>;

    /// Batch form of [`SpanReader::get_tag_values`]; failing tags are omitted
    async fn get_tags_values(
        &self,
        request: &TagValuesRequest,
        tags: &[String],
        ctx: &RequestContext,
    ) -> Result<HashMap<String, TagValuesResponse>, QueryError>;

    async fn get_system_id(
        &self,
        request: &GetSystemIdRequest,
        ctx: &RequestContext,
    ) -> Result<GetSystemIdResponse, QueryError>;

    async fn set_system_id(
        &self,
        request: &SetSystemIdRequest,
        ctx: &RequestContext,
    ) -> Result<SetSystemIdResponse, QueryError>;

    async fn get_tags_statistics(
        &self,
        request: &TagStatisticsRequest,
        ctx: &RequestContext,
    ) -> Result<TagStatisticsResponse, QueryError>;
}
