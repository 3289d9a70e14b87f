//! SQLite-backed [`SpanReader`]

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;

use crate::core::config::QueryConfig;
use crate::data::context::RequestContext;
use crate::data::error::{QueryError, QueryStage};
use crate::data::filters::{StaticTagRegistry, build_search_query};
use crate::data::traits::{QueryExecutor, SpanReader, fetch_rows};
use crate::data::types::{
    Diagnostics, GetAvailableTagsRequest, GetAvailableTagsResponse, GetSystemIdRequest,
    GetSystemIdResponse, SearchMetadata, SearchRequest, SearchResponse, SetSystemIdRequest,
    SetSystemIdResponse, SkippedRow, TagStatisticsRequest, TagStatisticsResponse,
    TagValuesRequest, TagValuesResponse,
};

use super::materialize::materialize;
use super::{cursor, tag_values, tags};

/// Span reader over any [`QueryExecutor`]
///
/// Holds no mutable state; one instance can serve concurrent requests.
pub struct SqliteSpanReader<E> {
    executor: E,
    registry: Arc<StaticTagRegistry>,
    config: QueryConfig,
}

impl<E: QueryExecutor> SqliteSpanReader<E> {
    pub fn new(executor: E, registry: Arc<StaticTagRegistry>, config: QueryConfig) -> Self {
        Self {
            executor,
            registry,
            config,
        }
    }

    pub fn registry(&self) -> &StaticTagRegistry {
        &self.registry
    }

    /// Caller context narrowed by the configured query timeout
    fn scoped(&self, ctx: &RequestContext) -> RequestContext {
        ctx.clone().with_timeout(self.config.timeout())
    }
}

#[async_trait]
impl<E: QueryExecutor> SpanReader for SqliteSpanReader<E> {
    async fn search(
        &self,
        request: &SearchRequest,
        ctx: &RequestContext,
    ) -> Result<SearchResponse, QueryError> {
        let boundary = request
            .next_token
            .as_ref()
            .map(cursor::decode)
            .transpose()?;
        let query = build_search_query(request, boundary, &self.registry, &self.config.limits())?;

        let ctx = self.scoped(ctx);
        let rows = fetch_rows(&self.executor, &query.statement, QueryStage::Search, &ctx).await?;

        let mut spans = Vec::with_capacity(rows.len());
        let mut diagnostics = Diagnostics::default();
        for (row_index, row) in rows.iter().enumerate() {
            match materialize(row) {
                Ok(span) => spans.push(span),
                Err(error) => {
                    tracing::warn!(row_index, error = %error, "Skipping span row that failed to decode");
                    diagnostics.skipped_rows.push(SkippedRow { row_index, error });
                }
            }
        }

        let next_token = cursor::next_page_token(
            &spans,
            query.sort,
            rows.len(),
            query.page_size,
            self.config.cursor_policy,
        );
        tracing::debug!(
            returned = spans.len(),
            skipped = diagnostics.skipped_rows.len(),
            has_next = next_token.is_some(),
            "Span search completed"
        );

        Ok(SearchResponse {
            spans,
            metadata: next_token.map(|next_token| SearchMetadata { next_token }),
            diagnostics,
        })
    }

    async fn get_available_tags(
        &self,
        _request: &GetAvailableTagsRequest,
        ctx: &RequestContext,
    ) -> Result<GetAvailableTagsResponse, QueryError> {
        let ctx = self.scoped(ctx);
        let tags = tags::list_tags(&self.executor, &self.registry, &ctx).await?;
        Ok(GetAvailableTagsResponse { tags })
    }

    async fn get_tag_values(
        &self,
        request: &TagValuesRequest,
        tag: &str,
        ctx: &RequestContext,
    ) -> Result<TagValuesResponse, QueryError> {
        let ctx = self.scoped(ctx);
        tag_values::values_for(
            &self.executor,
            &self.registry,
            request,
            tag,
            self.config.max_tag_values,
            &ctx,
        )
        .await
    }

    async fn get_tags_values(
        &self,
        request: &TagValuesRequest,
        tags: &[String],
        ctx: &RequestContext,
    ) -> Result<HashMap<String, TagValuesResponse>, QueryError> {
        let ctx = self.scoped(ctx);
        tag_values::values_for_all(
            &self.executor,
            &self.registry,
            request,
            tags,
            self.config.max_tag_values,
            &ctx,
        )
        .await
    }

    async fn get_system_id(
        &self,
        _request: &GetSystemIdRequest,
        _ctx: &RequestContext,
    ) -> Result<GetSystemIdResponse, QueryError> {
        Err(QueryError::NotImplemented("get_system_id"))
    }

    async fn set_system_id(
        &self,
        _request: &SetSystemIdRequest,
        _ctx: &RequestContext,
    ) -> Result<SetSystemIdResponse, QueryError> {
        Err(QueryError::NotImplemented("set_system_id"))
    }

    async fn get_tags_statistics(
        &self,
        _request: &TagStatisticsRequest,
        _ctx: &RequestContext,
    ) -> Result<TagStatisticsResponse, QueryError> {
        Err(QueryError::NotImplemented("get_tags_statistics"))
    }
}
