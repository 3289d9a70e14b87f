//! Tag value aggregator
//!
//! Distinct non-null values of a tag with the number of spans (or events and
//! links, for nested tags) carrying each value, ordered by count descending.

use std::collections::HashMap;

use crate::data::context::RequestContext;
use crate::data::error::{QueryError, QueryStage, RowDecodeError};
use crate::data::filters::{StaticTagRegistry, build_tag_values_query};
use crate::data::traits::{QueryExecutor, fetch_rows};
use crate::data::types::{
    ColumnValue, RawRow, TagValue, TagValueInfo, TagValuesRequest, TagValuesResponse,
};

/// Values of one tag
pub async fn values_for<E>(
    executor: &E,
    registry: &StaticTagRegistry,
    request: &TagValuesRequest,
    tag: &str,
    max_values: Option<u32>,
    ctx: &RequestContext,
) -> Result<TagValuesResponse, QueryError>
where
    E: QueryExecutor + ?Sized,
{
    let statement = build_tag_values_query(request, tag, registry, max_values)?;
    let rows = fetch_rows(executor, &statement, QueryStage::TagValues, ctx).await?;

    let mut values = Vec::with_capacity(rows.len());
    for (row_index, row) in rows.iter().enumerate() {
        match decode_tag_value(row) {
            Ok(Some(info)) => values.push(info),
            Ok(None) => {}
            Err(e) => tracing::warn!(tag, row_index, error = %e, "Skipping undecodable tag value row"),
        }
    }
    // Stable: ties keep the order the store returned them in
    values.sort_by(|a, b| b.count.cmp(&a.count));

    tracing::debug!(tag, count = values.len(), "Fetched tag values");
    Ok(TagValuesResponse { values })
}

/// Values of several tags, evaluated one after another
///
/// A tag whose query fails is logged and left out of the result. Cancellation
/// aborts the whole batch.
pub async fn values_for_all<E>(
    executor: &E,
    registry: &StaticTagRegistry,
    request: &TagValuesRequest,
    tags: &[String],
    max_values: Option<u32>,
    ctx: &RequestContext,
) -> Result<HashMap<String, TagValuesResponse>, QueryError>
where
    E: QueryExecutor + ?Sized,
{
    let mut results = HashMap::with_capacity(tags.len());
    for tag in tags {
        match values_for(executor, registry, request, tag, max_values, ctx).await {
            Ok(response) => {
                results.insert(tag.clone(), response);
            }
            Err(e) if e.is_cancelled() => return Err(e),
            Err(e) => tracing::warn!(tag = %tag, error = %e, "Omitting tag from batch tag values"),
        }
    }
    Ok(results)
}

/// `(tag_value, tag_count)`; a NULL value yields `None`
fn decode_tag_value(row: &RawRow) -> Result<Option<TagValueInfo>, RowDecodeError> {
    row.expect_columns(2)?;
    let value = match row.get(0)? {
        ColumnValue::Null => return Ok(None),
        ColumnValue::Integer(v) => TagValue::Integer(*v),
        ColumnValue::Real(v) => TagValue::Real(*v),
        ColumnValue::Text(v) => TagValue::Text(v.clone()),
        ColumnValue::Blob(_) => {
            return Err(RowDecodeError::TypeMismatch {
                index: 0,
                expected: "INTEGER, REAL or TEXT",
                found: "BLOB",
            });
        }
    };
    Ok(Some(TagValueInfo {
        value,
        count: row.get_u64(1)?,
    }))
}
