//! Result materializer: search row → [`Span`]
//!
//! Column order is fixed by [`SPAN_RESULT_COLUMNS`]. A row that does not match
//! it fails with a [`RowDecodeError`]; the caller decides whether to skip it.

use serde::de::DeserializeOwned;

use crate::data::error::RowDecodeError;
use crate::data::filters::columns::SPAN_RESULT_COLUMNS;
use crate::data::types::{
    Attributes, ColumnValue, InstrumentationScope, RawRow, Resource, Span, SpanEvent, SpanLink,
    SpanStatus,
};

const SPAN_ID: usize = 0;
const TRACE_ID: usize = 1;
const TRACE_STATE: usize = 2;
const PARENT_SPAN_ID: usize = 3;
const NAME: usize = 4;
const KIND: usize = 5;
const START_TIME: usize = 6;
const END_TIME: usize = 7;
const DROPPED_ATTRIBUTES: usize = 8;
const STATUS_MESSAGE: usize = 9;
const STATUS_CODE: usize = 10;
const DROPPED_EVENTS: usize = 11;
const DROPPED_LINKS: usize = 12;
const DURATION: usize = 13;
const INGESTION_TIME: usize = 14;
const SPAN_ATTRIBUTES: usize = 15;
const SCOPE_NAME: usize = 16;
const SCOPE_VERSION: usize = 17;
const SCOPE_DROPPED_ATTRIBUTES: usize = 18;
const SCOPE_ATTRIBUTES: usize = 19;
const RESOURCE_DROPPED_ATTRIBUTES: usize = 20;
const RESOURCE_ATTRIBUTES: usize = 21;
const EVENTS: usize = 22;
const LINKS: usize = 23;

/// Convert one search row into a [`Span`]
pub fn materialize(row: &RawRow) -> Result<Span, RowDecodeError> {
    row.expect_columns(SPAN_RESULT_COLUMNS.len())?;

    let start_time_unix_nano = row.get_u64(START_TIME)?;
    let end_time_unix_nano = row.get_u64(END_TIME)?;
    let duration_nano = match row.get_opt_i64(DURATION)? {
        Some(value) => u64::try_from(value).map_err(|_| RowDecodeError::OutOfRange {
            index: DURATION,
            value,
        })?,
        None => end_time_unix_nano.saturating_sub(start_time_unix_nano),
    };

    Ok(Span {
        span_id: row.get_str(SPAN_ID)?.to_string(),
        trace_id: row.get_str(TRACE_ID)?.to_string(),
        trace_state: opt_string(row, TRACE_STATE)?,
        parent_span_id: opt_string(row, PARENT_SPAN_ID)?,
        name: row.get_str(NAME)?.to_string(),
        kind: get_i32(row, KIND)?,
        status: SpanStatus {
            code: get_i32(row, STATUS_CODE)?,
            message: opt_string(row, STATUS_MESSAGE)?,
        },
        start_time_unix_nano,
        end_time_unix_nano,
        duration_nano,
        ingestion_time_unix_nano: row.get_u64(INGESTION_TIME)?,
        attributes: json_column::<Attributes>(row, SPAN_ATTRIBUTES)?,
        dropped_attributes_count: row.get_count(DROPPED_ATTRIBUTES)?,
        events: json_column::<Vec<SpanEvent>>(row, EVENTS)?,
        dropped_events_count: row.get_count(DROPPED_EVENTS)?,
        links: json_column::<Vec<SpanLink>>(row, LINKS)?,
        dropped_links_count: row.get_count(DROPPED_LINKS)?,
        scope: InstrumentationScope {
            name: opt_string(row, SCOPE_NAME)?,
            version: opt_string(row, SCOPE_VERSION)?,
            attributes: json_column::<Attributes>(row, SCOPE_ATTRIBUTES)?,
            dropped_attributes_count: row.get_count(SCOPE_DROPPED_ATTRIBUTES)?,
        },
        resource: Resource {
            attributes: json_column::<Attributes>(row, RESOURCE_ATTRIBUTES)?,
            dropped_attributes_count: row.get_count(RESOURCE_DROPPED_ATTRIBUTES)?,
        },
    })
}

fn opt_string(row: &RawRow, index: usize) -> Result<Option<String>, RowDecodeError> {
    Ok(row.get_opt_str(index)?.map(str::to_string))
}

fn get_i32(row: &RawRow, index: usize) -> Result<i32, RowDecodeError> {
    let value = row.get_opt_i64(index)?.unwrap_or(0);
    i32::try_from(value).map_err(|_| RowDecodeError::OutOfRange { index, value })
}

/// JSON text (or blob) column; NULL and empty text decode as the default value
fn json_column<T>(row: &RawRow, index: usize) -> Result<T, RowDecodeError>
where
    T: DeserializeOwned + Default,
{
    let bytes = match row.get(index)? {
        ColumnValue::Null => return Ok(T::default()),
        ColumnValue::Text(text) if text.is_empty() => return Ok(T::default()),
        ColumnValue::Text(text) => text.as_bytes(),
        ColumnValue::Blob(bytes) => bytes.as_slice(),
        other => {
            return Err(RowDecodeError::TypeMismatch {
                index,
                expected: "TEXT",
                found: other.type_name(),
            });
        }
    };
    serde_json::from_slice(bytes).map_err(|e| RowDecodeError::InvalidJson {
        index,
        message: e.to_string(),
    })
}
