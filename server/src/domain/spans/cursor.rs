//! Pagination cursor
//!
//! A continuation token is the decimal sort value of the last span of a page.
//! The next page resumes strictly past it, so spans sharing that exact value
//! with the last span are not repeated (and not returned).
//!
//! The search statement also orders by span id, which only fixes the order of
//! tied spans within a page. Resuming exactly across ties would need a
//! compound `(value, span_id)` token.

use crate::core::config::CursorPolicy;
use crate::data::error::InvalidCursorError;
use crate::data::filters::SortField;
use crate::data::types::{ContinuationToken, Span};

/// Sort value of `span` for `field`
pub fn sort_value(span: &Span, field: SortField) -> u64 {
    match field {
        SortField::StartTime => span.start_time_unix_nano,
        SortField::EndTime => span.end_time_unix_nano,
        SortField::Duration => span.duration_nano,
        SortField::IngestionTime => span.ingestion_time_unix_nano,
    }
}

pub fn encode(span: &Span, field: SortField) -> ContinuationToken {
    ContinuationToken::new(sort_value(span, field).to_string())
}

/// Parse a token back into the boundary bound against the sort column
pub fn decode(token: &ContinuationToken) -> Result<i64, InvalidCursorError> {
    let invalid = || InvalidCursorError {
        token: token.as_str().to_string(),
    };
    let raw = token.as_str();
    if raw.is_empty() || !raw.bytes().all(|b| b.is_ascii_digit()) {
        return Err(invalid());
    }
    raw.parse::<u64>()
        .ok()
        .and_then(|v| i64::try_from(v).ok())
        .ok_or_else(invalid)
}

/// Token for the page after `spans`, if one should be offered
///
/// `fetched_rows` counts every row the statement returned, including rows
/// later skipped by the materializer, so a page trimmed by bad rows still
/// counts as full.
pub fn next_page_token(
    spans: &[Span],
    field: SortField,
    fetched_rows: usize,
    page_size: u32,
    policy: CursorPolicy,
) -> Option<ContinuationToken> {
    let last = spans.last()?;
    let offer = match policy {
        CursorPolicy::AnyRows => true,
        CursorPolicy::FullPage => fetched_rows >= page_size as usize,
    };
    offer.then(|| encode(last, field))
}
