//! Span search request and response types

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::data::error::RowDecodeError;

use super::span::Span;

/// A single filter value
///
/// Booleans are matched before numbers so that `true` never deserializes as 1.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Scalar {
    Bool(bool),
    Integer(i64),
    Float(f64),
    Text(String),
}

impl fmt::Display for Scalar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Scalar::Bool(v) => write!(f, "{}", v),
            Scalar::Integer(v) => write!(f, "{}", v),
            Scalar::Float(v) => write!(f, "{}", v),
            Scalar::Text(v) => write!(f, "{}", v),
        }
    }
}

/// Value side of a filter: one scalar or an ordered list of scalars
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FilterValue {
    List(Vec<Scalar>),
    Scalar(Scalar),
}

impl From<Scalar> for FilterValue {
    fn from(v: Scalar) -> Self {
        FilterValue::Scalar(v)
    }
}

impl From<Vec<Scalar>> for FilterValue {
    fn from(v: Vec<Scalar>) -> Self {
        FilterValue::List(v)
    }
}

/// `{key, operator, value}` predicate over a static or dynamic tag
///
/// The operator stays a string until query building so that unknown
/// operators are reported as build errors rather than parse errors.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchFilter {
    pub key: String,
    pub operator: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<FilterValue>,
}

impl SearchFilter {
    pub fn new(
        key: impl Into<String>,
        operator: impl Into<String>,
        value: Option<FilterValue>,
    ) -> Self {
        Self {
            key: key.into(),
            operator: operator.into(),
            value,
        }
    }
}

/// Bounds on span start/end time, in unix nanoseconds
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Timeframe {
    #[serde(default)]
    pub start_time_unix_nano: Option<u64>,
    #[serde(default)]
    pub end_time_unix_nano: Option<u64>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    Asc,
    #[default]
    Desc,
}

impl fmt::Display for SortDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SortDirection::Asc => write!(f, "ASC"),
            SortDirection::Desc => write!(f, "DESC"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SortSpec {
    pub field: String,
    #[serde(default)]
    pub direction: SortDirection,
}

/// Opaque continuation token: decimal sort value of the last returned span
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ContinuationToken(String);

impl ContinuationToken {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ContinuationToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SearchRequest {
    #[serde(default)]
    pub filters: Vec<SearchFilter>,
    #[serde(default)]
    pub timeframe: Option<Timeframe>,
    #[serde(default)]
    pub sort: Option<SortSpec>,
    #[serde(default)]
    pub next_token: Option<ContinuationToken>,
    #[serde(default)]
    pub limit: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchMetadata {
    pub next_token: ContinuationToken,
}

/// A row the materializer rejected
#[derive(Debug, Clone, PartialEq)]
pub struct SkippedRow {
    /// Position of the row in the result stream
    pub row_index: usize,
    pub error: RowDecodeError,
}

/// In-process side channel for partial failures; never serialized
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Diagnostics {
    pub skipped_rows: Vec<SkippedRow>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SearchResponse {
    pub spans: Vec<Span>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<SearchMetadata>,
    #[serde(skip)]
    pub diagnostics: Diagnostics,
}

impl SearchResponse {
    pub fn next_token(&self) -> Option<&ContinuationToken> {
        self.metadata.as_ref().map(|m| &m.next_token)
    }
}
