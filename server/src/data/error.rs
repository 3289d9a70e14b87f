//! Error types for the span query engine
//!
//! Build-time and execution-time errors abort the whole call. Row decode
//! errors are isolated to the row that produced them and never surface
//! through [`QueryError`].

use std::fmt;

use thiserror::Error;

/// Stage of a request at which a query was prepared or executed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryStage {
    Search,
    ListTags,
    TagValues,
}

impl fmt::Display for QueryStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            QueryStage::Search => write!(f, "search"),
            QueryStage::ListTags => write!(f, "list tags"),
            QueryStage::TagValues => write!(f, "tag values"),
        }
    }
}

/// Why an in-flight query stopped before completion
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CancelReason {
    /// The caller cancelled the request
    Requested,
    /// The request deadline elapsed
    DeadlineExceeded,
}

impl fmt::Display for CancelReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CancelReason::Requested => write!(f, "cancelled by caller"),
            CancelReason::DeadlineExceeded => write!(f, "deadline exceeded"),
        }
    }
}

/// Top-level error for every span reader operation
#[derive(Error, Debug)]
pub enum QueryError {
    /// Malformed filter, operator, sort or page size; nothing was executed
    #[error("Invalid query: {0}")]
    Build(#[from] QueryBuildError),

    /// The execution capability failed to prepare or run a query
    #[error("Query execution failed during {stage}: {source}")]
    Execution {
        stage: QueryStage,
        #[source]
        source: sqlx::Error,
    },

    /// Malformed continuation token
    #[error("Invalid continuation token: {0}")]
    InvalidCursor(#[from] InvalidCursorError),

    /// The request context was cancelled while the query was in flight
    #[error("Query {reason} during {stage}")]
    Cancelled {
        stage: QueryStage,
        reason: CancelReason,
    },

    /// Operation intentionally not provided by this reader
    #[error("Not implemented: {0}")]
    NotImplemented(&'static str),
}

impl QueryError {
    pub fn execution(stage: QueryStage, source: sqlx::Error) -> Self {
        Self::Execution { stage, source }
    }

    pub fn cancelled(stage: QueryStage, reason: CancelReason) -> Self {
        Self::Cancelled { stage, reason }
    }

    /// Request-validation failures the caller can fix by changing the request
    pub fn is_client_error(&self) -> bool {
        matches!(self, Self::Build(_) | Self::InvalidCursor(_))
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled { .. })
    }
}

/// Errors raised while translating a request into SQL
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum QueryBuildError {
    #[error("unknown operator '{0}'")]
    UnknownOperator(String),

    #[error("malformed tag key '{key}': {reason}")]
    MalformedKey { key: String, reason: &'static str },

    #[error("operator '{operator}' on '{key}' requires {expected}")]
    InvalidValue {
        key: String,
        operator: &'static str,
        expected: &'static str,
    },

    #[error("cannot sort by '{0}'")]
    InvalidSortField(String),

    #[error("page size must be greater than zero")]
    InvalidPageSize,
}

/// A continuation token that does not decode to a sort boundary
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("'{token}' is not a valid continuation token")]
pub struct InvalidCursorError {
    pub token: String,
}

/// A single result row that could not be converted into its domain type
#[derive(Error, Debug, Clone, PartialEq)]
pub enum RowDecodeError {
    #[error("expected {expected} columns, row has {actual}")]
    ColumnCount { expected: usize, actual: usize },

    #[error("column {index}: expected {expected}, found {found}")]
    TypeMismatch {
        index: usize,
        expected: &'static str,
        found: &'static str,
    },

    #[error("column {index}: value {value} is out of range")]
    OutOfRange { index: usize, value: i64 },

    #[error("column {index}: invalid JSON: {message}")]
    InvalidJson { index: usize, message: String },

    #[error("column {index}: unknown tag type '{value}'")]
    UnknownTagType { index: usize, value: String },
}
