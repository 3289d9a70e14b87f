//! Data access layer
//!
//! - `filters` - SQL generation for span search and tag queries
//! - `sqlite` - SQLite span store implementing the execution capability
//! - `context` - per-request cancellation and deadline
//! - `types` - request, response, span and row types
//! - `traits` - `QueryExecutor` and `SpanReader`
//! - `error` - query error types

pub mod context;
pub mod error;
pub mod filters;
pub mod sqlite;
pub mod traits;
pub mod types;

pub use sqlite::SqliteService;

pub use error::{QueryBuildError, QueryError, RowDecodeError};
pub use traits::{QueryExecutor, SpanReader};
