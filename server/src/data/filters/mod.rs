//! Span query filter system
//!
//! Turns search and tag-value requests into parameterized SQLite statements.
//!
//! ## Usage
//!
//! ```no_run
//! use spanquery_server::data::filters::{
//!     QueryLimits, StaticTagRegistry, build_search_query, parse_filters,
//! };
//! use spanquery_server::data::types::SearchRequest;
//!
//! let json_str = r#"[{"key": "http.status_code", "operator": "gte", "value": 500}]"#;
//! let request = SearchRequest {
//!     filters: parse_filters(json_str).unwrap(),
//!     ..Default::default()
//! };
//! let registry = StaticTagRegistry::default();
//! let query = build_search_query(&request, None, &registry, &QueryLimits::default()).unwrap();
//! println!("{}", query.statement.sql);
//! ```

pub mod builder;
pub mod columns;
pub mod operators;
mod parser;
mod types;

pub use builder::{
    BuiltQuery, QueryLimits, build_dynamic_tags_query, build_search_query, build_tag_values_query,
};
pub use columns::{AttributeSource, SortField, StaticTag, StaticTagRegistry, TagColumn, resolve_tag};
pub use operators::Operator;
pub use parser::{FilterParseError, parse_filters};
pub use types::{BindValue, SqlParams, SqlStatement};
