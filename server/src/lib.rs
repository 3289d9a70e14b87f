//! Span query engine
//!
//! Read-side queries over recorded trace spans stored in SQLite: filtered and
//! paginated search, tag discovery and per-tag value counts.

mod app;
pub mod core;
pub mod data;
pub mod domain;
