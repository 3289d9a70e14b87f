//! Domain logic for span queries
//!
//! - `spans` - search, tag discovery and tag values over stored spans

pub mod spans;

pub use spans::SqliteSpanReader;
