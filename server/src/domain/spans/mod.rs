//! Span read path
//!
//! - `cursor` - continuation token encode/decode and emission policy
//! - `materialize` - search row to `Span` conversion
//! - `tags` - static and discovered tag catalog
//! - `tag_values` - distinct tag values with counts
//! - `reader` - `SpanReader` implementation wiring the above

pub mod cursor;
pub mod materialize;
mod reader;
pub mod tag_values;
pub mod tags;

#[cfg(test)]
pub(crate) mod testing;

pub use reader::SqliteSpanReader;
pub use tags::{DiscoveredTag, merge_tags};
