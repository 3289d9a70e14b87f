//! Filter parsing
//!
//! Parses a JSON filter list into [`SearchFilter`]s. Operator and key checks
//! happen later in the builder so all build errors share one type.

use thiserror::Error;

use crate::data::types::SearchFilter;

/// Maximum size of filter JSON in bytes (64KB)
const MAX_FILTER_JSON_SIZE: usize = 64 * 1024;

/// Maximum number of filters allowed
const MAX_FILTERS: usize = 50;

#[derive(Error, Debug)]
pub enum FilterParseError {
    #[error("Filter JSON exceeds maximum size of {MAX_FILTER_JSON_SIZE} bytes")]
    TooLarge,

    #[error("Invalid filter JSON: {0}")]
    InvalidJson(#[from] serde_json::Error),

    #[error("Maximum {MAX_FILTERS} filters allowed, got {0}")]
    TooMany(usize),
}

/// Parse filters from a JSON array
pub fn parse_filters(json_str: &str) -> Result<Vec<SearchFilter>, FilterParseError> {
    if json_str.len() > MAX_FILTER_JSON_SIZE {
        return Err(FilterParseError::TooLarge);
    }

    let filters: Vec<SearchFilter> = serde_json::from_str(json_str)?;

    if filters.len() > MAX_FILTERS {
        return Err(FilterParseError::TooMany(filters.len()));
    }

    Ok(filters)
}
