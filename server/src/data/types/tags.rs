//! Tag discovery and tag value types

use std::fmt;

use serde::{Deserialize, Serialize};

use super::query::{SearchFilter, Timeframe};

/// Declared or inferred type of a queryable tag
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TagType {
    String,
    Number,
    Boolean,
}

impl TagType {
    pub fn as_str(&self) -> &'static str {
        match self {
            TagType::String => "string",
            TagType::Number => "number",
            TagType::Boolean => "boolean",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "string" => Some(TagType::String),
            "number" => Some(TagType::Number),
            "boolean" => Some(TagType::Boolean),
            _ => None,
        }
    }
}

impl fmt::Display for TagType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TagInfo {
    pub name: String,
    #[serde(rename = "type")]
    pub tag_type: TagType,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GetAvailableTagsRequest {}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GetAvailableTagsResponse {
    pub tags: Vec<TagInfo>,
}

/// Request-level scope applied to every tag value query
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TagValuesRequest {
    #[serde(default)]
    pub filters: Vec<SearchFilter>,
    #[serde(default)]
    pub timeframe: Option<Timeframe>,
}

/// Observed non-null tag value
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TagValue {
    Integer(i64),
    Real(f64),
    Text(String),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TagValueInfo {
    pub value: TagValue,
    pub count: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TagValuesResponse {
    pub values: Vec<TagValueInfo>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TagStatisticsRequest {
    #[serde(default)]
    pub filters: Vec<SearchFilter>,
    #[serde(default)]
    pub timeframe: Option<Timeframe>,
    #[serde(default)]
    pub desired_statistics: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TagStatisticsResponse {
    pub statistics: std::collections::BTreeMap<String, f64>,
}
