//! Tag name resolution
//!
//! Maps queryable tag names onto the physical span table: static tags map to
//! fixed columns, dynamic tags map to a JSON path inside one of the attribute
//! blobs. Column names only ever come from this module's constants.

use std::collections::BTreeMap;

use crate::data::error::QueryBuildError;
use crate::data::types::TagType;

pub const SPANS_TABLE: &str = "spans";

/// Columns selected by span search, in the order the materializer reads them
pub const SPAN_RESULT_COLUMNS: &[&str] = &[
    "spans.span_id",
    "spans.trace_id",
    "spans.trace_state",
    "spans.parent_span_id",
    "spans.name",
    "spans.kind",
    "spans.start_time_unix_nano",
    "spans.end_time_unix_nano",
    "spans.dropped_attributes_count",
    "spans.status_message",
    "spans.status_code",
    "spans.dropped_events_count",
    "spans.dropped_links_count",
    "spans.duration_nano",
    "spans.ingestion_time_unix_nano",
    "spans.span_attributes",
    "spans.scope_name",
    "spans.scope_version",
    "spans.scope_dropped_attributes_count",
    "spans.scope_attributes",
    "spans.resource_dropped_attributes_count",
    "spans.resource_attributes",
    "spans.events",
    "spans.links",
];

/// Attribute blob a dynamic tag lives in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AttributeSource {
    Span,
    Scope,
    Resource,
    Event,
    Link,
}

impl AttributeSource {
    pub const ALL: [AttributeSource; 5] = [
        AttributeSource::Span,
        AttributeSource::Scope,
        AttributeSource::Resource,
        AttributeSource::Event,
        AttributeSource::Link,
    ];

    /// Prefix used in qualified tag names (`resource.service.name`)
    pub fn key(&self) -> &'static str {
        match self {
            AttributeSource::Span => "span",
            AttributeSource::Scope => "scope",
            AttributeSource::Resource => "resource",
            AttributeSource::Event => "event",
            AttributeSource::Link => "link",
        }
    }

    pub fn parse(key: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|s| s.key() == key)
    }

    pub fn column(&self) -> &'static str {
        match self {
            AttributeSource::Span => "spans.span_attributes",
            AttributeSource::Scope => "spans.scope_attributes",
            AttributeSource::Resource => "spans.resource_attributes",
            AttributeSource::Event => "spans.events",
            AttributeSource::Link => "spans.links",
        }
    }

    /// Events and links are JSON arrays of objects, each with its own attributes
    pub fn is_nested(&self) -> bool {
        matches!(self, AttributeSource::Event | AttributeSource::Link)
    }

    fn json_path(&self, field: &str) -> String {
        if self.is_nested() {
            format!("$.attributes.\"{}\"", field)
        } else {
            format!("$.\"{}\"", field)
        }
    }
}

/// A statically known, typed tag backed by a fixed column
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StaticTag {
    pub tag_type: TagType,
    pub column: &'static str,
}

const SPAN_STATIC_TAGS: &[(&str, TagType, &str)] = &[
    ("span.spanId", TagType::String, "spans.span_id"),
    ("span.traceId", TagType::String, "spans.trace_id"),
    ("span.traceState", TagType::String, "spans.trace_state"),
    ("span.parentSpanId", TagType::String, "spans.parent_span_id"),
    ("span.name", TagType::String, "spans.name"),
    ("span.kind", TagType::Number, "spans.kind"),
    ("span.startTimeUnixNano", TagType::Number, "spans.start_time_unix_nano"),
    ("span.endTimeUnixNano", TagType::Number, "spans.end_time_unix_nano"),
    ("span.droppedAttributesCount", TagType::Number, "spans.dropped_attributes_count"),
    ("span.droppedEventsCount", TagType::Number, "spans.dropped_events_count"),
    ("span.droppedLinksCount", TagType::Number, "spans.dropped_links_count"),
    ("span.status.code", TagType::Number, "spans.status_code"),
    ("span.status.message", TagType::String, "spans.status_message"),
    ("scope.name", TagType::String, "spans.scope_name"),
    ("scope.version", TagType::String, "spans.scope_version"),
    ("scope.droppedAttributesCount", TagType::Number, "spans.scope_dropped_attributes_count"),
    ("resource.droppedAttributesCount", TagType::Number, "spans.resource_dropped_attributes_count"),
    ("externalFields.durationNano", TagType::Number, "spans.duration_nano"),
    ("externalFields.ingestionTimeUnixNano", TagType::Number, "spans.ingestion_time_unix_nano"),
];

/// Immutable registry of static tags, built once at startup and shared
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StaticTagRegistry {
    tags: BTreeMap<String, StaticTag>,
}

impl Default for StaticTagRegistry {
    fn default() -> Self {
        SPAN_STATIC_TAGS
            .iter()
            .fold(Self::empty(), |registry, (name, tag_type, column)| {
                registry.with_tag(*name, *tag_type, *column)
            })
    }
}

impl StaticTagRegistry {
    pub fn empty() -> Self {
        Self {
            tags: BTreeMap::new(),
        }
    }

    pub fn with_tag(
        mut self,
        name: impl Into<String>,
        tag_type: TagType,
        column: &'static str,
    ) -> Self {
        self.tags.insert(name.into(), StaticTag { tag_type, column });
        self
    }

    pub fn get(&self, name: &str) -> Option<&StaticTag> {
        self.tags.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.tags.contains_key(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &StaticTag)> {
        self.tags.iter().map(|(name, tag)| (name.as_str(), tag))
    }

    pub fn len(&self) -> usize {
        self.tags.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tags.is_empty()
    }
}

/// Numeric fields a search can be ordered (and paginated) by
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum SortField {
    #[default]
    StartTime,
    EndTime,
    Duration,
    IngestionTime,
}

impl SortField {
    /// Accepts the static tag name or its short alias
    pub fn parse(name: &str) -> Option<Self> {
        match name {
            "span.startTimeUnixNano" | "start_time" => Some(SortField::StartTime),
            "span.endTimeUnixNano" | "end_time" => Some(SortField::EndTime),
            "externalFields.durationNano" | "duration" => Some(SortField::Duration),
            "externalFields.ingestionTimeUnixNano" | "ingestion_time" => {
                Some(SortField::IngestionTime)
            }
            _ => None,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            SortField::StartTime => "span.startTimeUnixNano",
            SortField::EndTime => "span.endTimeUnixNano",
            SortField::Duration => "externalFields.durationNano",
            SortField::IngestionTime => "externalFields.ingestionTimeUnixNano",
        }
    }

    pub fn column(&self) -> &'static str {
        match self {
            SortField::StartTime => "spans.start_time_unix_nano",
            SortField::EndTime => "spans.end_time_unix_nano",
            SortField::Duration => "spans.duration_nano",
            SortField::IngestionTime => "spans.ingestion_time_unix_nano",
        }
    }
}

/// Physical location of a tag
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TagColumn {
    /// Fixed column of the span table
    Column(&'static str),
    /// JSON path into an object-valued attribute column
    Json { column: &'static str, path: String },
    /// JSON path into each element of an array-valued column
    Nested { column: &'static str, path: String },
}

/// Resolve a tag name to its column or JSON path
///
/// Static tags win. Otherwise a known source prefix (`resource.`, `event.`, ...)
/// selects the attribute blob, and anything else is a span attribute key.
pub fn resolve_tag(registry: &StaticTagRegistry, key: &str) -> Result<TagColumn, QueryBuildError> {
    if let Some(tag) = registry.get(key) {
        return Ok(TagColumn::Column(tag.column));
    }

    let malformed = |reason| QueryBuildError::MalformedKey {
        key: key.to_string(),
        reason,
    };

    if key.is_empty() {
        return Err(malformed("empty key"));
    }
    // Keys end up inside a quoted JSON path label
    if key.contains('"') {
        return Err(malformed("double quotes are not allowed"));
    }

    let (source, field) = match key.split_once('.') {
        Some((prefix, rest)) => match AttributeSource::parse(prefix) {
            Some(source) => (source, rest),
            None => (AttributeSource::Span, key),
        },
        None => (AttributeSource::Span, key),
    };

    if field.is_empty() {
        return Err(malformed("missing attribute name"));
    }

    let path = source.json_path(field);
    let column = source.column();
    Ok(if source.is_nested() {
        TagColumn::Nested { column, path }
    } else {
        TagColumn::Json { column, path }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn static_tag_resolves_to_column() {
        let registry = StaticTagRegistry::default();
        assert_eq!(
            resolve_tag(&registry, "span.name").unwrap(),
            TagColumn::Column("spans.name")
        );
        assert_eq!(
            resolve_tag(&registry, "externalFields.durationNano").unwrap(),
            TagColumn::Column("spans.duration_nano")
        );
    }

    #[test]
    fn source_prefix_selects_attribute_blob() {
        let registry = StaticTagRegistry::default();
        assert_eq!(
            resolve_tag(&registry, "resource.service.name").unwrap(),
            TagColumn::Json {
                column: "spans.resource_attributes",
                path: "$.\"service.name\"".to_string()
            }
        );
        assert_eq!(
            resolve_tag(&registry, "event.exception.type").unwrap(),
            TagColumn::Nested {
                column: "spans.events",
                path: "$.attributes.\"exception.type\"".to_string()
            }
        );
    }

    #[test]
    fn unqualified_key_is_span_attribute() {
        let registry = StaticTagRegistry::default();
        assert_eq!(
            resolve_tag(&registry, "http.status_code").unwrap(),
            TagColumn::Json {
                column: "spans.span_attributes",
                path: "$.\"http.status_code\"".to_string()
            }
        );
        assert_eq!(
            resolve_tag(&registry, "span.http.method").unwrap(),
            TagColumn::Json {
                column: "spans.span_attributes",
                path: "$.\"http.method\"".to_string()
            }
        );
    }

    #[test]
    fn malformed_keys_rejected() {
        let registry = StaticTagRegistry::default();
        assert!(matches!(
            resolve_tag(&registry, ""),
            Err(QueryBuildError::MalformedKey { .. })
        ));
        assert!(matches!(
            resolve_tag(&registry, "resource."),
            Err(QueryBuildError::MalformedKey { .. })
        ));
        assert!(matches!(
            resolve_tag(&registry, "a\") OR 1=1 --"),
            Err(QueryBuildError::MalformedKey { .. })
        ));
    }

    #[test]
    fn custom_registry_entries() {
        let registry = StaticTagRegistry::empty().with_tag("http.method", TagType::String, "spans.name");
        assert_eq!(registry.len(), 1);
        assert!(registry.contains("http.method"));
        assert_eq!(
            resolve_tag(&registry, "http.method").unwrap(),
            TagColumn::Column("spans.name")
        );
        // Without the default registry, span.name is an ordinary attribute
        assert!(matches!(
            resolve_tag(&registry, "span.name").unwrap(),
            TagColumn::Json { .. }
        ));
    }

    #[test]
    fn sort_field_aliases() {
        assert_eq!(SortField::parse("duration"), Some(SortField::Duration));
        assert_eq!(
            SortField::parse("externalFields.durationNano"),
            Some(SortField::Duration)
        );
        assert_eq!(SortField::parse("span.startTimeUnixNano"), Some(SortField::StartTime));
        assert_eq!(SortField::parse("span.name"), None);
        assert_eq!(SortField::default(), SortField::StartTime);
    }

    #[test]
    fn every_sort_field_is_a_static_tag() {
        let registry = StaticTagRegistry::default();
        for field in [
            SortField::StartTime,
            SortField::EndTime,
            SortField::Duration,
            SortField::IngestionTime,
        ] {
            let tag = registry.get(field.name()).unwrap();
            assert_eq!(tag.column, field.column());
            assert_eq!(tag.tag_type, TagType::Number);
        }
    }
}
