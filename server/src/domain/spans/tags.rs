//! Tag catalog
//!
//! Merges the static tag registry with attribute keys discovered in stored
//! spans. Static names win on collision; a dynamic name seen with more than
//! one type is reported as `string`.

use std::collections::BTreeMap;

use crate::data::context::RequestContext;
use crate::data::error::{QueryError, QueryStage, RowDecodeError};
use crate::data::filters::{StaticTagRegistry, build_dynamic_tags_query};
use crate::data::traits::{QueryExecutor, fetch_rows};
use crate::data::types::{RawRow, TagInfo, TagType};

/// Attribute key observed in one attribute blob
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiscoveredTag {
    pub source: String,
    pub key: String,
    pub tag_type: TagType,
}

impl DiscoveredTag {
    /// Qualified name, e.g. `resource.service.name`
    pub fn qualified_name(&self) -> String {
        format!("{}.{}", self.source, self.key)
    }
}

/// All queryable tags, sorted by name, without duplicates
pub async fn list_tags<E>(
    executor: &E,
    registry: &StaticTagRegistry,
    ctx: &RequestContext,
) -> Result<Vec<TagInfo>, QueryError>
where
    E: QueryExecutor + ?Sized,
{
    let statement = build_dynamic_tags_query();
    let rows = fetch_rows(executor, &statement, QueryStage::ListTags, ctx).await?;

    let mut discovered = Vec::with_capacity(rows.len());
    for (row_index, row) in rows.iter().enumerate() {
        match decode_discovered(row) {
            Ok(Some(tag)) => discovered.push(tag),
            Ok(None) => {}
            Err(e) => tracing::warn!(row_index, error = %e, "Skipping undecodable tag row"),
        }
    }

    let tags = merge_tags(registry, discovered);
    tracing::debug!(count = tags.len(), "Listed available tags");
    Ok(tags)
}

/// `(source, tag_key, tag_type)`; rows with an empty source or key yield `None`
fn decode_discovered(row: &RawRow) -> Result<Option<DiscoveredTag>, RowDecodeError> {
    row.expect_columns(3)?;
    let source = row.get_opt_str(0)?.unwrap_or_default();
    let key = row.get_opt_str(1)?.unwrap_or_default();
    if source.is_empty() || key.is_empty() {
        return Ok(None);
    }
    let raw_type = row.get_str(2)?;
    let tag_type = TagType::parse(raw_type).ok_or_else(|| RowDecodeError::UnknownTagType {
        index: 2,
        value: raw_type.to_string(),
    })?;
    Ok(Some(DiscoveredTag {
        source: source.to_string(),
        key: key.to_string(),
        tag_type,
    }))
}

/// Union of static and discovered tags
pub fn merge_tags(registry: &StaticTagRegistry, discovered: Vec<DiscoveredTag>) -> Vec<TagInfo> {
    let mut merged: BTreeMap<String, TagType> = registry
        .iter()
        .map(|(name, tag)| (name.to_string(), tag.tag_type))
        .collect();
    let mut dynamic: BTreeMap<String, TagType> = BTreeMap::new();

    for tag in discovered {
        let name = tag.qualified_name();
        if let Some(static_tag) = registry.get(&name) {
            if static_tag.tag_type != tag.tag_type {
                tracing::warn!(
                    tag = %name,
                    static_type = %static_tag.tag_type,
                    dynamic_type = %tag.tag_type,
                    "Dynamic tag collides with static tag, keeping static"
                );
            }
            continue;
        }
        dynamic
            .entry(name)
            .and_modify(|existing| {
                if *existing != tag.tag_type {
                    *existing = TagType::String;
                }
            })
            .or_insert(tag.tag_type);
    }

    merged.extend(dynamic);
    merged
        .into_iter()
        .map(|(name, tag_type)| TagInfo { name, tag_type })
        .collect()
}
