//! SQL query builder
//!
//! Composes filters, timeframe, sort and pagination boundary into a single
//! parameterized statement. Nothing here executes SQL.

use crate::core::constants::{DEFAULT_PAGE_SIZE, MAX_PAGE_SIZE};
use crate::data::error::QueryBuildError;
use crate::data::types::{SearchFilter, SearchRequest, SortDirection, TagValuesRequest, Timeframe};

use super::columns::{
    AttributeSource, SPAN_RESULT_COLUMNS, SPANS_TABLE, SortField, StaticTagRegistry, TagColumn,
    resolve_tag,
};
use super::operators::{Operand, Operator};
use super::types::{SqlParams, SqlStatement};

/// Page size bounds applied to search requests
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QueryLimits {
    pub default_page_size: u32,
    pub max_page_size: u32,
}

impl Default for QueryLimits {
    fn default() -> Self {
        Self {
            default_page_size: DEFAULT_PAGE_SIZE,
            max_page_size: MAX_PAGE_SIZE,
        }
    }
}

/// Executable search plan plus the metadata needed to paginate its result
#[derive(Debug, Clone, PartialEq)]
pub struct BuiltQuery {
    pub statement: SqlStatement,
    pub sort: SortField,
    pub direction: SortDirection,
    pub page_size: u32,
    /// WHERE fragments in order: one per filter, then timeframe bounds, then
    /// the cursor boundary
    pub predicates: Vec<String>,
}

/// Build the span search statement
///
/// `boundary` is the decoded continuation token; the next page starts
/// strictly after it in the effective sort order.
pub fn build_search_query(
    request: &SearchRequest,
    boundary: Option<i64>,
    registry: &StaticTagRegistry,
    limits: &QueryLimits,
) -> Result<BuiltQuery, QueryBuildError> {
    let (sort, direction) = effective_sort(request)?;
    let page_size = effective_page_size(request.limit, limits)?;

    let mut params = SqlParams::default();
    let mut predicates = build_filter_predicates(&request.filters, registry, &mut params)?;
    predicates.extend(timeframe_predicates(request.timeframe.as_ref(), &mut params));

    if let Some(boundary) = boundary {
        let comparison = match direction {
            SortDirection::Desc => "<",
            SortDirection::Asc => ">",
        };
        predicates.push(format!("{} {} ?", sort.column(), comparison));
        params.push(boundary);
    }

    let mut sql = format!(
        "SELECT {} FROM {}",
        SPAN_RESULT_COLUMNS.join(", "),
        SPANS_TABLE
    );
    push_where(&mut sql, &predicates);
    // span_id orders ties within a page; the cursor boundary ignores it
    sql.push_str(&format!(
        " ORDER BY {col} {dir}, spans.span_id {dir} LIMIT ?",
        col = sort.column(),
        dir = direction
    ));
    params.push(i64::from(page_size));

    Ok(BuiltQuery {
        statement: SqlStatement::new(sql, params),
        sort,
        direction,
        page_size,
        predicates,
    })
}

/// Build the distinct value + count statement for one tag
///
/// Request filters and timeframe scope the counted spans. Event and link tags
/// count once per matching event or link.
pub fn build_tag_values_query(
    request: &TagValuesRequest,
    tag: &str,
    registry: &StaticTagRegistry,
    max_values: Option<u32>,
) -> Result<SqlStatement, QueryBuildError> {
    let mut params = SqlParams::default();

    let (value_expr, from) = match resolve_tag(registry, tag)? {
        TagColumn::Column(column) => (column.to_string(), SPANS_TABLE.to_string()),
        TagColumn::Json { column, path } => {
            params.push(path);
            (format!("json_extract({}, ?)", column), SPANS_TABLE.to_string())
        }
        TagColumn::Nested { column, path } => {
            params.push(path);
            (
                "json_extract(tag_item.value, ?)".to_string(),
                format!("{}, json_each({}) AS tag_item", SPANS_TABLE, column),
            )
        }
    };

    let mut predicates = build_filter_predicates(&request.filters, registry, &mut params)?;
    predicates.extend(timeframe_predicates(request.timeframe.as_ref(), &mut params));

    let mut sql = format!(
        "SELECT {} AS tag_value, COUNT(*) AS tag_count FROM {}",
        value_expr, from
    );
    push_where(&mut sql, &predicates);
    // NULL group dropped before LIMIT
    sql.push_str(" GROUP BY tag_value HAVING tag_value IS NOT NULL ORDER BY tag_count DESC");
    if let Some(max_values) = max_values {
        sql.push_str(" LIMIT ?");
        params.push(i64::from(max_values));
    }

    Ok(SqlStatement::new(sql, params))
}

/// Statement enumerating distinct `(source, key, type)` triples across all
/// attribute blobs. Blobs that are not valid JSON are ignored.
pub fn build_dynamic_tags_query() -> SqlStatement {
    let type_expr = "CASE attr.type \
         WHEN 'integer' THEN 'number' \
         WHEN 'real' THEN 'number' \
         WHEN 'true' THEN 'boolean' \
         WHEN 'false' THEN 'boolean' \
         ELSE 'string' END";

    let selects: Vec<String> = AttributeSource::ALL
        .iter()
        .map(|source| {
            let column = source.column();
            let valid = format!("CASE WHEN json_valid({c}) THEN {c} END", c = column);
            let from = if source.is_nested() {
                format!(
                    "{}, json_each({}) AS item, json_each(item.value, '$.attributes') AS attr",
                    SPANS_TABLE, valid
                )
            } else {
                format!("{}, json_each({}) AS attr", SPANS_TABLE, valid)
            };
            format!(
                "SELECT DISTINCT '{}' AS source, attr.key AS tag_key, {} AS tag_type FROM {} WHERE attr.type <> 'null'",
                source.key(),
                type_expr,
                from
            )
        })
        .collect();

    let sql = format!(
        "{} ORDER BY source, tag_key, tag_type",
        selects.join(" UNION ")
    );
    SqlStatement::new(sql, SqlParams::default())
}

/// One predicate per filter, AND-combined by the caller
pub fn build_filter_predicates(
    filters: &[SearchFilter],
    registry: &StaticTagRegistry,
    params: &mut SqlParams,
) -> Result<Vec<String>, QueryBuildError> {
    filters
        .iter()
        .map(|filter| filter_predicate(filter, registry, params))
        .collect()
}

fn filter_predicate(
    filter: &SearchFilter,
    registry: &StaticTagRegistry,
    params: &mut SqlParams,
) -> Result<String, QueryBuildError> {
    let operator: Operator = filter.operator.parse()?;
    let value = operator.check_value(&filter.key, filter.value.as_ref())?;

    let predicate = match resolve_tag(registry, &filter.key)? {
        TagColumn::Column(column) => operator.render(&Operand::column(column), value, params),
        TagColumn::Json { column, path } => {
            operator.render(&Operand::json(column, path), value, params)
        }
        TagColumn::Nested { column, path } => {
            let inner = operator
                .positive()
                .render(&Operand::json("nested_item.value", path), value, params);
            let exists = format!(
                "EXISTS (SELECT 1 FROM json_each({}) AS nested_item WHERE {})",
                column, inner
            );
            if operator.is_negative() {
                format!("NOT {}", exists)
            } else {
                exists
            }
        }
    };
    Ok(predicate)
}

fn timeframe_predicates(timeframe: Option<&Timeframe>, params: &mut SqlParams) -> Vec<String> {
    let mut predicates = Vec::new();
    let Some(timeframe) = timeframe else {
        return predicates;
    };
    if let Some(start) = timeframe.start_time_unix_nano {
        predicates.push("spans.start_time_unix_nano >= ?".to_string());
        params.push(saturating_i64(start));
    }
    if let Some(end) = timeframe.end_time_unix_nano {
        predicates.push("spans.end_time_unix_nano <= ?".to_string());
        params.push(saturating_i64(end));
    }
    predicates
}

fn effective_sort(request: &SearchRequest) -> Result<(SortField, SortDirection), QueryBuildError> {
    match &request.sort {
        None => Ok((SortField::default(), SortDirection::default())),
        Some(spec) => {
            let field = SortField::parse(&spec.field)
                .ok_or_else(|| QueryBuildError::InvalidSortField(spec.field.clone()))?;
            Ok((field, spec.direction))
        }
    }
}

fn effective_page_size(limit: Option<u32>, limits: &QueryLimits) -> Result<u32, QueryBuildError> {
    match limit {
        None => Ok(limits.default_page_size.min(limits.max_page_size)),
        Some(0) => Err(QueryBuildError::InvalidPageSize),
        Some(n) => Ok(n.min(limits.max_page_size)),
    }
}

fn push_where(sql: &mut String, predicates: &[String]) {
    if !predicates.is_empty() {
        sql.push_str(" WHERE ");
        sql.push_str(&predicates.join(" AND "));
    }
}

fn saturating_i64(v: u64) -> i64 {
    i64::try_from(v).unwrap_or(i64::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::filters::types::BindValue;
    use crate::data::types::{FilterValue, Scalar, SortSpec, TagType};

    fn filter(key: &str, operator: &str, value: Option<FilterValue>) -> SearchFilter {
        SearchFilter::new(key, operator, value)
    }

    fn build(request: &SearchRequest, boundary: Option<i64>) -> BuiltQuery {
        build_search_query(
            request,
            boundary,
            &StaticTagRegistry::default(),
            &QueryLimits::default(),
        )
        .unwrap()
    }

    #[test]
    fn default_sort_is_start_time_desc() {
        let query = build(&SearchRequest::default(), None);
        assert_eq!(query.sort, SortField::StartTime);
        assert_eq!(query.direction, SortDirection::Desc);
        assert!(query.statement.sql.ends_with(
            "ORDER BY spans.start_time_unix_nano DESC, spans.span_id DESC LIMIT ?"
        ));
        assert!(!query.statement.sql.contains("WHERE"));
        assert_eq!(query.statement.params, vec![BindValue::Integer(100)]);
    }

    #[test]
    fn one_predicate_per_filter() {
        let request = SearchRequest {
            filters: vec![
                filter("http.status_code", "gte", Some(Scalar::Integer(500).into())),
                filter("span.name", "contains", Some(Scalar::Text("checkout".into()).into())),
                filter(
                    "resource.service.name",
                    "in",
                    Some(vec![Scalar::Text("api".into()), Scalar::Text("web".into())].into()),
                ),
                filter("event.exception.type", "exists", None),
                filter("link.peer", "not_exists", None),
            ],
            ..Default::default()
        };
        let query = build(&request, None);
        assert_eq!(query.predicates.len(), request.filters.len());
        assert_eq!(
            query.statement.placeholder_count(),
            query.statement.params.len()
        );
    }

    #[test]
    fn values_never_interpolated() {
        let hostile = "x' OR '1'='1";
        let request = SearchRequest {
            filters: vec![
                filter("span.name", "equals", Some(Scalar::Text(hostile.into()).into())),
                filter("http.url", "contains", Some(Scalar::Text(hostile.into()).into())),
                filter(
                    "event.message",
                    "not_in",
                    Some(vec![Scalar::Text(hostile.into())].into()),
                ),
            ],
            ..Default::default()
        };
        let query = build(&request, None);
        assert!(!query.statement.sql.contains(hostile));
        assert!(!query.statement.sql.contains("http.url"));
        assert!(
            query
                .statement
                .params
                .contains(&BindValue::Text(hostile.to_string()))
        );
    }

    #[test]
    fn scenario_status_code_filter() {
        let request = SearchRequest {
            filters: vec![filter(
                "http.status_code",
                "gte",
                Some(Scalar::Integer(500).into()),
            )],
            ..Default::default()
        };
        let query = build(&request, None);
        assert!(query.statement.sql.contains(
            "WHERE json_extract(spans.span_attributes, ?) >= ? ORDER BY spans.start_time_unix_nano DESC"
        ));
        assert_eq!(
            query.statement.params,
            vec![
                BindValue::Text("$.\"http.status_code\"".to_string()),
                BindValue::Integer(500),
                BindValue::Integer(100),
            ]
        );
    }

    #[test]
    fn cursor_boundary_follows_direction() {
        let query = build(&SearchRequest::default(), Some(50));
        assert_eq!(
            query.predicates.last().unwrap(),
            "spans.start_time_unix_nano < ?"
        );
        assert_eq!(
            query.statement.params,
            vec![BindValue::Integer(50), BindValue::Integer(100)]
        );

        let request = SearchRequest {
            sort: Some(SortSpec {
                field: "duration".to_string(),
                direction: SortDirection::Asc,
            }),
            ..Default::default()
        };
        let query = build(&request, Some(7));
        assert_eq!(query.sort, SortField::Duration);
        assert_eq!(query.predicates.last().unwrap(), "spans.duration_nano > ?");
        assert!(query.statement.sql.contains("ORDER BY spans.duration_nano ASC"));
    }

    #[test]
    fn nested_negative_operator_uses_not_exists() {
        let request = SearchRequest {
            filters: vec![filter(
                "event.exception.type",
                "not_in",
                Some(vec![Scalar::Text("Timeout".into())].into()),
            )],
            ..Default::default()
        };
        let query = build(&request, None);
        assert_eq!(
            query.predicates[0],
            "NOT EXISTS (SELECT 1 FROM json_each(spans.events) AS nested_item \
             WHERE json_extract(nested_item.value, ?) IN (?))"
        );
    }

    #[test]
    fn timeframe_adds_bounds() {
        let request = SearchRequest {
            timeframe: Some(Timeframe {
                start_time_unix_nano: Some(10),
                end_time_unix_nano: Some(20),
            }),
            ..Default::default()
        };
        let query = build(&request, None);
        assert_eq!(
            query.predicates,
            vec![
                "spans.start_time_unix_nano >= ?".to_string(),
                "spans.end_time_unix_nano <= ?".to_string()
            ]
        );
    }

    #[test]
    fn build_errors() {
        let registry = StaticTagRegistry::default();
        let limits = QueryLimits::default();

        let unknown_op = SearchRequest {
            filters: vec![filter("span.name", "like", Some(Scalar::Text("a".into()).into()))],
            ..Default::default()
        };
        assert_eq!(
            build_search_query(&unknown_op, None, &registry, &limits),
            Err(QueryBuildError::UnknownOperator("like".to_string()))
        );

        let bad_arity = SearchRequest {
            filters: vec![filter("span.name", "in", Some(Scalar::Text("a".into()).into()))],
            ..Default::default()
        };
        assert!(matches!(
            build_search_query(&bad_arity, None, &registry, &limits),
            Err(QueryBuildError::InvalidValue { .. })
        ));

        let bad_sort = SearchRequest {
            sort: Some(SortSpec {
                field: "span.name".to_string(),
                direction: SortDirection::Desc,
            }),
            ..Default::default()
        };
        assert_eq!(
            build_search_query(&bad_sort, None, &registry, &limits),
            Err(QueryBuildError::InvalidSortField("span.name".to_string()))
        );

        let zero = SearchRequest {
            limit: Some(0),
            ..Default::default()
        };
        assert_eq!(
            build_search_query(&zero, None, &registry, &limits),
            Err(QueryBuildError::InvalidPageSize)
        );
    }

    #[test]
    fn page_size_clamped_to_max() {
        let limits = QueryLimits {
            default_page_size: 10,
            max_page_size: 50,
        };
        let request = SearchRequest {
            limit: Some(500),
            ..Default::default()
        };
        let query =
            build_search_query(&request, None, &StaticTagRegistry::default(), &limits).unwrap();
        assert_eq!(query.page_size, 50);
    }

    #[test]
    fn tag_values_for_static_tag() {
        let registry = StaticTagRegistry::empty().with_tag("http.method", TagType::String, "spans.name");
        let statement =
            build_tag_values_query(&TagValuesRequest::default(), "http.method", &registry, None)
                .unwrap();
        assert_eq!(
            statement.sql,
            "SELECT spans.name AS tag_value, COUNT(*) AS tag_count FROM spans \
             GROUP BY tag_value HAVING tag_value IS NOT NULL ORDER BY tag_count DESC"
        );
        assert!(statement.params.is_empty());
    }

    #[test]
    fn tag_values_path_bound_before_filters() {
        let request = TagValuesRequest {
            filters: vec![filter("span.kind", "equals", Some(Scalar::Integer(2).into()))],
            timeframe: None,
        };
        let statement = build_tag_values_query(
            &request,
            "resource.service.name",
            &StaticTagRegistry::default(),
            Some(25),
        )
        .unwrap();
        assert_eq!(
            statement.sql,
            "SELECT json_extract(spans.resource_attributes, ?) AS tag_value, COUNT(*) AS tag_count \
             FROM spans WHERE spans.kind = ? GROUP BY tag_value HAVING tag_value IS NOT NULL \
             ORDER BY tag_count DESC LIMIT ?"
        );
        assert_eq!(
            statement.params,
            vec![
                BindValue::Text("$.\"service.name\"".to_string()),
                BindValue::Integer(2),
                BindValue::Integer(25),
            ]
        );
    }

    #[test]
    fn tag_values_for_event_attribute_joins_array() {
        let statement = build_tag_values_query(
            &TagValuesRequest::default(),
            "event.exception.type",
            &StaticTagRegistry::default(),
            None,
        )
        .unwrap();
        assert!(statement.sql.contains("FROM spans, json_each(spans.events) AS tag_item"));
        assert_eq!(
            statement.params,
            vec![BindValue::Text("$.attributes.\"exception.type\"".to_string())]
        );
    }

    #[test]
    fn dynamic_tags_query_covers_all_sources() {
        let statement = build_dynamic_tags_query();
        for source in AttributeSource::ALL {
            assert!(statement.sql.contains(&format!("'{}' AS source", source.key())));
        }
        assert!(statement.params.is_empty());
        assert_eq!(statement.placeholder_count(), 0);
    }
}
