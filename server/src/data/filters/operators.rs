//! Operator catalog
//!
//! Maps each abstract filter operator onto a SQL fragment and the rule for
//! binding its value. Fragments contain only `?` placeholders; values and JSON
//! paths are pushed onto [`SqlParams`] in the order their placeholders appear.

use std::fmt;
use std::str::FromStr;

use crate::data::error::QueryBuildError;
use crate::data::types::{FilterValue, Scalar};

use super::types::SqlParams;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operator {
    Equals,
    In,
    NotIn,
    Contains,
    NotContains,
    Exists,
    NotExists,
    Gt,
    Gte,
    Lt,
    Lte,
}

/// Value shape an operator accepts
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Arity {
    None,
    Scalar,
    Text,
    List,
}

impl Arity {
    fn describe(&self) -> &'static str {
        match self {
            Arity::None => "no value",
            Arity::Scalar => "a single scalar value",
            Arity::Text => "a string value",
            Arity::List => "a non-empty list value",
        }
    }
}

/// A filter value already checked against its operator's arity
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum OperandValue<'a> {
    None,
    Scalar(&'a Scalar),
    Text(&'a str),
    List(&'a [Scalar]),
}

/// Left-hand side of a predicate
///
/// `expr` reads the value, `presence` is tested against NULL for the
/// existence operators. JSON-backed operands carry a path that is bound once
/// for whichever of the two expressions is rendered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Operand {
    expr: String,
    presence: String,
    path: Option<String>,
}

impl Operand {
    pub fn column(column: &str) -> Self {
        Self {
            expr: column.to_string(),
            presence: column.to_string(),
            path: None,
        }
    }

    /// `json_type` distinguishes a JSON null from a missing key
    pub fn json(column: &str, path: impl Into<String>) -> Self {
        Self {
            expr: format!("json_extract({}, ?)", column),
            presence: format!("json_type({}, ?)", column),
            path: Some(path.into()),
        }
    }

    fn bind_path(&self, params: &mut SqlParams) {
        if let Some(path) = &self.path {
            params.push(path.as_str());
        }
    }
}

impl Operator {
    pub const ALL: [Operator; 11] = [
        Operator::Equals,
        Operator::In,
        Operator::NotIn,
        Operator::Contains,
        Operator::NotContains,
        Operator::Exists,
        Operator::NotExists,
        Operator::Gt,
        Operator::Gte,
        Operator::Lt,
        Operator::Lte,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Operator::Equals => "equals",
            Operator::In => "in",
            Operator::NotIn => "not_in",
            Operator::Contains => "contains",
            Operator::NotContains => "not_contains",
            Operator::Exists => "exists",
            Operator::NotExists => "not_exists",
            Operator::Gt => "gt",
            Operator::Gte => "gte",
            Operator::Lt => "lt",
            Operator::Lte => "lte",
        }
    }

    pub fn arity(&self) -> Arity {
        match self {
            Operator::Exists | Operator::NotExists => Arity::None,
            Operator::In | Operator::NotIn => Arity::List,
            Operator::Contains | Operator::NotContains => Arity::Text,
            Operator::Equals | Operator::Gt | Operator::Gte | Operator::Lt | Operator::Lte => {
                Arity::Scalar
            }
        }
    }

    pub fn is_negative(&self) -> bool {
        matches!(
            self,
            Operator::NotIn | Operator::NotContains | Operator::NotExists
        )
    }

    /// The operator a negative operator negates; positive operators map to themselves
    pub fn positive(&self) -> Operator {
        match self {
            Operator::NotIn => Operator::In,
            Operator::NotContains => Operator::Contains,
            Operator::NotExists => Operator::Exists,
            other => *other,
        }
    }

    /// Check that `value` has the shape this operator binds
    pub fn check_value<'a>(
        &self,
        key: &str,
        value: Option<&'a FilterValue>,
    ) -> Result<OperandValue<'a>, QueryBuildError> {
        let checked = match (self.arity(), value) {
            (Arity::None, None) => Some(OperandValue::None),
            (Arity::Scalar, Some(FilterValue::Scalar(s))) => Some(OperandValue::Scalar(s)),
            (Arity::Text, Some(FilterValue::Scalar(Scalar::Text(s)))) => {
                Some(OperandValue::Text(s.as_str()))
            }
            (Arity::List, Some(FilterValue::List(items))) if !items.is_empty() => {
                Some(OperandValue::List(items.as_slice()))
            }
            _ => None,
        };
        checked.ok_or_else(|| QueryBuildError::InvalidValue {
            key: key.to_string(),
            operator: self.as_str(),
            expected: self.arity().describe(),
        })
    }

    /// Render the predicate fragment, pushing its bound values in placeholder order
    ///
    /// `not_in` and `not_contains` also match rows where the operand is absent
    /// or null, the same rows `NOT EXISTS` keeps for event and link attributes.
    ///
    /// `value` must come from [`Operator::check_value`] for the same operator
    /// (or its negative counterpart).
    pub fn render(&self, operand: &Operand, value: OperandValue<'_>, params: &mut SqlParams) -> String {
        match (self, value) {
            (Operator::Exists, _) => {
                operand.bind_path(params);
                format!("{} IS NOT NULL", operand.presence)
            }
            (Operator::NotExists, _) => {
                operand.bind_path(params);
                format!("{} IS NULL", operand.presence)
            }
            (Operator::In, OperandValue::List(items)) => {
                operand.bind_path(params);
                format!("{} IN ({})", operand.expr, bind_list(items, params))
            }
            (Operator::NotIn, OperandValue::List(items)) => {
                operand.bind_path(params);
                operand.bind_path(params);
                format!(
                    "({expr} IS NULL OR {expr} NOT IN ({}))",
                    bind_list(items, params),
                    expr = operand.expr
                )
            }
            (Operator::Contains, OperandValue::Text(text)) => {
                operand.bind_path(params);
                params.push(like_pattern(text));
                format!("{} LIKE ? ESCAPE '\\'", operand.expr)
            }
            (Operator::NotContains, OperandValue::Text(text)) => {
                operand.bind_path(params);
                operand.bind_path(params);
                params.push(like_pattern(text));
                format!(
                    "({expr} IS NULL OR {expr} NOT LIKE ? ESCAPE '\\')",
                    expr = operand.expr
                )
            }
            (_, OperandValue::Scalar(scalar)) => {
                operand.bind_path(params);
                params.push(scalar);
                let symbol = match self {
                    Operator::Gt => ">",
                    Operator::Gte => ">=",
                    Operator::Lt => "<",
                    Operator::Lte => "<=",
                    _ => "=",
                };
                format!("{} {} ?", operand.expr, symbol)
            }
            // Only reachable with an unchecked value
            _ => "0=1".to_string(),
        }
    }
}

/// One `?` per list element, values pushed in order
fn bind_list(items: &[Scalar], params: &mut SqlParams) -> String {
    params.values.extend(items.iter().map(Into::into));
    items.iter().map(|_| "?").collect::<Vec<_>>().join(", ")
}

fn like_pattern(text: &str) -> String {
    format!("%{}%", escape_like_pattern(text))
}

/// Escape LIKE metacharacters (`%`, `_`, `\`) so user text matches literally
fn escape_like_pattern(s: &str) -> String {
    s.replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_")
}

impl FromStr for Operator {
    type Err = QueryBuildError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|op| op.as_str() == s)
            .ok_or_else(|| QueryBuildError::UnknownOperator(s.to_string()))
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
