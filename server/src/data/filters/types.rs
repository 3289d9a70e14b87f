//! Bound parameters and prepared statements
//!
//! Every value that originates from a request travels as a [`BindValue`]
//! next to the SQL text, never inside it.

use crate::data::types::Scalar;

/// A value bound to a `?` placeholder
#[derive(Debug, Clone, PartialEq)]
pub enum BindValue {
    Integer(i64),
    Real(f64),
    Text(String),
}

impl From<i64> for BindValue {
    fn from(v: i64) -> Self {
        BindValue::Integer(v)
    }
}

impl From<String> for BindValue {
    fn from(v: String) -> Self {
        BindValue::Text(v)
    }
}

impl From<&str> for BindValue {
    fn from(v: &str) -> Self {
        BindValue::Text(v.to_string())
    }
}

impl From<&Scalar> for BindValue {
    fn from(v: &Scalar) -> Self {
        match v {
            // SQLite has no boolean storage class; JSON true/false extract as 1/0
            Scalar::Bool(b) => BindValue::Integer(i64::from(*b)),
            Scalar::Integer(i) => BindValue::Integer(*i),
            Scalar::Float(f) => BindValue::Real(*f),
            Scalar::Text(s) => BindValue::Text(s.clone()),
        }
    }
}

/// Collects SQL parameters during query building (maintains insertion order)
#[derive(Debug, Default, Clone, PartialEq)]
pub struct SqlParams {
    pub values: Vec<BindValue>,
}

impl SqlParams {
    pub fn push(&mut self, value: impl Into<BindValue>) {
        self.values.push(value.into());
    }
}

/// Parameterized SQL plus its bound arguments, ready for execution
#[derive(Debug, Clone, PartialEq)]
pub struct SqlStatement {
    pub sql: String,
    pub params: Vec<BindValue>,
}

impl SqlStatement {
    pub fn new(sql: impl Into<String>, params: SqlParams) -> Self {
        Self {
            sql: sql.into(),
            params: params.values,
        }
    }

    /// Number of `?` placeholders in the SQL text
    pub fn placeholder_count(&self) -> usize {
        self.sql.matches('?').count()
    }
}
