//! Dynamically typed result rows
//!
//! The execution capability yields rows as ordered column values. Typed
//! accessors report a [`RowDecodeError`] instead of panicking so callers can
//! skip a bad row and keep going.

use crate::data::error::RowDecodeError;

/// A single column value as stored by the engine
#[derive(Debug, Clone, PartialEq)]
pub enum ColumnValue {
    Null,
    Integer(i64),
    Real(f64),
    Text(String),
    Blob(Vec<u8>),
}

impl ColumnValue {
    pub fn type_name(&self) -> &'static str {
        match self {
            ColumnValue::Null => "NULL",
            ColumnValue::Integer(_) => "INTEGER",
            ColumnValue::Real(_) => "REAL",
            ColumnValue::Text(_) => "TEXT",
            ColumnValue::Blob(_) => "BLOB",
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, ColumnValue::Null)
    }
}

impl From<i64> for ColumnValue {
    fn from(v: i64) -> Self {
        ColumnValue::Integer(v)
    }
}

impl From<f64> for ColumnValue {
    fn from(v: f64) -> Self {
        ColumnValue::Real(v)
    }
}

impl From<&str> for ColumnValue {
    fn from(v: &str) -> Self {
        ColumnValue::Text(v.to_string())
    }
}

impl From<String> for ColumnValue {
    fn from(v: String) -> Self {
        ColumnValue::Text(v)
    }
}

impl<T: Into<ColumnValue>> From<Option<T>> for ColumnValue {
    fn from(v: Option<T>) -> Self {
        v.map(Into::into).unwrap_or(ColumnValue::Null)
    }
}

/// One row of a query result, scanned in column order
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawRow {
    values: Vec<ColumnValue>,
}

impl RawRow {
    pub fn new(values: Vec<ColumnValue>) -> Self {
        Self { values }
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Fail unless the row has exactly `expected` columns
    pub fn expect_columns(&self, expected: usize) -> Result<(), RowDecodeError> {
        if self.values.len() != expected {
            return Err(RowDecodeError::ColumnCount {
                expected,
                actual: self.values.len(),
            });
        }
        Ok(())
    }

    pub fn get(&self, index: usize) -> Result<&ColumnValue, RowDecodeError> {
        self.values
            .get(index)
            .ok_or(RowDecodeError::ColumnCount {
                expected: index + 1,
                actual: self.values.len(),
            })
    }

    pub fn get_i64(&self, index: usize) -> Result<i64, RowDecodeError> {
        match self.get(index)? {
            ColumnValue::Integer(v) => Ok(*v),
            other => Err(mismatch(index, "INTEGER", other)),
        }
    }

    pub fn get_opt_i64(&self, index: usize) -> Result<Option<i64>, RowDecodeError> {
        match self.get(index)? {
            ColumnValue::Null => Ok(None),
            ColumnValue::Integer(v) => Ok(Some(*v)),
            other => Err(mismatch(index, "INTEGER", other)),
        }
    }

    /// Non-negative integer column (timestamps, counters)
    pub fn get_u64(&self, index: usize) -> Result<u64, RowDecodeError> {
        let value = self.get_i64(index)?;
        u64::try_from(value).map_err(|_| RowDecodeError::OutOfRange { index, value })
    }

    /// Nullable counter column; NULL reads as zero
    pub fn get_count(&self, index: usize) -> Result<u32, RowDecodeError> {
        match self.get_opt_i64(index)? {
            None => Ok(0),
            Some(value) => {
                u32::try_from(value).map_err(|_| RowDecodeError::OutOfRange { index, value })
            }
        }
    }

    pub fn get_str(&self, index: usize) -> Result<&str, RowDecodeError> {
        match self.get(index)? {
            ColumnValue::Text(v) => Ok(v.as_str()),
            other => Err(mismatch(index, "TEXT", other)),
        }
    }

    pub fn get_opt_str(&self, index: usize) -> Result<Option<&str>, RowDecodeError> {
        match self.get(index)? {
            ColumnValue::Null => Ok(None),
            ColumnValue::Text(v) => Ok(Some(v.as_str())),
            other => Err(mismatch(index, "TEXT", other)),
        }
    }
}

impl From<Vec<ColumnValue>> for RawRow {
    fn from(values: Vec<ColumnValue>) -> Self {
        Self::new(values)
    }
}

fn mismatch(index: usize, expected: &'static str, found: &ColumnValue) -> RowDecodeError {
    RowDecodeError::TypeMismatch {
        index,
        expected,
        found: found.type_name(),
    }
}
