/// Tabular Value Module
///
/// The in-memory result of reading a whole table: ordered column names and
/// ordered rows of typed cells. A `TableData` is immutable once built; a new
/// read always produces a new value.

use crate::core::{AccviewError, Result};
use chrono::{NaiveDate, NaiveDateTime};
use std::fmt;

/// A single cell value as returned by a driver.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    Integer(i64),
    Real(f64),
    Text(String),
    Boolean(bool),
    Date(NaiveDate),
    Timestamp(NaiveDateTime),
    Blob(Vec<u8>),
}

impl Value {
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }
}

/// Display formatting used by every grid surface.
///
/// `NULL` for missing values, `true`/`false` for booleans, ISO dates,
/// `YYYY-MM-DD HH:MM:SS` timestamps and `<BLOB: N bytes>` for binary data.
impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => f.write_str("NULL"),
            Value::Integer(i) => write!(f, "{}", i),
            Value::Real(r) => write!(f, "{}", r),
            Value::Text(t) => f.write_str(t),
            Value::Boolean(b) => write!(f, "{}", b),
            Value::Date(d) => write!(f, "{}", d.format("%Y-%m-%d")),
            Value::Timestamp(ts) => write!(f, "{}", ts.format("%Y-%m-%d %H:%M:%S")),
            Value::Blob(b) => write!(f, "<BLOB: {} bytes>", b.len()),
        }
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Value::Integer(value)
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Value::Real(value)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::Text(value.to_string())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Value::Text(value)
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Value::Boolean(value)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(value: Option<T>) -> Self {
        value.map(Into::into).unwrap_or(Value::Null)
    }
}

/// Rows and columns of one table read.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct TableData {
    columns: Vec<String>,
    rows: Vec<Vec<Value>>,
}

impl TableData {
    /// Builds a tabular value, checking that every row is as wide as the
    /// column list.
    ///
    /// # Errors
    ///
    /// Returns `AccviewError::Schema` naming the first offending row.
    pub fn new(columns: Vec<String>, rows: Vec<Vec<Value>>) -> Result<Self> {
        if let Some((index, row)) = rows
            .iter()
            .enumerate()
            .find(|(_, row)| row.len() != columns.len())
        {
            return Err(AccviewError::Schema(format!(
                "row {} has {} cells, expected {}",
                index,
                row.len(),
                columns.len()
            )));
        }

        Ok(TableData { columns, rows })
    }

    /// A value with no columns and no rows.
    pub fn empty() -> Self {
        TableData::default()
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn rows(&self) -> &[Vec<Value>] {
        &self.rows
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    /// True when the value holds no rows, whether or not columns are known.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn get(&self, row: usize, column: usize) -> Option<&Value> {
        self.rows.get(row)?.get(column)
    }
}
