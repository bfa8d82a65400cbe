//! Dynamic row model for ad-hoc query results.
//!
//! A [`QueryResult`] keeps the column list reported by the database and one
//! [`RowMap`] per returned row. Each row is built by zipping the column names
//! with the row's values, so row keys always match the result columns in
//! database order.

use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use indexmap::IndexMap;
use rust_decimal::Decimal;

use crate::error::RowError;

/// A single field value decoded from a result row.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Decimal(Decimal),
    Text(String),
    Date(NaiveDate),
    Timestamp(NaiveDateTime),
    TimestampTz(DateTime<Utc>),
    /// A column type without a dedicated variant, kept as its wire bytes.
    Other { type_name: String, bytes: Vec<u8> },
}

impl Value {
    /// Short type name used in error messages.
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Null => "null",
            Self::Bool(_) => "bool",
            Self::Int(_) => "integer",
            Self::Float(_) => "float",
            Self::Decimal(_) => "decimal",
            Self::Text(_) => "text",
            Self::Date(_) => "date",
            Self::Timestamp(_) => "timestamp",
            Self::TimestampTz(_) => "timestamptz",
            Self::Other { .. } => "other",
        }
    }

    pub const fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    pub const fn as_i64(&self) -> Option<i64> {
        match self {
            Self::Int(v) => Some(*v),
            _ => None,
        }
    }

    /// Fixed-point view of the value. Integers widen losslessly.
    pub fn as_decimal(&self) -> Option<Decimal> {
        match self {
            Self::Decimal(v) => Some(*v),
            Self::Int(v) => Some(Decimal::from(*v)),
            _ => None,
        }
    }

    /// Text view of the value.
    ///
    /// `Other` values are readable as text when their bytes are UTF-8, which
    /// covers enum labels and text-like extension types.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Text(v) => Some(v.as_str()),
            Self::Other { bytes, .. } => std::str::from_utf8(bytes).ok(),
            _ => None,
        }
    }

    pub const fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(v) => Some(*v),
            _ => None,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => f.write_str("NULL"),
            Self::Bool(v) => write!(f, "{v}"),
            Self::Int(v) => write!(f, "{v}"),
            Self::Float(v) => write!(f, "{v}"),
            Self::Decimal(v) => write!(f, "{v}"),
            Self::Text(v) => write!(f, "{v:?}"),
            Self::Date(v) => write!(f, "{v}"),
            Self::Timestamp(v) => write!(f, "{v}"),
            Self::TimestampTz(v) => write!(f, "{v}"),
            Self::Other { type_name, bytes } => match std::str::from_utf8(bytes) {
                Ok(text) => write!(f, "{text:?}::{type_name}"),
                Err(_) => write!(f, "<{} bytes of {type_name}>", bytes.len()),
            },
        }
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Self::Int(v)
    }
}

impl From<Decimal> for Value {
    fn from(v: Decimal) -> Self {
        Self::Decimal(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Self::Text(v.to_string())
    }
}

impl<T: Into<Self>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map_or(Self::Null, Into::into)
    }
}

/// Ordered mapping from column name to value for one row.
#[derive(Debug, Clone, PartialEq)]
pub struct RowMap {
    fields: IndexMap<String, Value>,
}

impl RowMap {
    /// Pair `columns` with `values` by position.
    pub fn from_parts(columns: &[String], values: Vec<Value>) -> Result<Self, RowError> {
        if columns.len() != values.len() {
            return Err(RowError::ArityMismatch {
                columns: columns.len(),
                values: values.len(),
            });
        }
        Ok(Self {
            fields: columns.iter().cloned().zip(values).collect(),
        })
    }

    pub fn get(&self, column: &str) -> Option<&Value> {
        self.fields.get(column)
    }

    /// Value at `index` in column order.
    pub fn get_index(&self, index: usize) -> Option<&Value> {
        self.fields.get_index(index).map(|(_, v)| v)
    }

    fn require(&self, column: &str) -> Result<&Value, RowError> {
        self.get(column)
            .ok_or_else(|| RowError::UnknownColumn(column.to_string()))
    }

    pub fn i64(&self, column: &str) -> Result<i64, RowError> {
        let value = self.require(column)?;
        value.as_i64().ok_or_else(|| mismatch(column, "integer", value))
    }

    pub fn decimal(&self, column: &str) -> Result<Decimal, RowError> {
        let value = self.require(column)?;
        value
            .as_decimal()
            .ok_or_else(|| mismatch(column, "decimal", value))
    }

    pub fn text(&self, column: &str) -> Result<&str, RowError> {
        let value = self.require(column)?;
        value.as_str().ok_or_else(|| mismatch(column, "text", value))
    }

    pub fn columns(&self) -> impl Iterator<Item = &str> {
        self.fields.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

fn mismatch(column: &str, expected: &'static str, actual: &Value) -> RowError {
    RowError::TypeMismatch {
        column: column.to_string(),
        expected,
        actual: actual.kind(),
    }
}

/// Column metadata plus all rows returned by one statement.
#[derive(Debug, Clone, PartialEq)]
pub struct QueryResult {
    columns: Arc<[String]>,
    rows: Vec<RowMap>,
}

impl QueryResult {
    /// Build a result from column names and positional value rows.
    pub fn from_values<I>(columns: Vec<String>, rows: I) -> Result<Self, RowError>
    where
        I: IntoIterator<Item = Vec<Value>>,
    {
        let rows = rows
            .into_iter()
            .map(|values| RowMap::from_parts(&columns, values))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self {
            columns: columns.into(),
            rows,
        })
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.columns.iter().any(|c| c == name)
    }

    pub fn rows(&self) -> &[RowMap] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Row at `index`, or an error instead of a panic when out of range.
    pub fn row(&self, index: usize) -> Result<&RowMap, RowError> {
        self.rows.get(index).ok_or(RowError::OutOfBounds {
            index,
            len: self.rows.len(),
        })
    }

    pub fn first(&self) -> Result<&RowMap, RowError> {
        self.row(0)
    }

    pub fn last(&self) -> Result<&RowMap, RowError> {
        match self.rows.len() {
            0 => Err(RowError::OutOfBounds { index: 0, len: 0 }),
            n => self.row(n - 1),
        }
    }

    /// Every value of `name`, in row order.
    pub fn column(&self, name: &str) -> Result<Vec<&Value>, RowError> {
        if !self.has_column(name) {
            return Err(RowError::UnknownColumn(name.to_string()));
        }
        Ok(self.rows.iter().filter_map(|row| row.get(name)).collect())
    }

    /// Every value of `name` as a decimal. NULLs are skipped.
    pub fn decimals(&self, name: &str) -> Result<Vec<Decimal>, RowError> {
        self.column(name)?
            .into_iter()
            .filter(|v| !v.is_null())
            .map(|v| v.as_decimal().ok_or_else(|| mismatch(name, "decimal", v)))
            .collect()
    }

    pub fn max_decimal(&self, name: &str) -> Result<Option<Decimal>, RowError> {
        Ok(self.decimals(name)?.into_iter().max())
    }

    pub fn min_decimal(&self, name: &str) -> Result<Option<Decimal>, RowError> {
        Ok(self.decimals(name)?.into_iter().min())
    }

    pub fn sum_decimal(&self, name: &str) -> Result<Decimal, RowError> {
        Ok(self.decimals(name)?.into_iter().sum())
    }

    /// First row whose `column` value satisfies `predicate`.
    pub fn find<P>(&self, column: &str, predicate: P) -> Option<&RowMap>
    where
        P: Fn(&Value) -> bool,
    {
        self.rows
            .iter()
            .find(|row| row.get(column).is_some_and(&predicate))
    }

    /// Shorthand for finding a row by exact text value.
    pub fn find_text(&self, column: &str, text: &str) -> Option<&RowMap> {
        self.find(column, |v| v.as_str() == Some(text))
    }
}

impl<'a> IntoIterator for &'a QueryResult {
    type Item = &'a RowMap;
    type IntoIter = std::slice::Iter<'a, RowMap>;

    fn into_iter(self) -> Self::IntoIter {
        self.rows.iter()
    }
}
