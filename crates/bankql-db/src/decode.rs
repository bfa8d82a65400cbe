//! Conversion of PostgreSQL rows into the dynamic [`Value`] model.

use bankql_core::Value;
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use rust_decimal::Decimal;
use sqlx::postgres::{PgColumn, PgRow};
use sqlx::{Column, Decode, Postgres, Row, Type, TypeInfo, ValueRef};

use crate::error::DbError;

/// Target variant for a PostgreSQL type name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueKind {
    Bool,
    Int2,
    Int4,
    Int8,
    Float4,
    Float8,
    Numeric,
    Text,
    Date,
    Timestamp,
    TimestampTz,
}

impl ValueKind {
    /// Map a `pg_type` name as reported by the driver.
    pub fn from_type_name(name: &str) -> Option<Self> {
        let kind = match name {
            "BOOL" => Self::Bool,
            "INT2" => Self::Int2,
            "INT4" => Self::Int4,
            "INT8" => Self::Int8,
            "FLOAT4" => Self::Float4,
            "FLOAT8" => Self::Float8,
            "NUMERIC" => Self::Numeric,
            "TEXT" | "VARCHAR" | "BPCHAR" | "NAME" => Self::Text,
            "DATE" => Self::Date,
            "TIMESTAMP" => Self::Timestamp,
            "TIMESTAMPTZ" => Self::TimestampTz,
            _ => return None,
        };
        Some(kind)
    }
}

/// Decode every column of `row`, in column order.
pub fn decode_row(row: &PgRow) -> Result<Vec<Value>, DbError> {
    row.columns()
        .iter()
        .map(|column| decode_column(row, column))
        .collect()
}

fn decode_column(row: &PgRow, column: &PgColumn) -> Result<Value, DbError> {
    let index = column.ordinal();
    let raw = row.try_get_raw(index)?;
    if raw.is_null() {
        return Ok(Value::Null);
    }

    let type_name = column.type_info().name();
    let Some(kind) = ValueKind::from_type_name(type_name) else {
        let bytes = raw.as_bytes().map_err(|e| DbError::Decode {
            column: column.name().to_string(),
            reason: e.to_string(),
        })?;
        return Ok(other_value(type_name, bytes));
    };

    let value = match kind {
        ValueKind::Bool => Value::Bool(get::<bool>(row, column)?),
        ValueKind::Int2 => Value::Int(i64::from(get::<i16>(row, column)?)),
        ValueKind::Int4 => Value::Int(i64::from(get::<i32>(row, column)?)),
        ValueKind::Int8 => Value::Int(get::<i64>(row, column)?),
        ValueKind::Float4 => Value::Float(f64::from(get::<f32>(row, column)?)),
        ValueKind::Float8 => Value::Float(get::<f64>(row, column)?),
        ValueKind::Numeric => Value::Decimal(get::<Decimal>(row, column)?),
        ValueKind::Text => Value::Text(get::<String>(row, column)?),
        ValueKind::Date => Value::Date(get::<NaiveDate>(row, column)?),
        ValueKind::Timestamp => Value::Timestamp(get::<NaiveDateTime>(row, column)?),
        ValueKind::TimestampTz => Value::TimestampTz(get::<DateTime<Utc>>(row, column)?),
    };
    Ok(value)
}

/// Fallback for types without a dedicated variant.
fn other_value(type_name: &str, bytes: &[u8]) -> Value {
    Value::Other {
        type_name: type_name.to_string(),
        bytes: bytes.to_vec(),
    }
}

fn get<'r, T>(row: &'r PgRow, column: &PgColumn) -> Result<T, DbError>
where
    T: Decode<'r, Postgres> + Type<Postgres>,
{
    row.try_get::<T, _>(column.ordinal())
        .map_err(|e| DbError::Decode {
            column: column.name().to_string(),
            reason: e.to_string(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_integer_types_map_to_int_kinds() {
        assert_eq!(ValueKind::from_type_name("INT2"), Some(ValueKind::Int2));
        assert_eq!(ValueKind::from_type_name("INT4"), Some(ValueKind::Int4));
        assert_eq!(ValueKind::from_type_name("INT8"), Some(ValueKind::Int8));
    }

    #[test]
    fn test_character_types_map_to_text() {
        for name in ["TEXT", "VARCHAR", "BPCHAR", "NAME"] {
            assert_eq!(ValueKind::from_type_name(name), Some(ValueKind::Text), "{name}");
        }
    }

    #[test]
    fn test_numeric_and_time_types() {
        assert_eq!(ValueKind::from_type_name("NUMERIC"), Some(ValueKind::Numeric));
        assert_eq!(ValueKind::from_type_name("DATE"), Some(ValueKind::Date));
        assert_eq!(ValueKind::from_type_name("TIMESTAMP"), Some(ValueKind::Timestamp));
        assert_eq!(ValueKind::from_type_name("TIMESTAMPTZ"), Some(ValueKind::TimestampTz));
    }

    #[test]
    fn test_unknown_types_have_no_dedicated_kind() {
        assert_eq!(ValueKind::from_type_name("JSONB"), None);
        assert_eq!(ValueKind::from_type_name("numeric"), None);
    }

    #[test]
    fn test_unknown_types_fall_back_to_other() {
        let label = other_value("DEPOSIT_KIND", b"savings");
        assert_eq!(label.as_str(), Some("savings"));

        let inet = other_value("INET", &[2, 32, 0, 4, 10, 0, 0, 7]);
        assert!(matches!(inet, Value::Other { ref type_name, .. } if type_name == "INET"));
    }
}
