//! Valori SQL tipizzati - conversione da input JSON non tipizzato a valori bindabili
//!
//! Mass assignment arrives as a JSON object. Before anything reaches the database each
//! value is converted according to the kind of the column it targets, so a wrong type is
//! caught at the boundary instead of being coerced silently by MySQL.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde_json::{Map, Value};
use sqlx::{MySql, QueryBuilder};
use std::str::FromStr;
use thiserror::Error;
use uuid::Uuid;

/// Untyped input for create/update: column name -> JSON value
pub type Attributes = Map<String, Value>;

/// Builds an [`Attributes`] map from a `json!` object. Anything that is not an object
/// yields an empty map.
pub fn attributes(value: Value) -> Attributes {
    match value {
        Value::Object(map) => map,
        _ => Attributes::new(),
    }
}

/// Storage kind of a column, drives the JSON -> SQL conversion
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnKind {
    Uuid,
    Text,
    Integer,
    Decimal,
    Boolean,
    Timestamp,
}

impl ColumnKind {
    fn describe(self) -> &'static str {
        match self {
            ColumnKind::Uuid => "a UUID",
            ColumnKind::Text => "a string",
            ColumnKind::Integer => "an integer",
            ColumnKind::Decimal => "a decimal number",
            ColumnKind::Boolean => "a boolean",
            ColumnKind::Timestamp => "an RFC 3339 timestamp",
        }
    }
}

#[derive(Debug, Error, PartialEq)]
#[error("column `{column}` expects {expected}, got `{found}`")]
pub struct ValueError {
    pub column: String,
    pub expected: &'static str,
    pub found: String,
}

/// A value ready to be bound to a MySQL query
#[derive(Debug, Clone, PartialEq)]
pub enum SqlValue {
    Null,
    Bool(bool),
    Int(i64),
    Decimal(Decimal),
    Text(String),
    Uuid(Uuid),
    Timestamp(DateTime<Utc>),
}

impl SqlValue {
    /// Converts a JSON value for `column`, whose storage kind is `kind`
    pub fn from_json(column: &str, kind: ColumnKind, value: &Value) -> Result<Self, ValueError> {
        if value.is_null() {
            return Ok(SqlValue::Null);
        }

        let invalid = || ValueError {
            column: column.to_string(),
            expected: kind.describe(),
            found: value.to_string(),
        };

        match kind {
            ColumnKind::Uuid => value
                .as_str()
                .and_then(|s| Uuid::parse_str(s).ok())
                .map(SqlValue::Uuid)
                .ok_or_else(invalid),
            ColumnKind::Text => match value {
                Value::String(s) => Ok(SqlValue::Text(s.clone())),
                Value::Number(n) => Ok(SqlValue::Text(n.to_string())),
                Value::Bool(b) => Ok(SqlValue::Text(b.to_string())),
                _ => Err(invalid()),
            },
            ColumnKind::Integer => match value {
                Value::Number(n) => n.as_i64().map(SqlValue::Int).ok_or_else(invalid),
                Value::String(s) => s.trim().parse().map(SqlValue::Int).map_err(|_| invalid()),
                Value::Bool(b) => Ok(SqlValue::Int(i64::from(*b))),
                _ => Err(invalid()),
            },
            ColumnKind::Decimal => match value {
                // Number::to_string keeps the shortest representation ("9.99"), no float noise
                Value::Number(n) => Decimal::from_str(&n.to_string())
                    .or_else(|_| Decimal::from_scientific(&n.to_string()))
                    .map(SqlValue::Decimal)
                    .map_err(|_| invalid()),
                Value::String(s) => Decimal::from_str(s.trim())
                    .map(SqlValue::Decimal)
                    .map_err(|_| invalid()),
                _ => Err(invalid()),
            },
            ColumnKind::Boolean => match value {
                Value::Bool(b) => Ok(SqlValue::Bool(*b)),
                Value::Number(n) => match n.as_i64() {
                    Some(0) => Ok(SqlValue::Bool(false)),
                    Some(1) => Ok(SqlValue::Bool(true)),
                    _ => Err(invalid()),
                },
                Value::String(s) => match s.trim().to_ascii_lowercase().as_str() {
                    "1" | "true" => Ok(SqlValue::Bool(true)),
                    "0" | "false" => Ok(SqlValue::Bool(false)),
                    _ => Err(invalid()),
                },
                _ => Err(invalid()),
            },
            ColumnKind::Timestamp => value
                .as_str()
                .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
                .map(|dt| SqlValue::Timestamp(dt.with_timezone(&Utc)))
                .ok_or_else(invalid),
        }
    }

    /// JSON form of a converted value, in the shape the entities deserialize
    pub fn to_json(&self) -> Value {
        match self {
            SqlValue::Null => Value::Null,
            SqlValue::Bool(v) => Value::Bool(*v),
            SqlValue::Int(v) => Value::from(*v),
            SqlValue::Decimal(v) => Value::String(v.to_string()),
            SqlValue::Text(v) => Value::String(v.clone()),
            SqlValue::Uuid(v) => Value::String(v.to_string()),
            SqlValue::Timestamp(v) => Value::String(v.to_rfc3339()),
        }
    }

    /// Appends a `?` placeholder and binds the value
    pub fn push_bind(self, query: &mut QueryBuilder<'_, MySql>) {
        match self {
            SqlValue::Null => query.push_bind(None::<String>),
            SqlValue::Bool(v) => query.push_bind(v),
            SqlValue::Int(v) => query.push_bind(v),
            SqlValue::Decimal(v) => query.push_bind(v),
            SqlValue::Text(v) => query.push_bind(v),
            SqlValue::Uuid(v) => query.push_bind(v),
            SqlValue::Timestamp(v) => query.push_bind(v),
        };
    }
}

impl From<Uuid> for SqlValue {
    fn from(value: Uuid) -> Self {
        SqlValue::Uuid(value)
    }
}

impl From<String> for SqlValue {
    fn from(value: String) -> Self {
        SqlValue::Text(value)
    }
}

impl From<&str> for SqlValue {
    fn from(value: &str) -> Self {
        SqlValue::Text(value.to_string())
    }
}

impl From<i32> for SqlValue {
    fn from(value: i32) -> Self {
        SqlValue::Int(i64::from(value))
    }
}

impl From<i64> for SqlValue {
    fn from(value: i64) -> Self {
        SqlValue::Int(value)
    }
}

impl From<bool> for SqlValue {
    fn from(value: bool) -> Self {
        SqlValue::Bool(value)
    }
}

impl From<Decimal> for SqlValue {
    fn from(value: Decimal) -> Self {
        SqlValue::Decimal(value)
    }
}

impl From<DateTime<Utc>> for SqlValue {
    fn from(value: DateTime<Utc>) -> Self {
        SqlValue::Timestamp(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_decimal_from_number_keeps_scale() {
        let value = SqlValue::from_json("sale_price", ColumnKind::Decimal, &json!(9.99)).unwrap();
        assert_eq!(value, SqlValue::Decimal(Decimal::new(999, 2)));
    }

    #[test]
    fn test_decimal_from_string() {
        let value = SqlValue::from_json("sale_price", ColumnKind::Decimal, &json!("12.50")).unwrap();
        assert_eq!(value, SqlValue::Decimal(Decimal::new(1250, 2)));
    }

    #[test]
    fn test_uuid_rejects_garbage() {
        let err = SqlValue::from_json("category_id", ColumnKind::Uuid, &json!("not-a-uuid"))
            .unwrap_err();
        assert_eq!(err.column, "category_id");
        assert_eq!(err.expected, "a UUID");
    }

    #[test]
    fn test_boolean_accepts_query_string_forms() {
        for (input, expected) in [(json!("1"), true), (json!("false"), false), (json!(0), false)] {
            let value = SqlValue::from_json("is_active", ColumnKind::Boolean, &input).unwrap();
            assert_eq!(value, SqlValue::Bool(expected));
        }
        assert!(SqlValue::from_json("is_active", ColumnKind::Boolean, &json!("yes")).is_err());
    }

    #[test]
    fn test_integer_rejects_fractions() {
        assert!(SqlValue::from_json("current_stock", ColumnKind::Integer, &json!(1.5)).is_err());
        assert_eq!(
            SqlValue::from_json("current_stock", ColumnKind::Integer, &json!("42")).unwrap(),
            SqlValue::Int(42)
        );
    }

    #[test]
    fn test_null_is_accepted_for_every_kind() {
        assert_eq!(
            SqlValue::from_json("deleted_at", ColumnKind::Timestamp, &Value::Null).unwrap(),
            SqlValue::Null
        );
    }

    #[test]
    fn test_timestamp_is_normalised_to_utc() {
        let value = SqlValue::from_json(
            "created_at",
            ColumnKind::Timestamp,
            &json!("2024-06-01T12:00:00+02:00"),
        )
        .unwrap();
        let SqlValue::Timestamp(dt) = value else {
            panic!("expected a timestamp");
        };
        assert_eq!(dt.to_rfc3339(), "2024-06-01T10:00:00+00:00");
    }

    #[test]
    fn test_coerced_values_come_back_typed() {
        let stock = SqlValue::from_json("current_stock", ColumnKind::Integer, &json!("5")).unwrap();
        assert_eq!(stock.to_json(), json!(5));

        let active = SqlValue::from_json("is_active", ColumnKind::Boolean, &json!(1)).unwrap();
        assert_eq!(active.to_json(), json!(true));

        let price = SqlValue::from_json("sale_price", ColumnKind::Decimal, &json!(9.9)).unwrap();
        assert_eq!(price.to_json(), json!("9.9"));
    }

    #[test]
    fn test_attributes_from_non_object_is_empty() {
        assert!(attributes(json!([1, 2, 3])).is_empty());
        assert_eq!(attributes(json!({"name": "Widget"})).len(), 1);
    }
}
