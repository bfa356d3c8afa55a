//! Helper per costruire le query dinamiche con `sqlx::QueryBuilder`
//!
//! Identifiers pushed here always come from a model descriptor (static column lists), values
//! always go through `push_bind`.

use super::model::{DELETED_AT, Model};
use super::value::{ColumnKind, SqlValue};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde_json::Value;
use sqlx::mysql::MySqlRow;
use sqlx::{MySql, QueryBuilder, Row};
use uuid::Uuid;

/// Whether soft-deleted rows are visible to a query
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scope {
    WithoutTrashed,
    WithTrashed,
}

pub fn quote(identifier: &str) -> String {
    format!("`{identifier}`")
}

/// `SELECT <expr> FROM <table> WHERE 1 = 1`, plus the soft-delete scope when it applies.
/// Further conditions are appended with ` AND ...`.
pub fn select<M: Model>(expr: &str, scope: Scope) -> QueryBuilder<'static, MySql> {
    let mut query = QueryBuilder::new(format!(
        "SELECT {expr} FROM {} WHERE 1 = 1",
        quote(M::TABLE)
    ));
    if M::SOFT_DELETES && scope == Scope::WithoutTrashed {
        query.push(format!(" AND {} IS NULL", quote(DELETED_AT)));
    }
    query
}

/// ` AND k1 = ? AND k2 = ?` for the model's primary key
pub fn push_key<M: Model>(query: &mut QueryBuilder<'_, MySql>, values: Vec<SqlValue>) {
    for (column, value) in M::PRIMARY_KEY.iter().zip(values) {
        query.push(format!(" AND {} = ", quote(column)));
        value.push_bind(query);
    }
}

/// ` AND column [NOT] IN (?, ?, ...)`. An empty `IN` matches nothing, an empty `NOT IN`
/// matches everything.
pub fn push_in(
    query: &mut QueryBuilder<'_, MySql>,
    column: &str,
    values: Vec<SqlValue>,
    negate: bool,
) {
    if values.is_empty() {
        if !negate {
            query.push(" AND 1 = 0");
        }
        return;
    }

    query.push(format!(
        " AND {} {}IN (",
        quote(column),
        if negate { "NOT " } else { "" }
    ));
    for (i, value) in values.into_iter().enumerate() {
        if i > 0 {
            query.push(", ");
        }
        value.push_bind(query);
    }
    query.push(")");
}

pub fn push_order_by_key<M: Model>(query: &mut QueryBuilder<'_, MySql>) {
    let columns: Vec<String> = M::PRIMARY_KEY.iter().map(|c| quote(c)).collect();
    query.push(format!(" ORDER BY {}", columns.join(", ")));
}

/// Reads one column of a raw row as JSON, using the same representation serde gives the
/// entity field (UUIDs hyphenated, decimals as strings)
pub fn decode_json(row: &MySqlRow, column: &str, kind: ColumnKind) -> Result<Value, sqlx::Error> {
    let value = match kind {
        ColumnKind::Uuid => row
            .try_get::<Option<Uuid>, _>(column)?
            .map(|v| Value::String(v.to_string())),
        ColumnKind::Text => row.try_get::<Option<String>, _>(column)?.map(Value::String),
        ColumnKind::Integer => row.try_get::<Option<i64>, _>(column)?.map(Value::from),
        ColumnKind::Decimal => row
            .try_get::<Option<Decimal>, _>(column)?
            .map(|v| Value::String(v.to_string())),
        ColumnKind::Boolean => row.try_get::<Option<bool>, _>(column)?.map(Value::Bool),
        ColumnKind::Timestamp => row
            .try_get::<Option<DateTime<Utc>>, _>(column)?
            .map(|v| Value::String(v.to_rfc3339())),
    };
    Ok(value.unwrap_or(Value::Null))
}
