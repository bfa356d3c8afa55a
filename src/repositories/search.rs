//! Search - filtri per getAll/count/paginazione
//!
//! A search is an ordered list of `column operator value` conditions joined with `AND`.
//! It can be built in code or parsed from a JSON map where a scalar means equality and a
//! two-element array `[operator, value]` is operator-qualified:
//!
//! ```json
//! { "is_active": true, "sale_price": [">=", 10], "sku": ["in", ["SKU-001", "SKU-002"]] }
//! ```

use super::error::RepositoryError;
use super::model::Model;
use super::query::{push_in, quote};
use super::value::{Attributes, SqlValue};
use serde_json::Value;
use sqlx::{MySql, QueryBuilder};
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operator {
    Eq,
    Ne,
    Lt,
    Lte,
    Gt,
    Gte,
    Like,
    NotLike,
    In,
    NotIn,
    Null,
    NotNull,
}

impl Operator {
    fn sql(self) -> &'static str {
        match self {
            Operator::Eq => "=",
            Operator::Ne => "<>",
            Operator::Lt => "<",
            Operator::Lte => "<=",
            Operator::Gt => ">",
            Operator::Gte => ">=",
            Operator::Like => "LIKE",
            Operator::NotLike => "NOT LIKE",
            Operator::In => "IN",
            Operator::NotIn => "NOT IN",
            Operator::Null => "IS NULL",
            Operator::NotNull => "IS NOT NULL",
        }
    }
}

impl FromStr for Operator {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase();
        let operator = match normalized.as_str() {
            "=" | "==" => Operator::Eq,
            "!=" | "<>" => Operator::Ne,
            "<" => Operator::Lt,
            "<=" => Operator::Lte,
            ">" => Operator::Gt,
            ">=" => Operator::Gte,
            "like" => Operator::Like,
            "not like" => Operator::NotLike,
            "in" => Operator::In,
            "not in" => Operator::NotIn,
            "null" | "is null" => Operator::Null,
            "not null" | "is not null" => Operator::NotNull,
            _ => return Err(format!("unknown operator `{s}`")),
        };
        Ok(operator)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Filter {
    pub column: String,
    pub operator: Operator,
    pub value: Value,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Search {
    filters: Vec<Filter>,
}

impl Search {
    pub fn new() -> Self {
        Self::default()
    }

    /// `column = value` (`IS NULL` when value is null)
    pub fn eq(self, column: impl Into<String>, value: impl Into<Value>) -> Self {
        self.filter(column, Operator::Eq, value)
    }

    pub fn filter(
        mut self,
        column: impl Into<String>,
        operator: Operator,
        value: impl Into<Value>,
    ) -> Self {
        self.filters.push(Filter {
            column: column.into(),
            operator,
            value: value.into(),
        });
        self
    }

    pub fn filters(&self) -> &[Filter] {
        &self.filters
    }

    pub fn is_empty(&self) -> bool {
        self.filters.is_empty()
    }

    /// Parses the JSON map form described in the module docs
    pub fn from_attributes(map: &Attributes) -> Result<Self, RepositoryError> {
        let mut search = Search::new();

        for (column, value) in map {
            let invalid = |reason: String| RepositoryError::InvalidFilter {
                column: column.clone(),
                reason,
            };

            search = match value {
                Value::Array(parts) => match parts.as_slice() {
                    [Value::String(op), value] => {
                        let operator = op.parse::<Operator>().map_err(invalid)?;
                        search.filter(column.clone(), operator, value.clone())
                    }
                    [Value::String(op)] => match op.parse::<Operator>().map_err(invalid)? {
                        operator @ (Operator::Null | Operator::NotNull) => {
                            search.filter(column.clone(), operator, Value::Null)
                        }
                        _ => return Err(invalid(format!("operator `{op}` needs a value"))),
                    },
                    _ => {
                        return Err(invalid(
                            "expected a scalar or an [operator, value] pair".to_string(),
                        ));
                    }
                },
                other => search.eq(column.clone(), other.clone()),
            };
        }

        Ok(search)
    }

    /// Appends every filter as ` AND ...` to a query over `M`'s table
    pub fn apply<M: Model>(&self, query: &mut QueryBuilder<'_, MySql>) -> Result<(), RepositoryError> {
        for filter in &self.filters {
            let column = M::column(&filter.column).ok_or_else(|| RepositoryError::UnknownColumn {
                table: M::TABLE,
                column: filter.column.clone(),
            })?;
            let invalid = |reason: &str| RepositoryError::InvalidFilter {
                column: filter.column.clone(),
                reason: reason.to_string(),
            };

            match filter.operator {
                Operator::Null | Operator::NotNull => {
                    query.push(format!(" AND {} {}", quote(column.name), filter.operator.sql()));
                }
                Operator::In | Operator::NotIn => {
                    let items = filter
                        .value
                        .as_array()
                        .ok_or_else(|| invalid("expects a list of values"))?;
                    let values = items
                        .iter()
                        .map(|item| SqlValue::from_json(column.name, column.kind, item))
                        .collect::<Result<Vec<_>, _>>()?;
                    push_in(query, column.name, values, filter.operator == Operator::NotIn);
                }
                Operator::Eq | Operator::Ne if filter.value.is_null() => {
                    let operator = if filter.operator == Operator::Eq {
                        Operator::Null
                    } else {
                        Operator::NotNull
                    };
                    query.push(format!(" AND {} {}", quote(column.name), operator.sql()));
                }
                Operator::Like | Operator::NotLike => {
                    let pattern = filter
                        .value
                        .as_str()
                        .ok_or_else(|| invalid("expects a string pattern"))?;
                    query.push(format!(" AND {} {} ", quote(column.name), filter.operator.sql()));
                    query.push_bind(pattern.to_string());
                }
                operator => {
                    if filter.value.is_null() {
                        return Err(invalid("cannot compare against null"));
                    }
                    let value = SqlValue::from_json(column.name, column.kind, &filter.value)?;
                    query.push(format!(" AND {} {} ", quote(column.name), operator.sql()));
                    value.push_bind(query);
                }
            }
        }

        Ok(())
    }
}

impl TryFrom<&Attributes> for Search {
    type Error = RepositoryError;

    fn try_from(map: &Attributes) -> Result<Self, Self::Error> {
        Search::from_attributes(map)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repositories::value::attributes;
    use serde_json::json;

    #[test]
    fn test_operator_parsing() {
        assert_eq!("<>".parse::<Operator>(), Ok(Operator::Ne));
        assert_eq!(" NOT LIKE ".parse::<Operator>(), Ok(Operator::NotLike));
        assert_eq!("is not null".parse::<Operator>(), Ok(Operator::NotNull));
        assert!("~=".parse::<Operator>().is_err());
    }

    #[test]
    fn test_from_attributes_scalar_is_equality() {
        let search = Search::from_attributes(&attributes(json!({"is_active": true}))).unwrap();
        assert_eq!(
            search.filters(),
            &[Filter {
                column: "is_active".to_string(),
                operator: Operator::Eq,
                value: json!(true),
            }]
        );
    }

    #[test]
    fn test_from_attributes_operator_pairs() {
        let search = Search::from_attributes(&attributes(json!({
            "sale_price": [">=", 10],
            "barcode": ["not null"],
        })))
        .unwrap();

        let operators: Vec<Operator> = search.filters().iter().map(|f| f.operator).collect();
        assert_eq!(operators.len(), 2);
        assert!(operators.contains(&Operator::NotNull));
        assert!(operators.contains(&Operator::Gte));
    }

    #[test]
    fn test_from_attributes_rejects_malformed_arrays() {
        let err = Search::from_attributes(&attributes(json!({"sku": ["a", "b", "c"]}))).unwrap_err();
        assert!(matches!(err, RepositoryError::InvalidFilter { ref column, .. } if column == "sku"));

        let err = Search::from_attributes(&attributes(json!({"sku": ["like"]}))).unwrap_err();
        assert!(matches!(err, RepositoryError::InvalidFilter { .. }));
    }

    #[test]
    fn test_builder_keeps_order() {
        let search = Search::new()
            .eq("is_active", true)
            .filter("current_stock", Operator::Lt, 10);
        assert_eq!(search.filters().len(), 2);
        assert_eq!(search.filters()[1].column, "current_stock");
        assert!(!search.is_empty());
    }
}
