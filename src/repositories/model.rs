//! Model descriptor - tutto quello che il repository generico deve sapere su un'entità
//!
//! Instead of resolving "the model class" at runtime, every entity states its table, key,
//! columns and writable fields as associated consts. The generic repository only ever reads
//! these descriptors.

use super::error::RepositoryError;
use super::relations::Relation;
use super::value::{Attributes, ColumnKind, SqlValue};
use serde::{Deserialize, Serialize, de::DeserializeOwned};
use serde_json::Value;
use sqlx::FromRow;
use sqlx::mysql::MySqlRow;
use std::collections::BTreeMap;
use std::fmt::Debug;
use tracing::debug;
use uuid::Uuid;

pub const CREATED_AT: &str = "created_at";
pub const UPDATED_AT: &str = "updated_at";
pub const DELETED_AT: &str = "deleted_at";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Column {
    pub name: &'static str,
    pub kind: ColumnKind,
}

impl Column {
    pub const fn new(name: &'static str, kind: ColumnKind) -> Self {
        Self { name, kind }
    }
}

/// How a new row gets its primary key
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyGeneration {
    /// Time-ordered UUID (v7) generated on create
    Uuid,
    /// Supplied by the caller, or by the engine (auto increment)
    Manual,
}

/// Primary key values, in the order of `Model::PRIMARY_KEY`
pub trait PrimaryKey: Clone + Debug + Send + Sync + 'static {
    fn values(&self) -> Vec<SqlValue>;
}

impl PrimaryKey for Uuid {
    fn values(&self) -> Vec<SqlValue> {
        vec![SqlValue::Uuid(*self)]
    }
}

impl PrimaryKey for i64 {
    fn values(&self) -> Vec<SqlValue> {
        vec![SqlValue::Int(*self)]
    }
}

impl<A, B> PrimaryKey for (A, B)
where
    A: Into<SqlValue> + Clone + Debug + Send + Sync + 'static,
    B: Into<SqlValue> + Clone + Debug + Send + Sync + 'static,
{
    fn values(&self) -> Vec<SqlValue> {
        vec![self.0.clone().into(), self.1.clone().into()]
    }
}

/// A persisted entity as seen by the generic repository.
///
/// # Invariants
/// * every entry of `FILLABLE` and `PRIMARY_KEY` is listed in `COLUMNS`
/// * `SOFT_DELETES` implies a `deleted_at` timestamp column
/// * `TIMESTAMPS` implies `created_at` and `updated_at` timestamp columns
pub trait Model:
    for<'r> FromRow<'r, MySqlRow>
    + Serialize
    + DeserializeOwned
    + Clone
    + Debug
    + Send
    + Sync
    + Unpin
    + 'static
{
    type Key: PrimaryKey;

    const TABLE: &'static str;
    /// More than one column means a composite key
    const PRIMARY_KEY: &'static [&'static str];
    const COLUMNS: &'static [Column];
    /// Mass-assignment allow-list
    const FILLABLE: &'static [&'static str];
    const KEY_GENERATION: KeyGeneration = KeyGeneration::Manual;
    const TIMESTAMPS: bool = false;
    const SOFT_DELETES: bool = false;

    fn key(&self) -> Self::Key;

    fn relations() -> &'static [Relation] {
        &[]
    }

    /// Storage for eager-loaded relations, `None` for models without relations
    fn eager_loaded_mut(&mut self) -> Option<&mut EagerLoaded> {
        None
    }

    fn column(name: &str) -> Option<&'static Column> {
        Self::COLUMNS.iter().find(|column| column.name == name)
    }

    fn relation(name: &str) -> Option<&'static Relation> {
        Self::relations().iter().find(|relation| relation.name == name)
    }

    fn has_composite_key() -> bool {
        Self::PRIMARY_KEY.len() > 1
    }
}

/// Relations loaded through `with`/`with_count`, serialized next to the model's own fields
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EagerLoaded(BTreeMap<String, Value>);

impl EagerLoaded {
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.0.get(name)
    }

    pub fn insert(&mut self, name: impl Into<String>, value: Value) {
        self.0.insert(name.into(), value);
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Either a primary key or an entity the caller already holds
#[derive(Debug, Clone)]
pub enum KeyOrModel<M: Model> {
    Key(M::Key),
    Model(M),
}

impl<M: Model> From<M> for KeyOrModel<M> {
    fn from(model: M) -> Self {
        KeyOrModel::Model(model)
    }
}

/// Keeps only the allow-listed attributes. Everything else is dropped, not rejected.
pub fn fillable<M: Model>(data: &Attributes) -> Attributes {
    let mut kept = Attributes::new();
    let mut dropped = Vec::new();

    for (name, value) in data {
        if M::FILLABLE.contains(&name.as_str()) {
            kept.insert(name.clone(), value.clone());
        } else {
            dropped.push(name.as_str());
        }
    }

    if !dropped.is_empty() {
        debug!(table = M::TABLE, ?dropped, "Ignoring attributes outside the fillable list");
    }

    kept
}

/// Converts a row of attributes into typed values, in the row's order
pub fn column_values<M: Model>(
    row: &Attributes,
) -> Result<Vec<(&'static str, SqlValue)>, RepositoryError> {
    row.iter()
        .map(|(name, value)| {
            let column = M::column(name).ok_or_else(|| RepositoryError::UnknownColumn {
                table: M::TABLE,
                column: name.clone(),
            })?;
            Ok((column.name, SqlValue::from_json(column.name, column.kind, value)?))
        })
        .collect()
}

/// Serializes a model into its attribute map
pub fn to_attributes<M: Model>(model: &M) -> Result<Attributes, RepositoryError> {
    match serde_json::to_value(model) {
        Ok(Value::Object(map)) => Ok(map),
        Ok(other) => Err(RepositoryError::Serialization {
            table: M::TABLE,
            source: serde::ser::Error::custom(format!("expected an object, got {other}")),
        }),
        Err(source) => Err(RepositoryError::Serialization {
            table: M::TABLE,
            source,
        }),
    }
}

/// Builds a model from attributes without touching the database
pub fn from_attributes<M: Model>(row: Attributes) -> Result<M, RepositoryError> {
    serde_json::from_value(Value::Object(row)).map_err(|source| RepositoryError::Serialization {
        table: M::TABLE,
        source,
    })
}
