//! Relazioni ed eager loading
//!
//! A relation is declared once per model as a `const` table of [`Relation`]s. Each relation
//! carries two function pointers, monomorphised for the related model, that fetch (or count)
//! the related rows for a whole batch of parents with a single `IN (...)` query. Loaded rows
//! are attached to the parents as JSON under the relation name.

use super::error::RepositoryError;
use super::model::{Model, to_attributes};
use super::query::{Scope, decode_json, push_in, push_order_by_key, quote, select};
use super::value::{Attributes, SqlValue};
use futures::future::BoxFuture;
use serde_json::Value;
use sqlx::{MySql, MySqlPool, QueryBuilder, Row};
use std::fmt;
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RelationKind {
    /// The parent holds the foreign key, at most one related row
    BelongsTo,
    /// The related rows hold the parent's key
    HasMany,
    /// Like `HasMany`, restricted to rows whose owner type column carries `tag`
    MorphMany,
}

/// Owner discriminator of a polymorphic relation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Morph {
    pub type_column: &'static str,
    pub tag: &'static str,
}

/// Batch lookup handed to a relation loader
#[derive(Debug, Clone)]
pub struct RelationQuery {
    /// Column on the related table matched against the parents' keys
    pub foreign_key: &'static str,
    pub morph: Option<Morph>,
    pub keys: Vec<Value>,
}

impl RelationQuery {
    fn push_conditions<R: Model>(
        &self,
        query: &mut QueryBuilder<'_, MySql>,
    ) -> Result<(), RepositoryError> {
        let column = R::column(self.foreign_key).ok_or_else(|| RepositoryError::UnknownColumn {
            table: R::TABLE,
            column: self.foreign_key.to_string(),
        })?;
        let keys = self
            .keys
            .iter()
            .map(|key| SqlValue::from_json(column.name, column.kind, key))
            .collect::<Result<Vec<_>, _>>()?;

        push_in(query, column.name, keys, false);
        if let Some(morph) = self.morph {
            query.push(format!(" AND {} = ", quote(morph.type_column)));
            query.push_bind(morph.tag);
        }
        Ok(())
    }
}

pub type RelatedLoader =
    for<'a> fn(&'a MySqlPool, RelationQuery) -> BoxFuture<'a, Result<Vec<Value>, RepositoryError>>;

pub type RelatedCounter = for<'a> fn(
    &'a MySqlPool,
    RelationQuery,
) -> BoxFuture<'a, Result<Vec<(Value, u64)>, RepositoryError>>;

#[derive(Clone, Copy)]
pub struct Relation {
    pub name: &'static str,
    pub kind: RelationKind,
    /// Column on the parent whose value is matched
    pub local_key: &'static str,
    /// Column on the related table
    pub foreign_key: &'static str,
    pub morph: Option<Morph>,
    load: RelatedLoader,
    count: RelatedCounter,
}

impl fmt::Debug for Relation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Relation")
            .field("name", &self.name)
            .field("kind", &self.kind)
            .field("local_key", &self.local_key)
            .field("foreign_key", &self.foreign_key)
            .field("morph", &self.morph)
            .finish()
    }
}

impl Relation {
    /// `foreign_key` on the parent points at `owner_key` on `R`
    pub const fn belongs_to<R: Model>(
        name: &'static str,
        foreign_key: &'static str,
        owner_key: &'static str,
    ) -> Self {
        Self {
            name,
            kind: RelationKind::BelongsTo,
            local_key: foreign_key,
            foreign_key: owner_key,
            morph: None,
            load: load_related::<R>,
            count: count_related::<R>,
        }
    }

    /// Rows of `R` whose `foreign_key` equals the parent's `local_key`
    pub const fn has_many<R: Model>(
        name: &'static str,
        local_key: &'static str,
        foreign_key: &'static str,
    ) -> Self {
        Self {
            name,
            kind: RelationKind::HasMany,
            local_key,
            foreign_key,
            morph: None,
            load: load_related::<R>,
            count: count_related::<R>,
        }
    }

    /// Rows of `R` owned through `(type_column, id_column) = (tag, parent.local_key)`
    pub const fn morph_many<R: Model>(
        name: &'static str,
        local_key: &'static str,
        type_column: &'static str,
        id_column: &'static str,
        tag: &'static str,
    ) -> Self {
        Self {
            name,
            kind: RelationKind::MorphMany,
            local_key,
            foreign_key: id_column,
            morph: Some(Morph { type_column, tag }),
            load: load_related::<R>,
            count: count_related::<R>,
        }
    }

    fn lookup(&self, keys: Vec<Value>) -> RelationQuery {
        RelationQuery {
            foreign_key: self.foreign_key,
            morph: self.morph,
            keys,
        }
    }

    /// Distinct non-null values of `local_key` across the parents
    fn parent_keys(&self, parents: &[Attributes]) -> Vec<Value> {
        let mut keys: Vec<Value> = Vec::new();
        for parent in parents {
            match parent.get(self.local_key) {
                Some(Value::Null) | None => {}
                Some(key) if keys.contains(key) => {}
                Some(key) => keys.push(key.clone()),
            }
        }
        keys
    }

    fn match_related(&self, parent: &Attributes, related: &[Value]) -> Value {
        let local = parent.get(self.local_key).unwrap_or(&Value::Null);
        let mut matches = related
            .iter()
            .filter(|row| !local.is_null() && row.get(self.foreign_key) == Some(local));

        match self.kind {
            RelationKind::BelongsTo => matches.next().cloned().unwrap_or(Value::Null),
            RelationKind::HasMany | RelationKind::MorphMany => {
                Value::Array(matches.cloned().collect())
            }
        }
    }
}

fn load_related<R: Model>(
    pool: &MySqlPool,
    lookup: RelationQuery,
) -> BoxFuture<'_, Result<Vec<Value>, RepositoryError>> {
    Box::pin(async move {
        let mut query = select::<R>("*", Scope::WithoutTrashed);
        lookup.push_conditions::<R>(&mut query)?;
        push_order_by_key::<R>(&mut query);

        let rows: Vec<R> = query.build_query_as::<R>().fetch_all(pool).await?;
        debug!(table = R::TABLE, count = rows.len(), "Loaded related rows");

        rows.iter()
            .map(|row| {
                serde_json::to_value(row).map_err(|source| RepositoryError::Serialization {
                    table: R::TABLE,
                    source,
                })
            })
            .collect()
    })
}

fn count_related<R: Model>(
    pool: &MySqlPool,
    lookup: RelationQuery,
) -> BoxFuture<'_, Result<Vec<(Value, u64)>, RepositoryError>> {
    Box::pin(async move {
        let column = R::column(lookup.foreign_key).ok_or_else(|| RepositoryError::UnknownColumn {
            table: R::TABLE,
            column: lookup.foreign_key.to_string(),
        })?;

        let mut query = select::<R>(
            &format!("{} AS relation_key, COUNT(*) AS aggregate", quote(column.name)),
            Scope::WithoutTrashed,
        );
        lookup.push_conditions::<R>(&mut query)?;
        query.push(format!(" GROUP BY {}", quote(column.name)));

        let rows = query
            .build()
            .fetch_all(pool)
            .await
            .map_err(|source| RepositoryError::Aggregate {
                table: R::TABLE,
                source,
            })?;

        rows.iter()
            .map(|row| -> Result<(Value, u64), RepositoryError> {
                let key = decode_json(row, "relation_key", column.kind)?;
                let count: i64 = row.try_get("aggregate")?;
                Ok((key, count.max(0) as u64))
            })
            .collect()
    })
}

/// Attaches the requested relations and relation counts to every model of the batch.
/// Unknown names are rejected before any query runs.
pub async fn eager_load<M: Model>(
    pool: &MySqlPool,
    models: &mut [M],
    with: &[String],
    with_count: &[String],
) -> Result<(), RepositoryError> {
    if with.is_empty() && with_count.is_empty() {
        return Ok(());
    }

    let resolve = |name: &String| {
        M::relation(name).ok_or_else(|| RepositoryError::UnknownRelation {
            table: M::TABLE,
            relation: name.clone(),
        })
    };
    let relations = with.iter().map(resolve).collect::<Result<Vec<_>, _>>()?;
    let counted = with_count.iter().map(resolve).collect::<Result<Vec<_>, _>>()?;

    if models.is_empty() {
        return Ok(());
    }

    let parents = models
        .iter()
        .map(to_attributes::<M>)
        .collect::<Result<Vec<_>, _>>()?;

    for relation in relations {
        let keys = relation.parent_keys(&parents);
        let related = if keys.is_empty() {
            Vec::new()
        } else {
            (relation.load)(pool, relation.lookup(keys)).await?
        };

        for (model, parent) in models.iter_mut().zip(&parents) {
            let value = relation.match_related(parent, &related);
            if let Some(loaded) = model.eager_loaded_mut() {
                loaded.insert(relation.name, value);
            }
        }
    }

    for relation in counted {
        let keys = relation.parent_keys(&parents);
        let counts = if keys.is_empty() {
            Vec::new()
        } else {
            (relation.count)(pool, relation.lookup(keys)).await?
        };

        for (model, parent) in models.iter_mut().zip(&parents) {
            let local = parent.get(relation.local_key).unwrap_or(&Value::Null);
            let count = counts
                .iter()
                .find(|(key, _)| !local.is_null() && key == local)
                .map(|(_, count)| *count)
                .unwrap_or(0);
            if let Some(loaded) = model.eager_loaded_mut() {
                loaded.insert(format!("{}_count", relation.name), Value::from(count));
            }
        }
    }

    Ok(())
}
