//! Repository generico - implementazione di `BaseRepository` valida per ogni entità
//!
//! `Repository<M>` is bound to one model for its whole lifetime. Everything entity-specific
//! comes from the `Model` descriptor, so concrete repositories are plain type aliases with
//! their own `impl Repository<Entity>` block for extra queries.

use super::error::{RepositoryError, is_rejection};
use super::model::{
    CREATED_AT, Column, DELETED_AT, KeyGeneration, KeyOrModel, Model, PrimaryKey, UPDATED_AT,
    column_values, fillable, from_attributes, to_attributes,
};
use super::pagination::{PageRequest, Paginator};
use super::query::{Scope, push_key, push_order_by_key, quote, select};
use super::relations::eager_load;
use super::search::Search;
use super::traits::BaseRepository;
use super::value::{Attributes, SqlValue};
use chrono::{SubsecRound, Utc};
use serde_json::Value;
use sqlx::mysql::MySqlQueryResult;
use sqlx::{Executor, MySql, MySqlPool, QueryBuilder};
use std::marker::PhantomData;
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

#[derive(Debug, Clone)]
pub struct Repository<M: Model> {
    connection_pool: MySqlPool,
    with: Vec<String>,
    with_count: Vec<String>,
    _model: PhantomData<fn() -> M>,
}

/// What a write inside `update_or_create` ended up doing
enum Written<M> {
    Existing(M, Attributes),
    New(Attributes, u64),
}

impl<M: Model> Repository<M> {
    pub fn new(connection_pool: MySqlPool) -> Self {
        Self {
            connection_pool,
            with: Vec::new(),
            with_count: Vec::new(),
            _model: PhantomData,
        }
    }

    pub fn pool(&self) -> &MySqlPool {
        &self.connection_pool
    }

    // ************************* LETTURE ************************* //

    async fn hydrate(&self, mut models: Vec<M>) -> Result<Vec<M>, RepositoryError> {
        eager_load(&self.connection_pool, &mut models, &self.with, &self.with_count).await?;
        Ok(models)
    }

    async fn hydrate_one(&self, model: M) -> Result<M, RepositoryError> {
        let mut models = self.hydrate(vec![model]).await?;
        models
            .pop()
            .ok_or_else(|| RepositoryError::not_found(M::TABLE, "hydrated record"))
    }

    async fn fetch_by_key(
        &self,
        key: Vec<SqlValue>,
        scope: Scope,
    ) -> Result<Option<M>, RepositoryError> {
        let mut query = select::<M>("*", scope);
        push_key::<M>(&mut query, key);

        let model = query
            .build_query_as::<M>()
            .fetch_optional(&self.connection_pool)
            .await?;
        Ok(model)
    }

    async fn fetch_matching(
        &self,
        search: &Search,
        page: Option<&PageRequest>,
    ) -> Result<Vec<M>, RepositoryError> {
        let mut query = select::<M>("*", Scope::WithoutTrashed);
        search.apply::<M>(&mut query)?;
        push_order_by_key::<M>(&mut query);
        if let Some(page) = page {
            query.push(" LIMIT ");
            query.push_bind(page.limit());
            query.push(" OFFSET ");
            query.push_bind(page.offset());
        }

        let models = query
            .build_query_as::<M>()
            .fetch_all(&self.connection_pool)
            .await?;
        self.hydrate(models).await
    }

    async fn fetch_first(&self, search: &Search) -> Result<Option<M>, RepositoryError> {
        let mut query = select::<M>("*", Scope::WithoutTrashed);
        search.apply::<M>(&mut query)?;
        push_order_by_key::<M>(&mut query);
        query.push(" LIMIT 1");

        match query
            .build_query_as::<M>()
            .fetch_optional(&self.connection_pool)
            .await?
        {
            Some(model) => Ok(Some(self.hydrate_one(model).await?)),
            None => Ok(None),
        }
    }

    async fn count_matching(&self, search: &Search) -> Result<u64, RepositoryError> {
        let mut query = select::<M>("COUNT(*)", Scope::WithoutTrashed);
        search.apply::<M>(&mut query)?;

        let total: i64 = query
            .build_query_scalar()
            .fetch_one(&self.connection_pool)
            .await
            .map_err(|source| RepositoryError::Aggregate {
                table: M::TABLE,
                source,
            })?;
        Ok(total.max(0) as u64)
    }

    /// Key -> entity (NotFound when no row matches), entity -> itself
    async fn resolve(&self, target: KeyOrModel<M>) -> Result<M, RepositoryError> {
        match target {
            KeyOrModel::Model(model) => Ok(model),
            KeyOrModel::Key(key) => self
                .fetch_by_key(key.values(), Scope::WithoutTrashed)
                .await?
                .ok_or_else(|| RepositoryError::not_found(M::TABLE, format!("key {key:?}"))),
        }
    }

    /// Reloads by key regardless of the soft-delete scope, with the configured eager loads
    async fn refresh(&self, key: Vec<SqlValue>) -> Result<M, RepositoryError> {
        let model = self
            .fetch_by_key(key.clone(), Scope::WithTrashed)
            .await?
            .ok_or_else(|| RepositoryError::not_found(M::TABLE, format!("key {key:?}")))?;
        self.hydrate_one(model).await
    }

    // ************************* SCRITTURE ************************* //

    /// Adds the generated key and the timestamps to a row about to be inserted
    fn stamp_new_row(&self, mut row: Attributes) -> Attributes {
        if M::KEY_GENERATION == KeyGeneration::Uuid {
            for key in M::PRIMARY_KEY {
                if row.get(*key).is_none_or(Value::is_null) {
                    row.insert(key.to_string(), Value::String(Uuid::now_v7().to_string()));
                }
            }
        }
        if M::TIMESTAMPS {
            let now = Value::String(Utc::now().trunc_subsecs(0).to_rfc3339());
            row.insert(CREATED_AT.to_string(), now.clone());
            row.insert(UPDATED_AT.to_string(), now);
        }
        row
    }

    fn stamp_updated_row(&self, mut row: Attributes) -> Attributes {
        if M::TIMESTAMPS && !row.is_empty() {
            let now = Value::String(Utc::now().trunc_subsecs(0).to_rfc3339());
            row.insert(UPDATED_AT.to_string(), now);
        }
        row
    }

    /// Typed values for a write, `None` when a value does not fit its column
    fn typed_values(
        &self,
        row: &Attributes,
    ) -> Result<Option<Vec<(&'static str, SqlValue)>>, RepositoryError> {
        match column_values::<M>(row) {
            Ok(values) => Ok(Some(values)),
            Err(RepositoryError::InvalidValue(err)) => {
                warn!(table = M::TABLE, "Rejected write: {}", err);
                Ok(None)
            }
            Err(err) => Err(err),
        }
    }

    fn key_of_new_row(
        &self,
        row: &Attributes,
        last_insert_id: u64,
    ) -> Result<Vec<SqlValue>, RepositoryError> {
        M::PRIMARY_KEY
            .iter()
            .map(|name| {
                let column = M::column(name).ok_or_else(|| RepositoryError::UnknownColumn {
                    table: M::TABLE,
                    column: name.to_string(),
                })?;
                match row.get(*name) {
                    Some(value) if !value.is_null() => {
                        Ok(SqlValue::from_json(column.name, column.kind, value)?)
                    }
                    // engine-assigned (auto increment) key
                    _ => Ok(SqlValue::Int(last_insert_id as i64)),
                }
            })
            .collect()
    }

    /// Entity to hand back after an insert. Composite keys are built from the written row
    /// and only reloaded when a column was left to its schema default.
    async fn after_insert(&self, row: Attributes, last_insert_id: u64) -> Result<M, RepositoryError> {
        if M::has_composite_key() {
            match from_attributes::<M>(row.clone()) {
                Ok(model) => return Ok(model),
                Err(RepositoryError::Serialization { source, .. }) => {
                    debug!("Local copy incomplete ({}), reloading", source);
                }
                Err(err) => return Err(err),
            }
        }
        let key = self.key_of_new_row(&row, last_insert_id)?;
        self.refresh(key).await
    }

    /// Entity to hand back after an update. Composite keys get the local copy, merged
    /// with the written row.
    async fn after_update(&self, model: M, written: Attributes) -> Result<M, RepositoryError> {
        if M::has_composite_key() {
            let mut attributes = to_attributes(&model)?;
            attributes.extend(written);
            return from_attributes::<M>(attributes);
        }
        self.refresh(model.key().values()).await
    }

    // ************************* CANCELLAZIONE LOGICA ************************* //

    /// Marks the entity as deleted without removing the row
    #[instrument(skip_all, fields(table = M::TABLE))]
    pub async fn soft_delete(
        &self,
        target: impl Into<KeyOrModel<M>> + Send,
    ) -> Result<bool, RepositoryError> {
        if !M::SOFT_DELETES {
            return Err(RepositoryError::SoftDeletesUnsupported { table: M::TABLE });
        }
        let model = self.resolve(target.into()).await?;

        let now = Utc::now().trunc_subsecs(0);
        let mut query = QueryBuilder::<MySql>::new(format!(
            "UPDATE {} SET {} = ",
            quote(M::TABLE),
            quote(DELETED_AT)
        ));
        query.push_bind(now);
        if M::TIMESTAMPS {
            query.push(format!(", {} = ", quote(UPDATED_AT)));
            query.push_bind(now);
        }
        query.push(format!(" WHERE {} IS NULL", quote(DELETED_AT)));
        push_key::<M>(&mut query, model.key().values());

        let result = query.build().execute(&self.connection_pool).await?;
        info!("Record soft deleted");
        Ok(result.rows_affected() > 0)
    }

    /// Brings back a soft-deleted entity
    #[instrument(skip_all, fields(table = M::TABLE, key = ?key))]
    pub async fn restore(&self, key: &M::Key) -> Result<bool, RepositoryError> {
        if !M::SOFT_DELETES {
            return Err(RepositoryError::SoftDeletesUnsupported { table: M::TABLE });
        }

        let mut query = QueryBuilder::<MySql>::new(format!(
            "UPDATE {} SET {} = NULL WHERE {} IS NOT NULL",
            quote(M::TABLE),
            quote(DELETED_AT),
            quote(DELETED_AT)
        ));
        push_key::<M>(&mut query, key.values());

        let result = query.build().execute(&self.connection_pool).await?;
        Ok(result.rows_affected() > 0)
    }

    /// Like `find`, soft-deleted rows included
    pub async fn find_with_trashed(&self, key: &M::Key) -> Result<Option<M>, RepositoryError> {
        match self.fetch_by_key(key.values(), Scope::WithTrashed).await? {
            Some(model) => Ok(Some(self.hydrate_one(model).await?)),
            None => Ok(None),
        }
    }
}

/// Turns an engine rejection into `None`, lets every other error through
fn rejected<T>(table: &'static str, result: Result<T, sqlx::Error>) -> Result<Option<T>, RepositoryError> {
    match result {
        Ok(value) => Ok(Some(value)),
        Err(err) if is_rejection(&err) => {
            warn!(table, "Database rejected write: {}", err);
            Ok(None)
        }
        Err(err) => Err(err.into()),
    }
}

/// The row as it was written: converted values, back in JSON form
fn written_row(values: &[(&'static str, SqlValue)]) -> Attributes {
    values
        .iter()
        .map(|(column, value)| (column.to_string(), value.to_json()))
        .collect()
}

async fn insert_rows<'c, M, E>(
    executor: E,
    columns: &[&'static str],
    rows: Vec<Vec<Option<SqlValue>>>,
) -> Result<MySqlQueryResult, sqlx::Error>
where
    M: Model,
    E: Executor<'c, Database = MySql>,
{
    let column_list: Vec<String> = columns.iter().map(|c| quote(c)).collect();
    let mut query = QueryBuilder::<MySql>::new(format!(
        "INSERT INTO {} ({}) VALUES ",
        quote(M::TABLE),
        column_list.join(", ")
    ));
    for (i, row) in rows.into_iter().enumerate() {
        if i > 0 {
            query.push(", ");
        }
        query.push("(");
        for (j, value) in row.into_iter().enumerate() {
            if j > 0 {
                query.push(", ");
            }
            // colonna assente in questa riga: vale il default dello schema
            match value {
                Some(value) => value.push_bind(&mut query),
                None => {
                    query.push("DEFAULT");
                }
            }
        }
        query.push(")");
    }

    query.build().execute(executor).await
}

async fn update_row<'c, M, E>(
    executor: E,
    key: Vec<SqlValue>,
    values: Vec<(&'static str, SqlValue)>,
) -> Result<MySqlQueryResult, sqlx::Error>
where
    M: Model,
    E: Executor<'c, Database = MySql>,
{
    let mut query = QueryBuilder::<MySql>::new(format!("UPDATE {} SET ", quote(M::TABLE)));
    for (i, (column, value)) in values.into_iter().enumerate() {
        if i > 0 {
            query.push(", ");
        }
        query.push(format!("{} = ", quote(column)));
        value.push_bind(&mut query);
    }
    query.push(" WHERE 1 = 1");
    push_key::<M>(&mut query, key);

    query.build().execute(executor).await
}

impl<M: Model> BaseRepository for Repository<M> {
    type Model = M;

    #[instrument(skip_all, fields(table = M::TABLE))]
    async fn create(&self, data: &Attributes) -> Result<Option<M>, RepositoryError> {
        debug!("Creating record");
        let row = self.stamp_new_row(fillable::<M>(data));
        let Some(values) = self.typed_values(&row)? else {
            return Ok(None);
        };
        let written = written_row(&values);
        let (columns, values): (Vec<_>, Vec<_>) =
            values.into_iter().map(|(c, v)| (c, Some(v))).unzip();

        let result = insert_rows::<M, _>(&self.connection_pool, &columns, vec![values]).await;
        let Some(result) = rejected(M::TABLE, result)? else {
            return Ok(None);
        };

        let model = self.after_insert(written, result.last_insert_id()).await?;
        info!("Record created");
        Ok(Some(model))
    }

    #[instrument(skip_all, fields(table = M::TABLE, rows = rows.len()))]
    async fn insert(&self, rows: &[Attributes]) -> Result<bool, RepositoryError> {
        if rows.is_empty() {
            return Ok(true);
        }

        let mut prepared = Vec::with_capacity(rows.len());
        for row in rows {
            let mut row = row.clone();
            if M::KEY_GENERATION == KeyGeneration::Uuid {
                for key in M::PRIMARY_KEY {
                    if row.get(*key).is_none_or(Value::is_null) {
                        row.insert(key.to_string(), Value::String(Uuid::now_v7().to_string()));
                    }
                }
            }
            prepared.push(row);
        }

        // union of the columns of every row, in order of first appearance
        let mut columns: Vec<&'static Column> = Vec::new();
        for row in &prepared {
            for name in row.keys() {
                let column = M::column(name).ok_or_else(|| RepositoryError::UnknownColumn {
                    table: M::TABLE,
                    column: name.clone(),
                })?;
                if !columns.iter().any(|c| c.name == column.name) {
                    columns.push(column);
                }
            }
        }

        let mut values = Vec::with_capacity(prepared.len());
        for row in &prepared {
            let mut typed = Vec::with_capacity(columns.len());
            for column in &columns {
                let Some(value) = row.get(column.name) else {
                    typed.push(None);
                    continue;
                };
                match SqlValue::from_json(column.name, column.kind, value) {
                    Ok(value) => typed.push(Some(value)),
                    Err(err) => {
                        warn!("Rejected bulk insert: {}", err);
                        return Ok(false);
                    }
                }
            }
            values.push(typed);
        }

        let names: Vec<&'static str> = columns.iter().map(|c| c.name).collect();
        let result = insert_rows::<M, _>(&self.connection_pool, &names, values).await;
        match rejected(M::TABLE, result)? {
            Some(result) => {
                info!("Inserted {} rows", result.rows_affected());
                Ok(true)
            }
            None => Ok(false),
        }
    }

    #[instrument(skip_all, fields(table = M::TABLE))]
    async fn update(
        &self,
        target: impl Into<KeyOrModel<Self::Model>> + Send,
        data: &Attributes,
    ) -> Result<Option<M>, RepositoryError> {
        let model = self.resolve(target.into()).await?;
        let row = self.stamp_updated_row(fillable::<M>(data));
        let mut written = Attributes::new();

        if row.is_empty() {
            debug!("No fillable attributes to update");
        } else {
            let Some(values) = self.typed_values(&row)? else {
                return Ok(None);
            };
            written = written_row(&values);
            let result = update_row::<M, _>(&self.connection_pool, model.key().values(), values).await;
            if rejected(M::TABLE, result)?.is_none() {
                return Ok(None);
            }
            info!("Record updated");
        }

        Ok(Some(self.after_update(model, written).await?))
    }

    #[instrument(skip_all, fields(table = M::TABLE))]
    async fn update_or_create(
        &self,
        attributes: &Attributes,
        data: &Attributes,
    ) -> Result<Option<M>, RepositoryError> {
        let search = Search::from_attributes(attributes)?;
        // lookup and write share one transaction, the row lock closes the race between them
        let mut tx = self.connection_pool.begin().await?;

        let mut query = select::<M>("*", Scope::WithoutTrashed);
        search.apply::<M>(&mut query)?;
        push_order_by_key::<M>(&mut query);
        query.push(" LIMIT 1 FOR UPDATE");
        let existing = query.build_query_as::<M>().fetch_optional(&mut *tx).await?;

        let written = match existing {
            Some(model) => {
                debug!("Matching record found, updating it");
                let row = self.stamp_updated_row(fillable::<M>(data));
                let mut written = Attributes::new();
                if !row.is_empty() {
                    let Some(values) = self.typed_values(&row)? else {
                        return Ok(None);
                    };
                    written = written_row(&values);
                    let result = update_row::<M, _>(&mut *tx, model.key().values(), values).await;
                    if rejected(M::TABLE, result)?.is_none() {
                        return Ok(None);
                    }
                }
                Written::Existing(model, written)
            }
            None => {
                debug!("No matching record, creating one");
                let mut merged = attributes.clone();
                merged.extend(data.clone());
                let row = self.stamp_new_row(fillable::<M>(&merged));
                let Some(values) = self.typed_values(&row)? else {
                    return Ok(None);
                };
                let written = written_row(&values);
                let (columns, values): (Vec<_>, Vec<_>) =
                    values.into_iter().map(|(c, v)| (c, Some(v))).unzip();
                let result = insert_rows::<M, _>(&mut *tx, &columns, vec![values]).await;
                let Some(result) = rejected(M::TABLE, result)? else {
                    return Ok(None);
                };
                Written::New(written, result.last_insert_id())
            }
        };

        tx.commit().await?;

        let model = match written {
            Written::Existing(model, row) => self.after_update(model, row).await?,
            Written::New(row, last_insert_id) => self.after_insert(row, last_insert_id).await?,
        };
        Ok(Some(model))
    }

    #[instrument(skip_all, fields(table = M::TABLE))]
    async fn delete(
        &self,
        target: impl Into<KeyOrModel<Self::Model>> + Send,
    ) -> Result<bool, RepositoryError> {
        let model = self.resolve(target.into()).await?;
        if M::SOFT_DELETES {
            // generic delete always purges, soft deletes go through `soft_delete`
            debug!("Force deleting a soft-deletable record");
        }

        let mut query =
            QueryBuilder::<MySql>::new(format!("DELETE FROM {} WHERE 1 = 1", quote(M::TABLE)));
        push_key::<M>(&mut query, model.key().values());

        let result = query.build().execute(&self.connection_pool).await?;
        info!("Deleted {} rows", result.rows_affected());
        Ok(result.rows_affected() > 0)
    }

    #[instrument(skip_all, fields(table = M::TABLE, key = ?key))]
    async fn find(&self, key: &<Self::Model as Model>::Key) -> Result<Option<M>, RepositoryError> {
        match self.fetch_by_key(key.values(), Scope::WithoutTrashed).await? {
            Some(model) => Ok(Some(self.hydrate_one(model).await?)),
            None => Ok(None),
        }
    }

    #[instrument(skip_all, fields(table = M::TABLE, column = ?column))]
    async fn find_or_fail(&self, value: Value, column: Option<&str>) -> Result<M, RepositoryError> {
        let mut query = select::<M>("*", Scope::WithoutTrashed);

        let lookup = match column {
            Some(name) => {
                let column = M::column(name).ok_or_else(|| RepositoryError::UnknownColumn {
                    table: M::TABLE,
                    column: name.to_string(),
                })?;
                let bound = SqlValue::from_json(column.name, column.kind, &value)?;
                query.push(format!(" AND {} = ", quote(column.name)));
                bound.push_bind(&mut query);
                format!("{name} = {value}")
            }
            None => {
                let parts = if M::has_composite_key() {
                    value
                        .as_array()
                        .filter(|parts| parts.len() == M::PRIMARY_KEY.len())
                        .cloned()
                        .ok_or_else(|| RepositoryError::InvalidFilter {
                            column: M::PRIMARY_KEY.join(", "),
                            reason: "a composite key lookup takes one value per key column"
                                .to_string(),
                        })?
                } else {
                    vec![value.clone()]
                };
                let key = M::PRIMARY_KEY
                    .iter()
                    .zip(&parts)
                    .map(|(name, part)| -> Result<SqlValue, RepositoryError> {
                        let column = M::column(name).ok_or_else(|| RepositoryError::UnknownColumn {
                            table: M::TABLE,
                            column: name.to_string(),
                        })?;
                        Ok(SqlValue::from_json(column.name, column.kind, part)?)
                    })
                    .collect::<Result<Vec<_>, _>>()?;
                push_key::<M>(&mut query, key);
                format!("{} = {value}", M::PRIMARY_KEY.join(", "))
            }
        };

        push_order_by_key::<M>(&mut query);
        query.push(" LIMIT 1");

        let model = query
            .build_query_as::<M>()
            .fetch_optional(&self.connection_pool)
            .await?
            .ok_or_else(|| {
                warn!("Record not found for {}", lookup);
                RepositoryError::not_found(M::TABLE, lookup)
            })?;
        self.hydrate_one(model).await
    }

    #[instrument(skip_all, fields(table = M::TABLE))]
    async fn get_all(&self, search: &Search) -> Result<Vec<M>, RepositoryError> {
        self.fetch_matching(search, None).await
    }

    #[instrument(skip_all, fields(table = M::TABLE, page = page.page, page_size = page.page_size))]
    async fn get_all_paginated(
        &self,
        search: &Search,
        page: PageRequest,
    ) -> Result<Paginator<M>, RepositoryError> {
        let total = self.count_matching(search).await?;
        let data = self.fetch_matching(search, Some(&page)).await?;
        debug!("Page with {} of {} records", data.len(), total);
        Ok(Paginator::new(data, total, &page))
    }

    #[instrument(skip_all, fields(table = M::TABLE))]
    async fn count(&self, search: &Search) -> Result<u64, RepositoryError> {
        self.count_matching(search).await
    }

    #[instrument(skip_all, fields(table = M::TABLE))]
    async fn find_first(&self, attributes: &Attributes) -> Result<Option<M>, RepositoryError> {
        let search = Search::from_attributes(attributes)?;
        self.fetch_first(&search).await
    }

    #[instrument(skip_all, fields(table = M::TABLE))]
    async fn find_many(&self, attributes: &Attributes) -> Result<Vec<M>, RepositoryError> {
        let search = Search::from_attributes(attributes)?;
        self.fetch_matching(&search, None).await
    }

    fn with(&self, relations: &[&str]) -> Self {
        let mut configured = self.clone();
        for relation in relations {
            if !configured.with.iter().any(|r| r == relation) {
                configured.with.push(relation.to_string());
            }
        }
        configured
    }

    fn with_count(&self, relations: &[&str]) -> Self {
        let mut configured = self.clone();
        for relation in relations {
            if !configured.with_count.iter().any(|r| r == relation) {
                configured.with_count.push(relation.to_string());
            }
        }
        configured
    }
}
