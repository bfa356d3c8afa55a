//! Repository contract
//!
//! This module defines the uniform interface every entity repository exposes.

use super::error::RepositoryError;
use super::model::{KeyOrModel, Model};
use super::pagination::{PageRequest, Paginator};
use super::search::Search;
use super::value::Attributes;

/// Uniform CRUD/search operations over one entity type
///
/// # Type Parameters
/// * `Model` - Entity the repository is bound to for its whole lifetime
pub trait BaseRepository: Sized {
    type Model: Model;

    /// Creates a new entity from untrusted input
    ///
    /// # Arguments
    /// * `data` - Attributes; keys outside the model's fillable list are dropped
    ///
    /// # Returns
    /// * `Ok(Some(Model))` - Created entity, reloaded unless the key is composite
    /// * `Ok(None)` - The database rejected the write
    /// * `Err(RepositoryError)` - Any other failure
    async fn create(&self, data: &Attributes) -> Result<Option<Self::Model>, RepositoryError>;

    /// Inserts rows in one statement, without hydrating entities
    ///
    /// # Arguments
    /// * `rows` - One attribute map per row; no fillable filtering, no timestamps
    ///
    /// # Returns
    /// * `Ok(true)` - Rows inserted (or nothing to insert)
    /// * `Ok(false)` - The database rejected the rows
    async fn insert(&self, rows: &[Attributes]) -> Result<bool, RepositoryError>;

    /// Updates an entity
    ///
    /// # Arguments
    /// * `target` - Primary key or an already loaded entity
    /// * `data` - Attributes to change (fillable only)
    ///
    /// # Returns
    /// * `Ok(Some(Model))` - Updated entity
    /// * `Ok(None)` - The database rejected the write
    /// * `Err(RepositoryError::NotFound)` - Key did not match any row, nothing was written
    async fn update(
        &self,
        target: impl Into<KeyOrModel<Self::Model>> + Send,
        data: &Attributes,
    ) -> Result<Option<Self::Model>, RepositoryError>;

    /// Updates the first entity matching `attributes` with `data`, or creates one from both
    async fn update_or_create(
        &self,
        attributes: &Attributes,
        data: &Attributes,
    ) -> Result<Option<Self::Model>, RepositoryError>;

    /// Removes an entity for good, soft-delete capable or not
    ///
    /// # Returns
    /// * `Ok(true)` - A row was removed
    /// * `Ok(false)` - Nothing was removed
    /// * `Err(RepositoryError::NotFound)` - Key did not match any row
    async fn delete(
        &self,
        target: impl Into<KeyOrModel<Self::Model>> + Send,
    ) -> Result<bool, RepositoryError>;

    /// Finds an entity by primary key
    async fn find(
        &self,
        key: &<Self::Model as Model>::Key,
    ) -> Result<Option<Self::Model>, RepositoryError>;

    /// Finds an entity by primary key (`column = None`) or by the given column
    ///
    /// # Arguments
    /// * `value` - Value to look for; a JSON array with one value per column for composite keys
    /// * `column` - Column to search, primary key when `None`
    async fn find_or_fail(
        &self,
        value: serde_json::Value,
        column: Option<&str>,
    ) -> Result<Self::Model, RepositoryError>;

    /// All entities matching `search`, ordered by primary key
    async fn get_all(&self, search: &Search) -> Result<Vec<Self::Model>, RepositoryError>;

    /// One page of the entities matching `search`
    async fn get_all_paginated(
        &self,
        search: &Search,
        page: PageRequest,
    ) -> Result<Paginator<Self::Model>, RepositoryError>;

    /// Number of entities matching `search`
    ///
    /// # Returns
    /// * `Err(RepositoryError::Aggregate)` - The count query failed
    async fn count(&self, search: &Search) -> Result<u64, RepositoryError>;

    /// First entity matching the attribute filter
    async fn find_first(
        &self,
        attributes: &Attributes,
    ) -> Result<Option<Self::Model>, RepositoryError>;

    /// Every entity matching the attribute filter
    async fn find_many(&self, attributes: &Attributes)
    -> Result<Vec<Self::Model>, RepositoryError>;

    /// Repository that eager-loads `relations` on the following queries
    fn with(&self, relations: &[&str]) -> Self;

    /// Repository that loads `<relation>_count` for `relations` on the following queries
    fn with_count(&self, relations: &[&str]) -> Self;
}
