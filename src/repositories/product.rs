//! ProductRepository - Query specifiche dei prodotti oltre al contratto generico

use super::crudable::Repository;
use super::error::RepositoryError;
use super::query::{Scope, quote, select};
use crate::entities::Product;
use tracing::instrument;

pub type ProductRepository = Repository<Product>;

impl Repository<Product> {
    /// Lo SKU è univoco, quindi al massimo un prodotto
    #[instrument(skip(self))]
    pub async fn find_by_sku(&self, sku: &str) -> Result<Option<Product>, RepositoryError> {
        let mut query = select::<Product>("*", Scope::WithoutTrashed);
        query.push(format!(" AND {} = ", quote("sku")));
        query.push_bind(sku.to_string());

        let product = query
            .build_query_as::<Product>()
            .fetch_optional(self.pool())
            .await?;

        Ok(product)
    }
}
