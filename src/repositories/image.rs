//! ImageRepository - Immagini polimorfiche, indicizzate per (model_type, model_id)

use super::crudable::Repository;
use super::error::RepositoryError;
use super::query::{Scope, push_order_by_key, quote, select};
use super::traits::BaseRepository;
use super::value::attributes;
use crate::entities::{Image, ImageOwner};
use serde_json::json;
use tracing::instrument;
use uuid::Uuid;

pub type ImageRepository = Repository<Image>;

impl Repository<Image> {
    /// Tutte le immagini di un proprietario
    #[instrument(skip(self))]
    pub async fn for_owner(
        &self,
        owner: ImageOwner,
        owner_id: Uuid,
    ) -> Result<Vec<Image>, RepositoryError> {
        let mut query = select::<Image>("*", Scope::WithoutTrashed);
        query.push(format!(" AND {} = ", quote("model_type")));
        query.push_bind(owner.tag());
        query.push(format!(" AND {} = ", quote("model_id")));
        query.push_bind(owner_id);
        push_order_by_key::<Image>(&mut query);

        let images = query
            .build_query_as::<Image>()
            .fetch_all(self.pool())
            .await?;

        Ok(images)
    }

    /// Attaches a new image to its owner. `None` when the database rejects the row.
    #[instrument(skip(self))]
    pub async fn attach(
        &self,
        owner: ImageOwner,
        owner_id: Uuid,
        path: &str,
    ) -> Result<Option<Image>, RepositoryError> {
        self.create(&attributes(json!({
            "model_type": owner.tag(),
            "model_id": owner_id,
            "path": path,
        })))
        .await
    }
}
