//! Image entity - Immagine polimorfica, appartiene a prodotti, categorie, fornitori o utenti

use super::ImageOwner;
use crate::repositories::{Column, ColumnKind, KeyGeneration, Model};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, sqlx::FromRow)]
pub struct Image {
    pub image_id: Uuid,
    /// Tipo del proprietario, insieme a `model_id` identifica il record a cui appartiene
    pub model_type: ImageOwner,
    pub model_id: Uuid,
    pub path: String,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl Model for Image {
    type Key = Uuid;

    const TABLE: &'static str = "images";
    const PRIMARY_KEY: &'static [&'static str] = &["image_id"];
    const COLUMNS: &'static [Column] = &[
        Column::new("image_id", ColumnKind::Uuid),
        Column::new("model_type", ColumnKind::Text),
        Column::new("model_id", ColumnKind::Uuid),
        Column::new("path", ColumnKind::Text),
        Column::new("created_at", ColumnKind::Timestamp),
        Column::new("updated_at", ColumnKind::Timestamp),
    ];
    const FILLABLE: &'static [&'static str] = &["model_type", "model_id", "path"];
    const KEY_GENERATION: KeyGeneration = KeyGeneration::Uuid;
    const TIMESTAMPS: bool = true;

    fn key(&self) -> Uuid {
        self.image_id
    }
}
