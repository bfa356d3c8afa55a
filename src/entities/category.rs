//! Category entity - Categoria merceologica, supporta la cancellazione logica

use super::{Image, ImageOwner, Product};
use crate::repositories::{Column, ColumnKind, EagerLoaded, KeyGeneration, Model, Relation};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, sqlx::FromRow)]
pub struct Category {
    pub category_id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
    pub deleted_at: Option<DateTime<Utc>>,
    #[sqlx(skip)]
    #[serde(flatten)]
    pub relations: EagerLoaded,
}

impl Category {
    pub fn is_trashed(&self) -> bool {
        self.deleted_at.is_some()
    }
}

const RELATIONS: &[Relation] = &[
    Relation::has_many::<Product>("products", "category_id", "category_id"),
    Relation::morph_many::<Image>(
        "images",
        "category_id",
        "model_type",
        "model_id",
        ImageOwner::Category.tag(),
    ),
];

impl Model for Category {
    type Key = Uuid;

    const TABLE: &'static str = "categories";
    const PRIMARY_KEY: &'static [&'static str] = &["category_id"];
    const COLUMNS: &'static [Column] = &[
        Column::new("category_id", ColumnKind::Uuid),
        Column::new("name", ColumnKind::Text),
        Column::new("description", ColumnKind::Text),
        Column::new("created_at", ColumnKind::Timestamp),
        Column::new("updated_at", ColumnKind::Timestamp),
        Column::new("deleted_at", ColumnKind::Timestamp),
    ];
    const FILLABLE: &'static [&'static str] = &["name", "description"];
    const KEY_GENERATION: KeyGeneration = KeyGeneration::Uuid;
    const TIMESTAMPS: bool = true;
    const SOFT_DELETES: bool = true;

    fn key(&self) -> Uuid {
        self.category_id
    }

    fn relations() -> &'static [Relation] {
        RELATIONS
    }

    fn eager_loaded_mut(&mut self) -> Option<&mut EagerLoaded> {
        Some(&mut self.relations)
    }
}
