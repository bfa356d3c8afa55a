//! Supplier entity - Fornitore

use super::{Image, ImageOwner, Product};
use crate::repositories::{Column, ColumnKind, EagerLoaded, KeyGeneration, Model, Relation};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, sqlx::FromRow)]
pub struct Supplier {
    pub supplier_id: Uuid,
    pub name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
    #[sqlx(skip)]
    #[serde(flatten)]
    pub relations: EagerLoaded,
}

const RELATIONS: &[Relation] = &[
    Relation::has_many::<Product>("products", "supplier_id", "supplier_id"),
    Relation::morph_many::<Image>(
        "images",
        "supplier_id",
        "model_type",
        "model_id",
        ImageOwner::Supplier.tag(),
    ),
];

impl Model for Supplier {
    type Key = Uuid;

    const TABLE: &'static str = "suppliers";
    const PRIMARY_KEY: &'static [&'static str] = &["supplier_id"];
    const COLUMNS: &'static [Column] = &[
        Column::new("supplier_id", ColumnKind::Uuid),
        Column::new("name", ColumnKind::Text),
        Column::new("email", ColumnKind::Text),
        Column::new("phone", ColumnKind::Text),
        Column::new("created_at", ColumnKind::Timestamp),
        Column::new("updated_at", ColumnKind::Timestamp),
    ];
    const FILLABLE: &'static [&'static str] = &["name", "email", "phone"];
    const KEY_GENERATION: KeyGeneration = KeyGeneration::Uuid;
    const TIMESTAMPS: bool = true;

    fn key(&self) -> Uuid {
        self.supplier_id
    }

    fn relations() -> &'static [Relation] {
        RELATIONS
    }

    fn eager_loaded_mut(&mut self) -> Option<&mut EagerLoaded> {
        Some(&mut self.relations)
    }
}
