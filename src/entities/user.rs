//! User entity - Utente che registra i prodotti

use super::Product;
use crate::repositories::{Column, ColumnKind, EagerLoaded, KeyGeneration, Model, Relation};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, sqlx::FromRow)]
pub struct User {
    /* se vogliamo rinominare campi usiamo la macro
     * #[serde(rename = "userId")]
     */
    pub user_id: Uuid,
    pub name: String,
    pub email: String,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
    #[sqlx(skip)]
    #[serde(flatten)]
    pub relations: EagerLoaded,
}

const RELATIONS: &[Relation] = &[Relation::has_many::<Product>("products", "user_id", "user_id")];

impl Model for User {
    type Key = Uuid;

    const TABLE: &'static str = "users";
    const PRIMARY_KEY: &'static [&'static str] = &["user_id"];
    const COLUMNS: &'static [Column] = &[
        Column::new("user_id", ColumnKind::Uuid),
        Column::new("name", ColumnKind::Text),
        Column::new("email", ColumnKind::Text),
        Column::new("created_at", ColumnKind::Timestamp),
        Column::new("updated_at", ColumnKind::Timestamp),
    ];
    const FILLABLE: &'static [&'static str] = &["name", "email"];
    const KEY_GENERATION: KeyGeneration = KeyGeneration::Uuid;
    const TIMESTAMPS: bool = true;

    fn key(&self) -> Uuid {
        self.user_id
    }

    fn relations() -> &'static [Relation] {
        RELATIONS
    }

    fn eager_loaded_mut(&mut self) -> Option<&mut EagerLoaded> {
        Some(&mut self.relations)
    }
}
