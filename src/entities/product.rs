//! Product entity - Entità prodotto, il cuore dell'inventario

use super::{Category, Image, ImageOwner, Supplier, User};
use crate::repositories::{Column, ColumnKind, EagerLoaded, KeyGeneration, Model, Relation};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, sqlx::FromRow)]
pub struct Product {
    pub product_id: Uuid,
    pub category_id: Option<Uuid>,
    pub supplier_id: Option<Uuid>,
    pub barcode: Option<String>,
    pub sku: Option<String>,
    pub name: String,
    pub description: Option<String>,
    pub current_stock: i32,
    pub min_stock: i32,
    pub max_stock: Option<i32>,
    pub sale_price: Decimal,
    pub purchase_price: Decimal,
    pub is_active: bool,
    pub user_id: Option<Uuid>,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
    /// category, supplier, user, images (+ `*_count`) quando richiesti con `with`
    #[sqlx(skip)]
    #[serde(flatten)]
    pub relations: EagerLoaded,
}

impl Product {
    /// Below the reorder threshold
    pub fn needs_restock(&self) -> bool {
        self.current_stock < self.min_stock
    }
}

const RELATIONS: &[Relation] = &[
    Relation::belongs_to::<User>("user", "user_id", "user_id"),
    Relation::belongs_to::<Category>("category", "category_id", "category_id"),
    Relation::belongs_to::<Supplier>("supplier", "supplier_id", "supplier_id"),
    Relation::morph_many::<Image>(
        "images",
        "product_id",
        "model_type",
        "model_id",
        ImageOwner::Product.tag(),
    ),
];

impl Model for Product {
    type Key = Uuid;

    const TABLE: &'static str = "products";
    const PRIMARY_KEY: &'static [&'static str] = &["product_id"];
    const COLUMNS: &'static [Column] = &[
        Column::new("product_id", ColumnKind::Uuid),
        Column::new("category_id", ColumnKind::Uuid),
        Column::new("supplier_id", ColumnKind::Uuid),
        Column::new("barcode", ColumnKind::Text),
        Column::new("sku", ColumnKind::Text),
        Column::new("name", ColumnKind::Text),
        Column::new("description", ColumnKind::Text),
        Column::new("current_stock", ColumnKind::Integer),
        Column::new("min_stock", ColumnKind::Integer),
        Column::new("max_stock", ColumnKind::Integer),
        Column::new("sale_price", ColumnKind::Decimal),
        Column::new("purchase_price", ColumnKind::Decimal),
        Column::new("is_active", ColumnKind::Boolean),
        Column::new("user_id", ColumnKind::Uuid),
        Column::new("created_at", ColumnKind::Timestamp),
        Column::new("updated_at", ColumnKind::Timestamp),
    ];
    const FILLABLE: &'static [&'static str] = &[
        "category_id",
        "supplier_id",
        "barcode",
        "sku",
        "name",
        "current_stock",
        "min_stock",
        "max_stock",
        "description",
        "sale_price",
        "purchase_price",
        "is_active",
        "user_id",
    ];
    const KEY_GENERATION: KeyGeneration = KeyGeneration::Uuid;
    const TIMESTAMPS: bool = true;

    fn key(&self) -> Uuid {
        self.product_id
    }

    fn relations() -> &'static [Relation] {
        RELATIONS
    }

    fn eager_loaded_mut(&mut self) -> Option<&mut EagerLoaded> {
        Some(&mut self.relations)
    }
}
