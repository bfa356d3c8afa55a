//! Enumerazioni - Tipi enumerati utilizzati nelle entità

use serde::{Deserialize, Serialize};

// ********************* ENUMERAZIONI UTILI **********************//

/// Owner type tag of an image (`images.model_type`)
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, sqlx::Type)]
#[sqlx(type_name = "model_type", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum ImageOwner {
    Product,
    Category,
    Supplier,
    User,
}

impl ImageOwner {
    /// Value stored in the `model_type` column
    pub const fn tag(self) -> &'static str {
        match self {
            ImageOwner::Product => "product",
            ImageOwner::Category => "category",
            ImageOwner::Supplier => "supplier",
            ImageOwner::User => "user",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tag_matches_serde_name() {
        for owner in [
            ImageOwner::Product,
            ImageOwner::Category,
            ImageOwner::Supplier,
            ImageOwner::User,
        ] {
            assert_eq!(
                serde_json::to_value(owner).unwrap(),
                serde_json::Value::String(owner.tag().to_string())
            );
        }
    }
}
