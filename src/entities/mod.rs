//! Entities module - Entità del dominio applicativo
//!
//! Questo modulo contiene tutte le entità (models) che rappresentano i dati persistiti nel database.
//! Ogni entity corrisponde a una tabella nel database e descrive se stessa tramite il trait `Model`.

pub mod category;
pub mod enums;
pub mod image;
pub mod product;
pub mod supplier;
pub mod user;

// Re-exports per facilitare l'import
pub use category::Category;
pub use enums::ImageOwner;
pub use image::Image;
pub use product::Product;
pub use supplier::Supplier;
pub use user::User;

use crate::repositories::KeyOrModel;
use uuid::Uuid;

/// `repo.update(product_id, ...)` invece di `repo.update(KeyOrModel::Key(product_id), ...)`
macro_rules! uuid_keyed {
    ($($model:ty),* $(,)?) => {
        $(
            impl From<Uuid> for KeyOrModel<$model> {
                fn from(key: Uuid) -> Self {
                    KeyOrModel::Key(key)
                }
            }
        )*
    };
}

uuid_keyed!(Product, Category, Supplier, User, Image);
