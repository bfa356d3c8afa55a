//! Application State - Stato globale dell'applicazione
//!
//! Contiene tutti i repository e lo stato condiviso necessario per gestire l'applicazione.

use crate::repositories::{
    CategoryRepository, ImageRepository, ProductRepository, SupplierRepository, UserRepository,
};
use sqlx::MySqlPool;

/// Stato globale dell'applicazione condiviso tra tutte le route
pub struct AppState {
    /// Repository per la gestione dei prodotti
    pub product: ProductRepository,

    /// Repository per la gestione delle categorie
    pub category: CategoryRepository,

    /// Repository per la gestione dei fornitori
    pub supplier: SupplierRepository,

    /// Repository per la gestione degli utenti
    pub user: UserRepository,

    /// Repository per le immagini polimorfiche
    pub image: ImageRepository,
}

impl AppState {
    /// Crea una nuova istanza di AppState inizializzando tutti i repository
    /// con il pool di connessioni fornito.
    ///
    /// # Arguments
    /// * `pool` - Pool di connessioni MySQL condiviso
    ///
    /// # Returns
    /// Nuova istanza di AppState con tutti i repository inizializzati
    pub fn new(pool: MySqlPool) -> Self {
        Self {
            product: ProductRepository::new(pool.clone()),
            category: CategoryRepository::new(pool.clone()),
            supplier: SupplierRepository::new(pool.clone()),
            user: UserRepository::new(pool.clone()),
            image: ImageRepository::new(pool),
        }
    }
}
