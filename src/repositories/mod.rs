//! Repositories module - Coordinatore per tutti i repository del progetto
//!
//! Questo modulo organizza il layer di accesso ai dati: un unico repository generico
//! (`Repository<M>`) che implementa il contratto `BaseRepository` per ogni entità che
//! implementa `Model`, più i blocchi `impl` con le query specifiche di alcune entità.

// ************************* NOTA IMPORTANTE SU SQLX ************************* //

/*
   Qui non usiamo query! / query_as!: le colonne, i filtri e le relazioni arrivano a runtime
   (mass assignment da JSON, Search, with/with_count) quindi le query si costruiscono con
   sqlx::QueryBuilder e si leggono con build_query_as::<M>() grazie a #[derive(sqlx::FromRow)].
   Regola d'oro: gli identificatori (tabelle, colonne) vengono SOLO dai descrittori statici
   del Model (Model::COLUMNS), i valori passano SEMPRE da push_bind. Mai format! con input utente.

   Promemoria sui metodi di fetch:
   .execute(...)         INSERT/UPDATE/DELETE, rows_affected() e last_insert_id()
   .fetch_optional(...)  zero o una riga
   .fetch_one(...)       esattamente una riga (aggregati, COUNT)
   .fetch_all(...)       tutte le righe
*/

// ************************* MODULI REPOSITORY ************************* //

// Dichiarazione dei sotto-moduli
pub mod crudable;
pub mod error;
pub mod image;
pub mod model;
pub mod pagination;
pub mod product;
pub mod query;
pub mod relations;
pub mod search;
pub mod traits;
pub mod value;

// Re-esportazione del contratto e dei tipi di supporto per facilitare l'import
pub use crudable::Repository;
pub use error::RepositoryError;
pub use model::{Column, EagerLoaded, KeyGeneration, KeyOrModel, Model, PrimaryKey};
pub use pagination::{DEFAULT_PAGE_SIZE, PageRequest, Paginator};
pub use relations::{Relation, RelationKind};
pub use search::{Filter, Operator, Search};
pub use traits::BaseRepository;
pub use value::{Attributes, ColumnKind, SqlValue, ValueError, attributes};

// Re-esportazione dei repository concreti
pub use image::ImageRepository;
pub use product::ProductRepository;

use crate::entities::{Category, Supplier, User};

pub type CategoryRepository = Repository<Category>;
pub type SupplierRepository = Repository<Supplier>;
pub type UserRepository = Repository<User>;
