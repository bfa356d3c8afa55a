//! DTOs module - Data Transfer Objects
//!
//! Questo modulo contiene i DTOs usati per la comunicazione client-server.
//! I body di create/update sono mappe JSON (mass assignment filtrato dal `FILLABLE` del model),
//! qui restano solo i parametri che non sono attributi delle entità.

pub mod query;

// Re-exports
pub use query::ProductListQuery;
