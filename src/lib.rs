//! Inventory server library - espone i moduli principali per i test

pub mod core;
pub mod dtos;
pub mod entities;
pub mod repositories;
pub mod services;

// Re-export dei tipi principali per facilitare l'import
pub use crate::core::{AppError, AppState, Config};
pub use services::root;

use axum::{
    Router,
    routing::{get, put},
};
use std::sync::Arc;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

/// Crea il router principale dell'applicazione
pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(root))
        .nest("/products", configure_product_routes())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Configura le routes per la gestione dei prodotti
fn configure_product_routes() -> Router<Arc<AppState>> {
    use services::*;

    Router::new()
        .route("/", get(list_products).post(create_product))
        .route(
            "/{product_id}",
            get(get_product).patch(update_product).delete(delete_product),
        )
        .route("/sku/{sku}", put(upsert_product_by_sku))
}
