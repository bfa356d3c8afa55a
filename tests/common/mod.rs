#![allow(dead_code)]

use axum_test::TestServer;
use inventory_server::core::AppState;
use sqlx::MySqlPool;
use std::sync::Arc;
use uuid::{Uuid, uuid};

// UUID caricati dai fixtures in ../fixtures
pub const HARDWARE: Uuid = uuid!("11111111-1111-7111-8111-000000000001");
pub const GARDEN: Uuid = uuid!("11111111-1111-7111-8111-000000000002");
/// Categoria già cancellata logicamente nei fixtures
pub const DISCONTINUED: Uuid = uuid!("11111111-1111-7111-8111-000000000003");

pub const ACME: Uuid = uuid!("22222222-2222-7222-8222-000000000001");
pub const NORTHWIND: Uuid = uuid!("22222222-2222-7222-8222-000000000002");

pub const ALICE: Uuid = uuid!("33333333-3333-7333-8333-000000000001");

/// Claw Hammer, SKU-001: Hardware, Acme, Alice, due immagini
pub const CLAW_HAMMER: Uuid = uuid!("44444444-4444-7444-8444-000000000001");
pub const SCREWDRIVER_SET: Uuid = uuid!("44444444-4444-7444-8444-000000000002");
pub const GARDEN_HOSE: Uuid = uuid!("44444444-4444-7444-8444-000000000004");
/// Inattivo, senza categoria
pub const MYSTERY_BOX: Uuid = uuid!("44444444-4444-7444-8444-000000000008");

pub const ACTIVE_PRODUCTS: u64 = 5;
pub const ALL_PRODUCTS: u64 = 8;

/// Crea un AppState per i test
///
/// # Arguments
/// * `pool` - Connection pool MySQL
///
/// # Returns
/// Arc<AppState> con tutti i repository sul pool di test
pub fn create_test_state(pool: MySqlPool) -> Arc<AppState> {
    Arc::new(AppState::new(pool))
}

/// Crea un TestServer per i test
///
/// # Arguments
/// * `state` - AppState da utilizzare per il server
///
/// # Returns
/// TestServer configurato e pronto per eseguire richieste
pub fn create_test_server(state: Arc<AppState>) -> TestServer {
    let app = inventory_server::create_router(state);
    TestServer::new(app).expect("Failed to create test server")
}

/// Conta le righe di una tabella ignorando qualsiasi scope (anche i record cancellati logicamente)
pub async fn raw_count(pool: &MySqlPool, table: &str) -> i64 {
    sqlx::query_scalar(&format!("SELECT COUNT(*) FROM `{table}`"))
        .fetch_one(pool)
        .await
        .expect("Failed to count rows")
}
