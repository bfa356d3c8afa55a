//! Integration tests per la cancellazione (fisica e logica)
//!
//! Test per:
//! - delete sempre fisico, anche per le entità con cancellazione logica
//! - soft_delete / restore / find_with_trashed
//! - scope dei record cancellati logicamente nelle letture

mod common;

#[cfg(test)]
mod soft_delete_tests {
    use super::common::*;
    use inventory_server::repositories::{
        BaseRepository, CategoryRepository, ProductRepository, RepositoryError, Search, attributes,
    };
    use serde_json::json;
    use sqlx::MySqlPool;

    #[sqlx::test(fixtures(path = "../fixtures", scripts("users", "categories", "suppliers", "products")))]
    async fn test_delete_purges_soft_deletable_rows(pool: MySqlPool) {
        let repo = CategoryRepository::new(pool.clone());

        assert!(repo.delete(GARDEN).await.unwrap());

        // nessuna riga, nemmeno cancellata logicamente
        assert!(repo.find_with_trashed(&GARDEN).await.unwrap().is_none());
        assert_eq!(raw_count(&pool, "categories").await, 2);

        // ON DELETE SET NULL sui prodotti della categoria
        let hose = ProductRepository::new(pool).find(&GARDEN_HOSE).await.unwrap().unwrap();
        assert_eq!(hose.category_id, None);
    }

    #[sqlx::test(fixtures(path = "../fixtures", scripts("categories")))]
    async fn test_delete_trashed_model_purges_it(pool: MySqlPool) {
        let repo = CategoryRepository::new(pool.clone());

        // per chiave non si trova: la risoluzione rispetta lo scope
        let err = repo.delete(DISCONTINUED).await.unwrap_err();
        assert!(err.is_not_found());

        let trashed = repo.find_with_trashed(&DISCONTINUED).await.unwrap().unwrap();
        assert!(trashed.is_trashed());
        assert!(repo.delete(trashed).await.unwrap());
        assert_eq!(raw_count(&pool, "categories").await, 2);
    }

    #[sqlx::test(fixtures(path = "../fixtures", scripts("categories")))]
    async fn test_soft_delete_and_restore(pool: MySqlPool) {
        let repo = CategoryRepository::new(pool.clone());

        assert!(repo.soft_delete(HARDWARE).await.unwrap());
        assert!(repo.find(&HARDWARE).await.unwrap().is_none());
        assert_eq!(repo.count(&Search::new()).await.unwrap(), 1);
        assert_eq!(raw_count(&pool, "categories").await, 3);

        let trashed = repo.find_with_trashed(&HARDWARE).await.unwrap().unwrap();
        assert!(trashed.deleted_at.is_some());

        // già cancellata: per chiave non viene più risolta
        assert!(repo.soft_delete(HARDWARE).await.unwrap_err().is_not_found());
        assert!(repo.find_or_fail(json!(HARDWARE), None).await.unwrap_err().is_not_found());

        assert!(repo.restore(&HARDWARE).await.unwrap());
        assert!(!repo.restore(&HARDWARE).await.unwrap());
        let restored = repo.find(&HARDWARE).await.unwrap().unwrap();
        assert!(!restored.is_trashed());
        assert_eq!(repo.count(&Search::new()).await.unwrap(), 2);
    }

    #[sqlx::test(fixtures(path = "../fixtures", scripts("categories")))]
    async fn test_update_of_trashed_entity(pool: MySqlPool) {
        let repo = CategoryRepository::new(pool);

        let err = repo
            .update(DISCONTINUED, &attributes(json!({"name": "Back in stock"})))
            .await
            .unwrap_err();
        assert!(err.is_not_found());

        // con il model già caricato l'update avviene e il refresh ignora lo scope
        let trashed = repo.find_with_trashed(&DISCONTINUED).await.unwrap().unwrap();
        let renamed = repo
            .update(trashed, &attributes(json!({"name": "Archive"})))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(renamed.name, "Archive");
        assert!(renamed.is_trashed());
    }

    #[sqlx::test(fixtures(path = "../fixtures", scripts("users", "categories", "suppliers", "products")))]
    async fn test_soft_delete_requires_capability(pool: MySqlPool) {
        let repo = ProductRepository::new(pool);

        let err = repo.soft_delete(CLAW_HAMMER).await.unwrap_err();
        assert!(matches!(err, RepositoryError::SoftDeletesUnsupported { table: "products" }));

        let err = repo.restore(&CLAW_HAMMER).await.unwrap_err();
        assert!(matches!(err, RepositoryError::SoftDeletesUnsupported { .. }));

        // il prodotto non è stato toccato
        assert!(repo.find(&CLAW_HAMMER).await.unwrap().is_some());
    }

    #[sqlx::test(fixtures(path = "../fixtures", scripts("categories")))]
    async fn test_create_soft_deletable_entity(pool: MySqlPool) {
        let tools = CategoryRepository::new(pool)
            .create(&attributes(json!({"name": "Power tools", "deleted_at": "2024-01-01T00:00:00Z"})))
            .await
            .unwrap()
            .unwrap();

        assert_eq!(tools.name, "Power tools");
        // deleted_at non è fillable
        assert!(!tools.is_trashed());
    }
}
