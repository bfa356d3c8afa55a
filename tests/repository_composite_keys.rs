//! Integration tests per le entità con chiave composta
//!
//! Le entità con chiave composta non vengono ricaricate dopo una scrittura: il repository
//! restituisce la copia locale con i valori scritti.

#[cfg(test)]
mod composite_key_tests {
    use chrono::{DateTime, Utc};
    use inventory_server::repositories::error::is_rejection;
    use inventory_server::repositories::{
        BaseRepository, Column, ColumnKind, KeyOrModel, Model, Repository, RepositoryError,
        attributes,
    };
    use serde::{Deserialize, Serialize};
    use serde_json::json;
    use sqlx::MySqlPool;
    use uuid::{Uuid, uuid};

    const HAMMER: Uuid = uuid!("44444444-4444-7444-8444-000000000001");

    /// Giacenza di un prodotto in un magazzino
    #[derive(Serialize, Deserialize, Debug, Clone, PartialEq, sqlx::FromRow)]
    struct WarehouseStock {
        warehouse_code: String,
        product_id: Uuid,
        quantity: i32,
        /// Aggiornato dal database (ON UPDATE CURRENT_TIMESTAMP)
        touched_at: Option<DateTime<Utc>>,
    }

    impl Model for WarehouseStock {
        type Key = (String, Uuid);

        const TABLE: &'static str = "warehouse_stock";
        const PRIMARY_KEY: &'static [&'static str] = &["warehouse_code", "product_id"];
        const COLUMNS: &'static [Column] = &[
            Column::new("warehouse_code", ColumnKind::Text),
            Column::new("product_id", ColumnKind::Uuid),
            Column::new("quantity", ColumnKind::Integer),
            Column::new("touched_at", ColumnKind::Timestamp),
        ];
        const FILLABLE: &'static [&'static str] = &["warehouse_code", "product_id", "quantity"];

        fn key(&self) -> (String, Uuid) {
            (self.warehouse_code.clone(), self.product_id)
        }
    }

    async fn setup(pool: MySqlPool) -> Repository<WarehouseStock> {
        sqlx::query(
            "CREATE TABLE warehouse_stock (
                warehouse_code VARCHAR(16) NOT NULL,
                product_id BINARY(16) NOT NULL,
                quantity INT NOT NULL DEFAULT 0,
                touched_at TIMESTAMP NULL DEFAULT NULL ON UPDATE CURRENT_TIMESTAMP,
                PRIMARY KEY (warehouse_code, product_id)
            )",
        )
        .execute(&pool)
        .await
        .expect("Failed to create warehouse_stock");

        Repository::new(pool)
    }

    fn key(code: &str) -> KeyOrModel<WarehouseStock> {
        KeyOrModel::Key((code.to_string(), HAMMER))
    }

    #[sqlx::test]
    async fn test_create_returns_local_entity(pool: MySqlPool) {
        let repo = setup(pool).await;

        let stock = repo
            .create(&attributes(json!({
                "warehouse_code": "MI-1",
                "product_id": HAMMER,
                "quantity": 5,
            })))
            .await
            .unwrap()
            .unwrap();

        assert_eq!(stock.key(), ("MI-1".to_string(), HAMMER));
        assert_eq!(stock.quantity, 5);

        let duplicate = repo
            .create(&attributes(json!({"warehouse_code": "MI-1", "product_id": HAMMER})))
            .await
            .unwrap();
        assert!(duplicate.is_none());
    }

    #[sqlx::test]
    async fn test_update_returns_local_entity_without_reload(pool: MySqlPool) {
        let repo = setup(pool).await;
        repo.create(&attributes(json!({
            "warehouse_code": "MI-1",
            "product_id": HAMMER,
            "quantity": 5,
        })))
        .await
        .unwrap()
        .unwrap();

        let updated = repo
            .update(key("MI-1"), &attributes(json!({"quantity": 9})))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(updated.quantity, 9);
        // valore impostato dal database, non visibile senza ricaricare
        assert!(updated.touched_at.is_none());

        let reloaded = repo
            .find(&("MI-1".to_string(), HAMMER))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(reloaded.quantity, 9);
        assert!(reloaded.touched_at.is_some());

        let err = repo
            .update(key("TO-9"), &attributes(json!({"quantity": 1})))
            .await
            .unwrap_err();
        assert!(err.is_not_found());
    }

    #[sqlx::test]
    async fn test_find_or_fail_with_composite_key(pool: MySqlPool) {
        let repo = setup(pool).await;
        repo.insert(&[
            attributes(json!({"warehouse_code": "MI-1", "product_id": HAMMER, "quantity": 3})),
            attributes(json!({"warehouse_code": "RM-2", "product_id": HAMMER, "quantity": 7})),
        ])
        .await
        .unwrap();

        let rome = repo.find_or_fail(json!(["RM-2", HAMMER]), None).await.unwrap();
        assert_eq!(rome.quantity, 7);

        let err = repo.find_or_fail(json!("RM-2"), None).await.unwrap_err();
        assert!(matches!(err, RepositoryError::InvalidFilter { .. }));

        let err = repo.find_or_fail(json!(["NA-3", HAMMER]), None).await.unwrap_err();
        assert!(err.is_not_found());
    }

    #[sqlx::test]
    async fn test_update_or_create_and_delete(pool: MySqlPool) {
        let repo = setup(pool).await;
        let lookup = attributes(json!({"warehouse_code": "MI-1", "product_id": HAMMER}));

        let created = repo
            .update_or_create(&lookup, &attributes(json!({"quantity": 1})))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(created.quantity, 1);

        let updated = repo
            .update_or_create(&lookup, &attributes(json!({"quantity": 2})))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(updated.quantity, 2);
        assert_eq!(repo.find_many(&lookup).await.unwrap().len(), 1);

        assert!(repo.delete(key("MI-1")).await.unwrap());
        assert!(repo.find_many(&lookup).await.unwrap().is_empty());
    }

    #[sqlx::test]
    async fn test_create_and_update_with_coerced_values(pool: MySqlPool) {
        let repo = setup(pool).await;

        // "5" è accettato per una colonna intera: l'entità restituita ha il valore convertito
        let stock = repo
            .create(&attributes(json!({
                "warehouse_code": "MI-1",
                "product_id": HAMMER.to_string(),
                "quantity": "5",
            })))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(stock.quantity, 5);

        let updated = repo
            .update(key("MI-1"), &attributes(json!({"quantity": "8"})))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(updated.quantity, 8);

        let upserted = repo
            .update_or_create(
                &attributes(json!({"warehouse_code": "RM-2", "product_id": HAMMER})),
                &attributes(json!({"quantity": "2"})),
            )
            .await
            .unwrap()
            .unwrap();
        assert_eq!(upserted.quantity, 2);
    }

    #[sqlx::test]
    async fn test_create_reloads_columns_left_to_default(pool: MySqlPool) {
        let repo = setup(pool).await;

        let stock = repo
            .create(&attributes(json!({"warehouse_code": "MI-1", "product_id": HAMMER})))
            .await
            .unwrap()
            .unwrap();

        assert_eq!(stock.key(), ("MI-1".to_string(), HAMMER));
        assert_eq!(stock.quantity, 0);
    }

    #[sqlx::test]
    async fn test_engine_failures_are_not_swallowed(pool: MySqlPool) {
        // nessuna tabella warehouse_stock: non è un dato rifiutato, è un errore
        let repo: Repository<WarehouseStock> = Repository::new(pool);

        let err = repo
            .create(&attributes(json!({"warehouse_code": "MI-1", "product_id": HAMMER})))
            .await
            .unwrap_err();
        assert!(matches!(err, RepositoryError::Database(_)));

        let err = repo
            .insert(&[attributes(json!({"warehouse_code": "MI-1", "product_id": HAMMER}))])
            .await
            .unwrap_err();
        assert!(matches!(err, RepositoryError::Database(_)));
    }

    #[sqlx::test]
    async fn test_database_errors_are_classified(pool: MySqlPool) {
        setup(pool.clone()).await;
        let insert = "INSERT INTO warehouse_stock (warehouse_code, product_id, quantity) VALUES (?, ?, ?)";

        sqlx::query(insert)
            .bind("MI-1")
            .bind(HAMMER)
            .bind(1)
            .execute(&pool)
            .await
            .unwrap();

        let duplicate = sqlx::query(insert)
            .bind("MI-1")
            .bind(HAMMER)
            .bind(2)
            .execute(&pool)
            .await
            .unwrap_err();
        assert!(is_rejection(&duplicate));

        let null_code = sqlx::query(insert)
            .bind(None::<String>)
            .bind(HAMMER)
            .bind(2)
            .execute(&pool)
            .await
            .unwrap_err();
        assert!(is_rejection(&null_code));

        let missing_table = sqlx::query("SELECT * FROM warehouse_archive")
            .execute(&pool)
            .await
            .unwrap_err();
        assert!(!is_rejection(&missing_table));
    }
}
