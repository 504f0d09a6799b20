//! PostgreSQL integration tests
//!
//! These tests use a shared PostgreSQL container for efficiency.
//! Run with:
//!
//! ```bash
//! cargo test -p record-store --test postgres_integration -- --test-threads=1
//! ```

use std::sync::Arc;

use record_store::{
    Fields, PostgresRecordStore, Record, RecordFilter, RecordId, RecordStore, RecordStoreExt,
    StoreError,
};
use serde::{Deserialize, Serialize};
use serial_test::serial;
use sqlx::PgPool;
use testcontainers::{ContainerAsync, runners::AsyncRunner};
use testcontainers_modules::postgres::Postgres;
use tokio::sync::OnceCell;

/// Shared container info - container stays alive for all tests
struct ContainerInfo {
    #[allow(dead_code)] // Container must stay alive for tests
    container: ContainerAsync<Postgres>,
    connection_string: String,
}

/// Global shared container
static CONTAINER: OnceCell<Arc<ContainerInfo>> = OnceCell::const_new();

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct Tag {
    id: RecordId,
    code: String,
    label: String,
}

impl Record for Tag {
    // Shares the products collection so the code index applies
    const COLLECTION: &'static str = "products";
    const UNIQUE_FIELDS: &'static [&'static str] = &["code"];

    fn id(&self) -> RecordId {
        self.id
    }
}

fn tag(code: &str) -> Tag {
    Tag {
        id: RecordId::new(),
        code: code.to_string(),
        label: "Tag".to_string(),
    }
}

async fn get_container_info() -> Arc<ContainerInfo> {
    CONTAINER
        .get_or_init(|| async {
            let container = Postgres::default().start().await.unwrap();

            let host = container.get_host().await.unwrap();
            let port = container.get_host_port_ipv4(5432).await.unwrap();

            let connection_string =
                format!("postgres://postgres:postgres@{}:{}/postgres", host, port);

            // Create a temporary pool just for migrations
            let temp_pool = PgPool::connect(&connection_string).await.unwrap();

            // Run migrations using raw_sql to execute multiple statements
            sqlx::raw_sql(include_str!(
                "../../../migrations/001_create_records_table.sql"
            ))
            .execute(&temp_pool)
            .await
            .unwrap();

            temp_pool.close().await;

            Arc::new(ContainerInfo {
                container,
                connection_string,
            })
        })
        .await
        .clone()
}

/// Get a fresh store with its own pool and cleared tables
async fn get_test_store() -> PostgresRecordStore<Tag> {
    let info = get_container_info().await;

    let pool = sqlx::postgres::PgPoolOptions::new()
        .max_connections(5)
        .connect(&info.connection_string)
        .await
        .unwrap();

    sqlx::query("TRUNCATE TABLE records")
        .execute(&pool)
        .await
        .unwrap();

    PostgresRecordStore::new(pool)
}

fn label_patch(label: &str) -> Fields {
    let mut fields = Fields::new();
    fields.insert("label".to_string(), serde_json::json!(label));
    fields
}

#[tokio::test]
#[serial]
async fn create_and_get_record() {
    let store = get_test_store().await;
    let t = tag("T-1");

    store.create(t.clone()).await.unwrap();

    let loaded = store.get(t.id).await.unwrap();
    assert_eq!(loaded, Some(t));
}

#[tokio::test]
#[serial]
async fn find_by_code() {
    let store = get_test_store().await;
    store.create(tag("T-1")).await.unwrap();
    let t2 = store.create(tag("T-2")).await.unwrap();

    let found = store.find(&RecordFilter::eq("code", "T-2")).await.unwrap();
    assert_eq!(found, Some(t2));
    assert!(
        !store
            .exists(&RecordFilter::eq("code", "T-9"))
            .await
            .unwrap()
    );
}

#[tokio::test]
#[serial]
async fn unique_index_maps_to_duplicate_key() {
    let store = get_test_store().await;
    store.create(tag("T-1")).await.unwrap();

    let result = store.create(tag("T-1")).await;
    match result {
        Err(StoreError::DuplicateKey { field, value, .. }) => {
            assert_eq!(field, "code");
            assert_eq!(value, "T-1");
        }
        other => panic!("expected DuplicateKey, got {other:?}"),
    }
}

#[tokio::test]
#[serial]
async fn update_merges_fields() {
    let store = get_test_store().await;
    let t = store.create(tag("T-1")).await.unwrap();

    let updated = store.update(t.id, label_patch("Renamed")).await.unwrap();
    assert_eq!(updated.label, "Renamed");
    assert_eq!(updated.code, "T-1");
}

#[tokio::test]
#[serial]
async fn update_and_delete_unknown_id() {
    let store = get_test_store().await;

    let update = store.update(RecordId::new(), label_patch("x")).await;
    assert!(update.unwrap_err().is_not_found());

    let delete = store.delete(RecordId::new()).await;
    assert!(delete.unwrap_err().is_not_found());
}

#[tokio::test]
#[serial]
async fn delete_removes_record() {
    let store = get_test_store().await;
    let t = store.create(tag("T-1")).await.unwrap();

    store.delete(t.id).await.unwrap();
    assert_eq!(store.get(t.id).await.unwrap(), None);
    assert!(!store.delete_if_exists(t.id).await.unwrap());
}

#[tokio::test]
#[serial]
async fn list_in_insertion_order() {
    let store = get_test_store().await;
    for code in ["C", "A", "B"] {
        store.create(tag(code)).await.unwrap();
    }

    let codes: Vec<String> = store
        .list()
        .await
        .unwrap()
        .into_iter()
        .map(|t| t.code)
        .collect();
    assert_eq!(codes, vec!["C", "A", "B"]);
}
