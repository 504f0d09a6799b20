use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::RwLock;

use crate::{
    Fields, Record, RecordFilter, RecordId, Result, StoreError, field_value,
    store::{RecordStore, validate_update},
};

struct StoredRecord<R> {
    record: R,
    document: Value,
}

struct InMemoryState<R> {
    records: Vec<StoredRecord<R>>,
    unavailable: bool,
    fail_on_update: bool,
}

impl<R> Default for InMemoryState<R> {
    fn default() -> Self {
        Self {
            records: Vec::new(),
            unavailable: false,
            fail_on_update: false,
        }
    }
}

/// In-memory record store implementation for testing and local runs.
///
/// Enforces `R::UNIQUE_FIELDS` the way a unique index would, so the
/// duplicate-key backstop behaves the same as the PostgreSQL store.
pub struct InMemoryRecordStore<R: Record> {
    state: Arc<RwLock<InMemoryState<R>>>,
}

impl<R: Record> Clone for InMemoryRecordStore<R> {
    fn clone(&self) -> Self {
        Self {
            state: Arc::clone(&self.state),
        }
    }
}

impl<R: Record> Default for InMemoryRecordStore<R> {
    fn default() -> Self {
        Self {
            state: Arc::new(RwLock::new(InMemoryState::default())),
        }
    }
}

impl<R: Record> InMemoryRecordStore<R> {
    /// Creates a new empty in-memory record store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of records stored.
    pub async fn record_count(&self) -> usize {
        self.state.read().await.records.len()
    }

    /// Makes every subsequent call fail with `Unavailable`.
    pub async fn set_unavailable(&self, unavailable: bool) {
        self.state.write().await.unavailable = unavailable;
    }

    /// Makes every subsequent `update` fail with `Unavailable`.
    pub async fn set_fail_on_update(&self, fail: bool) {
        self.state.write().await.fail_on_update = fail;
    }

    /// Removes all records.
    pub async fn clear(&self) {
        self.state.write().await.records.clear();
    }

    fn check_available(state: &InMemoryState<R>) -> Result<()> {
        if state.unavailable {
            return Err(StoreError::Unavailable(format!(
                "{} store is offline",
                R::COLLECTION
            )));
        }
        Ok(())
    }

    fn check_unique(
        state: &InMemoryState<R>,
        document: &Value,
        skip: Option<RecordId>,
    ) -> Result<()> {
        for field in R::UNIQUE_FIELDS {
            let Some(value) = field_value(document, field) else {
                continue;
            };
            let taken = state
                .records
                .iter()
                .filter(|stored| Some(stored.record.id()) != skip)
                .any(|stored| {
                    field_value(&stored.document, field).as_deref() == Some(value.as_str())
                });
            if taken {
                return Err(StoreError::DuplicateKey {
                    collection: R::COLLECTION,
                    field: field.to_string(),
                    value,
                });
            }
        }
        Ok(())
    }
}

#[async_trait]
impl<R: Record> RecordStore<R> for InMemoryRecordStore<R> {
    async fn find(&self, filter: &RecordFilter) -> Result<Option<R>> {
        let state = self.state.read().await;
        Self::check_available(&state)?;

        Ok(state
            .records
            .iter()
            .find(|stored| filter.matches(&stored.document))
            .map(|stored| stored.record.clone()))
    }

    async fn get(&self, id: RecordId) -> Result<Option<R>> {
        let state = self.state.read().await;
        Self::check_available(&state)?;

        Ok(state
            .records
            .iter()
            .find(|stored| stored.record.id() == id)
            .map(|stored| stored.record.clone()))
    }

    async fn create(&self, record: R) -> Result<R> {
        let mut state = self.state.write().await;
        Self::check_available(&state)?;

        let id = record.id();
        if state.records.iter().any(|stored| stored.record.id() == id) {
            return Err(StoreError::DuplicateKey {
                collection: R::COLLECTION,
                field: "id".to_string(),
                value: id.to_string(),
            });
        }

        let document = serde_json::to_value(&record)?;
        Self::check_unique(&state, &document, None)?;

        state.records.push(StoredRecord {
            record: record.clone(),
            document,
        });
        Ok(record)
    }

    async fn update(&self, id: RecordId, fields: Fields) -> Result<R> {
        validate_update(&fields)?;

        let mut state = self.state.write().await;
        Self::check_available(&state)?;
        if state.fail_on_update {
            return Err(StoreError::Unavailable(format!(
                "{} store rejected the update",
                R::COLLECTION
            )));
        }

        let position = state
            .records
            .iter()
            .position(|stored| stored.record.id() == id)
            .ok_or(StoreError::NotFound {
                collection: R::COLLECTION,
                id,
            })?;

        let mut document = state.records[position].document.clone();
        if let Value::Object(map) = &mut document {
            map.extend(fields);
        }
        let record: R = serde_json::from_value(document.clone())?;
        Self::check_unique(&state, &document, Some(id))?;

        state.records[position] = StoredRecord {
            record: record.clone(),
            document,
        };
        Ok(record)
    }

    async fn delete(&self, id: RecordId) -> Result<()> {
        let mut state = self.state.write().await;
        Self::check_available(&state)?;

        let position = state
            .records
            .iter()
            .position(|stored| stored.record.id() == id)
            .ok_or(StoreError::NotFound {
                collection: R::COLLECTION,
                id,
            })?;
        state.records.remove(position);
        Ok(())
    }

    async fn list(&self) -> Result<Vec<R>> {
        let state = self.state.read().await;
        Self::check_available(&state)?;

        Ok(state
            .records
            .iter()
            .map(|stored| stored.record.clone())
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::RecordStoreExt;
    use serde::{Deserialize, Serialize};
    use serde_json::json;

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    struct Widget {
        id: RecordId,
        code: String,
        label: String,
        #[serde(default)]
        serial: Option<String>,
    }

    impl Record for Widget {
        const COLLECTION: &'static str = "widgets";
        const UNIQUE_FIELDS: &'static [&'static str] = &["code", "serial"];

        fn id(&self) -> RecordId {
            self.id
        }
    }

    fn widget(code: &str) -> Widget {
        Widget {
            id: RecordId::new(),
            code: code.to_string(),
            label: "Widget".to_string(),
            serial: None,
        }
    }

    fn fields(value: Value) -> Fields {
        match value {
            Value::Object(map) => map,
            _ => panic!("expected object"),
        }
    }

    #[tokio::test]
    async fn test_create_and_get() {
        let store = InMemoryRecordStore::new();
        let w = widget("W-1");

        store.create(w.clone()).await.unwrap();

        assert_eq!(store.get(w.id).await.unwrap(), Some(w));
        assert_eq!(store.record_count().await, 1);
    }

    #[tokio::test]
    async fn test_find_by_field() {
        let store = InMemoryRecordStore::new();
        store.create(widget("W-1")).await.unwrap();
        let w2 = store.create(widget("W-2")).await.unwrap();

        let found = store.find(&RecordFilter::eq("code", "W-2")).await.unwrap();
        assert_eq!(found, Some(w2));

        assert!(
            !store
                .exists(&RecordFilter::eq("code", "W-3"))
                .await
                .unwrap()
        );
    }

    #[tokio::test]
    async fn test_unique_index_rejects_duplicate_create() {
        let store = InMemoryRecordStore::new();
        store.create(widget("W-1")).await.unwrap();

        let result = store.create(widget("W-1")).await;
        match result {
            Err(StoreError::DuplicateKey { field, value, .. }) => {
                assert_eq!(field, "code");
                assert_eq!(value, "W-1");
            }
            other => panic!("expected DuplicateKey, got {other:?}"),
        }
        assert_eq!(store.record_count().await, 1);
    }

    #[tokio::test]
    async fn test_null_fields_do_not_collide() {
        let store = InMemoryRecordStore::new();
        store.create(widget("W-1")).await.unwrap();
        store.create(widget("W-2")).await.unwrap();
        assert_eq!(store.record_count().await, 2);
    }

    #[tokio::test]
    async fn test_update_merges_fields() {
        let store = InMemoryRecordStore::new();
        let w = store.create(widget("W-1")).await.unwrap();

        let updated = store
            .update(w.id, fields(json!({"label": "Renamed"})))
            .await
            .unwrap();

        assert_eq!(updated.label, "Renamed");
        assert_eq!(updated.code, "W-1");
        assert_eq!(store.get(w.id).await.unwrap().unwrap().label, "Renamed");
        assert!(
            store
                .exists(&RecordFilter::eq("label", "Renamed"))
                .await
                .unwrap()
        );
    }

    #[tokio::test]
    async fn test_update_respects_unique_index() {
        let store = InMemoryRecordStore::new();
        store.create(widget("W-1")).await.unwrap();
        let w2 = store.create(widget("W-2")).await.unwrap();

        let result = store.update(w2.id, fields(json!({"code": "W-1"}))).await;
        assert!(result.unwrap_err().is_duplicate_key());

        // Updating a record to its own value is not a collision
        let same = store.update(w2.id, fields(json!({"code": "W-2"}))).await;
        assert!(same.is_ok());
    }

    #[tokio::test]
    async fn test_update_unknown_id() {
        let store: InMemoryRecordStore<Widget> = InMemoryRecordStore::new();
        let result = store
            .update(RecordId::new(), fields(json!({"label": "x"})))
            .await;
        assert!(result.unwrap_err().is_not_found());
    }

    #[tokio::test]
    async fn test_delete_and_delete_if_exists() {
        let store = InMemoryRecordStore::new();
        let w = store.create(widget("W-1")).await.unwrap();

        store.delete(w.id).await.unwrap();
        assert_eq!(store.get(w.id).await.unwrap(), None);

        assert!(store.delete(w.id).await.unwrap_err().is_not_found());
        assert!(!store.delete_if_exists(w.id).await.unwrap());
    }

    #[tokio::test]
    async fn test_list_preserves_insertion_order() {
        let store = InMemoryRecordStore::new();
        for code in ["C", "A", "B"] {
            store.create(widget(code)).await.unwrap();
        }

        let codes: Vec<String> = store
            .list()
            .await
            .unwrap()
            .into_iter()
            .map(|w| w.code)
            .collect();
        assert_eq!(codes, vec!["C", "A", "B"]);
    }

    #[tokio::test]
    async fn test_unavailable_store() {
        let store = InMemoryRecordStore::new();
        store.set_unavailable(true).await;

        let result = store.create(widget("W-1")).await;
        assert!(result.unwrap_err().is_unavailable());

        store.set_unavailable(false).await;
        assert!(store.create(widget("W-1")).await.is_ok());
    }

    #[tokio::test]
    async fn test_fail_on_update_only_affects_updates() {
        let store = InMemoryRecordStore::new();
        let w = store.create(widget("W-1")).await.unwrap();
        store.set_fail_on_update(true).await;

        let result = store.update(w.id, fields(json!({"label": "x"}))).await;
        assert!(result.unwrap_err().is_unavailable());
        assert_eq!(store.get(w.id).await.unwrap().unwrap().label, "Widget");
    }

    #[tokio::test]
    async fn test_clones_share_state() {
        let store = InMemoryRecordStore::new();
        let clone = store.clone();
        store.create(widget("W-1")).await.unwrap();
        assert_eq!(clone.record_count().await, 1);

        clone.clear().await;
        assert_eq!(store.record_count().await, 0);
    }
}
