use async_trait::async_trait;

use crate::{Fields, Record, RecordFilter, RecordId, Result, StoreError};

/// Core trait for record store implementations.
///
/// Every mutation touches exactly one record, addressed by id. There are no
/// multi-record transactions. All implementations must be thread-safe
/// (Send + Sync).
#[async_trait]
pub trait RecordStore<R: Record>: Send + Sync {
    /// Returns the first record matching the filter, in insertion order.
    async fn find(&self, filter: &RecordFilter) -> Result<Option<R>>;

    /// Loads a record by id.
    async fn get(&self, id: RecordId) -> Result<Option<R>>;

    /// Persists a new record.
    ///
    /// Fails with `DuplicateKey` if any of `R::UNIQUE_FIELDS` is already
    /// taken by another record.
    async fn create(&self, record: R) -> Result<R>;

    /// Merges the given top-level fields into an existing record.
    ///
    /// Returns the updated record, or `NotFound` if the id is unknown.
    async fn update(&self, id: RecordId, fields: Fields) -> Result<R>;

    /// Deletes a record by id.
    ///
    /// Returns `NotFound` if the id is unknown.
    async fn delete(&self, id: RecordId) -> Result<()>;

    /// Returns all records in insertion order.
    async fn list(&self) -> Result<Vec<R>>;
}

/// Extension trait providing convenience methods for record stores.
#[async_trait]
pub trait RecordStoreExt<R: Record>: RecordStore<R> {
    /// Checks whether any record matches the filter.
    async fn exists(&self, filter: &RecordFilter) -> Result<bool> {
        Ok(self.find(filter).await?.is_some())
    }

    /// Deletes a record, treating an already-missing record as success.
    ///
    /// Returns true if a record was actually removed.
    async fn delete_if_exists(&self, id: RecordId) -> Result<bool> {
        match self.delete(id).await {
            Ok(()) => Ok(true),
            Err(StoreError::NotFound { .. }) => Ok(false),
            Err(e) => Err(e),
        }
    }
}

// Blanket implementation for all RecordStore implementations
impl<R: Record, T: RecordStore<R> + ?Sized> RecordStoreExt<R> for T {}

/// Validates a partial update before it is applied.
pub fn validate_update(fields: &Fields) -> Result<()> {
    if fields.is_empty() {
        return Err(StoreError::InvalidUpdate(
            "update must change at least one field".to_string(),
        ));
    }
    if fields.contains_key("id") {
        return Err(StoreError::InvalidUpdate(
            "the id field cannot be updated".to_string(),
        ));
    }
    Ok(())
}
