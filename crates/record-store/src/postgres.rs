use std::marker::PhantomData;

use async_trait::async_trait;
use serde_json::Value;
use sqlx::types::Json;
use sqlx::{PgPool, Row, postgres::PgRow};

use crate::{
    Fields, Record, RecordFilter, RecordId, Result, StoreError, field_value,
    store::{RecordStore, validate_update},
};

/// SQLSTATE for unique_violation.
const UNIQUE_VIOLATION: &str = "23505";

/// PostgreSQL-backed record store.
///
/// Records of every collection share one JSONB document table. Unique
/// fields are enforced by partial expression indexes named
/// `uq_<collection>_<field>` (see `migrations/`).
pub struct PostgresRecordStore<R> {
    pool: PgPool,
    _record: PhantomData<fn() -> R>,
}

impl<R> Clone for PostgresRecordStore<R> {
    fn clone(&self) -> Self {
        Self {
            pool: self.pool.clone(),
            _record: PhantomData,
        }
    }
}

impl<R: Record> PostgresRecordStore<R> {
    /// Creates a new PostgreSQL record store.
    pub fn new(pool: PgPool) -> Self {
        Self {
            pool,
            _record: PhantomData,
        }
    }

    /// Gets a reference to the underlying connection pool.
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Runs the database migrations.
    pub async fn run_migrations(&self) -> std::result::Result<(), sqlx::migrate::MigrateError> {
        sqlx::migrate!("../../migrations").run(&self.pool).await
    }

    fn row_to_record(row: PgRow) -> Result<R> {
        let Json(body): Json<Value> = row.try_get("body")?;
        Ok(serde_json::from_value(body)?)
    }

    /// Maps a unique-index violation to `DuplicateKey`.
    fn map_write_error(e: sqlx::Error, document: &Value) -> StoreError {
        if let sqlx::Error::Database(ref db_err) = e
            && db_err.code().as_deref() == Some(UNIQUE_VIOLATION)
        {
            let constraint = db_err.constraint().unwrap_or_default();
            let field = R::UNIQUE_FIELDS
                .iter()
                .find(|field| constraint == format!("uq_{}_{}", R::COLLECTION, field))
                .map(|field| field.to_string())
                .unwrap_or_else(|| constraint.to_string());
            let value = field_value(document, &field).unwrap_or_default();
            return StoreError::DuplicateKey {
                collection: R::COLLECTION,
                field,
                value,
            };
        }
        StoreError::Database(e)
    }
}

#[async_trait]
impl<R: Record> RecordStore<R> for PostgresRecordStore<R> {
    async fn find(&self, filter: &RecordFilter) -> Result<Option<R>> {
        let mut sql = String::from("SELECT body FROM records WHERE collection = $1");
        let mut param_count = 1;
        for _ in filter.conditions() {
            sql.push_str(&format!(
                " AND body -> ${} = ${}",
                param_count + 1,
                param_count + 2
            ));
            param_count += 2;
        }
        sql.push_str(" ORDER BY created_at ASC, seq ASC LIMIT 1");

        let mut query = sqlx::query(&sql).bind(R::COLLECTION);
        for (field, value) in filter.conditions() {
            query = query.bind(field.as_str()).bind(Json(value.clone()));
        }

        let row = query.fetch_optional(&self.pool).await?;
        row.map(Self::row_to_record).transpose()
    }

    async fn get(&self, id: RecordId) -> Result<Option<R>> {
        let row = sqlx::query("SELECT body FROM records WHERE collection = $1 AND id = $2")
            .bind(R::COLLECTION)
            .bind(id.as_uuid())
            .fetch_optional(&self.pool)
            .await?;

        row.map(Self::row_to_record).transpose()
    }

    async fn create(&self, record: R) -> Result<R> {
        let document = serde_json::to_value(&record)?;

        sqlx::query("INSERT INTO records (collection, id, body) VALUES ($1, $2, $3)")
            .bind(R::COLLECTION)
            .bind(record.id().as_uuid())
            .bind(Json(&document))
            .execute(&self.pool)
            .await
            .map_err(|e| Self::map_write_error(e, &document))?;

        Ok(record)
    }

    async fn update(&self, id: RecordId, fields: Fields) -> Result<R> {
        validate_update(&fields)?;
        let patch = Value::Object(fields);

        let row = sqlx::query(
            r#"
            UPDATE records
            SET body = body || $3, updated_at = NOW()
            WHERE collection = $1 AND id = $2
            RETURNING body
            "#,
        )
        .bind(R::COLLECTION)
        .bind(id.as_uuid())
        .bind(Json(&patch))
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| Self::map_write_error(e, &patch))?;

        match row {
            Some(row) => Self::row_to_record(row),
            None => Err(StoreError::NotFound {
                collection: R::COLLECTION,
                id,
            }),
        }
    }

    async fn delete(&self, id: RecordId) -> Result<()> {
        let result = sqlx::query("DELETE FROM records WHERE collection = $1 AND id = $2")
            .bind(R::COLLECTION)
            .bind(id.as_uuid())
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound {
                collection: R::COLLECTION,
                id,
            });
        }
        Ok(())
    }

    async fn list(&self) -> Result<Vec<R>> {
        let rows = sqlx::query(
            "SELECT body FROM records WHERE collection = $1 ORDER BY created_at ASC, seq ASC",
        )
        .bind(R::COLLECTION)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(Self::row_to_record).collect()
    }
}
