use async_trait::async_trait;
use serde_json::Value;
use sqlx::{PgPool, types::Json};
use uuid::Uuid;

use super::{Collection, Document, DocumentStore, Filter, FilterOp, StoredDocument};
use crate::errors::BackendError;

/// Document store backed by a single PostgreSQL table of JSONB documents.
#[derive(Clone)]
pub struct PgDocumentStore {
    pool: PgPool,
}

impl PgDocumentStore {
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn classify(err: sqlx::Error) -> BackendError {
    if let sqlx::Error::Database(db) = &err {
        if db.is_unique_violation() {
            return BackendError::Conflict(db.message().to_string());
        }
        if db.code().as_deref() == Some("42501") {
            return BackendError::PermissionDenied(db.message().to_string());
        }
    }
    if matches!(
        err,
        sqlx::Error::PoolTimedOut | sqlx::Error::PoolClosed | sqlx::Error::Io(_)
    ) {
        return BackendError::Unavailable(err.to_string());
    }
    BackendError::Database(err)
}

fn containment(filter: &Filter) -> Value {
    let mut needle = Document::new();
    needle.insert(filter.field.clone(), filter.value.clone());
    Value::Object(needle)
}

#[async_trait]
impl DocumentStore for PgDocumentStore {
    async fn create(&self, collection: Collection, fields: Document) -> Result<String, BackendError> {
        let id = Uuid::new_v4().simple().to_string();
        sqlx::query("INSERT INTO documents (collection, id, data) VALUES ($1, $2, $3)")
            .bind(collection.as_str())
            .bind(&id)
            .bind(Json(fields))
            .execute(&self.pool)
            .await
            .map_err(classify)?;
        Ok(id)
    }

    async fn set(&self, collection: Collection, id: &str, fields: Document) -> Result<(), BackendError> {
        sqlx::query(
            "INSERT INTO documents (collection, id, data) VALUES ($1, $2, $3)
             ON CONFLICT (collection, id) DO UPDATE SET data = EXCLUDED.data, updated_at = now()",
        )
        .bind(collection.as_str())
        .bind(id)
        .bind(Json(fields))
        .execute(&self.pool)
        .await
        .map_err(classify)?;
        Ok(())
    }

    async fn get(&self, collection: Collection, id: &str) -> Result<Option<Document>, BackendError> {
        let row = sqlx::query_as::<_, (Json<Document>,)>(
            "SELECT data FROM documents WHERE collection = $1 AND id = $2",
        )
        .bind(collection.as_str())
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(classify)?;
        Ok(row.map(|(Json(data),)| data))
    }

    async fn query(
        &self,
        collection: Collection,
        filter: &Filter,
    ) -> Result<Vec<StoredDocument>, BackendError> {
        let rows = match filter.op {
            FilterOp::Eq => {
                sqlx::query_as::<_, (String, Json<Document>)>(
                    "SELECT id, data FROM documents
                     WHERE collection = $1 AND data @> $2
                     ORDER BY inserted_at",
                )
                .bind(collection.as_str())
                .bind(Json(containment(filter)))
                .fetch_all(&self.pool)
                .await
            }
        }
        .map_err(classify)?;
        Ok(rows
            .into_iter()
            .map(|(id, Json(fields))| StoredDocument { id, fields })
            .collect())
    }

    async fn update(
        &self,
        collection: Collection,
        id: &str,
        partial: Document,
    ) -> Result<(), BackendError> {
        let result = sqlx::query(
            "UPDATE documents SET data = data || $3, updated_at = now()
             WHERE collection = $1 AND id = $2",
        )
        .bind(collection.as_str())
        .bind(id)
        .bind(Json(partial))
        .execute(&self.pool)
        .await
        .map_err(classify)?;
        if result.rows_affected() == 0 {
            return Err(BackendError::not_found(collection.as_str(), id));
        }
        Ok(())
    }

    async fn delete(&self, collection: Collection, id: &str) -> Result<(), BackendError> {
        let result = sqlx::query("DELETE FROM documents WHERE collection = $1 AND id = $2")
            .bind(collection.as_str())
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(classify)?;
        if result.rows_affected() == 0 {
            return Err(BackendError::not_found(collection.as_str(), id));
        }
        Ok(())
    }
}
