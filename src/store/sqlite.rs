/// SQLite-backed document store
use crate::{
    error::{ShareError, ShareResult},
    model::DocumentRef,
    store::{has_field, merge, set_field, DocumentStore, WriteBatch, WriteOp},
};
use async_trait::async_trait;
use chrono::Utc;
use serde_json::Value;
use sqlx::{pool::PoolConnection, Row, Sqlite, SqliteConnection, SqlitePool};
use tracing::{debug, warn};

/// Document store keeping each document as a JSON blob
///
/// A batch runs inside one `BEGIN IMMEDIATE` transaction, so either every
/// write lands or none does, and concurrent batches wait on the busy
/// timeout for the write lock instead of failing on a read-to-write upgrade.
#[derive(Clone)]
pub struct SqliteDocumentStore {
    db: SqlitePool,
}

impl SqliteDocumentStore {
    pub fn new(db: SqlitePool) -> Self {
        Self { db }
    }

    async fn load(
        conn: &mut SqliteConnection,
        reference: &DocumentRef,
    ) -> ShareResult<Option<Value>> {
        let row = sqlx::query("SELECT data FROM document WHERE path = ?1")
            .bind(reference.path())
            .fetch_optional(&mut *conn)
            .await?;

        match row {
            Some(row) => {
                let data: String = row.try_get("data")?;
                Ok(Some(serde_json::from_str(&data)?))
            }
            None => Ok(None),
        }
    }

    async fn save(
        conn: &mut SqliteConnection,
        reference: &DocumentRef,
        data: &Value,
    ) -> ShareResult<()> {
        sqlx::query(
            r#"
            INSERT INTO document (path, collection, id, data, updated_at)
            VALUES (?1, ?2, ?3, ?4, ?5)
            ON CONFLICT(path) DO UPDATE SET data = excluded.data, updated_at = excluded.updated_at
            "#,
        )
        .bind(reference.path())
        .bind(&reference.collection)
        .bind(&reference.id)
        .bind(serde_json::to_string(data)?)
        .bind(Utc::now().to_rfc3339())
        .execute(&mut *conn)
        .await?;

        Ok(())
    }

    async fn apply(conn: &mut SqliteConnection, op: WriteOp) -> ShareResult<()> {
        match op {
            WriteOp::Require { reference, field } => {
                let document = Self::load(conn, &reference)
                    .await?
                    .ok_or_else(|| ShareError::NotFound(format!("Document {}", reference)))?;

                if has_field(&document, &field) {
                    Ok(())
                } else {
                    Err(ShareError::Authorization(format!(
                        "{} is not set on {}",
                        field, reference
                    )))
                }
            }
            WriteOp::Update {
                reference,
                field,
                value,
            } => {
                let mut document = Self::load(conn, &reference)
                    .await?
                    .ok_or_else(|| ShareError::NotFound(format!("Document {}", reference)))?;

                set_field(&mut document, &field, value).map_err(|e| {
                    ShareError::Store(format!("Failed to update {} on {}: {}", field, reference, e))
                })?;

                Self::save(conn, &reference, &document).await
            }
            WriteOp::SetMerge { reference, data } => {
                let mut document = Self::load(conn, &reference)
                    .await?
                    .unwrap_or_else(|| Value::Object(Default::default()));

                merge(&mut document, data);

                Self::save(conn, &reference, &document).await
            }
        }
    }

    async fn apply_all(conn: &mut SqliteConnection, batch: WriteBatch) -> ShareResult<()> {
        for op in batch.into_ops() {
            Self::apply(conn, op).await?;
        }
        sqlx::query("COMMIT").execute(&mut *conn).await?;
        Ok(())
    }

    /// Roll back after a failed batch
    ///
    /// A connection that cannot be rolled back is still inside the
    /// transaction, so it is closed instead of going back to the pool.
    async fn abort(mut conn: PoolConnection<Sqlite>) {
        if let Err(e) = sqlx::query("ROLLBACK").execute(&mut *conn).await {
            warn!("Failed to roll back batch, closing connection: {}", e);
            drop(conn.detach());
        }
    }

    /// Write a whole document, replacing any existing one
    pub async fn put(&self, reference: &DocumentRef, data: &Value) -> ShareResult<()> {
        let mut conn = self.db.acquire().await?;
        Self::save(&mut conn, reference, data).await
    }
}

#[async_trait]
impl DocumentStore for SqliteDocumentStore {
    async fn commit(&self, batch: WriteBatch) -> ShareResult<()> {
        let count = batch.len();
        let mut conn = self.db.acquire().await?;

        // Take the write lock before the first read
        sqlx::query("BEGIN IMMEDIATE").execute(&mut *conn).await?;

        if let Err(e) = Self::apply_all(&mut conn, batch).await {
            Self::abort(conn).await;
            return Err(e);
        }

        debug!("Committed batch of {} writes", count);

        Ok(())
    }

    async fn get(&self, reference: &DocumentRef) -> ShareResult<Option<Value>> {
        let mut conn = self.db.acquire().await?;
        Self::load(&mut conn, reference).await
    }
}
