//! SQLite-backed [`DocumentStore`] implementation.
//!
//! All collections share one `documents` table keyed by
//! `(collection, id)`. Each upsert or delete call runs in a single
//! transaction, so a batch lands completely or not at all.

use std::collections::BTreeSet;

use anyhow::Result;
use async_trait::async_trait;
use sqlx::{Row, SqlitePool};

use repo_chat_core::error::StoreError;
use repo_chat_core::models::Document;
use repo_chat_core::store::DocumentStore;

use crate::config::Config;
use crate::db;
use crate::migrate;

/// One named collection inside the SQLite database.
pub struct SqliteStore {
    pool: SqlitePool,
    collection: String,
}

impl SqliteStore {
    pub fn new(pool: SqlitePool, collection: impl Into<String>) -> Self {
        Self {
            pool,
            collection: collection.into(),
        }
    }

    /// Connect to the configured database, create the schema if needed,
    /// and return a handle on `collection`.
    pub async fn open(config: &Config, collection: impl Into<String>) -> Result<Self> {
        let pool = db::connect(config).await?;
        migrate::run_migrations(&pool).await?;
        Ok(Self::new(pool, collection))
    }

    /// Another collection in the same database.
    pub fn sibling(&self, collection: impl Into<String>) -> Self {
        Self::new(self.pool.clone(), collection)
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

/// Transport-level failures mean the database is gone; everything else is
/// a rejection of this particular request.
fn store_error(err: sqlx::Error) -> StoreError {
    match &err {
        sqlx::Error::Io(_)
        | sqlx::Error::Tls(_)
        | sqlx::Error::PoolTimedOut
        | sqlx::Error::PoolClosed
        | sqlx::Error::WorkerCrashed => StoreError::Connection(err.to_string()),
        _ => StoreError::Rejected(err.to_string()),
    }
}

#[async_trait]
impl DocumentStore for SqliteStore {
    fn name(&self) -> &str {
        &self.collection
    }

    async fn count(&self) -> Result<usize, StoreError> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM documents WHERE collection = ?")
            .bind(&self.collection)
            .fetch_one(&self.pool)
            .await
            .map_err(store_error)?;
        Ok(count as usize)
    }

    async fn upsert(&self, docs: &[Document]) -> Result<(), StoreError> {
        let now = chrono::Utc::now().timestamp();
        let mut tx = self.pool.begin().await.map_err(store_error)?;

        for doc in docs {
            sqlx::query(
                r#"
                INSERT INTO documents (collection, id, path, body, updated_at)
                VALUES (?, ?, ?, ?, ?)
                ON CONFLICT(collection, id) DO UPDATE SET
                    path = excluded.path,
                    body = excluded.body,
                    updated_at = excluded.updated_at
                "#,
            )
            .bind(&self.collection)
            .bind(&doc.id)
            .bind(&doc.path)
            .bind(&doc.body)
            .bind(now)
            .execute(&mut *tx)
            .await
            .map_err(store_error)?;
        }

        tx.commit().await.map_err(store_error)?;
        Ok(())
    }

    async fn delete(&self, ids: &[String]) -> Result<(), StoreError> {
        let mut tx = self.pool.begin().await.map_err(store_error)?;

        for id in ids {
            sqlx::query("DELETE FROM documents WHERE collection = ? AND id = ?")
                .bind(&self.collection)
                .bind(id)
                .execute(&mut *tx)
                .await
                .map_err(store_error)?;
        }

        tx.commit().await.map_err(store_error)?;
        Ok(())
    }

    async fn peek_ids(&self, limit: usize) -> Result<BTreeSet<String>, StoreError> {
        let ids: Vec<String> = sqlx::query_scalar(
            "SELECT id FROM documents WHERE collection = ? ORDER BY id LIMIT ?",
        )
        .bind(&self.collection)
        .bind(i64::try_from(limit).unwrap_or(i64::MAX))
        .fetch_all(&self.pool)
        .await
        .map_err(store_error)?;

        Ok(ids.into_iter().collect())
    }

    async fn get(&self, ids: &[String]) -> Result<Vec<Document>, StoreError> {
        let wanted: BTreeSet<&String> = ids.iter().collect();
        let mut docs = Vec::with_capacity(wanted.len());

        for id in wanted {
            let row = sqlx::query(
                "SELECT id, path, body FROM documents WHERE collection = ? AND id = ?",
            )
            .bind(&self.collection)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(store_error)?;

            if let Some(row) = row {
                docs.push(Document {
                    id: row.get("id"),
                    path: row.get("path"),
                    body: row.get("body"),
                });
            }
        }

        Ok(docs)
    }
}
