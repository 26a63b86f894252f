//! Document store abstraction.
//!
//! The [`DocumentStore`] trait is the only way the sync driver touches
//! persisted state. A store holds one named collection of [`Document`]s
//! keyed by id; backends include the in-memory store in this crate and the
//! SQLite store in the `repo-chat` crate.
//!
//! Implementations must be `Send + Sync` to work with async runtimes.

pub mod memory;

use std::collections::BTreeSet;

use async_trait::async_trait;

use crate::error::StoreError;
use crate::models::Document;

/// Abstract collection of documents keyed by identifier.
///
/// # Operations
///
/// | Method | Purpose |
/// |--------|---------|
/// | [`count`](DocumentStore::count) | Number of documents in the collection |
/// | [`upsert`](DocumentStore::upsert) | Insert or overwrite documents by id |
/// | [`delete`](DocumentStore::delete) | Remove documents by id |
/// | [`peek_ids`](DocumentStore::peek_ids) | List up to `limit` stored ids |
/// | [`get`](DocumentStore::get) | Fetch documents by id |
///
/// Upserting an existing id overwrites it and deleting an unknown id is a
/// no-op, so replaying a batch is harmless.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Collection name, used in logs and reports.
    fn name(&self) -> &str;

    async fn count(&self) -> Result<usize, StoreError>;

    async fn upsert(&self, docs: &[Document]) -> Result<(), StoreError>;

    async fn delete(&self, ids: &[String]) -> Result<(), StoreError>;

    /// Return at most `limit` stored ids.
    async fn peek_ids(&self, limit: usize) -> Result<BTreeSet<String>, StoreError>;

    /// Fetch the documents that exist among `ids`, in id order.
    async fn get(&self, ids: &[String]) -> Result<Vec<Document>, StoreError>;
}
