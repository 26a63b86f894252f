//! In-memory [`DocumentStore`] implementation for testing.
//!
//! Uses a `BTreeMap` behind `std::sync::RwLock`, so id listings come back
//! in sorted order.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use async_trait::async_trait;

use crate::error::StoreError;
use crate::models::Document;

use super::DocumentStore;

/// In-memory collection of documents.
pub struct InMemoryStore {
    name: String,
    docs: RwLock<BTreeMap<String, Document>>,
}

impl InMemoryStore {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            docs: RwLock::new(BTreeMap::new()),
        }
    }

    /// Snapshot of every stored id.
    pub fn ids(&self) -> BTreeSet<String> {
        match self.docs.read() {
            Ok(docs) => docs.keys().cloned().collect(),
            Err(poisoned) => poisoned.into_inner().keys().cloned().collect(),
        }
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, BTreeMap<String, Document>>, StoreError> {
        self.docs
            .read()
            .map_err(|_| StoreError::Rejected("store lock poisoned".to_string()))
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, BTreeMap<String, Document>>, StoreError> {
        self.docs
            .write()
            .map_err(|_| StoreError::Rejected("store lock poisoned".to_string()))
    }
}

impl Default for InMemoryStore {
    fn default() -> Self {
        Self::new("memory")
    }
}

#[async_trait]
impl DocumentStore for InMemoryStore {
    fn name(&self) -> &str {
        &self.name
    }

    async fn count(&self) -> Result<usize, StoreError> {
        Ok(self.read()?.len())
    }

    async fn upsert(&self, docs: &[Document]) -> Result<(), StoreError> {
        let mut stored = self.write()?;
        for doc in docs {
            stored.insert(doc.id.clone(), doc.clone());
        }
        Ok(())
    }

    async fn delete(&self, ids: &[String]) -> Result<(), StoreError> {
        let mut stored = self.write()?;
        for id in ids {
            stored.remove(id);
        }
        Ok(())
    }

    async fn peek_ids(&self, limit: usize) -> Result<BTreeSet<String>, StoreError> {
        Ok(self.read()?.keys().take(limit).cloned().collect())
    }

    async fn get(&self, ids: &[String]) -> Result<Vec<Document>, StoreError> {
        let stored = self.read()?;
        let wanted: BTreeSet<&String> = ids.iter().collect();
        Ok(wanted
            .into_iter()
            .filter_map(|id| stored.get(id).cloned())
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn doc(id: &str, body: &str) -> Document {
        Document {
            id: id.to_string(),
            path: format!("{id}.txt"),
            body: body.to_string(),
        }
    }

    #[tokio::test]
    async fn upsert_overwrites_by_id() {
        let store = InMemoryStore::new("test");
        store.upsert(&[doc("a", "one")]).await.unwrap();
        store.upsert(&[doc("a", "two")]).await.unwrap();
        assert_eq!(store.count().await.unwrap(), 1);
        let got = store.get(&["a".to_string()]).await.unwrap();
        assert_eq!(got[0].body, "two");
    }

    #[tokio::test]
    async fn delete_unknown_is_noop() {
        let store = InMemoryStore::new("test");
        store.upsert(&[doc("a", "x")]).await.unwrap();
        store
            .delete(&["missing".to_string(), "a".to_string()])
            .await
            .unwrap();
        assert_eq!(store.count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn peek_respects_limit() {
        let store = InMemoryStore::new("test");
        store
            .upsert(&[doc("c", ""), doc("a", ""), doc("b", "")])
            .await
            .unwrap();
        let ids = store.peek_ids(2).await.unwrap();
        assert_eq!(ids.len(), 2);
        assert!(ids.contains("a") && ids.contains("b"));
        assert_eq!(store.peek_ids(10).await.unwrap().len(), 3);
    }

    #[tokio::test]
    async fn get_skips_missing_ids() {
        let store = InMemoryStore::new("test");
        store.upsert(&[doc("a", "x")]).await.unwrap();
        let got = store
            .get(&["zzz".to_string(), "a".to_string()])
            .await
            .unwrap();
        assert_eq!(got, vec![doc("a", "x")]);
    }
}
