//! Document retrieval by id for `repo-chat get`.

use anyhow::{bail, Result};

use repo_chat_core::models::Document;
use repo_chat_core::store::DocumentStore;

use crate::config::Config;
use crate::sqlite_store::SqliteStore;

/// Fetch `ids` from `store`, failing if any of them is missing.
pub async fn get_documents(store: &dyn DocumentStore, ids: &[String]) -> Result<Vec<Document>> {
    let docs = store.get(ids).await?;
    if let Some(missing) = ids.iter().find(|id| !docs.iter().any(|d| &d.id == *id)) {
        bail!("document not found in {}: {}", store.name(), missing);
    }
    Ok(docs)
}

/// CLI entry point: print documents as text or JSON.
pub async fn run_get(config: &Config, ids: &[String], folders: bool, json: bool) -> Result<()> {
    let collection = if folders {
        config.sync.folder_collection()
    } else {
        config.sync.collection.clone()
    };
    let store = SqliteStore::open(config, collection).await?;
    let docs = get_documents(&store, ids).await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&docs)?);
    } else {
        for doc in &docs {
            println!("id:   {}", doc.id);
            println!("path: {}", doc.path);
            println!("---");
            println!("{}", doc.body);
            println!();
        }
    }

    store.pool().close().await;
    Ok(())
}
