//! Error types shared by the sync pipeline.
//!
//! The pipeline distinguishes three failure families, each with its own
//! blast radius:
//!
//! | Error | Scope | Effect on a run |
//! |-------|-------|-----------------|
//! | [`ReadError`] | one file | file is skipped and logged |
//! | [`ConsistencyError`] | whole record set | run aborts before any store write |
//! | [`StoreError`] | one batch | batch is reported; `Connection` aborts the rest |

use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// A file could not be turned into a record.
#[derive(Debug, Error)]
pub enum ReadError {
    #[error("failed to read {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("{} is not valid UTF-8 text", .path.display())]
    NotText { path: PathBuf },
}

impl ReadError {
    pub fn path(&self) -> &PathBuf {
        match self {
            ReadError::Io { path, .. } | ReadError::NotText { path } => path,
        }
    }
}

/// Two distinct records produced the same identifier.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("identifier {id} is shared by {} records: {}", .paths.len(), .paths.join(", "))]
pub struct ConsistencyError {
    pub id: String,
    pub paths: Vec<String>,
}

/// Failure reported by a [`DocumentStore`](crate::store::DocumentStore).
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum StoreError {
    /// The store refused this request; later requests may still succeed.
    #[error("store rejected request: {0}")]
    Rejected(String),

    /// The store is unreachable; no further requests should be attempted.
    #[error("store connection failed: {0}")]
    Connection(String),
}

impl StoreError {
    pub fn is_connection(&self) -> bool {
        matches!(self, StoreError::Connection(_))
    }
}

/// Fatal errors that stop a sync run before or while it touches the store.
#[derive(Debug, Error)]
pub enum SyncError {
    #[error("repository root does not exist or is not a directory: {}", .0.display())]
    InvalidRoot(PathBuf),

    #[error(transparent)]
    Consistency(#[from] ConsistencyError),

    #[error(
        "collection {collection} holds {count} documents, more than the id listing limit of {limit}"
    )]
    PeekLimitExceeded {
        collection: String,
        count: usize,
        limit: usize,
    },

    #[error("failed to {action} collection {collection}: {source}")]
    Store {
        collection: String,
        action: &'static str,
        #[source]
        source: StoreError,
    },
}
