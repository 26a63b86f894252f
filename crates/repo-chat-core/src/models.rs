//! Core data models used throughout repo-chat.
//!
//! Records are recomputed from the filesystem on every run; only the
//! [`Document`]s written to a store persist between runs.

use std::path::PathBuf;

use serde::Serialize;

/// A text file selected for indexing, with its content-derived identifier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileRecord {
    pub absolute_path: PathBuf,
    /// Path relative to the repository root, `/` separated.
    pub relative_path: String,
    /// File text, truncated to the configured maximum length.
    pub content: String,
    pub id: String,
}

/// A folder that directly contains at least one indexed file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FolderRecord {
    /// Folder path relative to the repository root; the root itself is `.`.
    pub relative_path: String,
    /// Relative paths of the direct child files, sorted.
    pub files: Vec<String>,
    /// Identifiers of the direct child files, in the same order as `files`.
    pub child_ids: Vec<String>,
    pub id: String,
}

/// A document as held by a [`DocumentStore`](crate::store::DocumentStore).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Document {
    pub id: String,
    /// Relative file or folder path the document was built from.
    pub path: String,
    pub body: String,
}

/// Eligible files found under a repository root, plus why others were skipped.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ScanResult {
    /// Relative paths, sorted and unique.
    pub paths: Vec<String>,
    pub skipped: SkipCounts,
}

/// Per-reason counters for entries the scanner left out.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SkipCounts {
    pub ignored: u64,
    pub vcs: u64,
    pub denied_extension: u64,
    pub binary: u64,
    pub unreadable: u64,
}

impl SkipCounts {
    pub fn total(&self) -> u64 {
        self.ignored + self.vcs + self.denied_extension + self.binary + self.unreadable
    }
}

/// Something the reconciler can diff against a stored identifier set.
pub trait Identified {
    fn id(&self) -> &str;

    /// Human-readable label used in logs and consistency errors.
    fn label(&self) -> &str;

    fn to_document(&self) -> Document;
}

impl Identified for FileRecord {
    fn id(&self) -> &str {
        &self.id
    }

    fn label(&self) -> &str {
        &self.relative_path
    }

    fn to_document(&self) -> Document {
        Document {
            id: self.id.clone(),
            path: self.relative_path.clone(),
            body: self.content.clone(),
        }
    }
}

impl Identified for FolderRecord {
    fn id(&self) -> &str {
        &self.id
    }

    fn label(&self) -> &str {
        &self.relative_path
    }

    /// The folder path on the first line, then one line per child file.
    fn to_document(&self) -> Document {
        let mut body = self.relative_path.clone();
        for file in &self.files {
            body.push('\n');
            body.push_str(file);
        }
        Document {
            id: self.id.clone(),
            path: self.relative_path.clone(),
            body,
        }
    }
}
