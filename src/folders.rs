//! Folder-level records derived from the file-level set.
//!
//! Each folder that directly contains indexed files gets a record whose id
//! hashes its children's ids, so a folder changes exactly when one of its
//! direct files is added, removed, or edited. Nested folders are
//! independent: a change in `src/a/x.rs` touches `src/a` but not `src`.

use std::collections::BTreeMap;

use repo_chat_core::identity::folder_record;
use repo_chat_core::models::{FileRecord, FolderRecord};

/// Relative path of the folder holding `relative_file`; `.` for the root.
pub fn parent_folder(relative_file: &str) -> &str {
    match relative_file.rfind('/') {
        Some(idx) => &relative_file[..idx],
        None => ".",
    }
}

/// Group file records by parent folder, sorted by folder path.
pub fn folder_records(files: &[FileRecord]) -> Vec<FolderRecord> {
    let mut groups: BTreeMap<&str, Vec<(String, String)>> = BTreeMap::new();
    for file in files {
        groups
            .entry(parent_folder(&file.relative_path))
            .or_default()
            .push((file.relative_path.clone(), file.id.clone()));
    }

    groups
        .into_iter()
        .map(|(folder, children)| folder_record(folder.to_string(), children))
        .collect()
}
