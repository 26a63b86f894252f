//! Content-derived identifiers for files and folders.
//!
//! A file's identifier is the first 128 bits of the SHA-256 digest of its
//! relative path, a NUL separator, and its (possibly truncated) content,
//! hex encoded. The same path and content always give the same identifier,
//! which is what lets a later run diff against ids stored by an earlier one.
//!
//! Content longer than the configured maximum is cut to exactly that many
//! characters before hashing, so edits past the cut point are invisible:
//!
//! ```rust
//! use repo_chat_core::identity::file_identifier;
//!
//! let a = file_identifier("notes.txt", "hello", 3);
//! let b = file_identifier("notes.txt", "help me", 3);
//! assert_eq!(a, b);
//! assert_ne!(a, file_identifier("other.txt", "hello", 3));
//! ```

use std::path::PathBuf;

use sha2::{Digest, Sha256};

use crate::models::{FileRecord, FolderRecord};

/// Default upper bound on stored and hashed content, in characters.
pub const DEFAULT_MAX_CONTENT_CHARS: usize = 20_000;

/// Digest bytes kept in an identifier.
const ID_BYTES: usize = 16;

/// Return at most the first `max_chars` characters of `content`.
///
/// Counts Unicode scalar values, so the cut never splits a character.
pub fn truncate_content(content: &str, max_chars: usize) -> &str {
    match content.char_indices().nth(max_chars) {
        Some((byte_index, _)) => &content[..byte_index],
        None => content,
    }
}

/// Identifier for a file at `relative_path` with the given content.
pub fn file_identifier(relative_path: &str, content: &str, max_chars: usize) -> String {
    let mut hasher = Sha256::new();
    hasher.update(relative_path.as_bytes());
    hasher.update([0u8]);
    hasher.update(truncate_content(content, max_chars).as_bytes());
    short_digest(hasher)
}

/// Identifier for a folder, derived from its children's identifiers in order.
pub fn folder_identifier<S: AsRef<str>>(child_ids: &[S]) -> String {
    let mut hasher = Sha256::new();
    for id in child_ids {
        hasher.update(id.as_ref().as_bytes());
    }
    short_digest(hasher)
}

fn short_digest(hasher: Sha256) -> String {
    let digest = hasher.finalize();
    hex::encode(&digest[..ID_BYTES])
}

/// Build a [`FileRecord`], truncating `content` in place.
pub fn file_record(
    absolute_path: PathBuf,
    relative_path: String,
    mut content: String,
    max_chars: usize,
) -> FileRecord {
    let kept = truncate_content(&content, max_chars).len();
    content.truncate(kept);
    let id = file_identifier(&relative_path, &content, max_chars);
    FileRecord {
        absolute_path,
        relative_path,
        content,
        id,
    }
}

/// Build a [`FolderRecord`] from `(relative file path, file id)` pairs.
///
/// Children are sorted by path before hashing so the identifier does not
/// depend on enumeration order.
pub fn folder_record(relative_path: String, mut children: Vec<(String, String)>) -> FolderRecord {
    children.sort();
    let (files, child_ids): (Vec<String>, Vec<String>) = children.into_iter().unzip();
    let id = folder_identifier(&child_ids);
    FolderRecord {
        relative_path,
        files,
        child_ids,
        id,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const N: usize = DEFAULT_MAX_CONTENT_CHARS;

    #[test]
    fn identifier_is_deterministic() {
        let a = file_identifier("src/main.rs", "fn main() {}", N);
        let b = file_identifier("src/main.rs", "fn main() {}", N);
        assert_eq!(a, b);
        assert_eq!(a.len(), 32);
        assert!(a.chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase()));
    }

    #[test]
    fn content_change_changes_identifier() {
        let a = file_identifier("src/main.rs", "fn main() {}", N);
        let b = file_identifier("src/main.rs", "fn main() { }", N);
        assert_ne!(a, b);
    }

    #[test]
    fn path_change_changes_identifier() {
        let a = file_identifier("src/a.rs", "same", N);
        let b = file_identifier("src/b.rs", "same", N);
        assert_ne!(a, b);
    }

    #[test]
    fn path_and_content_boundary_is_unambiguous() {
        assert_ne!(
            file_identifier("ab", "c", N),
            file_identifier("a", "bc", N)
        );
    }

    #[test]
    fn no_collisions_across_corpus() {
        let mut seen = std::collections::HashSet::new();
        for dir in 0..20 {
            for file in 0..50 {
                let path = format!("dir{dir}/file{file}.txt");
                let content = format!("line {file}\nowner {dir}\n");
                assert!(seen.insert(file_identifier(&path, &content, N)));
            }
        }
        assert_eq!(seen.len(), 1000);
    }

    #[test]
    fn truncation_boundary_exactly_at_limit() {
        let limit = 10;
        let exact = "a".repeat(limit);
        let longer = format!("{exact}b");
        let much_longer = format!("{exact}completely different tail");

        // Content of exactly N characters is kept whole.
        assert_eq!(truncate_content(&exact, limit), exact);
        // Anything past N is dropped, so these all hash the same.
        let id = file_identifier("f.txt", &exact, limit);
        assert_eq!(file_identifier("f.txt", &longer, limit), id);
        assert_eq!(file_identifier("f.txt", &much_longer, limit), id);

        // Changing the Nth character (index N-1) is still visible.
        let mut edited = "a".repeat(limit - 1);
        edited.push('z');
        assert_ne!(file_identifier("f.txt", &edited, limit), id);

        // One character short of the limit is distinct from the full prefix.
        let shorter = "a".repeat(limit - 1);
        assert_ne!(file_identifier("f.txt", &shorter, limit), id);
    }

    #[test]
    fn truncation_counts_characters_not_bytes() {
        let text = "ééééé";
        assert_eq!(truncate_content(text, 3), "ééé");
        assert_eq!(truncate_content(text, 10), text);
        assert_eq!(truncate_content(text, 0), "");
    }

    #[test]
    fn file_record_stores_truncated_content() {
        let record = file_record(
            PathBuf::from("/repo/a.txt"),
            "a.txt".to_string(),
            "abcdef".to_string(),
            4,
        );
        assert_eq!(record.content, "abcd");
        assert_eq!(record.id, file_identifier("a.txt", "abcd", 4));
    }

    #[test]
    fn folder_identifier_ignores_enumeration_order() {
        let a = folder_record(
            "src".to_string(),
            vec![
                ("src/b.rs".to_string(), "2".to_string()),
                ("src/a.rs".to_string(), "1".to_string()),
            ],
        );
        let b = folder_record(
            "src".to_string(),
            vec![
                ("src/a.rs".to_string(), "1".to_string()),
                ("src/b.rs".to_string(), "2".to_string()),
            ],
        );
        assert_eq!(a.id, b.id);
        assert_eq!(a.files, vec!["src/a.rs", "src/b.rs"]);
        assert_eq!(a.id, folder_identifier(&["1", "2"]));
    }

    #[test]
    fn folder_identifier_follows_children() {
        let before = folder_identifier(&["1", "2"]);
        let after = folder_identifier(&["1", "3"]);
        assert_ne!(before, after);
    }
}
