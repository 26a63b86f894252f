//! Turns scanned paths into [`FileRecord`]s.

use std::path::Path;

use tracing::{debug, warn};

use repo_chat_core::error::ReadError;
use repo_chat_core::identity;
use repo_chat_core::models::FileRecord;

/// Read `relative_path` under `root` and build its record.
///
/// Content is truncated to `max_chars` characters before hashing.
pub fn read_file_record(
    root: &Path,
    relative_path: &str,
    max_chars: usize,
) -> Result<FileRecord, ReadError> {
    let absolute_path = root.join(relative_path);
    let bytes = std::fs::read(&absolute_path).map_err(|source| ReadError::Io {
        path: absolute_path.clone(),
        source,
    })?;
    let content = String::from_utf8(bytes).map_err(|_| ReadError::NotText {
        path: absolute_path.clone(),
    })?;

    Ok(identity::file_record(
        absolute_path,
        relative_path.to_string(),
        content,
        max_chars,
    ))
}

/// Records for every readable path, plus the errors for the ones skipped.
///
/// `on_progress` is called after each path with `(done, total)`.
pub fn read_file_records(
    root: &Path,
    paths: &[String],
    max_chars: usize,
    mut on_progress: impl FnMut(u64, u64),
) -> (Vec<FileRecord>, Vec<ReadError>) {
    let total = paths.len() as u64;
    let mut records = Vec::with_capacity(paths.len());
    let mut errors = Vec::new();

    for (i, path) in paths.iter().enumerate() {
        match read_file_record(root, path, max_chars) {
            Ok(record) => {
                debug!("{} {}", record.id, record.relative_path);
                records.push(record);
            }
            Err(err) => {
                warn!("skipping {}", err);
                errors.push(err);
            }
        }
        on_progress(i as u64 + 1, total);
    }

    (records, errors)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn reads_and_identifies_file() {
        let tmp = TempDir::new().unwrap();
        fs::create_dir_all(tmp.path().join("src")).unwrap();
        fs::write(tmp.path().join("src/lib.rs"), "pub fn f() {}").unwrap();

        let record = read_file_record(tmp.path(), "src/lib.rs", 20_000).unwrap();
        assert_eq!(record.relative_path, "src/lib.rs");
        assert_eq!(record.content, "pub fn f() {}");
        assert_eq!(
            record.id,
            identity::file_identifier("src/lib.rs", "pub fn f() {}", 20_000)
        );
        assert_eq!(record.absolute_path, tmp.path().join("src/lib.rs"));
    }

    #[test]
    fn invalid_utf8_is_read_error() {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join("bad.txt"), [b'o', b'k', 0xff, 0xfe]).unwrap();

        let err = read_file_record(tmp.path(), "bad.txt", 100).unwrap_err();
        assert!(matches!(err, ReadError::NotText { .. }));
    }

    #[test]
    fn missing_file_is_read_error() {
        let tmp = TempDir::new().unwrap();
        let err = read_file_record(tmp.path(), "gone.txt", 100).unwrap_err();
        assert!(matches!(err, ReadError::Io { .. }));
        assert_eq!(err.path(), &tmp.path().join("gone.txt"));
    }

    #[test]
    fn batch_read_skips_failures() {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join("a.txt"), "a").unwrap();
        fs::write(tmp.path().join("c.txt"), "c").unwrap();
        let paths = vec!["a.txt".to_string(), "b.txt".to_string(), "c.txt".to_string()];

        let mut seen = Vec::new();
        let (records, errors) =
            read_file_records(tmp.path(), &paths, 100, |n, total| seen.push((n, total)));
        assert_eq!(records.len(), 2);
        assert_eq!(errors.len(), 1);
        assert_eq!(seen, vec![(1, 3), (2, 3), (3, 3)]);
    }
}
