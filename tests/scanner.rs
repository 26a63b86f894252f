//! Scanner tests against scratch repositories on disk.

use std::fs;
use std::path::Path;

use repo_chat::scanner::{scan_repository, ScanOptions};
use repo_chat_core::error::SyncError;
use tempfile::TempDir;

fn write(root: &Path, rel: &str, content: &[u8]) {
    let path = root.join(rel);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(path, content).unwrap();
}

fn options(root: &Path) -> ScanOptions {
    let mut options = ScanOptions::new(root);
    options.denied_extensions = vec!["bin".to_string(), ".sqlite3".to_string()];
    options
}

#[test]
fn scan_returns_sorted_text_files() {
    let tmp = TempDir::new().unwrap();
    write(tmp.path(), "src/main.rs", b"fn main() {}");
    write(tmp.path(), "README.md", b"# hi");
    write(tmp.path(), "src/a/b.rs", b"// b");

    let result = scan_repository(&options(tmp.path())).unwrap();
    assert_eq!(result.paths, vec!["README.md", "src/a/b.rs", "src/main.rs"]);
    assert_eq!(result.skipped.total(), 0);
}

#[test]
fn vcs_directories_are_pruned() {
    let tmp = TempDir::new().unwrap();
    write(tmp.path(), ".git/HEAD", b"ref: refs/heads/main");
    write(tmp.path(), ".git/objects/ab/cd", b"blob");
    write(tmp.path(), ".hg/store/data", b"x");
    write(tmp.path(), ".github/workflows/ci.yml", b"on: push");
    write(tmp.path(), "lib.rs", b"");

    let result = scan_repository(&options(tmp.path())).unwrap();
    assert_eq!(result.paths, vec![".github/workflows/ci.yml", "lib.rs"]);
    assert_eq!(result.skipped.vcs, 2);
}

#[test]
fn gitignore_globs_negation_and_directories() {
    let tmp = TempDir::new().unwrap();
    write(
        tmp.path(),
        ".gitignore",
        b"*.log\n!keep.log\nbuild/\ndocs/**/draft.md\n",
    );
    write(tmp.path(), "app.log", b"noise");
    write(tmp.path(), "keep.log", b"signal");
    write(tmp.path(), "build/out.txt", b"artifact");
    write(tmp.path(), "src/build", b"a file named build is kept");
    write(tmp.path(), "docs/a/b/draft.md", b"wip");
    write(tmp.path(), "docs/a/final.md", b"done");

    let result = scan_repository(&options(tmp.path())).unwrap();
    assert_eq!(
        result.paths,
        vec![".gitignore", "docs/a/final.md", "keep.log", "src/build"]
    );
    // app.log, the build/ directory, and draft.md
    assert_eq!(result.skipped.ignored, 3);
}

#[test]
fn ignored_file_stays_out_after_edit() {
    let tmp = TempDir::new().unwrap();
    write(tmp.path(), ".gitignore", b"secret.txt\n");
    write(tmp.path(), "secret.txt", b"v1");
    let first = scan_repository(&options(tmp.path())).unwrap();

    write(tmp.path(), "secret.txt", b"v2 with different content");
    let second = scan_repository(&options(tmp.path())).unwrap();

    assert!(!first.paths.contains(&"secret.txt".to_string()));
    assert!(!second.paths.contains(&"secret.txt".to_string()));
}

#[test]
fn custom_ignore_file_and_missing_ignore_file() {
    let tmp = TempDir::new().unwrap();
    write(tmp.path(), ".repochatignore", b"*.md\n");
    write(tmp.path(), "notes.md", b"n");
    write(tmp.path(), "code.rs", b"c");

    let mut opts = options(tmp.path());
    opts.ignore_file = Some(".repochatignore".into());
    let result = scan_repository(&opts).unwrap();
    assert_eq!(result.paths, vec![".repochatignore", "code.rs"]);

    opts.ignore_file = Some("does-not-exist".into());
    let result = scan_repository(&opts).unwrap();
    assert_eq!(result.paths.len(), 3);
}

#[test]
fn denylist_node_modules_and_exclude_globs() {
    let tmp = TempDir::new().unwrap();
    write(tmp.path(), "model.bin", b"weights");
    write(tmp.path(), "db.sqlite3", b"tables");
    write(tmp.path(), "node_modules/pkg/index.js", b"module.exports = 1");
    write(tmp.path(), "web/node_modules/x.js", b"x");
    write(tmp.path(), "dist/app.js", b"bundle");
    write(tmp.path(), "src/app.ts", b"export {}");

    let mut opts = options(tmp.path());
    opts.exclude_globs = vec!["dist/**".to_string()];
    let result = scan_repository(&opts).unwrap();
    assert_eq!(result.paths, vec!["src/app.ts"]);
    assert_eq!(result.skipped.denied_extension, 2);
    assert_eq!(result.skipped.ignored, 3);
}

#[test]
fn binary_files_are_skipped() {
    let tmp = TempDir::new().unwrap();
    write(tmp.path(), "image.png", &[0x89, b'P', b'N', b'G', 0x0d, 0x0a, 0x1a, 0x0a, 0x00]);
    write(tmp.path(), "latin1.txt", &[b'c', b'a', b'f', 0xe9]);
    write(tmp.path(), "utf8.txt", "café".as_bytes());

    let result = scan_repository(&options(tmp.path())).unwrap();
    assert_eq!(result.paths, vec!["utf8.txt"]);
    assert_eq!(result.skipped.binary, 2);
}

#[test]
fn text_detection_only_reads_the_first_kilobyte() {
    let tmp = TempDir::new().unwrap();
    let mut content = vec![b'a'; 2048];
    content[1500] = 0xff;
    write(tmp.path(), "late_garbage.txt", &content);

    let result = scan_repository(&options(tmp.path())).unwrap();
    assert_eq!(result.paths, vec!["late_garbage.txt"]);
}

#[test]
fn missing_root_is_fatal() {
    let tmp = TempDir::new().unwrap();
    let err = scan_repository(&options(&tmp.path().join("nope"))).unwrap_err();
    assert!(matches!(
        err.downcast_ref::<SyncError>(),
        Some(SyncError::InvalidRoot(_))
    ));
}

#[cfg(unix)]
#[test]
fn unreadable_files_are_skipped_not_fatal() {
    use std::os::unix::fs::PermissionsExt;

    let tmp = TempDir::new().unwrap();
    write(tmp.path(), "locked.txt", b"private");
    write(tmp.path(), "open.txt", b"public");
    let locked = tmp.path().join("locked.txt");
    fs::set_permissions(&locked, fs::Permissions::from_mode(0o000)).unwrap();

    // Root ignores permission bits; only assert when the file is really unreadable.
    let really_locked = fs::read(&locked).is_err();
    let result = scan_repository(&options(tmp.path())).unwrap();
    fs::set_permissions(&locked, fs::Permissions::from_mode(0o644)).unwrap();

    assert!(result.paths.contains(&"open.txt".to_string()));
    if really_locked {
        assert_eq!(result.paths, vec!["open.txt"]);
        assert_eq!(result.skipped.unreadable, 1);
    }
}
