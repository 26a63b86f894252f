//! Filesystem scanner.
//!
//! Walks a repository root and returns the relative paths of text files
//! eligible for indexing. An entry is left out when any of these hold:
//!
//! - it lives under a version-control directory (`.git`, `.hg`, `.svn`);
//! - it, or one of its parent directories, matches the root ignore file
//!   (gitignore syntax, including `**`, `!negation` and `dir/` patterns);
//! - it matches an exclude glob (`**/node_modules/**` is always excluded);
//! - its extension is on the denylist;
//! - its first 1024 bytes are not UTF-8 text or contain a NUL byte.
//!
//! Unreadable entries are skipped with a warning. Only a missing root is
//! fatal.

use anyhow::{Context, Result};
use globset::{Glob, GlobSet, GlobSetBuilder};
use ignore::gitignore::{Gitignore, GitignoreBuilder};
use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};
use walkdir::WalkDir;

use repo_chat_core::error::SyncError;
use repo_chat_core::models::{ScanResult, SkipCounts};

use crate::config::RepositoryConfig;

/// Bytes inspected when deciding whether a file is text.
pub const SNIFF_LEN: usize = 1024;

const VCS_DIRS: &[&str] = &[".git", ".hg", ".svn"];

const DEFAULT_EXCLUDES: &[&str] = &["**/node_modules/**"];

/// Inputs for a single scan.
#[derive(Debug, Clone)]
pub struct ScanOptions {
    pub root: PathBuf,
    /// Ignore file relative to `root`; a missing file means "ignore nothing".
    pub ignore_file: Option<PathBuf>,
    pub exclude_globs: Vec<String>,
    pub denied_extensions: Vec<String>,
    pub follow_symlinks: bool,
}

impl ScanOptions {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            ignore_file: Some(PathBuf::from(".gitignore")),
            exclude_globs: Vec::new(),
            denied_extensions: Vec::new(),
            follow_symlinks: false,
        }
    }

    pub fn from_config(repo: &RepositoryConfig) -> Self {
        Self {
            root: repo.root.clone(),
            ignore_file: Some(repo.ignore_file.clone()),
            exclude_globs: repo.exclude_globs.clone(),
            denied_extensions: repo.denied_extensions.clone(),
            follow_symlinks: repo.follow_symlinks,
        }
    }
}

/// Walk `options.root` and collect eligible relative paths, sorted.
pub fn scan_repository(options: &ScanOptions) -> Result<ScanResult> {
    let root = &options.root;
    if !root.is_dir() {
        return Err(SyncError::InvalidRoot(root.clone()).into());
    }

    let ignore = build_ignore(root, options.ignore_file.as_deref())?;

    let mut excludes: Vec<String> = DEFAULT_EXCLUDES.iter().map(|s| s.to_string()).collect();
    excludes.extend(options.exclude_globs.iter().cloned());
    let exclude_set = build_globset(&excludes)?;

    let denied: Vec<String> = options
        .denied_extensions
        .iter()
        .map(|ext| ext.trim_start_matches('.').to_ascii_lowercase())
        .collect();

    let mut paths = Vec::new();
    let mut skipped = SkipCounts::default();

    let mut walker = WalkDir::new(root)
        .follow_links(options.follow_symlinks)
        .sort_by_file_name()
        .into_iter();

    while let Some(entry) = walker.next() {
        let entry = match entry {
            Ok(entry) => entry,
            Err(err) => {
                warn!("skipping unreadable entry: {}", err);
                skipped.unreadable += 1;
                continue;
            }
        };

        let path = entry.path();
        let relative = path.strip_prefix(root).unwrap_or(path);
        if relative.as_os_str().is_empty() {
            continue;
        }

        let Some(rel_str) = relative_path_string(relative) else {
            warn!("skipping non UTF-8 path: {}", path.display());
            skipped.unreadable += 1;
            continue;
        };

        if entry.file_type().is_dir() {
            if is_vcs_dir(relative) {
                debug!("pruning {}", rel_str);
                skipped.vcs += 1;
                walker.skip_current_dir();
            } else if ignore.matched(relative, true).is_ignore() {
                debug!("pruning ignored directory {}", rel_str);
                skipped.ignored += 1;
                walker.skip_current_dir();
            }
            continue;
        }

        if !entry.file_type().is_file() {
            continue;
        }

        if is_vcs_dir(relative) {
            skipped.vcs += 1;
            continue;
        }

        if ignore
            .matched_path_or_any_parents(relative, false)
            .is_ignore()
            || exclude_set.is_match(&rel_str)
        {
            skipped.ignored += 1;
            continue;
        }

        if has_denied_extension(relative, &denied) {
            skipped.denied_extension += 1;
            continue;
        }

        match is_binary_file(path) {
            Ok(false) => paths.push(rel_str),
            Ok(true) => {
                debug!("skipping binary file {}", rel_str);
                skipped.binary += 1;
            }
            Err(err) => {
                warn!("skipping unreadable file {}: {}", rel_str, err);
                skipped.unreadable += 1;
            }
        }
    }

    // Sort for deterministic ordering
    paths.sort();
    paths.dedup();

    Ok(ScanResult { paths, skipped })
}

/// True if the first [`SNIFF_LEN`] bytes are not UTF-8 text or contain NUL.
pub fn is_binary_file(path: &Path) -> std::io::Result<bool> {
    let mut head = Vec::with_capacity(SNIFF_LEN);
    File::open(path)?
        .take(SNIFF_LEN as u64)
        .read_to_end(&mut head)?;
    Ok(looks_binary(&head))
}

fn looks_binary(head: &[u8]) -> bool {
    if head.contains(&0) {
        return true;
    }
    match std::str::from_utf8(head) {
        Ok(_) => false,
        // A multi-byte character cut off by the sniff window is still text.
        Err(err) => err.error_len().is_some() || head.len() < SNIFF_LEN,
    }
}

/// `/`-joined form of a relative path, or `None` if it is not UTF-8.
pub fn relative_path_string(relative: &Path) -> Option<String> {
    let parts: Option<Vec<&str>> = relative
        .components()
        .map(|c| c.as_os_str().to_str())
        .collect();
    parts.map(|p| p.join("/"))
}

fn is_vcs_dir(relative: &Path) -> bool {
    relative.components().any(|c| {
        c.as_os_str()
            .to_str()
            .is_some_and(|name| VCS_DIRS.contains(&name))
    })
}

fn has_denied_extension(path: &Path, denied: &[String]) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| denied.iter().any(|d| d.eq_ignore_ascii_case(ext)))
        .unwrap_or(false)
}

fn build_ignore(root: &Path, ignore_file: Option<&Path>) -> Result<Gitignore> {
    let mut builder = GitignoreBuilder::new(root);
    if let Some(file) = ignore_file {
        let full = root.join(file);
        if full.is_file() {
            if let Some(err) = builder.add(&full) {
                warn!("problem reading {}: {}", full.display(), err);
            }
        }
    }
    builder
        .build()
        .with_context(|| format!("Failed to build ignore rules for {}", root.display()))
}

fn build_globset(patterns: &[String]) -> Result<GlobSet> {
    let mut builder = GlobSetBuilder::new();
    for pattern in patterns {
        builder.add(Glob::new(pattern).with_context(|| format!("Invalid glob: {}", pattern))?);
    }
    Ok(builder.build()?)
}
