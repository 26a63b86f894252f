//! Sync driver.
//!
//! Coordinates a full run: scan → identify → uniqueness check → read stored
//! ids → reconcile → batched apply → report. [`run_sync`] takes its store
//! handles from the caller; only the CLI wrapper [`run_sync_cmd`] opens the
//! SQLite store.
//!
//! Every check that can abort a run (bad root, duplicate identifiers, an id
//! listing that would be truncated) happens before the first write. Once
//! writing starts, a rejected batch is recorded and the run moves on to the
//! next one; a connection failure stops the remaining batches. Batches that
//! were applied stay applied.

use std::collections::BTreeSet;
use std::fmt;

use anyhow::Result;
use serde::Serialize;
use tracing::{info, warn};

use repo_chat_core::error::{StoreError, SyncError};
use repo_chat_core::models::{FileRecord, Identified, SkipCounts};
use repo_chat_core::reconcile::{compute_delta, Delta};
use repo_chat_core::store::DocumentStore;

use crate::config::Config;
use crate::folders::folder_records;
use crate::identify::read_file_records;
use crate::progress::{SyncProgressEvent, SyncProgressReporter};
use crate::scanner::{scan_repository, ScanOptions};
use crate::sqlite_store::SqliteStore;

/// Inputs for one sync run.
#[derive(Debug, Clone)]
pub struct SyncOptions {
    pub scan: ScanOptions,
    pub max_content_chars: usize,
    pub batch_size: usize,
    pub peek_limit: usize,
    pub dry_run: bool,
}

impl SyncOptions {
    pub fn from_config(config: &Config) -> Self {
        Self {
            scan: ScanOptions::from_config(&config.repository),
            max_content_chars: config.repository.max_content_chars,
            batch_size: config.sync.batch_size,
            peek_limit: config.sync.peek_limit,
            dry_run: false,
        }
    }
}

/// Store operation a batch belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum BatchOp {
    Upsert,
    Delete,
}

impl fmt::Display for BatchOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BatchOp::Upsert => f.write_str("upsert"),
            BatchOp::Delete => f.write_str("delete"),
        }
    }
}

/// A batch the store refused.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BatchFailure {
    pub op: BatchOp,
    /// 1-based position among the batches of `op`.
    pub batch: usize,
    pub size: usize,
    #[serde(serialize_with = "serialize_display")]
    pub error: StoreError,
}

fn serialize_display<S: serde::Serializer>(err: &StoreError, s: S) -> Result<S::Ok, S::Error> {
    s.collect_str(err)
}

/// Outcome of reconciling one collection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CollectionReport {
    pub collection: String,
    pub count_before: usize,
    /// `None` for dry runs, aborted runs, or when the final count failed.
    pub count_after: Option<usize>,
    /// Documents written (or, for dry runs, that would be written).
    pub added: usize,
    /// Documents deleted (or, for dry runs, that would be deleted).
    pub removed: usize,
    pub batches_applied: usize,
    pub batches_total: usize,
    pub failures: Vec<BatchFailure>,
    /// A connection failure stopped the remaining batches.
    pub aborted: bool,
    pub dry_run: bool,
}

impl CollectionReport {
    pub fn is_success(&self) -> bool {
        self.failures.is_empty() && !self.aborted
    }

    pub fn first_error(&self) -> Option<&BatchFailure> {
        self.failures.first()
    }
}

/// Result of a sync run: the file collection, and folders when enabled.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SyncReport {
    pub scanned: usize,
    pub skipped: SkipCounts,
    /// Paths found by the scan but not readable as text.
    pub unreadable: Vec<String>,
    pub files: CollectionReport,
    pub folders: Option<CollectionReport>,
}

impl SyncReport {
    pub fn is_success(&self) -> bool {
        self.files.is_success() && self.folders.as_ref().map_or(true, |f| f.is_success())
    }

    /// First batch failure across both collections.
    pub fn first_error(&self) -> Option<&BatchFailure> {
        self.files
            .first_error()
            .or_else(|| self.folders.as_ref().and_then(|f| f.first_error()))
    }
}

/// Reconciled-but-not-applied state for one collection.
struct Plan<T> {
    count_before: usize,
    delta: Delta<T>,
}

/// Run a full sync of `options.scan.root` into `store`.
///
/// When `folder_store` is given, folder records derived from the same file
/// set are reconciled into it after the files.
pub async fn run_sync(
    store: &dyn DocumentStore,
    folder_store: Option<&dyn DocumentStore>,
    options: &SyncOptions,
    progress: &dyn SyncProgressReporter,
) -> Result<SyncReport> {
    let collection = store.name().to_string();

    progress.report(SyncProgressEvent::Scanning {
        collection: collection.clone(),
    });
    let scan = scan_repository(&options.scan)?;
    info!(
        "scanned {}: {} eligible, {} skipped",
        options.scan.root.display(),
        scan.paths.len(),
        scan.skipped.total()
    );

    let (records, read_errors) = read_file_records(
        &options.scan.root,
        &scan.paths,
        options.max_content_chars,
        |n, total| {
            progress.report(SyncProgressEvent::Identifying {
                collection: collection.clone(),
                n,
                total,
            })
        },
    );
    let unreadable: Vec<String> = read_errors
        .iter()
        .map(|e| e.path().display().to_string())
        .collect();

    // Plan everything before the first write.
    let file_plan = plan(store, &records, options.peek_limit).await?;
    let folder_plan = match folder_store {
        Some(folder_store) => {
            let folders = folder_records(&records);
            Some((
                folder_store,
                plan(folder_store, &folders, options.peek_limit).await?,
            ))
        }
        None => None,
    };

    let files = apply(store, file_plan, options, progress).await;

    let folders = match folder_plan {
        Some((folder_store, _)) if files.aborted => {
            warn!(
                "skipping folder collection {} after connection failure",
                folder_store.name()
            );
            None
        }
        Some((folder_store, folder_plan)) => {
            Some(apply(folder_store, folder_plan, options, progress).await)
        }
        None => None,
    };

    Ok(SyncReport {
        scanned: scan.paths.len(),
        skipped: scan.skipped,
        unreadable,
        files,
        folders,
    })
}

/// Count, list stored ids, and compute the delta for one collection.
async fn plan<T: Identified + Clone>(
    store: &dyn DocumentStore,
    records: &[T],
    peek_limit: usize,
) -> Result<Plan<T>, SyncError> {
    let collection = store.name().to_string();
    let count_before = store.count().await.map_err(|source| SyncError::Store {
        collection: collection.clone(),
        action: "count",
        source,
    })?;

    if count_before > peek_limit {
        return Err(SyncError::PeekLimitExceeded {
            collection,
            count: count_before,
            limit: peek_limit,
        });
    }

    let stored: BTreeSet<String> =
        store
            .peek_ids(peek_limit)
            .await
            .map_err(|source| SyncError::Store {
                collection: collection.clone(),
                action: "list ids of",
                source,
            })?;

    let delta = compute_delta(records, &stored)?;
    info!(
        "{}: {} stored, {} current, {} to add, {} to remove",
        collection,
        stored.len(),
        records.len(),
        delta.to_add.len(),
        delta.to_remove.len()
    );

    Ok(Plan {
        count_before,
        delta,
    })
}

/// Write a plan's delta in batches: additions first, then removals.
async fn apply<T: Identified>(
    store: &dyn DocumentStore,
    plan: Plan<T>,
    options: &SyncOptions,
    progress: &dyn SyncProgressReporter,
) -> CollectionReport {
    let collection = store.name().to_string();
    let Plan {
        count_before,
        delta,
    } = plan;

    let add_batches: Vec<&[T]> = delta.to_add.chunks(options.batch_size).collect();
    let remove_batches: Vec<&[String]> = delta.to_remove.chunks(options.batch_size).collect();

    let mut report = CollectionReport {
        collection: collection.clone(),
        count_before,
        count_after: None,
        added: 0,
        removed: 0,
        batches_applied: 0,
        batches_total: add_batches.len() + remove_batches.len(),
        failures: Vec::new(),
        aborted: false,
        dry_run: options.dry_run,
    };

    if options.dry_run {
        report.added = delta.to_add.len();
        report.removed = delta.to_remove.len();
        return report;
    }

    let upsert_total = add_batches.len() as u64;
    for (i, batch) in add_batches.iter().enumerate() {
        progress.report(SyncProgressEvent::Applying {
            collection: collection.clone(),
            op: "upserting",
            batch: i as u64 + 1,
            batches: upsert_total,
        });
        let docs: Vec<_> = batch.iter().map(|r| r.to_document()).collect();
        match store.upsert(&docs).await {
            Ok(()) => {
                report.batches_applied += 1;
                report.added += batch.len();
            }
            Err(err) => {
                if record_failure(&mut report, BatchOp::Upsert, i + 1, batch.len(), err) {
                    return report;
                }
            }
        }
    }

    let delete_total = remove_batches.len() as u64;
    for (i, batch) in remove_batches.iter().enumerate() {
        progress.report(SyncProgressEvent::Applying {
            collection: collection.clone(),
            op: "deleting",
            batch: i as u64 + 1,
            batches: delete_total,
        });
        match store.delete(batch).await {
            Ok(()) => {
                report.batches_applied += 1;
                report.removed += batch.len();
            }
            Err(err) => {
                if record_failure(&mut report, BatchOp::Delete, i + 1, batch.len(), err) {
                    return report;
                }
            }
        }
    }

    match store.count().await {
        Ok(count) => report.count_after = Some(count),
        Err(err) => warn!("{}: final count failed: {}", collection, err),
    }

    info!(
        "{}: {} added, {} removed, {} / {} batches applied",
        collection, report.added, report.removed, report.batches_applied, report.batches_total
    );
    report
}

/// Record a failed batch; returns true when the run must stop.
fn record_failure(
    report: &mut CollectionReport,
    op: BatchOp,
    batch: usize,
    size: usize,
    error: StoreError,
) -> bool {
    warn!(
        "{}: {} batch {} ({} documents) failed: {}",
        report.collection, op, batch, size, error
    );
    let abort = error.is_connection();
    report.failures.push(BatchFailure {
        op,
        batch,
        size,
        error,
    });
    if abort {
        report.aborted = true;
    }
    abort
}

/// Records for the files currently in the repository, without a store.
///
/// Used by `repo-chat scan` to list what a sync would index.
pub fn current_records(options: &SyncOptions) -> Result<(Vec<FileRecord>, SkipCounts, usize)> {
    let scan = scan_repository(&options.scan)?;
    let (records, errors) = read_file_records(
        &options.scan.root,
        &scan.paths,
        options.max_content_chars,
        |_, _| {},
    );
    Ok((records, scan.skipped, errors.len()))
}

/// CLI entry point for `repo-chat sync`.
///
/// Returns whether every batch was applied, so the binary can set its exit
/// status.
pub async fn run_sync_cmd(
    config: &Config,
    dry_run: bool,
    folders: bool,
    json: bool,
    progress: &dyn SyncProgressReporter,
) -> Result<bool> {
    let store = SqliteStore::open(config, config.sync.collection.clone()).await?;
    let folder_store = (folders || config.sync.folders)
        .then(|| store.sibling(config.sync.folder_collection()));

    let mut options = SyncOptions::from_config(config);
    options.dry_run = dry_run;

    let report = run_sync(
        &store,
        folder_store.as_ref().map(|s| s as &dyn DocumentStore),
        &options,
        progress,
    )
    .await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!("{}", report);
    }

    store.pool().close().await;
    Ok(report.is_success())
}

/// CLI entry point for `repo-chat scan`: print `id  path` per eligible file.
pub fn run_scan(config: &Config) -> Result<()> {
    let options = SyncOptions::from_config(config);
    let (records, skipped, unreadable) = current_records(&options)?;

    for record in &records {
        println!("{}  {}", record.id, record.relative_path);
    }
    println!();
    println!("files: {}", records.len());
    println!(
        "skipped: {} ignored, {} vcs, {} denied extension, {} binary, {} unreadable",
        skipped.ignored,
        skipped.vcs,
        skipped.denied_extension,
        skipped.binary,
        skipped.unreadable + unreadable as u64
    );
    Ok(())
}

impl fmt::Display for CollectionReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.dry_run {
            writeln!(f, "collection {} (dry-run)", self.collection)?;
        } else {
            writeln!(f, "collection {}", self.collection)?;
        }
        writeln!(f, "  documents before: {}", self.count_before)?;
        if self.dry_run {
            writeln!(f, "  would add: {}", self.added)?;
            writeln!(f, "  would remove: {}", self.removed)?;
            return Ok(());
        }
        writeln!(f, "  added: {}", self.added)?;
        writeln!(f, "  removed: {}", self.removed)?;
        match self.count_after {
            Some(count) => writeln!(f, "  documents after: {}", count)?,
            None => writeln!(f, "  documents after: unknown")?,
        }
        writeln!(
            f,
            "  batches applied: {} / {}",
            self.batches_applied, self.batches_total
        )?;
        for failure in &self.failures {
            writeln!(
                f,
                "  failed {} batch {} ({} documents): {}",
                failure.op, failure.batch, failure.size, failure.error
            )?;
        }
        if self.aborted {
            writeln!(f, "  aborted: remaining batches skipped")?;
        }
        Ok(())
    }
}

impl fmt::Display for SyncReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "sync {}", self.files.collection)?;
        writeln!(
            f,
            "  scanned: {} files ({} skipped)",
            self.scanned,
            self.skipped.total()
        )?;
        if !self.unreadable.is_empty() {
            writeln!(f, "  unreadable: {}", self.unreadable.len())?;
        }
        write!(f, "{}", self.files)?;
        if let Some(folders) = &self.folders {
            write!(f, "{}", folders)?;
        }
        if self.is_success() {
            write!(f, "ok")
        } else {
            write!(f, "partial")
        }
    }
}
