//! Sync progress reporting.
//!
//! Reports observable progress during `repo-chat sync` so users see what is
//! being scanned, how many files are left to read, and which store batch is
//! being written. Progress is emitted on **stderr** so stdout remains
//! parseable for scripts.

use std::io::Write;

use clap::ValueEnum;

/// A single progress event for sync.
#[derive(Clone, Debug)]
pub enum SyncProgressEvent {
    /// Walking the repository. Total unknown.
    Scanning { collection: String },
    /// Reading and hashing files: n of total done.
    Identifying {
        collection: String,
        n: u64,
        total: u64,
    },
    /// Writing a batch to the store.
    Applying {
        collection: String,
        op: &'static str,
        batch: u64,
        batches: u64,
    },
}

/// Reports sync progress. Implementations write to stderr (human or JSON).
pub trait SyncProgressReporter: Send + Sync {
    /// Emit a progress event. Called from the sync driver.
    fn report(&self, event: SyncProgressEvent);
}

/// Human-friendly progress on stderr: "sync repo-chat  identifying  1,234 / 5,000 files".
pub struct StderrProgress;

impl SyncProgressReporter for StderrProgress {
    fn report(&self, event: SyncProgressEvent) {
        let line = match &event {
            SyncProgressEvent::Scanning { collection } => {
                format!("sync {}  scanning...\n", collection)
            }
            SyncProgressEvent::Identifying {
                collection,
                n,
                total,
            } => format!(
                "sync {}  identifying  {} / {} files\n",
                collection,
                format_number(*n),
                format_number(*total)
            ),
            SyncProgressEvent::Applying {
                collection,
                op,
                batch,
                batches,
            } => format!(
                "sync {}  {}  batch {} / {}\n",
                collection,
                op,
                format_number(*batch),
                format_number(*batches)
            ),
        };
        let _ = std::io::stderr().lock().write_all(line.as_bytes());
        let _ = std::io::stderr().lock().flush();
    }
}

/// Machine-readable progress: one JSON object per line on stderr.
pub struct JsonProgress;

impl SyncProgressReporter for JsonProgress {
    fn report(&self, event: SyncProgressEvent) {
        let obj = match &event {
            SyncProgressEvent::Scanning { collection } => serde_json::json!({
                "event": "progress",
                "collection": collection,
                "phase": "scanning"
            }),
            SyncProgressEvent::Identifying {
                collection,
                n,
                total,
            } => serde_json::json!({
                "event": "progress",
                "collection": collection,
                "phase": "identifying",
                "n": n,
                "total": total
            }),
            SyncProgressEvent::Applying {
                collection,
                op,
                batch,
                batches,
            } => serde_json::json!({
                "event": "progress",
                "collection": collection,
                "phase": op,
                "batch": batch,
                "batches": batches
            }),
        };
        if let Ok(line) = serde_json::to_string(&obj) {
            let _ = writeln!(std::io::stderr().lock(), "{}", line);
            let _ = std::io::stderr().lock().flush();
        }
    }
}

/// No-op reporter when progress is disabled.
pub struct NoProgress;

impl SyncProgressReporter for NoProgress {
    fn report(&self, _event: SyncProgressEvent) {}
}

fn format_number(n: u64) -> String {
    let s = n.to_string();
    let mut result = String::with_capacity(s.len() + (s.len() - 1) / 3);
    let chars: Vec<char> = s.chars().rev().collect();
    for (i, c) in chars.iter().enumerate() {
        if i > 0 && i % 3 == 0 {
            result.push(',');
        }
        result.push(*c);
    }
    result.chars().rev().collect()
}

/// Progress mode for the CLI: off, human (stderr), or JSON (stderr).
#[derive(Clone, Copy, Debug, Eq, PartialEq, ValueEnum)]
pub enum ProgressMode {
    Off,
    Human,
    Json,
}

impl ProgressMode {
    /// Default: human progress when stderr is a TTY, otherwise off.
    pub fn default_for_tty() -> Self {
        if atty::is(atty::Stream::Stderr) {
            ProgressMode::Human
        } else {
            ProgressMode::Off
        }
    }

    /// Build a reporter for this mode.
    pub fn reporter(&self) -> Box<dyn SyncProgressReporter> {
        match self {
            ProgressMode::Off => Box::new(NoProgress),
            ProgressMode::Human => Box::new(StderrProgress),
            ProgressMode::Json => Box::new(JsonProgress),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn format_number_comma() {
        assert_eq!(format_number(0), "0");
        assert_eq!(format_number(1), "1");
        assert_eq!(format_number(999), "999");
        assert_eq!(format_number(1000), "1,000");
        assert_eq!(format_number(1234), "1,234");
        assert_eq!(format_number(1_234_567), "1,234,567");
    }
}
