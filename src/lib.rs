//! # repo-chat
//!
//! Keeps a document store in step with a source repository, so a chat
//! assistant can retrieve the repository's files.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────┐   ┌──────────┐   ┌───────────┐   ┌────────────┐
//! │ Scanner  │──▶│ Identify │──▶│ Reconcile │──▶│ Batched    │
//! │ walk+ign │   │ sha-256  │   │ delta     │   │ apply      │
//! └──────────┘   └──────────┘   └───────────┘   └─────┬──────┘
//!                                                     ▼
//!                                              ┌────────────┐
//!                                              │ Document   │
//!                                              │ store      │
//!                                              └────────────┘
//! ```
//!
//! Each run rescans the repository, derives an identifier per file from its
//! path and content, and diffs those ids against the ids already stored.
//! Only new or changed files are written, and ids that no longer match a
//! file are deleted. Re-running with no changes writes nothing.
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`config`] | TOML configuration parsing |
//! | [`scanner`] | Repository walk, ignore rules, binary detection |
//! | [`identify`] | File reading and record construction |
//! | [`folders`] | Folder-level records derived from file records |
//! | [`sync`] | Sync driver and report |
//! | [`sqlite_store`] | SQLite document store |
//! | [`progress`] | Progress reporting on stderr |
//! | [`db`] | Database connection |
//! | [`migrate`] | Schema creation |

pub mod config;
pub mod db;
pub mod folders;
pub mod get;
pub mod identify;
pub mod migrate;
pub mod progress;
pub mod scanner;
pub mod sqlite_store;
pub mod status;
pub mod sync;
