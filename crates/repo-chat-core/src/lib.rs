//! # repo-chat core
//!
//! Filesystem-free logic for repo-chat: data models, content identifiers,
//! delta reconciliation, error types, and the document store trait.
//!
//! This crate contains no tokio, sqlx, or filesystem I/O. Scanning and
//! reading files happen in the `repo-chat` crate, which feeds the results
//! into [`reconcile::compute_delta`] and applies them through a
//! [`store::DocumentStore`].

pub mod error;
pub mod identity;
pub mod models;
pub mod reconcile;
pub mod store;
