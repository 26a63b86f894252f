//! Delta computation between the current record set and a store's ids.
//!
//! # Algorithm
//!
//! 1. [`ensure_unique`] rejects record sets where two records share an id.
//! 2. `to_add` keeps every record whose id the store does not hold. A file
//!    whose content changed has a new id, so it lands here too.
//! 3. `to_remove` keeps every stored id that no current record produces,
//!    which includes the orphaned ids of changed files.
//!
//! `to_add` ids are absent from the store and `to_remove` ids are present,
//! so the two sides never overlap and may be applied in either order.

use std::collections::{BTreeMap, BTreeSet, HashSet};

use crate::error::ConsistencyError;
use crate::models::Identified;

/// Changes needed to bring a store in line with the current records.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Delta<T> {
    pub to_add: Vec<T>,
    /// Sorted.
    pub to_remove: Vec<String>,
}

impl<T> Delta<T> {
    pub fn is_empty(&self) -> bool {
        self.to_add.is_empty() && self.to_remove.is_empty()
    }
}

/// Fail if any identifier is produced by more than one record.
///
/// Reports the first duplicated id (in id order) with every path that
/// produced it.
pub fn ensure_unique<T: Identified>(records: &[T]) -> Result<(), ConsistencyError> {
    let mut by_id: BTreeMap<&str, Vec<&str>> = BTreeMap::new();
    for record in records {
        by_id.entry(record.id()).or_default().push(record.label());
    }

    match by_id.into_iter().find(|(_, labels)| labels.len() > 1) {
        Some((id, labels)) => Err(ConsistencyError {
            id: id.to_string(),
            paths: labels.into_iter().map(str::to_string).collect(),
        }),
        None => Ok(()),
    }
}

/// Compute what to add and remove, after checking id uniqueness.
pub fn compute_delta<T: Identified + Clone>(
    records: &[T],
    stored_ids: &BTreeSet<String>,
) -> Result<Delta<T>, ConsistencyError> {
    ensure_unique(records)?;

    let current: HashSet<&str> = records.iter().map(|r| r.id()).collect();

    let to_add = records
        .iter()
        .filter(|r| !stored_ids.contains(r.id()))
        .cloned()
        .collect();

    let to_remove = stored_ids
        .iter()
        .filter(|id| !current.contains(id.as_str()))
        .cloned()
        .collect();

    Ok(Delta { to_add, to_remove })
}
