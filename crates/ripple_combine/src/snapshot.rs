//! Snapshots and synchronous snapshot access
//!
//! A snapshot maps field names to their latest observed values. Key
//! order is field declaration order and carries no other meaning.
//! Snapshots are rebuilt wholesale on every emission, never mutated in
//! place, so consumers can compare them by simple equality.

use indexmap::IndexMap;
use std::sync::{Arc, RwLock};

/// Field name → latest observed value
pub type Snapshot<V> = IndexMap<String, V>;

pub(crate) type SharedSnapshot<V> = Arc<RwLock<Option<Snapshot<V>>>>;

/// Synchronous access to the latest combined snapshot
///
/// The combined stream writes each snapshot here *before* yielding it,
/// so a reader observed right after an emission always matches that
/// emission.
pub struct SnapshotReader<V> {
    cell: SharedSnapshot<V>,
}

impl<V> Clone for SnapshotReader<V> {
    fn clone(&self) -> Self {
        Self {
            cell: self.cell.clone(),
        }
    }
}

impl<V: Clone> SnapshotReader<V> {
    pub(crate) fn new(cell: SharedSnapshot<V>) -> Self {
        Self { cell }
    }

    /// The most recently published snapshot, if any
    pub fn latest(&self) -> Option<Snapshot<V>> {
        self.cell.read().unwrap().clone()
    }

    /// The latest value of one field
    pub fn latest_value(&self, name: &str) -> Option<V> {
        self.cell
            .read()
            .unwrap()
            .as_ref()
            .and_then(|snapshot| snapshot.get(name).cloned())
    }
}
