pub mod fs;

use crate::error::{EngineError, Result};
use crate::types::snapshot::Snapshot;
use chrono::NaiveDate;
use std::collections::BTreeMap;
use tracing::{debug, info};

/// Append-only, date-ordered sequence of snapshots.
///
/// Only the newest `retention` snapshots stay addressable; evicted ones are
/// dropped from memory, never from disk.
#[derive(Debug, Default)]
pub struct SnapshotStore {
    snapshots: BTreeMap<NaiveDate, Snapshot>,
    retention: Option<usize>,
}

impl SnapshotStore {
    pub fn new(retention: Option<usize>) -> Self {
        Self {
            snapshots: BTreeMap::new(),
            retention,
        }
    }

    /// Fails when `as_of` predates the newest stored snapshot.
    pub fn check_order(&self, as_of: NaiveDate) -> Result<()> {
        match self.latest_date() {
            Some(latest) if as_of < latest => Err(EngineError::SnapshotOrder(format!(
                "{as_of} is older than the latest stored snapshot {latest}"
            ))),
            _ => Ok(()),
        }
    }

    /// Appends a snapshot. Re-appending the latest date replaces that snapshot.
    pub fn append(&mut self, snapshot: Snapshot) -> Result<()> {
        let as_of = snapshot.as_of();
        self.check_order(as_of)?;
        if self.snapshots.insert(as_of, snapshot).is_some() {
            info!(as_of = %as_of, "replaced snapshot for re-run cycle");
        }
        self.evict();
        Ok(())
    }

    fn evict(&mut self) {
        let Some(keep) = self.retention else {
            return;
        };
        while self.snapshots.len() > keep {
            if let Some((date, _)) = self.snapshots.pop_first() {
                debug!(as_of = %date, "snapshot evicted by retention");
            }
        }
    }

    pub fn get(&self, as_of: NaiveDate) -> Option<&Snapshot> {
        self.snapshots.get(&as_of)
    }

    pub fn latest(&self) -> Option<&Snapshot> {
        self.snapshots.values().next_back()
    }

    fn latest_date(&self) -> Option<NaiveDate> {
        self.snapshots.keys().next_back().copied()
    }

    /// The two newest snapshots as `(previous, current)`.
    pub fn latest_pair(&self) -> Option<(Option<&Snapshot>, &Snapshot)> {
        let mut newest = self.snapshots.values().rev();
        let current = newest.next()?;
        Some((newest.next(), current))
    }

    pub fn dates(&self) -> Vec<NaiveDate> {
        self.snapshots.keys().copied().collect()
    }

    pub fn len(&self) -> usize {
        self.snapshots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.snapshots.is_empty()
    }
}
