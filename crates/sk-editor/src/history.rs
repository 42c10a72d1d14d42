//! Snapshot history for undo/redo.
//!
//! Every committed state is encoded with MessagePack into an owned buffer,
//! so entries never alias the live page. Restoring decodes a fresh copy
//! that replaces the page wholesale.
//!
//! The cursor always points at the entry matching the live state. A commit
//! after an undo discards everything past the cursor.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sk_core::{EditError, NodeId, Page};
use thiserror::Error;

/// One restorable editor state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    pub page: Page,
    pub selection: Option<NodeId>,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum HistoryError {
    #[error("nothing to undo")]
    NothingToUndo,

    #[error("nothing to redo")]
    NothingToRedo,

    /// A snapshot could not be encoded or decoded.
    #[error(transparent)]
    Edit(#[from] EditError),
}

/// What a commit did besides appending.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CommitOutcome {
    /// Oldest entries dropped to stay within the limit.
    pub evicted: usize,
    /// Redo entries discarded by committing after an undo.
    pub discarded: usize,
}

#[derive(Debug, Clone)]
struct HistoryEntry {
    bytes: Vec<u8>,
    label: String,
    timestamp: DateTime<Utc>,
}

/// Linear undo/redo log of encoded snapshots.
#[derive(Debug, Clone)]
pub struct SnapshotHistory {
    entries: Vec<HistoryEntry>,
    cursor: usize,
    max_entries: usize,
    #[cfg(test)]
    pub(crate) fail_next_commit: bool,
}

impl SnapshotHistory {
    /// A history keeping at most `max_entries` states (at least two, so
    /// one step can always be undone).
    pub fn new(max_entries: usize) -> Self {
        let max_entries = max_entries.max(2);
        Self {
            entries: Vec::with_capacity(max_entries.min(64)),
            cursor: 0,
            max_entries,
            #[cfg(test)]
            fail_next_commit: false,
        }
    }

    /// Record `snapshot` as the new current state.
    ///
    /// # Errors
    /// `HistoryError::Edit` if the snapshot cannot be encoded; the history
    /// is unchanged in that case.
    pub fn commit(&mut self, snapshot: &Snapshot, label: &str) -> Result<CommitOutcome, HistoryError> {
        #[cfg(test)]
        {
            if std::mem::take(&mut self.fail_next_commit) {
                return Err(EditError::CorruptData("encoding disabled".into()).into());
            }
        }
        let bytes = encode(snapshot)?;
        let mut outcome = CommitOutcome::default();

        if !self.entries.is_empty() {
            let keep = self.cursor + 1;
            outcome.discarded = self.entries.len() - keep;
            self.entries.truncate(keep);
        }
        self.entries.push(HistoryEntry {
            bytes,
            label: label.to_string(),
            timestamp: Utc::now(),
        });
        if self.entries.len() > self.max_entries {
            outcome.evicted = self.entries.len() - self.max_entries;
            self.entries.drain(..outcome.evicted);
            log::warn!(
                "history limit {} reached; evicted {} oldest entries",
                self.max_entries,
                outcome.evicted
            );
        }
        self.cursor = self.entries.len() - 1;
        log::debug!("committed `{label}` ({} entries)", self.entries.len());
        Ok(outcome)
    }

    /// Drop every entry and start again from `snapshot`.
    ///
    /// # Errors
    /// `HistoryError::Edit` if the snapshot cannot be encoded.
    pub fn reset(&mut self, snapshot: &Snapshot, label: &str) -> Result<(), HistoryError> {
        let bytes = encode(snapshot)?;
        self.entries.clear();
        self.entries.push(HistoryEntry {
            bytes,
            label: label.to_string(),
            timestamp: Utc::now(),
        });
        self.cursor = 0;
        Ok(())
    }

    /// Step back one entry. Returns the restored state and the label of the
    /// entry that was undone.
    ///
    /// # Errors
    /// `NothingToUndo` at the oldest entry; `Edit(CorruptData)` if the
    /// stored snapshot does not decode (the cursor does not move).
    pub fn undo(&mut self) -> Result<(Snapshot, String), HistoryError> {
        if self.cursor == 0 || self.entries.is_empty() {
            return Err(HistoryError::NothingToUndo);
        }
        let snapshot = decode(&self.entries[self.cursor - 1].bytes)?;
        let label = self.entries[self.cursor].label.clone();
        self.cursor -= 1;
        Ok((snapshot, label))
    }

    /// Step forward one entry. Returns the restored state and the label of
    /// the entry that was redone.
    ///
    /// # Errors
    /// `NothingToRedo` at the newest entry; `Edit(CorruptData)` if the
    /// stored snapshot does not decode.
    pub fn redo(&mut self) -> Result<(Snapshot, String), HistoryError> {
        if self.cursor + 1 >= self.entries.len() {
            return Err(HistoryError::NothingToRedo);
        }
        let entry = &self.entries[self.cursor + 1];
        let snapshot = decode(&entry.bytes)?;
        let label = entry.label.clone();
        self.cursor += 1;
        Ok((snapshot, label))
    }

    pub fn can_undo(&self) -> bool {
        self.cursor > 0
    }

    pub fn can_redo(&self) -> bool {
        self.cursor + 1 < self.entries.len()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn max_entries(&self) -> usize {
        self.max_entries
    }

    /// Label of the entry `undo` would revert.
    pub fn undo_label(&self) -> Option<&str> {
        self.can_undo()
            .then(|| self.entries[self.cursor].label.as_str())
    }

    /// Label of the entry `redo` would re-apply.
    pub fn redo_label(&self) -> Option<&str> {
        self.entries.get(self.cursor + 1).map(|e| e.label.as_str())
    }

    /// `(label, timestamp)` of every entry, oldest first.
    pub fn entries(&self) -> impl Iterator<Item = (&str, DateTime<Utc>)> + '_ {
        self.entries.iter().map(|e| (e.label.as_str(), e.timestamp))
    }

    /// Total bytes held by encoded snapshots.
    pub fn encoded_bytes(&self) -> usize {
        self.entries.iter().map(|e| e.bytes.len()).sum()
    }
}

fn encode(snapshot: &Snapshot) -> Result<Vec<u8>, EditError> {
    rmp_serde::to_vec_named(snapshot)
        .map_err(|e| EditError::CorruptData(format!("cannot encode snapshot: {e}")))
}

fn decode(bytes: &[u8]) -> Result<Snapshot, EditError> {
    rmp_serde::from_slice(bytes)
        .map_err(|e| EditError::CorruptData(format!("cannot decode snapshot: {e}")))
}
