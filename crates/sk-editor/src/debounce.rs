//! Time-based coalescing of property-panel edits.
//!
//! Edits are keyed by `(element, target, name)`. A newer edit for the same
//! key replaces the pending one and restarts its delay. Time is passed in
//! by the caller so the host event loop owns the clock.

use sk_core::{NodeId, PropertyEdit, PropertyTarget};
use std::collections::HashMap;
use std::time::{Duration, Instant};

type EditKey = (NodeId, PropertyTarget, String);

#[derive(Debug, Clone)]
struct PendingEdit {
    id: NodeId,
    edit: PropertyEdit,
    due: Instant,
    seq: u64,
}

#[derive(Debug, Clone)]
pub struct PropertyDebouncer {
    delay: Duration,
    pending: HashMap<EditKey, PendingEdit>,
    seq: u64,
}

impl PropertyDebouncer {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            pending: HashMap::new(),
            seq: 0,
        }
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    /// Queue an edit. Returns `true` if it superseded a pending edit.
    pub fn push(&mut self, id: NodeId, edit: PropertyEdit, now: Instant) -> bool {
        self.seq += 1;
        let key = (id, edit.target, edit.name.clone());
        let pending = PendingEdit {
            id,
            edit,
            due: now + self.delay,
            seq: self.seq,
        };
        let superseded = self.pending.insert(key, pending).is_some();
        if superseded {
            log::trace!("coalesced pending edit on {id}");
        }
        superseded
    }

    /// Remove and return edits whose delay has elapsed, oldest submission
    /// first.
    pub fn drain_ready(&mut self, now: Instant) -> Vec<(NodeId, PropertyEdit)> {
        let ready: Vec<EditKey> = self
            .pending
            .iter()
            .filter(|(_, p)| p.due <= now)
            .map(|(k, _)| k.clone())
            .collect();
        let mut out: Vec<PendingEdit> = ready
            .into_iter()
            .filter_map(|k| self.pending.remove(&k))
            .collect();
        out.sort_by_key(|p| p.seq);
        out.into_iter().map(|p| (p.id, p.edit)).collect()
    }

    /// Remove and return every pending edit regardless of its delay.
    pub fn flush(&mut self) -> Vec<(NodeId, PropertyEdit)> {
        let mut out: Vec<PendingEdit> = self.pending.drain().map(|(_, p)| p).collect();
        out.sort_by_key(|p| p.seq);
        out.into_iter().map(|p| (p.id, p.edit)).collect()
    }

    /// Drop pending edits for `id`. Returns how many were dropped.
    pub fn cancel(&mut self, id: NodeId) -> usize {
        let before = self.pending.len();
        self.pending.retain(|(node, _, _), _| *node != id);
        before - self.pending.len()
    }

    pub fn clear(&mut self) -> usize {
        let dropped = self.pending.len();
        self.pending.clear();
        dropped
    }

    /// When the earliest pending edit becomes ready.
    pub fn next_deadline(&self) -> Option<Instant> {
        self.pending.values().map(|p| p.due).min()
    }
}
