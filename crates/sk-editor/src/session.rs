//! Editor session: the single owner of the live page.
//!
//! Every change to the page goes through [`Session::apply`] so that
//! validation, selection upkeep and history commits happen in one place.
//! Hosts feed it mutations, shortcut actions, drag events and debounced
//! property edits; it hands back outcomes and queued selection events.

use crate::config::SessionConfig;
use crate::debounce::PropertyDebouncer;
use crate::gesture::{DragGesture, DragSource};
use crate::history::{HistoryError, Snapshot, SnapshotHistory};
use crate::selection::{self, Direction, Selection, SelectionEvent};
use crate::shortcuts::ShortcutAction;
use sk_core::{
    AlignEdge, Axis, Bounds, Breakpoint, EditError, ElementKind, ExportBundle, LintDiagnostic,
    NodeId, NodeInit, Page, ProjectMeta, PropertyEdit, SiblingStep, StyleMap,
};
use std::time::Instant;
use thiserror::Error;

// ─── Mutations ───────────────────────────────────────────────────────────

/// A user-level edit. One applied mutation is one undo step unless a batch
/// is open.
#[derive(Debug, Clone, PartialEq)]
pub enum Mutation {
    Create {
        kind: ElementKind,
        init: NodeInit,
    },
    Insert {
        kind: ElementKind,
        init: NodeInit,
        parent: Option<NodeId>,
        index: usize,
    },
    Reorder {
        id: NodeId,
        parent: Option<NodeId>,
        index: usize,
    },
    MoveSibling {
        id: NodeId,
        step: SiblingStep,
    },
    Delete {
        id: NodeId,
    },
    Duplicate {
        id: NodeId,
    },
    Group {
        ids: Vec<NodeId>,
    },
    Ungroup {
        id: NodeId,
    },
    Align {
        targets: Vec<(NodeId, Bounds)>,
        edge: AlignEdge,
    },
    Distribute {
        targets: Vec<(NodeId, Bounds)>,
        axis: Axis,
    },
    UpdateProperty {
        id: NodeId,
        edit: PropertyEdit,
    },
    SetOverride {
        id: NodeId,
        breakpoint: Breakpoint,
        delta: StyleMap,
    },
    ClearOverride {
        id: NodeId,
        breakpoint: Breakpoint,
        property: Option<String>,
    },
}

impl Mutation {
    /// History label shown in undo/redo menus.
    pub fn label(&self) -> String {
        match self {
            Mutation::Create { kind, .. } | Mutation::Insert { kind, .. } => {
                format!("Add {kind}")
            }
            Mutation::Reorder { .. } => "Move element".to_string(),
            Mutation::MoveSibling { step, .. } => match step {
                SiblingStep::Backward => "Send backward",
                SiblingStep::Forward => "Bring forward",
                SiblingStep::ToBack => "Send to back",
                SiblingStep::ToFront => "Bring to front",
            }
            .to_string(),
            Mutation::Delete { .. } => "Delete element".to_string(),
            Mutation::Duplicate { .. } => "Duplicate element".to_string(),
            Mutation::Group { ids } => format!("Group {} elements", ids.len()),
            Mutation::Ungroup { .. } => "Ungroup".to_string(),
            Mutation::Align { .. } => "Align elements".to_string(),
            Mutation::Distribute { .. } => "Distribute elements".to_string(),
            Mutation::UpdateProperty { edit, .. } => format!("Edit {}", edit.name),
            Mutation::SetOverride { breakpoint, .. } => format!("Set {breakpoint} styles"),
            Mutation::ClearOverride { breakpoint, .. } => format!("Clear {breakpoint} styles"),
        }
    }
}

/// What an applied mutation did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MutationOutcome {
    /// A new element (inserted, duplicated or group wrapper). It is now the
    /// selection.
    Created(NodeId),
    /// Elements removed by a cascade delete.
    Deleted(Vec<NodeId>),
    /// Former group children, now in the group's place.
    Ungrouped(Vec<NodeId>),
    Changed,
    /// Valid but without effect; nothing was committed.
    Unchanged,
}

impl MutationOutcome {
    pub fn changed(&self) -> bool {
        !matches!(self, MutationOutcome::Unchanged)
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SessionError {
    #[error(transparent)]
    Edit(#[from] EditError),

    #[error(transparent)]
    History(#[from] HistoryError),

    #[error("undo and redo are unavailable while a batch is open")]
    BatchOpen,

    #[error("no batch is open")]
    NoBatch,
}

// ─── Session ─────────────────────────────────────────────────────────────

#[derive(Debug)]
pub struct Session {
    page: Page,
    selection: Selection,
    history: SnapshotHistory,
    config: SessionConfig,
    debouncer: PropertyDebouncer,
    drag: DragGesture,
    batch_depth: usize,
    batch_dirty: bool,
    events: Vec<SelectionEvent>,
}

impl Session {
    /// An empty page with a baseline history entry.
    pub fn new(config: SessionConfig) -> Self {
        Self::with_page(Page::new(), config)
    }

    /// Start editing an existing page. The page becomes the undo baseline.
    pub fn with_page(page: Page, config: SessionConfig) -> Self {
        let mut session = Self {
            page,
            selection: Selection::new(),
            history: SnapshotHistory::new(config.history_limit),
            debouncer: PropertyDebouncer::new(config.debounce_delay()),
            config,
            drag: DragGesture::new(),
            batch_depth: 0,
            batch_dirty: false,
            events: Vec::new(),
        };
        let baseline = session.snapshot();
        if let Err(e) = session.history.reset(&baseline, "Open page") {
            log::warn!("could not record baseline: {e}");
        }
        session
    }

    pub fn page(&self) -> &Page {
        &self.page
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub fn history(&self) -> &SnapshotHistory {
        &self.history
    }

    pub fn can_undo(&self) -> bool {
        self.batch_depth == 0 && self.history.can_undo()
    }

    pub fn can_redo(&self) -> bool {
        self.batch_depth == 0 && self.history.can_redo()
    }

    fn snapshot(&self) -> Snapshot {
        Snapshot {
            page: self.page.clone(),
            selection: self.selection.current(),
        }
    }

    fn commit(&mut self, label: &str) -> Result<(), SessionError> {
        let snapshot = self.snapshot();
        let outcome = self.history.commit(&snapshot, label)?;
        if outcome.discarded > 0 {
            log::debug!("`{label}` discarded {} redo entries", outcome.discarded);
        }
        Ok(())
    }

    // ─── Applying mutations ──────────────────────────────────────────────

    /// Validate and apply `mutation`, then record it in history.
    ///
    /// Pending debounced edits are committed first so history keeps
    /// submission order. On error the page and history are untouched.
    ///
    /// # Errors
    /// Whatever the page operation rejects, or a snapshot encoding failure.
    pub fn apply(&mut self, mutation: Mutation) -> Result<MutationOutcome, SessionError> {
        self.flush_edits();
        self.apply_now(mutation)
    }

    fn apply_now(&mut self, mutation: Mutation) -> Result<MutationOutcome, SessionError> {
        let label = mutation.label();
        let committing = self.batch_depth == 0;
        let before = committing.then(|| (self.page.clone(), self.selection));
        let outcome = match self.execute(mutation) {
            Ok(outcome) => outcome,
            Err(e) => {
                log::warn!("`{label}` rejected: {e}");
                return Err(e.into());
            }
        };
        if !outcome.changed() {
            log::trace!("`{label}` changed nothing");
            return Ok(outcome);
        }

        let events_mark = self.events.len();
        if let MutationOutcome::Created(id) = outcome {
            let events = self.selection.select(id);
            self.push_events(events);
        }
        if let Some(event) = self.selection.retain_existing(self.page.document()) {
            self.events.push(event);
        }

        if let Some((page, selection)) = before {
            // The live page must always match the history cursor.
            if let Err(e) = self.commit(&label) {
                log::warn!("`{label}` rolled back: {e}");
                self.page = page;
                self.selection = selection;
                self.events.truncate(events_mark);
                return Err(e);
            }
        } else {
            self.batch_dirty = true;
        }
        if let MutationOutcome::Deleted(removed) = &outcome {
            for id in removed {
                self.debouncer.cancel(*id);
            }
        }
        Ok(outcome)
    }

    fn execute(&mut self, mutation: Mutation) -> Result<MutationOutcome, EditError> {
        let page = &mut self.page;
        Ok(match mutation {
            Mutation::Create { kind, init } => MutationOutcome::Created(page.create_node(kind, init)),
            Mutation::Insert {
                kind,
                init,
                parent,
                index,
            } => MutationOutcome::Created(page.insert_on_drop(kind, init, parent, index)?),
            Mutation::Reorder { id, parent, index } => {
                let doc = page.document();
                let before = (doc.parent_of(id), doc.index_in_parent(id));
                page.reorder(id, parent, index)?;
                let doc = page.document();
                changed_if(before != (doc.parent_of(id), doc.index_in_parent(id)))
            }
            Mutation::MoveSibling { id, step } => changed_if(page.move_sibling(id, step)?),
            Mutation::Delete { id } => {
                let removed = page.delete(id);
                if removed.is_empty() {
                    MutationOutcome::Unchanged
                } else {
                    MutationOutcome::Deleted(removed)
                }
            }
            Mutation::Duplicate { id } => MutationOutcome::Created(page.duplicate(id)?),
            Mutation::Group { ids } => MutationOutcome::Created(page.group(&ids)?),
            Mutation::Ungroup { id } => MutationOutcome::Ungrouped(page.ungroup(id)?),
            Mutation::Align { targets, edge } => {
                let before = page.clone();
                page.align(&targets, edge)?;
                changed_if(*page != before)
            }
            Mutation::Distribute { targets, axis } => {
                let before = page.clone();
                page.distribute(&targets, axis)?;
                changed_if(*page != before)
            }
            Mutation::UpdateProperty { id, edit } => changed_if(page.update_property(id, &edit)?),
            Mutation::SetOverride {
                id,
                breakpoint,
                delta,
            } => {
                let before = page.overlay().get(id, breakpoint).cloned();
                page.set_override(id, breakpoint, delta)?;
                changed_if(page.overlay().get(id, breakpoint).cloned() != before)
            }
            Mutation::ClearOverride {
                id,
                breakpoint,
                property,
            } => changed_if(page.clear_override(id, breakpoint, property.as_deref())?),
        })
    }

    // ─── Batching ────────────────────────────────────────────────────────

    /// Open a batch. Batches nest; only the outermost close commits.
    pub fn begin_batch(&mut self) {
        self.flush_edits();
        self.batch_depth += 1;
    }

    /// Close a batch. When the outermost batch closes and anything changed,
    /// one history entry labelled `label` is committed. Returns whether a
    /// commit happened.
    ///
    /// # Errors
    /// `NoBatch` without a matching `begin_batch`.
    pub fn end_batch(&mut self, label: &str) -> Result<bool, SessionError> {
        if self.batch_depth == 0 {
            return Err(SessionError::NoBatch);
        }
        self.flush_edits();
        self.batch_depth -= 1;
        if self.batch_depth > 0 || !std::mem::take(&mut self.batch_dirty) {
            return Ok(false);
        }
        self.commit(label)?;
        Ok(true)
    }

    pub fn in_batch(&self) -> bool {
        self.batch_depth > 0
    }

    // ─── Undo / Redo ─────────────────────────────────────────────────────

    /// Step back one entry. Returns the label of the undone change.
    ///
    /// # Errors
    /// `NothingToUndo` at the baseline; `BatchOpen` inside a batch.
    pub fn undo(&mut self) -> Result<String, SessionError> {
        if self.batch_depth > 0 {
            return Err(SessionError::BatchOpen);
        }
        self.flush_edits();
        let (snapshot, label) = self.history.undo()?;
        self.restore(snapshot);
        log::debug!("undid `{label}`");
        Ok(label)
    }

    /// Re-apply the next entry. Returns its label.
    ///
    /// # Errors
    /// `NothingToRedo` at the newest entry; `BatchOpen` inside a batch.
    pub fn redo(&mut self) -> Result<String, SessionError> {
        if self.batch_depth > 0 {
            return Err(SessionError::BatchOpen);
        }
        self.flush_edits();
        let (snapshot, label) = self.history.redo()?;
        self.restore(snapshot);
        log::debug!("redid `{label}`");
        Ok(label)
    }

    fn restore(&mut self, snapshot: Snapshot) {
        self.page = snapshot.page;
        self.debouncer.clear();
        self.drag.cancel();
        let events = self.selection.restore(snapshot.selection);
        self.push_events(events);
    }

    // ─── Selection ───────────────────────────────────────────────────────

    pub fn selected(&self) -> Option<NodeId> {
        self.selection.current()
    }

    /// # Errors
    /// `NotFound` if `id` is not on the page.
    pub fn select(&mut self, id: NodeId) -> Result<(), SessionError> {
        self.page.document().require(id)?;
        let events = self.selection.select(id);
        self.push_events(events);
        Ok(())
    }

    pub fn clear_selection(&mut self) -> bool {
        match self.selection.clear() {
            Some(event) => {
                self.events.push(event);
                true
            }
            None => false,
        }
    }

    /// Move the selection by arrow key. Returns `false` at a boundary or
    /// with nothing selected.
    pub fn navigate(&mut self, direction: Direction) -> bool {
        let Some(from) = self.selection.current() else {
            return false;
        };
        match selection::navigate(self.page.document(), from, direction) {
            Some(to) => {
                let events = self.selection.select(to);
                self.push_events(events);
                true
            }
            None => false,
        }
    }

    /// Root-to-selection path for breadcrumbs.
    pub fn hierarchy_path(&self) -> Vec<NodeId> {
        self.selection
            .current()
            .map(|id| selection::hierarchy_path(self.page.document(), id))
            .unwrap_or_default()
    }

    /// Drain queued selection events in emission order.
    pub fn take_selection_events(&mut self) -> Vec<SelectionEvent> {
        std::mem::take(&mut self.events)
    }

    fn push_events(&mut self, events: Vec<SelectionEvent>) {
        self.events.extend(events);
    }

    // ─── Shortcuts ───────────────────────────────────────────────────────

    /// Execute a resolved shortcut against the current selection. Returns
    /// whether anything happened; actions needing a selection do nothing
    /// without one, and undo/redo at a history boundary do nothing.
    ///
    /// # Errors
    /// Whatever the underlying mutation rejects.
    pub fn dispatch(&mut self, action: ShortcutAction) -> Result<bool, SessionError> {
        let selected = self.selection.current();
        let step = |step: SiblingStep| selected.map(|id| Mutation::MoveSibling { id, step });
        let mutation = match action {
            ShortcutAction::Undo => return boundary_is_noop(self.undo()),
            ShortcutAction::Redo => return boundary_is_noop(self.redo()),
            ShortcutAction::Deselect => return Ok(self.clear_selection()),
            ShortcutAction::Navigate(direction) => return Ok(self.navigate(direction)),
            ShortcutAction::Delete => selected.map(|id| Mutation::Delete { id }),
            ShortcutAction::Duplicate => selected.map(|id| Mutation::Duplicate { id }),
            ShortcutAction::Ungroup => selected.map(|id| Mutation::Ungroup { id }),
            ShortcutAction::SendBackward => step(SiblingStep::Backward),
            ShortcutAction::BringForward => step(SiblingStep::Forward),
            ShortcutAction::SendToBack => step(SiblingStep::ToBack),
            ShortcutAction::BringToFront => step(SiblingStep::ToFront),
        };
        match mutation {
            Some(mutation) => Ok(self.apply(mutation)?.changed()),
            None => Ok(false),
        }
    }

    // ─── Debounced property edits ────────────────────────────────────────

    /// Queue a property-panel edit. Rapid edits to the same property
    /// collapse into one history entry.
    ///
    /// # Errors
    /// `NotFound` if `id` is not on the page.
    pub fn queue_property_edit(
        &mut self,
        id: NodeId,
        edit: PropertyEdit,
        now: Instant,
    ) -> Result<(), SessionError> {
        self.page.document().require(id)?;
        self.debouncer.push(id, edit, now);
        Ok(())
    }

    /// Apply queued edits whose quiet period has elapsed. Returns how many
    /// changed the page.
    pub fn poll_edits(&mut self, now: Instant) -> usize {
        let ready = self.debouncer.drain_ready(now);
        self.apply_edits(ready)
    }

    /// Apply every queued edit immediately.
    pub fn flush_edits(&mut self) -> usize {
        let pending = self.debouncer.flush();
        self.apply_edits(pending)
    }

    /// When the host should next call [`Session::poll_edits`].
    pub fn next_edit_deadline(&self) -> Option<Instant> {
        self.debouncer.next_deadline()
    }

    pub fn pending_edits(&self) -> usize {
        self.debouncer.len()
    }

    fn apply_edits(&mut self, edits: Vec<(NodeId, PropertyEdit)>) -> usize {
        let mut applied = 0;
        for (id, edit) in edits {
            match self.apply_now(Mutation::UpdateProperty { id, edit }) {
                Ok(outcome) if outcome.changed() => applied += 1,
                Ok(_) => {}
                Err(e) => log::warn!("dropped queued edit on {id}: {e}"),
            }
        }
        applied
    }

    // ─── Drag and drop ───────────────────────────────────────────────────

    /// # Errors
    /// `NotFound` when dragging an element that is not on the page.
    pub fn begin_drag(&mut self, source: DragSource) -> Result<(), SessionError> {
        if let DragSource::Existing(id) = source {
            self.page.document().require(id)?;
        }
        self.drag.start(source);
        Ok(())
    }

    /// Record the drop position under the pointer; `None` for no valid
    /// target. Returns `false` when no drag is active.
    pub fn drag_over(&mut self, target: Option<(Option<NodeId>, usize)>) -> bool {
        if !self.drag.is_active() {
            return false;
        }
        match target {
            Some((parent, index)) => self.drag.update(parent, index),
            None => {
                self.drag.leave();
                true
            }
        }
    }

    /// Drop. Returns `None` when no drag was active or there was no target.
    ///
    /// # Errors
    /// Whatever the resulting insert or reorder rejects.
    pub fn end_drag(&mut self) -> Result<Option<MutationOutcome>, SessionError> {
        match self.drag.release() {
            Some(mutation) => self.apply(mutation).map(Some),
            None => Ok(None),
        }
    }

    pub fn cancel_drag(&mut self) -> bool {
        self.drag.cancel()
    }

    pub fn drag(&self) -> &DragGesture {
        &self.drag
    }

    // ─── Projects ────────────────────────────────────────────────────────

    /// Replace the page with a saved project and start a fresh history.
    /// On error the live session is untouched.
    ///
    /// # Errors
    /// `CorruptData` for malformed or inconsistent project text.
    pub fn load_project(&mut self, text: &str) -> Result<ProjectMeta, SessionError> {
        let loaded = sk_core::load_project(text)?;
        self.page = loaded.page;
        self.debouncer.clear();
        self.drag.cancel();
        self.batch_depth = 0;
        self.batch_dirty = false;
        if let Some(event) = self.selection.clear() {
            self.events.push(event);
        }
        let baseline = self.snapshot();
        self.history.reset(&baseline, "Open project")?;
        log::debug!(
            "loaded project `{}` ({} elements)",
            loaded.meta.name,
            self.page.document().len()
        );
        Ok(loaded.meta)
    }

    /// Serialize the page. `meta.modified` is bumped only on success.
    ///
    /// # Errors
    /// `CapacityExceeded` past `max_project_bytes`.
    pub fn save_project(&mut self, meta: &mut ProjectMeta) -> Result<String, SessionError> {
        self.flush_edits();
        let mut touched = meta.clone();
        touched.touch();
        let text = sk_core::save_project(&self.page, &touched, self.config.max_project_bytes)?;
        *meta = touched;
        Ok(text)
    }

    // ─── Read-only projections ───────────────────────────────────────────

    pub fn export(&self) -> ExportBundle {
        sk_core::export(&self.page, &self.config.export)
    }

    /// # Errors
    /// `NotFound` if `id` is not on the page.
    pub fn resolve_styles(&self, id: NodeId, breakpoint: Breakpoint) -> Result<StyleMap, SessionError> {
        Ok(self.page.resolve_styles(id, breakpoint)?)
    }

    pub fn lint(&self) -> Vec<LintDiagnostic> {
        sk_core::lint_page(&self.page)
    }
}

fn changed_if(changed: bool) -> MutationOutcome {
    if changed {
        MutationOutcome::Changed
    } else {
        MutationOutcome::Unchanged
    }
}

fn boundary_is_noop(result: Result<String, SessionError>) -> Result<bool, SessionError> {
    match result {
        Ok(_) => Ok(true),
        Err(SessionError::History(HistoryError::NothingToUndo | HistoryError::NothingToRedo)) => {
            Ok(false)
        }
        Err(e) => Err(e),
    }
}
