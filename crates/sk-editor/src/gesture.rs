//! Drag-and-drop gesture state machine.
//!
//! A gesture holds no reference to the page. Hover updates only record
//! where a drop would land; the page is touched once, when the caller
//! applies the mutation returned by [`DragGesture::release`].

use crate::session::Mutation;
use sk_core::{ElementKind, NodeId, NodeInit};

/// What is being dragged.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DragSource {
    /// A new element from the palette.
    Palette(ElementKind),
    /// An element already on the canvas.
    Existing(NodeId),
}

/// Where a drop would land. `parent: None` is the root list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DropTarget {
    pub parent: Option<NodeId>,
    pub index: usize,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
enum GestureState {
    #[default]
    Idle,
    Active {
        source: DragSource,
        hover: Option<DropTarget>,
    },
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DragGesture {
    state: GestureState,
}

impl DragGesture {
    pub fn new() -> Self {
        Self::default()
    }

    /// Begin dragging `source`, abandoning any gesture already in flight.
    pub fn start(&mut self, source: DragSource) {
        if self.is_active() {
            log::debug!("drag restarted before drop; previous gesture abandoned");
        }
        self.state = GestureState::Active {
            source,
            hover: None,
        };
    }

    pub fn is_active(&self) -> bool {
        matches!(self.state, GestureState::Active { .. })
    }

    pub fn source(&self) -> Option<DragSource> {
        match self.state {
            GestureState::Active { source, .. } => Some(source),
            GestureState::Idle => None,
        }
    }

    pub fn hover(&self) -> Option<DropTarget> {
        match self.state {
            GestureState::Active { hover, .. } => hover,
            GestureState::Idle => None,
        }
    }

    /// Record the current drop position. Returns `false` when idle.
    pub fn update(&mut self, parent: Option<NodeId>, index: usize) -> bool {
        match &mut self.state {
            GestureState::Active { hover, .. } => {
                *hover = Some(DropTarget { parent, index });
                true
            }
            GestureState::Idle => false,
        }
    }

    /// The pointer left every valid drop zone.
    pub fn leave(&mut self) {
        if let GestureState::Active { hover, .. } = &mut self.state {
            *hover = None;
        }
    }

    /// End the gesture and return the mutation a drop at the last hover
    /// position means, if any.
    pub fn release(&mut self) -> Option<Mutation> {
        let GestureState::Active { source, hover } = std::mem::take(&mut self.state) else {
            return None;
        };
        let DropTarget { parent, index } = hover?;
        Some(match source {
            DragSource::Palette(kind) => Mutation::Insert {
                kind,
                init: NodeInit::default(),
                parent,
                index,
            },
            DragSource::Existing(id) => Mutation::Reorder { id, parent, index },
        })
    }

    /// Abort without producing a mutation. Returns whether a gesture was
    /// in flight.
    pub fn cancel(&mut self) -> bool {
        let was_active = self.is_active();
        self.state = GestureState::Idle;
        was_active
    }
}
