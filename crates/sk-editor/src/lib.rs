//! SiteKit editor layer.
//!
//! Wraps an `sk_core::Page` in a [`Session`] that owns selection, snapshot
//! undo/redo, drag gestures, debounced property edits and shortcut routing.

pub mod config;
pub mod debounce;
pub mod gesture;
pub mod history;
pub mod selection;
pub mod session;
pub mod shortcuts;

pub use config::SessionConfig;
pub use debounce::PropertyDebouncer;
pub use gesture::{DragGesture, DragSource, DropTarget};
pub use history::{CommitOutcome, HistoryError, Snapshot, SnapshotHistory};
pub use selection::{Direction, Selection, SelectionEvent, hierarchy_path, navigate};
pub use session::{Mutation, MutationOutcome, Session, SessionError};
pub use shortcuts::{ShortcutAction, ShortcutMap};
