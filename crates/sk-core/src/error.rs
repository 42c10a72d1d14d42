//! Error kinds reported by document operations.
//!
//! Every failure is an explicit outcome. A rejected operation leaves the
//! document exactly as it was.

use crate::id::NodeId;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EditError {
    /// The operation referenced an element absent from the document.
    #[error("element not found: {0}")]
    NotFound(NodeId),

    /// The operation would break tree invariants (cycles, self-attachment,
    /// children under a void element).
    #[error("structural error: {0}")]
    Structural(String),

    /// Preconditions unmet (too few nodes, wrong element kind, bad name).
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// A size limit was exceeded.
    #[error("capacity exceeded: {size} bytes (limit {limit})")]
    CapacityExceeded { size: usize, limit: usize },

    /// Stored data is unparsable or structurally invalid.
    #[error("corrupt data: {0}")]
    CorruptData(String),
}

impl EditError {
    pub(crate) fn structural(msg: impl Into<String>) -> Self {
        EditError::Structural(msg.into())
    }

    pub(crate) fn invalid(msg: impl Into<String>) -> Self {
        EditError::InvalidArgument(msg.into())
    }

    pub(crate) fn corrupt(msg: impl Into<String>) -> Self {
        EditError::CorruptData(msg.into())
    }
}

pub type EditResult<T> = Result<T, EditError>;
