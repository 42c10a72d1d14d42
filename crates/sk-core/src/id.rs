use lasso::{Spur, ThreadedRodeo};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::cmp::Ordering;
use std::fmt;
use std::sync::LazyLock;

/// Global string interner for element IDs.
static INTERNER: LazyLock<ThreadedRodeo> = LazyLock::new(ThreadedRodeo::default);

/// A lightweight, interned identifier for placed elements.
/// Internally a 4-byte `Spur` index, so copies and comparisons are O(1).
///
/// Ordering compares the underlying strings so that ID-keyed maps
/// iterate deterministically.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(Spur);

impl NodeId {
    /// Intern a string as a NodeId, or return the existing handle.
    pub fn intern(s: &str) -> Self {
        NodeId(INTERNER.get_or_intern(s))
    }

    /// Resolve back to a string slice.
    pub fn as_str(&self) -> &str {
        INTERNER.resolve(&self.0)
    }

    /// The trailing `-N` counter of generated IDs (`heading-12` → 12).
    pub fn numeric_suffix(&self) -> Option<u64> {
        let (_, tail) = self.as_str().rsplit_once('-')?;
        if tail.is_empty() || !tail.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        tail.parse().ok()
    }
}

impl PartialOrd for NodeId {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for NodeId {
    fn cmp(&self, other: &Self) -> Ordering {
        if self.0 == other.0 {
            return Ordering::Equal;
        }
        self.as_str().cmp(other.as_str())
    }
}

impl fmt::Debug for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.as_str())
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for NodeId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for NodeId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Ok(NodeId::intern(&s))
    }
}

/// Monotonic `nextElementId` counter.
///
/// IDs are never reused while a document is loaded: the counter only moves
/// forward, and a candidate that already exists (injected from outside) is
/// skipped rather than returned.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct IdAllocator {
    next: u64,
}

impl Default for IdAllocator {
    fn default() -> Self {
        Self::new()
    }
}

impl IdAllocator {
    pub const fn new() -> Self {
        Self { next: 1 }
    }

    /// Start counting from `next` (clamped to at least 1).
    pub const fn starting_at(next: u64) -> Self {
        Self {
            next: if next == 0 { 1 } else { next },
        }
    }

    /// The value the next allocation will try first.
    pub fn peek(&self) -> u64 {
        self.next
    }

    /// Allocate `"{prefix}-{n}"`, skipping candidates for which `taken`
    /// returns true.
    pub fn allocate(&mut self, prefix: &str, taken: impl Fn(NodeId) -> bool) -> NodeId {
        loop {
            let n = self.next;
            self.next += 1;
            let id = NodeId::intern(&format!("{prefix}-{n}"));
            if !taken(id) {
                return id;
            }
            log::trace!("id {id} already present, skipping");
        }
    }

    /// Move the counter past an externally supplied ID's numeric suffix.
    pub fn observe(&mut self, id: NodeId) {
        if let Some(n) = id.numeric_suffix() {
            self.next = self.next.max(n.saturating_add(1));
        }
    }
}
