//! Responsive style overlay: per-breakpoint style overrides keyed by
//! element ID, layered over base styles at resolve/export time.

use crate::error::EditError;
use crate::id::NodeId;
use crate::model::StyleMap;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::str::FromStr;

/// Responsive viewport tiers. Desktop is the base and never gets a media
/// query on export.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Breakpoint {
    Desktop,
    Tablet,
    Mobile,
}

impl Breakpoint {
    pub const ALL: [Breakpoint; 3] = [Breakpoint::Desktop, Breakpoint::Tablet, Breakpoint::Mobile];

    /// `max-width` of the media query, in pixels.
    pub const fn max_width(self) -> Option<u32> {
        match self {
            Breakpoint::Desktop => None,
            Breakpoint::Tablet => Some(768),
            Breakpoint::Mobile => Some(480),
        }
    }

    pub const fn name(self) -> &'static str {
        match self {
            Breakpoint::Desktop => "desktop",
            Breakpoint::Tablet => "tablet",
            Breakpoint::Mobile => "mobile",
        }
    }
}

impl fmt::Display for Breakpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Breakpoint {
    type Err = EditError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Breakpoint::ALL
            .into_iter()
            .find(|b| b.name().eq_ignore_ascii_case(s))
            .ok_or_else(|| EditError::invalid(format!("unknown breakpoint `{s}`")))
    }
}

/// `elementId → (breakpoint → style overrides)`, ordered by ID so saved
/// projects are stable.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StyleOverlay {
    entries: BTreeMap<NodeId, BTreeMap<Breakpoint, StyleMap>>,
}

impl StyleOverlay {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Shallow key-wise merge of `delta` into the override map for
    /// `(id, breakpoint)`, creating nested maps as needed.
    pub fn set_override(&mut self, id: NodeId, breakpoint: Breakpoint, delta: StyleMap) {
        if delta.is_empty() {
            return;
        }
        self.entries
            .entry(id)
            .or_default()
            .entry(breakpoint)
            .or_default()
            .extend(delta);
    }

    /// Remove one property override. Empty maps are pruned.
    pub fn remove_property(&mut self, id: NodeId, breakpoint: Breakpoint, property: &str) -> bool {
        let Some(per_bp) = self.entries.get_mut(&id) else {
            return false;
        };
        let removed = per_bp
            .get_mut(&breakpoint)
            .is_some_and(|styles| styles.remove(property).is_some());
        self.prune(id);
        removed
    }

    /// Drop every override for `(id, breakpoint)`.
    pub fn clear(&mut self, id: NodeId, breakpoint: Breakpoint) -> bool {
        let removed = self
            .entries
            .get_mut(&id)
            .is_some_and(|per_bp| per_bp.remove(&breakpoint).is_some());
        self.prune(id);
        removed
    }

    fn prune(&mut self, id: NodeId) {
        if let Some(per_bp) = self.entries.get_mut(&id) {
            per_bp.retain(|_, styles| !styles.is_empty());
            if per_bp.is_empty() {
                self.entries.remove(&id);
            }
        }
    }

    pub fn get(&self, id: NodeId, breakpoint: Breakpoint) -> Option<&StyleMap> {
        self.entries.get(&id)?.get(&breakpoint)
    }

    pub fn has_override(&self, id: NodeId, breakpoint: Breakpoint) -> bool {
        self.get(id, breakpoint).is_some_and(|s| !s.is_empty())
    }

    /// All breakpoints with overrides for `id`.
    pub fn for_element(&self, id: NodeId) -> Option<&BTreeMap<Breakpoint, StyleMap>> {
        self.entries.get(&id)
    }

    pub fn element_ids(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.entries.keys().copied()
    }

    /// Base styles overlaid with the breakpoint's overrides (override wins).
    pub fn resolve(&self, base: &StyleMap, id: NodeId, breakpoint: Breakpoint) -> StyleMap {
        let mut resolved = base.clone();
        if let Some(over) = self.get(id, breakpoint) {
            resolved.extend(over.iter().map(|(k, v)| (k.clone(), v.clone())));
        }
        resolved
    }

    /// Orphan cleanup when an element is deleted.
    pub fn remove_element(&mut self, id: NodeId) -> bool {
        self.entries.remove(&id).is_some()
    }

    /// Copy the entries of every `old` key in `mapping` to its `new` ID.
    pub fn copy_remapped(&mut self, mapping: &HashMap<NodeId, NodeId>) {
        let copies: Vec<_> = mapping
            .iter()
            .filter_map(|(old, new)| self.entries.get(old).map(|e| (*new, e.clone())))
            .collect();
        self.entries.extend(copies);
    }

    /// Drop entries whose element no longer exists.
    pub fn retain_elements(&mut self, mut keep: impl FnMut(NodeId) -> bool) -> usize {
        let before = self.entries.len();
        self.entries.retain(|id, _| keep(*id));
        before - self.entries.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn styles(pairs: &[(&str, &str)]) -> StyleMap {
        pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect()
    }

    #[test]
    fn override_wins_on_conflict() {
        let id = NodeId::intern("heading-1");
        let mut overlay = StyleOverlay::new();
        overlay.set_override(id, Breakpoint::Mobile, styles(&[("color", "red")]));

        let base = styles(&[("color", "blue"), ("fontSize", "32")]);
        assert_eq!(
            overlay.resolve(&base, id, Breakpoint::Mobile),
            styles(&[("color", "red"), ("fontSize", "32")])
        );
        assert_eq!(overlay.resolve(&base, id, Breakpoint::Desktop), base);
    }

    #[test]
    fn set_override_merges_shallowly() {
        let id = NodeId::intern("button-1");
        let mut overlay = StyleOverlay::new();
        overlay.set_override(id, Breakpoint::Tablet, styles(&[("color", "red"), ("width", "100")]));
        overlay.set_override(id, Breakpoint::Tablet, styles(&[("color", "green")]));
        assert_eq!(
            overlay.get(id, Breakpoint::Tablet),
            Some(&styles(&[("color", "green"), ("width", "100")]))
        );
    }

    #[test]
    fn removing_last_property_prunes_entry() {
        let id = NodeId::intern("text-1");
        let mut overlay = StyleOverlay::new();
        overlay.set_override(id, Breakpoint::Mobile, styles(&[("display", "none")]));
        assert!(overlay.remove_property(id, Breakpoint::Mobile, "display"));
        assert!(overlay.is_empty());
    }

    #[test]
    fn copy_remapped_duplicates_entries() {
        let old = NodeId::intern("image-1");
        let new = NodeId::intern("image-2");
        let mut overlay = StyleOverlay::new();
        overlay.set_override(old, Breakpoint::Mobile, styles(&[("width", "100%")]));

        overlay.copy_remapped(&HashMap::from([(old, new)]));
        assert_eq!(overlay.get(old, Breakpoint::Mobile), overlay.get(new, Breakpoint::Mobile));

        overlay.set_override(new, Breakpoint::Mobile, styles(&[("width", "50%")]));
        assert_eq!(overlay.get(old, Breakpoint::Mobile).unwrap()["width"], "100%");
    }

    #[test]
    fn breakpoint_parsing_and_widths() {
        assert_eq!("Tablet".parse::<Breakpoint>(), Ok(Breakpoint::Tablet));
        assert!("watch".parse::<Breakpoint>().is_err());
        assert_eq!(Breakpoint::Desktop.max_width(), None);
        assert_eq!(Breakpoint::Mobile.max_width(), Some(480));
    }
}
