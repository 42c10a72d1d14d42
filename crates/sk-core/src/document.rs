//! The element tree: a flat ID-keyed table plus the ordered root list.
//!
//! Parent and child links are stored on both sides and kept in agreement by
//! every method here. Callers outside the crate can read freely but only
//! change structure through the methods below (or the mutation operations
//! on [`Page`](crate::Page)).

use crate::error::{EditError, EditResult};
use crate::id::{IdAllocator, NodeId};
use crate::model::{Element, ElementKind, NodeInit};
use petgraph::graphmap::DiGraphMap;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Document {
    elements: HashMap<NodeId, Element>,
    root_elements: Vec<NodeId>,
    next_element_id: IdAllocator,
}

impl Document {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuild a document from stored records, trusting the stored
    /// `parent`/`children` fields but verifying they agree.
    ///
    /// # Errors
    /// `CorruptData` if IDs repeat or any tree invariant fails.
    pub fn from_parts(
        elements: impl IntoIterator<Item = Element>,
        root_elements: Vec<NodeId>,
        next_element_id: u64,
    ) -> EditResult<Self> {
        let mut ids = IdAllocator::starting_at(next_element_id);
        let mut map = HashMap::new();
        for element in elements {
            ids.observe(element.id);
            let id = element.id;
            if map.insert(id, element).is_some() {
                return Err(EditError::corrupt(format!("duplicate element id {id}")));
            }
        }

        let doc = Self {
            elements: map,
            root_elements,
            next_element_id: ids,
        };
        doc.check_invariants()
            .map_err(|e| EditError::corrupt(e.to_string()))?;
        Ok(doc)
    }

    // ─── Queries ─────────────────────────────────────────────────────────

    pub fn len(&self) -> usize {
        self.elements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    pub fn contains(&self, id: NodeId) -> bool {
        self.elements.contains_key(&id)
    }

    pub fn get(&self, id: NodeId) -> Option<&Element> {
        self.elements.get(&id)
    }

    pub(crate) fn get_mut(&mut self, id: NodeId) -> Option<&mut Element> {
        self.elements.get_mut(&id)
    }

    /// Like [`get`](Self::get) but reports `NotFound`.
    pub fn require(&self, id: NodeId) -> EditResult<&Element> {
        self.elements.get(&id).ok_or(EditError::NotFound(id))
    }

    pub fn elements(&self) -> impl Iterator<Item = &Element> {
        self.elements.values()
    }

    pub fn root_elements(&self) -> &[NodeId] {
        &self.root_elements
    }

    pub fn next_element_id(&self) -> u64 {
        self.next_element_id.peek()
    }

    /// Children of `id` in document order (empty if absent).
    pub fn children(&self, id: NodeId) -> &[NodeId] {
        self.elements
            .get(&id)
            .map(|e| e.children.as_slice())
            .unwrap_or(&[])
    }

    pub fn parent_of(&self, id: NodeId) -> Option<NodeId> {
        self.elements.get(&id).and_then(|e| e.parent)
    }

    /// The sibling list containing `id`: its parent's children, or the root
    /// list. `None` for unknown or detached elements.
    pub fn siblings(&self, id: NodeId) -> Option<&[NodeId]> {
        let element = self.elements.get(&id)?;
        let list = match element.parent {
            Some(p) => self.children(p),
            None => self.root_elements.as_slice(),
        };
        list.contains(&id).then_some(list)
    }

    pub fn index_in_parent(&self, id: NodeId) -> Option<usize> {
        self.siblings(id)?.iter().position(|&s| s == id)
    }

    /// Check if `ancestor` is a parent/grandparent/etc. of `descendant`.
    pub fn is_ancestor_of(&self, ancestor: NodeId, descendant: NodeId) -> bool {
        if ancestor == descendant {
            return false;
        }
        let mut current = self.parent_of(descendant);
        let mut steps = 0usize;
        while let Some(p) = current {
            if p == ancestor {
                return true;
            }
            steps += 1;
            if steps > self.elements.len() {
                break;
            }
            current = self.parent_of(p);
        }
        false
    }

    /// `id` and all its descendants, pre-order.
    pub fn subtree(&self, id: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        if !self.contains(id) {
            return out;
        }
        let mut stack = vec![id];
        while let Some(current) = stack.pop() {
            out.push(current);
            stack.extend(self.children(current).iter().rev().copied());
        }
        out
    }

    /// Every attached element, pre-order from the root list.
    pub fn walk(&self) -> Vec<NodeId> {
        self.root_elements
            .iter()
            .flat_map(|&root| self.subtree(root))
            .collect()
    }

    // ─── Creation ────────────────────────────────────────────────────────

    pub(crate) fn allocate_id(&mut self, kind: ElementKind) -> NodeId {
        let elements = &self.elements;
        self.next_element_id
            .allocate(kind.name(), |id| elements.contains_key(&id))
    }

    /// Create an element and append it to the root list.
    pub fn create_node(&mut self, kind: ElementKind, init: NodeInit) -> NodeId {
        let id = self.allocate_id(kind);
        self.elements.insert(id, Element::new(id, kind, init));
        self.root_elements.push(id);
        log::debug!("created {id} at root");
        id
    }

    /// Create an element directly under `parent` at `index` (clamped).
    ///
    /// # Errors
    /// `Structural` if `parent` is missing or cannot hold children. Nothing
    /// is allocated on failure.
    pub fn create_child(
        &mut self,
        kind: ElementKind,
        init: NodeInit,
        parent: NodeId,
        index: usize,
    ) -> EditResult<NodeId> {
        self.check_container(parent)?;
        let id = self.allocate_id(kind);
        self.elements.insert(id, Element::new(id, kind, init));
        self.link(id, Some(parent), index);
        log::debug!("created {id} under {parent} at {index}");
        Ok(id)
    }

    /// Create an element and place it in the root list at `index` (clamped).
    pub fn create_root_at(&mut self, kind: ElementKind, init: NodeInit, index: usize) -> NodeId {
        let id = self.create_node(kind, init);
        self.link(id, None, index);
        id
    }

    /// Register an already-built element as-is. Callers are responsible for
    /// linking it so that parent and children agree.
    pub(crate) fn insert_record(&mut self, element: Element) {
        self.next_element_id.observe(element.id);
        self.elements.insert(element.id, element);
    }

    // ─── Structure ───────────────────────────────────────────────────────

    /// Move `child` under `parent` at `index` (clamped to the valid range).
    ///
    /// # Errors
    /// - `Structural` if `parent` is missing, equals `child`, is a descendant
    ///   of `child`, or is a void element.
    /// - `NotFound` if `child` is missing.
    pub fn attach(&mut self, child: NodeId, parent: NodeId, index: usize) -> EditResult<()> {
        self.validate_attach(child, Some(parent))?;
        self.link(child, Some(parent), index);
        Ok(())
    }

    /// Move `child` into the root list at `index` (clamped).
    ///
    /// # Errors
    /// `NotFound` if `child` is missing.
    pub fn attach_root(&mut self, child: NodeId, index: usize) -> EditResult<()> {
        self.validate_attach(child, None)?;
        self.link(child, None, index);
        Ok(())
    }

    /// Unlink `id` from its parent (or the root list). The element stays
    /// addressable until it is attached again or deleted.
    ///
    /// # Errors
    /// `NotFound` if `id` is missing.
    pub fn detach(&mut self, id: NodeId) -> EditResult<()> {
        if !self.contains(id) {
            return Err(EditError::NotFound(id));
        }
        self.unlink(id);
        Ok(())
    }

    /// Delete `id` and all its descendants, children first. Returns the
    /// removed IDs in removal order; empty when `id` is already absent.
    pub fn delete_cascade(&mut self, id: NodeId) -> Vec<NodeId> {
        if !self.contains(id) {
            return Vec::new();
        }
        self.unlink(id);
        let mut removed = self.subtree(id);
        removed.reverse();
        for gone in &removed {
            self.elements.remove(gone);
        }
        log::debug!("deleted {id} ({} elements)", removed.len());
        removed
    }

    pub(crate) fn validate_attach(&self, child: NodeId, parent: Option<NodeId>) -> EditResult<()> {
        if let Some(p) = parent {
            if p == child {
                return Err(EditError::structural(format!(
                    "cannot attach {child} to itself"
                )));
            }
            self.check_container(p)?;
        }
        if !self.contains(child) {
            return Err(EditError::NotFound(child));
        }
        if let Some(p) = parent
            && self.is_ancestor_of(child, p)
        {
            return Err(EditError::structural(format!(
                "cannot attach {child} under its own descendant {p}"
            )));
        }
        Ok(())
    }

    fn check_container(&self, parent: NodeId) -> EditResult<()> {
        let Some(p) = self.elements.get(&parent) else {
            return Err(EditError::structural(format!(
                "parent {parent} does not exist"
            )));
        };
        if !p.kind.accepts_children() {
            return Err(EditError::structural(format!(
                "{parent} is a <{}> and cannot hold children",
                p.kind.tag_name()
            )));
        }
        Ok(())
    }

    /// Remove `id` from whichever sibling list holds it and clear its parent.
    /// Returns the former `(parent, index)` if it was linked.
    pub(crate) fn unlink(&mut self, id: NodeId) -> Option<(Option<NodeId>, usize)> {
        let parent = self.elements.get(&id)?.parent;
        let index = match parent {
            Some(p) => {
                let list = &mut self.elements.get_mut(&p)?.children;
                let i = list.iter().position(|&c| c == id);
                if let Some(i) = i {
                    list.remove(i);
                }
                i
            }
            None => {
                let i = self.root_elements.iter().position(|&c| c == id);
                if let Some(i) = i {
                    self.root_elements.remove(i);
                }
                i
            }
        };
        if let Some(el) = self.elements.get_mut(&id) {
            el.parent = None;
        }
        index.map(|i| (parent, i))
    }

    /// Unlink then insert at the clamped index. Callers validate first.
    pub(crate) fn link(&mut self, id: NodeId, parent: Option<NodeId>, index: usize) {
        self.unlink(id);
        match parent {
            Some(p) => {
                if let Some(list) = self.elements.get_mut(&p).map(|e| &mut e.children) {
                    let at = index.min(list.len());
                    list.insert(at, id);
                }
            }
            None => {
                let at = index.min(self.root_elements.len());
                self.root_elements.insert(at, id);
            }
        }
        if let Some(el) = self.elements.get_mut(&id) {
            el.parent = parent;
        }
    }

    /// Remove an element record without touching any links. Callers must
    /// have unlinked it and its children first.
    pub(crate) fn remove_record(&mut self, id: NodeId) -> Option<Element> {
        self.elements.remove(&id)
    }

    // ─── Invariants ──────────────────────────────────────────────────────

    /// Verify bidirectional parent/child agreement, the root list, void
    /// elements, and acyclicity.
    ///
    /// # Errors
    /// `Structural` describing the first violation found.
    pub fn check_invariants(&self) -> EditResult<()> {
        let mut seen_roots = HashSet::new();
        for &root in &self.root_elements {
            if !seen_roots.insert(root) {
                return Err(EditError::structural(format!("{root} listed twice as root")));
            }
            match self.elements.get(&root) {
                None => return Err(EditError::structural(format!("root {root} does not exist"))),
                Some(el) if el.parent.is_some() => {
                    return Err(EditError::structural(format!("root {root} has a parent")));
                }
                Some(_) => {}
            }
        }

        let mut graph: DiGraphMap<NodeId, ()> = DiGraphMap::new();
        for (&key, el) in &self.elements {
            if key != el.id {
                return Err(EditError::structural(format!(
                    "element stored under {key} has id {}",
                    el.id
                )));
            }
            graph.add_node(el.id);
            match el.parent {
                Some(p) => {
                    let Some(parent) = self.elements.get(&p) else {
                        return Err(EditError::structural(format!(
                            "{} points at missing parent {p}",
                            el.id
                        )));
                    };
                    let count = parent.children.iter().filter(|&&c| c == el.id).count();
                    if count != 1 || seen_roots.contains(&el.id) {
                        return Err(EditError::structural(format!(
                            "{} must appear exactly once under {p}",
                            el.id
                        )));
                    }
                }
                None if !seen_roots.contains(&el.id) => {
                    return Err(EditError::structural(format!(
                        "{} has no parent and is not a root",
                        el.id
                    )));
                }
                None => {}
            }

            if !el.children.is_empty() && !el.kind.accepts_children() {
                return Err(EditError::structural(format!(
                    "void element {} has children",
                    el.id
                )));
            }
            for &child in &el.children {
                match self.elements.get(&child) {
                    Some(c) if c.parent == Some(el.id) => {
                        graph.add_edge(el.id, child, ());
                    }
                    _ => {
                        return Err(EditError::structural(format!(
                            "{} lists {child} as a child but they disagree",
                            el.id
                        )));
                    }
                }
            }
        }

        if petgraph::algo::is_cyclic_directed(&graph) {
            return Err(EditError::structural("element tree contains a cycle"));
        }
        Ok(())
    }
}
