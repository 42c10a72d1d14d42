//! Single selection, hierarchy paths, and keyboard navigation.
//!
//! Everything here reads the document; nothing writes it.

use serde::{Deserialize, Serialize};
use sk_core::{Document, NodeId};

/// Emitted to consumers when the selection changes. A change from one
/// element to another is always `Deselected` then `Selected`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectionEvent {
    Deselected(NodeId),
    Selected(NodeId),
}

/// At most one selected element.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Selection {
    current: Option<NodeId>,
}

impl Selection {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn current(&self) -> Option<NodeId> {
        self.current
    }

    pub fn is_selected(&self, id: NodeId) -> bool {
        self.current == Some(id)
    }

    /// Replace the selection. Re-selecting the current element emits
    /// nothing.
    pub fn select(&mut self, id: NodeId) -> Vec<SelectionEvent> {
        if self.current == Some(id) {
            return Vec::new();
        }
        let mut events = Vec::with_capacity(2);
        if let Some(previous) = self.current.replace(id) {
            events.push(SelectionEvent::Deselected(previous));
        }
        events.push(SelectionEvent::Selected(id));
        events
    }

    pub fn clear(&mut self) -> Option<SelectionEvent> {
        self.current.take().map(SelectionEvent::Deselected)
    }

    /// Set the selection to a restored value, emitting the transition.
    pub fn restore(&mut self, id: Option<NodeId>) -> Vec<SelectionEvent> {
        match id {
            Some(id) => self.select(id),
            None => self.clear().into_iter().collect(),
        }
    }

    /// Clear the selection if its element is gone from `doc`.
    pub fn retain_existing(&mut self, doc: &Document) -> Option<SelectionEvent> {
        match self.current {
            Some(id) if !doc.contains(id) => self.clear(),
            _ => None,
        }
    }
}

/// Elements from the root down to `id`, inclusive. Empty if `id` is not in
/// the document.
pub fn hierarchy_path(doc: &Document, id: NodeId) -> Vec<NodeId> {
    if !doc.contains(id) {
        return Vec::new();
    }
    let mut path = vec![id];
    let mut current = doc.parent_of(id);
    while let Some(parent) = current {
        if path.len() > doc.len() {
            log::warn!("parent chain of {id} does not terminate");
            return Vec::new();
        }
        path.push(parent);
        current = doc.parent_of(parent);
    }
    path.reverse();
    path
}

/// Arrow-key directions: up/down move between siblings, left goes to the
/// parent and right to the first child.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Direction {
    Up,
    Down,
    Left,
    Right,
}

/// The element reached by moving from `from` in `direction`, or `None` at a
/// structural boundary.
pub fn navigate(doc: &Document, from: NodeId, direction: Direction) -> Option<NodeId> {
    match direction {
        Direction::Up => {
            let index = doc.index_in_parent(from)?;
            let previous = index.checked_sub(1)?;
            doc.siblings(from)?.get(previous).copied()
        }
        Direction::Down => {
            let index = doc.index_in_parent(from)?;
            doc.siblings(from)?.get(index + 1).copied()
        }
        Direction::Left => doc.parent_of(from),
        Direction::Right => doc.children(from).first().copied(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use sk_core::{ElementKind, NodeInit, Page};

    fn tree() -> (Page, NodeId, NodeId, NodeId, NodeId) {
        let mut page = Page::new();
        let section = page.create_node(ElementKind::Section, NodeInit::default());
        let card = page
            .insert_on_drop(ElementKind::Container, NodeInit::default(), Some(section), 0)
            .unwrap();
        let title = page
            .insert_on_drop(ElementKind::Heading, NodeInit::default(), Some(card), 0)
            .unwrap();
        let body = page
            .insert_on_drop(ElementKind::Paragraph, NodeInit::default(), Some(card), 1)
            .unwrap();
        (page, section, card, title, body)
    }

    #[test]
    fn select_emits_deselect_then_select() {
        let a = NodeId::intern("text-1");
        let b = NodeId::intern("text-2");
        let mut selection = Selection::new();
        assert_eq!(selection.select(a), vec![SelectionEvent::Selected(a)]);
        assert_eq!(
            selection.select(b),
            vec![SelectionEvent::Deselected(a), SelectionEvent::Selected(b)]
        );
        assert!(selection.select(b).is_empty());
        assert_eq!(selection.clear(), Some(SelectionEvent::Deselected(b)));
        assert_eq!(selection.clear(), None);
    }

    #[test]
    fn hierarchy_path_runs_root_to_leaf() {
        let (page, section, card, title, _) = tree();
        assert_eq!(hierarchy_path(page.document(), title), vec![section, card, title]);
        assert_eq!(hierarchy_path(page.document(), section), vec![section]);
        assert!(hierarchy_path(page.document(), NodeId::intern("ghost-1")).is_empty());
    }

    #[test]
    fn navigation_and_boundaries() {
        let (page, section, card, title, body) = tree();
        let doc = page.document();
        assert_eq!(navigate(doc, title, Direction::Down), Some(body));
        assert_eq!(navigate(doc, body, Direction::Up), Some(title));
        assert_eq!(navigate(doc, title, Direction::Up), None);
        assert_eq!(navigate(doc, body, Direction::Down), None);
        assert_eq!(navigate(doc, title, Direction::Left), Some(card));
        assert_eq!(navigate(doc, section, Direction::Left), None);
        assert_eq!(navigate(doc, card, Direction::Right), Some(title));
        assert_eq!(navigate(doc, body, Direction::Right), None);
    }

    #[test]
    fn root_siblings_navigate_through_root_list() {
        let mut page = Page::new();
        let first = page.create_node(ElementKind::Header, NodeInit::default());
        let second = page.create_node(ElementKind::Footer, NodeInit::default());
        assert_eq!(navigate(page.document(), first, Direction::Down), Some(second));
        assert_eq!(navigate(page.document(), second, Direction::Up), Some(first));
    }

    #[test]
    fn retain_existing_clears_deleted_selection() {
        let (mut page, _, card, title, _) = tree();
        let mut selection = Selection::new();
        selection.select(title);
        page.delete(card);
        assert_eq!(
            selection.retain_existing(page.document()),
            Some(SelectionEvent::Deselected(title))
        );
        assert_eq!(selection.current(), None);
    }
}
