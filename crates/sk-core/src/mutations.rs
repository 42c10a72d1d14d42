//! Mutation operations over a [`Page`].
//!
//! Each operation validates everything it needs before writing anything, so
//! a rejected call leaves the page untouched.

use crate::error::{EditError, EditResult};
use crate::id::NodeId;
use crate::model::{Bounds, Element, ElementKind, NodeInit, is_internal_attribute};
use crate::page::Page;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

// ─── Operation arguments ─────────────────────────────────────────────────

/// Where a property edit lands on the element.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PropertyTarget {
    Style,
    Attribute,
    Content,
}

/// One property edit from the property panel. `value: None` removes the
/// key (or clears content).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PropertyEdit {
    pub target: PropertyTarget,
    pub name: String,
    pub value: Option<String>,
}

impl PropertyEdit {
    pub fn style(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            target: PropertyTarget::Style,
            name: name.into(),
            value: Some(value.into()),
        }
    }

    pub fn attribute(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            target: PropertyTarget::Attribute,
            name: name.into(),
            value: Some(value.into()),
        }
    }

    pub fn content(value: impl Into<String>) -> Self {
        Self {
            target: PropertyTarget::Content,
            name: "content".into(),
            value: Some(value.into()),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AlignEdge {
    Left,
    HCenter,
    Right,
    Top,
    VMiddle,
    Bottom,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Axis {
    Horizontal,
    Vertical,
}

/// Reordering within the current sibling list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SiblingStep {
    Backward,
    Forward,
    ToBack,
    ToFront,
}

// ─── Operations ──────────────────────────────────────────────────────────

impl Page {
    /// Create an element of `kind` and insert it into `target` (root list
    /// when `None`) at `index`, clamped to `[0, children.len()]`.
    ///
    /// # Errors
    /// `Structural` if `target` is missing or is a void element.
    pub fn insert_on_drop(
        &mut self,
        kind: ElementKind,
        init: NodeInit,
        target: Option<NodeId>,
        index: usize,
    ) -> EditResult<NodeId> {
        match target {
            Some(parent) => self.document.create_child(kind, init, parent, index),
            None => Ok(self.document.create_root_at(kind, init, index)),
        }
    }

    /// Move `id` to `new_parent` (root list when `None`) at `index`. The
    /// index is interpreted after `id` has been removed from its old place.
    ///
    /// # Errors
    /// `NotFound` for a missing node; `Structural` for self/descendant
    /// targets, missing parents or void parents.
    pub fn reorder(&mut self, id: NodeId, new_parent: Option<NodeId>, index: usize) -> EditResult<()> {
        if let Err(e) = self.document.validate_attach(id, new_parent) {
            log::warn!("reorder of {id} rejected: {e}");
            return Err(e);
        }
        self.document.link(id, new_parent, index);
        log::debug!("moved {id} to {new_parent:?}[{index}]");
        Ok(())
    }

    /// Step `id` within its sibling list. Returns `false` at the boundary.
    ///
    /// # Errors
    /// `NotFound` if `id` is missing; `Structural` if it is detached.
    pub fn move_sibling(&mut self, id: NodeId, step: SiblingStep) -> EditResult<bool> {
        self.document.require(id)?;
        let siblings = self
            .document
            .siblings(id)
            .ok_or_else(|| EditError::structural(format!("{id} is detached")))?;
        let last = siblings.len() - 1;
        let pos = self.document.index_in_parent(id).unwrap_or(0);
        let target = match step {
            SiblingStep::Backward if pos > 0 => pos - 1,
            SiblingStep::Forward if pos < last => pos + 1,
            SiblingStep::ToBack if pos > 0 => 0,
            SiblingStep::ToFront if pos < last => last,
            _ => return Ok(false),
        };
        let parent = self.document.parent_of(id);
        self.document.link(id, parent, target);
        Ok(true)
    }

    /// Deep-clone the subtree at `id` with fresh IDs and insert the clone
    /// right after the original. Overlay entries are copied to the new IDs.
    ///
    /// # Errors
    /// `NotFound` if `id` is missing.
    pub fn duplicate(&mut self, id: NodeId) -> EditResult<NodeId> {
        let source = self.document.require(id)?;
        let parent = source.parent;
        let position = self
            .document
            .index_in_parent(id)
            .map(|i| i + 1)
            .unwrap_or(usize::MAX);

        let originals = self.document.subtree(id);
        let mut mapping: HashMap<NodeId, NodeId> = HashMap::with_capacity(originals.len());
        for &old in &originals {
            let Some(kind) = self.document.get(old).map(|e| e.kind) else {
                continue;
            };
            mapping.insert(old, self.document.allocate_id(kind));
        }
        let remap = |old: NodeId| mapping.get(&old).copied().unwrap_or(old);

        let clones: Vec<Element> = originals
            .iter()
            .filter_map(|&old| self.document.get(old))
            .map(|el| {
                let mut copy = el.clone();
                copy.id = remap(el.id);
                copy.children = el.children.iter().map(|&c| remap(c)).collect();
                copy.parent = if el.id == id {
                    None
                } else {
                    el.parent.map(remap)
                };
                copy
            })
            .collect();
        for copy in clones {
            self.document.insert_record(copy);
        }

        let new_root = remap(id);
        self.document.link(new_root, parent, position);
        self.responsive_styles.copy_remapped(&mapping);
        log::debug!("duplicated {id} as {new_root} ({} elements)", mapping.len());
        Ok(new_root)
    }

    /// Wrap two or more siblings in a new group placed where the first of
    /// them (in document order) was. Children keep their relative order.
    ///
    /// # Errors
    /// - `InvalidArgument` for fewer than two IDs, repeats, or nodes that do
    ///   not share a parent.
    /// - `NotFound` if any ID is missing.
    pub fn group(&mut self, ids: &[NodeId]) -> EditResult<NodeId> {
        if ids.len() < 2 {
            return Err(EditError::invalid(format!(
                "group needs at least 2 elements, got {}",
                ids.len()
            )));
        }
        let mut seen = HashSet::new();
        for &id in ids {
            self.document.require(id)?;
            if !seen.insert(id) {
                return Err(EditError::invalid(format!("{id} listed twice")));
            }
        }
        let parent = self.document.parent_of(ids[0]);
        let mut ordered = Vec::with_capacity(ids.len());
        for &id in ids {
            if self.document.parent_of(id) != parent {
                return Err(EditError::invalid("grouped elements must share a parent"));
            }
            let index = self
                .document
                .index_in_parent(id)
                .ok_or_else(|| EditError::invalid(format!("{id} is detached")))?;
            ordered.push((index, id));
        }
        ordered.sort_by_key(|(index, _)| *index);
        let position = ordered[0].0;

        let group_id = self.document.allocate_id(ElementKind::Group);
        self.document.insert_record(Element::new(
            group_id,
            ElementKind::Group,
            NodeInit::default(),
        ));
        for &(_, id) in &ordered {
            self.document.unlink(id);
        }
        self.document.link(group_id, parent, position);
        for (i, &(_, id)) in ordered.iter().enumerate() {
            self.document.link(id, Some(group_id), i);
        }
        log::debug!("grouped {} elements into {group_id}", ordered.len());
        Ok(group_id)
    }

    /// Dissolve a group: its children take its place in the former parent,
    /// in order, and the wrapper (with its overlay entries) is removed.
    ///
    /// # Errors
    /// `NotFound` if missing; `InvalidArgument` if `id` is not a group.
    pub fn ungroup(&mut self, id: NodeId) -> EditResult<Vec<NodeId>> {
        let group = self.document.require(id)?;
        if group.kind != ElementKind::Group {
            return Err(EditError::invalid(format!(
                "{id} is a {} and not a group",
                group.kind
            )));
        }
        let children: Vec<NodeId> = group.children.to_vec();
        let parent = group.parent;
        let position = self
            .document
            .unlink(id)
            .map(|(_, i)| i)
            .unwrap_or(usize::MAX);

        for (offset, &child) in children.iter().enumerate() {
            self.document
                .link(child, parent, position.saturating_add(offset));
        }
        self.document.remove_record(id);
        self.responsive_styles.remove_element(id);
        log::debug!("ungrouped {id} ({} children)", children.len());
        Ok(children)
    }

    /// Align elements to a shared edge or center line using geometry from
    /// the render layer. Writes absolute-position styles only.
    ///
    /// # Errors
    /// `InvalidArgument` for fewer than two targets; `NotFound` for missing
    /// elements.
    pub fn align(&mut self, targets: &[(NodeId, Bounds)], edge: AlignEdge) -> EditResult<()> {
        if targets.len() < 2 {
            return Err(EditError::invalid("align needs at least 2 elements"));
        }
        self.require_all(targets)?;

        let min_x = targets.iter().map(|(_, b)| b.x).fold(f32::MAX, f32::min);
        let min_y = targets.iter().map(|(_, b)| b.y).fold(f32::MAX, f32::min);
        let max_r = targets.iter().map(|(_, b)| b.right()).fold(f32::MIN, f32::max);
        let max_b = targets.iter().map(|(_, b)| b.bottom()).fold(f32::MIN, f32::max);
        let mid_x = (min_x + max_r) / 2.0;
        let mid_y = (min_y + max_b) / 2.0;

        for &(id, b) in targets {
            let (x, y) = match edge {
                AlignEdge::Left => (min_x, b.y),
                AlignEdge::HCenter => (mid_x - b.width / 2.0, b.y),
                AlignEdge::Right => (max_r - b.width, b.y),
                AlignEdge::Top => (b.x, min_y),
                AlignEdge::VMiddle => (b.x, mid_y - b.height / 2.0),
                AlignEdge::Bottom => (b.x, max_b - b.height),
            };
            self.write_position(id, x, y);
        }
        Ok(())
    }

    /// Space elements evenly along `axis`, keeping the outermost two fixed:
    /// `gap = (span - sum_of_sizes) / (count - 1)`.
    ///
    /// # Errors
    /// `InvalidArgument` for fewer than three targets; `NotFound` for missing
    /// elements.
    pub fn distribute(&mut self, targets: &[(NodeId, Bounds)], axis: Axis) -> EditResult<()> {
        if targets.len() < 3 {
            return Err(EditError::invalid("distribute needs at least 3 elements"));
        }
        self.require_all(targets)?;

        let start = |b: &Bounds| match axis {
            Axis::Horizontal => b.x,
            Axis::Vertical => b.y,
        };
        let size = |b: &Bounds| match axis {
            Axis::Horizontal => b.width,
            Axis::Vertical => b.height,
        };

        let mut sorted = targets.to_vec();
        sorted.sort_by(|(_, a), (_, b)| start(a).total_cmp(&start(b)));

        let first = sorted[0].1;
        let span_end = sorted
            .iter()
            .map(|(_, b)| start(b) + size(b))
            .fold(f32::MIN, f32::max);
        let span = span_end - start(&first);
        let total: f32 = sorted.iter().map(|(_, b)| size(b)).sum();
        let gap = (span - total) / (sorted.len() - 1) as f32;

        let mut cursor = start(&first);
        for (id, b) in &sorted {
            let (x, y) = match axis {
                Axis::Horizontal => (cursor, b.y),
                Axis::Vertical => (b.x, cursor),
            };
            self.write_position(*id, x, y);
            cursor += size(b) + gap;
        }
        Ok(())
    }

    /// Route a property-panel edit into styles, attributes or content.
    /// Returns whether the element changed.
    ///
    /// # Errors
    /// `NotFound` if missing; `InvalidArgument` for bookkeeping attribute
    /// names, malformed names, or content on a void element.
    pub fn update_property(&mut self, id: NodeId, edit: &PropertyEdit) -> EditResult<bool> {
        let element = self.document.require(id)?;
        match edit.target {
            PropertyTarget::Attribute => {
                if is_internal_attribute(&edit.name) {
                    return Err(EditError::invalid(format!(
                        "`{}` is reserved for the editor",
                        edit.name
                    )));
                }
                if !is_valid_name(&edit.name) {
                    return Err(EditError::invalid(format!(
                        "`{}` is not a valid attribute name",
                        edit.name
                    )));
                }
            }
            PropertyTarget::Style => {
                if !is_valid_name(&edit.name) {
                    return Err(EditError::invalid(format!(
                        "`{}` is not a valid style property",
                        edit.name
                    )));
                }
            }
            PropertyTarget::Content => {
                if element.kind.is_self_closing() && edit.value.is_some() {
                    return Err(EditError::invalid(format!(
                        "<{}> cannot hold content",
                        element.kind.tag_name()
                    )));
                }
            }
        }

        let Some(element) = self.document.get_mut(id) else {
            return Err(EditError::NotFound(id));
        };
        let changed = match (edit.target, &edit.value) {
            (PropertyTarget::Style, Some(v)) => {
                element.styles.insert(edit.name.clone(), v.clone()).as_ref() != Some(v)
            }
            (PropertyTarget::Style, None) => element.styles.remove(&edit.name).is_some(),
            (PropertyTarget::Attribute, Some(v)) => {
                let name = edit.name.to_ascii_lowercase();
                element.attributes.insert(name, v.clone()).as_ref() != Some(v)
            }
            (PropertyTarget::Attribute, None) => element
                .attributes
                .remove(&edit.name.to_ascii_lowercase())
                .is_some(),
            (PropertyTarget::Content, value) => {
                let changed = element.content != *value;
                element.content = value.clone();
                changed
            }
        };
        Ok(changed)
    }

    fn require_all(&self, targets: &[(NodeId, Bounds)]) -> EditResult<()> {
        for (id, _) in targets {
            self.document.require(*id)?;
        }
        Ok(())
    }

    fn write_position(&mut self, id: NodeId, x: f32, y: f32) {
        if let Some(el) = self.document.get_mut(id) {
            el.styles.insert("position".into(), "absolute".into());
            el.styles.insert("left".into(), px(x));
            el.styles.insert("top".into(), px(y));
        }
    }
}

/// Attribute and style names: ASCII letters, digits, `-`, `_`, `:`.
pub(crate) fn is_valid_name(name: &str) -> bool {
    !name.is_empty()
        && name
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || matches!(b, b'-' | b'_' | b':'))
}

/// Pixel value rounded to two decimals, without trailing zeros.
fn px(v: f32) -> String {
    let rounded = (f64::from(v) * 100.0).round() / 100.0;
    if rounded.fract() == 0.0 {
        format!("{}px", rounded as i64)
    } else {
        format!("{rounded}px")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::overlay::Breakpoint;
    use crate::model::StyleMap;
    use pretty_assertions::assert_eq;

    fn page_with_buttons(n: usize) -> (Page, NodeId, Vec<NodeId>) {
        let mut page = Page::new();
        let root = page.create_node(ElementKind::Container, NodeInit::default());
        let buttons = (0..n)
            .map(|i| {
                page.insert_on_drop(ElementKind::Button, NodeInit::default(), Some(root), i)
                    .unwrap()
            })
            .collect();
        (page, root, buttons)
    }

    #[test]
    fn insert_on_drop_scenario() {
        let mut page = Page::new();
        let c = page.create_node(ElementKind::Container, NodeInit::default());
        let p = page
            .insert_on_drop(ElementKind::Paragraph, NodeInit::default(), Some(c), 0)
            .unwrap();
        assert_eq!(page.document().children(c), &[p]);
        assert_eq!(page.document().parent_of(p), Some(c));
        assert_eq!(page.document().root_elements(), &[c]);
    }

    #[test]
    fn insert_on_drop_clamps_and_supports_root() {
        let (mut page, root, buttons) = page_with_buttons(2);
        let late = page
            .insert_on_drop(ElementKind::Text, NodeInit::default(), Some(root), 50)
            .unwrap();
        assert_eq!(page.document().children(root), &[buttons[0], buttons[1], late]);

        let first = page
            .insert_on_drop(ElementKind::Header, NodeInit::default(), None, 0)
            .unwrap();
        assert_eq!(page.document().root_elements(), &[first, root]);
    }

    #[test]
    fn group_scenario() {
        let (mut page, r, b) = page_with_buttons(3);
        let (b0, b1, b2) = (b[0], b[1], b[2]);
        let g = page.group(&[b2, b1]).unwrap();

        assert_eq!(page.document().children(r), &[b0, g]);
        assert_eq!(page.document().children(g), &[b1, b2]);
        assert_eq!(page.document().parent_of(b1), Some(g));
        assert_eq!(page.document().parent_of(b2), Some(g));
        assert_eq!(page.document().get(g).unwrap().kind, ElementKind::Group);
        page.document().check_invariants().unwrap();
    }

    #[test]
    fn group_rejects_bad_input_without_change() {
        let (mut page, _, b) = page_with_buttons(2);
        let loose = page.create_node(ElementKind::Button, NodeInit::default());
        let before = page.clone();

        assert!(matches!(page.group(&[b[0]]), Err(EditError::InvalidArgument(_))));
        assert!(matches!(
            page.group(&[b[0], loose]),
            Err(EditError::InvalidArgument(_))
        ));
        assert!(matches!(
            page.group(&[b[0], b[0]]),
            Err(EditError::InvalidArgument(_))
        ));
        let ghost = NodeId::intern("button-9999");
        assert_eq!(page.group(&[b[0], ghost]), Err(EditError::NotFound(ghost)));
        assert_eq!(page, before);
    }

    #[test]
    fn ungroup_restores_position_and_order() {
        let (mut page, r, b) = page_with_buttons(4);
        let g = page.group(&[b[1], b[2]]).unwrap();
        let delta = StyleMap::from([("gap".to_string(), "4".to_string())]);
        page.set_override(g, Breakpoint::Mobile, delta).unwrap();

        let children = page.ungroup(g).unwrap();
        assert_eq!(children, vec![b[1], b[2]]);
        assert_eq!(page.document().children(r), &[b[0], b[1], b[2], b[3]]);
        assert!(page.document().get(g).is_none());
        assert!(!page.overlay().has_override(g, Breakpoint::Mobile));
        page.document().check_invariants().unwrap();
    }

    #[test]
    fn ungroup_non_group_is_invalid() {
        let (mut page, r, _) = page_with_buttons(1);
        assert!(matches!(page.ungroup(r), Err(EditError::InvalidArgument(_))));
    }

    #[test]
    fn duplicate_clones_subtree_after_original() {
        let mut page = Page::new();
        let section = page.create_node(ElementKind::Section, NodeInit::default());
        let card = page
            .insert_on_drop(ElementKind::Container, NodeInit::default(), Some(section), 0)
            .unwrap();
        let title = page
            .insert_on_drop(ElementKind::Heading, NodeInit::default(), Some(card), 0)
            .unwrap();
        let trailing = page
            .insert_on_drop(ElementKind::Divider, NodeInit::default(), Some(section), 1)
            .unwrap();
        page.set_override(
            title,
            Breakpoint::Mobile,
            StyleMap::from([("fontSize".to_string(), "20".to_string())]),
        )
        .unwrap();

        let copy = page.duplicate(card).unwrap();
        let doc = page.document();
        assert_eq!(doc.children(section), &[card, copy, trailing]);
        assert_eq!(doc.parent_of(copy), Some(section));

        let copy_title = doc.children(copy)[0];
        assert_ne!(copy_title, title);
        assert_eq!(doc.parent_of(copy_title), Some(copy));
        assert_eq!(doc.get(copy_title).unwrap().content.as_deref(), Some("Heading"));
        assert_eq!(
            page.overlay().get(copy_title, Breakpoint::Mobile),
            page.overlay().get(title, Breakpoint::Mobile)
        );
        doc.check_invariants().unwrap();
    }

    #[test]
    fn duplicate_is_isolated_from_original() {
        let (mut page, _, b) = page_with_buttons(1);
        let copy = page.duplicate(b[0]).unwrap();
        page.update_property(copy, &PropertyEdit::content("Changed")).unwrap();
        page.update_property(copy, &PropertyEdit::style("color", "red")).unwrap();

        let original = page.document().get(b[0]).unwrap();
        assert_eq!(original.content.as_deref(), Some("Button"));
        assert!(!original.styles.contains_key("color"));
    }

    #[test]
    fn duplicate_missing_is_not_found() {
        let mut page = Page::new();
        let ghost = NodeId::intern("button-4242");
        assert_eq!(page.duplicate(ghost), Err(EditError::NotFound(ghost)));
    }

    #[test]
    fn reorder_rejects_cycles() {
        let mut page = Page::new();
        let a = page.create_node(ElementKind::Container, NodeInit::default());
        let b = page
            .insert_on_drop(ElementKind::Container, NodeInit::default(), Some(a), 0)
            .unwrap();
        let before = page.clone();
        assert!(matches!(page.reorder(a, Some(b), 0), Err(EditError::Structural(_))));
        assert_eq!(page, before);
    }

    #[test]
    fn reorder_moves_to_root_and_between_parents() {
        let (mut page, r, b) = page_with_buttons(3);
        page.reorder(b[2], Some(r), 0).unwrap();
        assert_eq!(page.document().children(r), &[b[2], b[0], b[1]]);
        page.reorder(b[0], None, 0).unwrap();
        assert_eq!(page.document().root_elements(), &[b[0], r]);
        page.document().check_invariants().unwrap();
    }

    #[test]
    fn move_sibling_steps_and_boundaries() {
        let (mut page, r, b) = page_with_buttons(3);
        assert!(!page.move_sibling(b[0], SiblingStep::Backward).unwrap());
        assert!(page.move_sibling(b[0], SiblingStep::Forward).unwrap());
        assert_eq!(page.document().children(r), &[b[1], b[0], b[2]]);
        assert!(page.move_sibling(b[2], SiblingStep::ToBack).unwrap());
        assert_eq!(page.document().children(r), &[b[2], b[1], b[0]]);
        assert!(!page.move_sibling(b[0], SiblingStep::ToFront).unwrap());
    }

    #[test]
    fn distribute_equal_gaps() {
        let (mut page, _, b) = page_with_buttons(3);
        let targets = [
            (b[0], Bounds::new(0.0, 0.0, 10.0, 10.0)),
            (b[2], Bounds::new(90.0, 0.0, 10.0, 10.0)),
            (b[1], Bounds::new(20.0, 5.0, 20.0, 10.0)),
        ];
        page.distribute(&targets, Axis::Horizontal).unwrap();
        let left = |id| page.document().get(id).unwrap().styles["left"].clone();
        // span 100, widths 40, gap 30
        assert_eq!(left(b[0]), "0px");
        assert_eq!(left(b[1]), "40px");
        assert_eq!(left(b[2]), "90px");
        assert_eq!(page.document().get(b[1]).unwrap().styles["top"], "5px");
    }

    #[test]
    fn distribute_needs_three() {
        let (mut page, _, b) = page_with_buttons(2);
        let targets = [(b[0], Bounds::default()), (b[1], Bounds::default())];
        assert!(matches!(
            page.distribute(&targets, Axis::Vertical),
            Err(EditError::InvalidArgument(_))
        ));
    }

    #[test]
    fn align_right_edges() {
        let (mut page, _, b) = page_with_buttons(2);
        let targets = [
            (b[0], Bounds::new(10.0, 0.0, 50.0, 20.0)),
            (b[1], Bounds::new(30.0, 40.0, 100.0, 20.0)),
        ];
        page.align(&targets, AlignEdge::Right).unwrap();
        let el = page.document().get(b[0]).unwrap();
        assert_eq!(el.styles["left"], "80px");
        assert_eq!(el.styles["position"], "absolute");
        assert_eq!(page.document().get(b[1]).unwrap().styles["left"], "30px");
    }

    #[test]
    fn align_missing_target_writes_nothing() {
        let (mut page, _, b) = page_with_buttons(1);
        let ghost = NodeId::intern("button-31337");
        let before = page.clone();
        let targets = [(b[0], Bounds::default()), (ghost, Bounds::default())];
        assert_eq!(page.align(&targets, AlignEdge::Top), Err(EditError::NotFound(ghost)));
        assert_eq!(page, before);
    }

    #[test]
    fn update_property_routes_by_target() {
        let (mut page, _, b) = page_with_buttons(1);
        let id = b[0];
        assert!(page.update_property(id, &PropertyEdit::style("color", "red")).unwrap());
        assert!(!page.update_property(id, &PropertyEdit::style("color", "red")).unwrap());
        assert!(page.update_property(id, &PropertyEdit::attribute("title", "Go")).unwrap());
        assert!(page.update_property(id, &PropertyEdit::content("Go")).unwrap());

        let el = page.document().get(id).unwrap();
        assert_eq!(el.styles["color"], "red");
        assert_eq!(el.attributes["title"], "Go");
        assert_eq!(el.content.as_deref(), Some("Go"));

        let remove = PropertyEdit {
            target: PropertyTarget::Style,
            name: "color".into(),
            value: None,
        };
        assert!(page.update_property(id, &remove).unwrap());
        assert!(!page.document().get(id).unwrap().styles.contains_key("color"));
    }

    #[test]
    fn update_property_rejects_reserved_and_void_content() {
        let mut page = Page::new();
        let img = page.create_node(ElementKind::Image, NodeInit::default());
        assert!(matches!(
            page.update_property(img, &PropertyEdit::attribute("draggable", "true")),
            Err(EditError::InvalidArgument(_))
        ));
        assert!(matches!(
            page.update_property(img, &PropertyEdit::attribute("bad name", "x")),
            Err(EditError::InvalidArgument(_))
        ));
        assert!(matches!(
            page.update_property(img, &PropertyEdit::content("x")),
            Err(EditError::InvalidArgument(_))
        ));
    }

    #[test]
    fn px_formatting() {
        assert_eq!(px(10.0), "10px");
        assert_eq!(px(12.345), "12.35px");
        assert_eq!(px(-3.5), "-3.5px");
    }

    #[test]
    fn attribute_names_are_case_insensitive() {
        let mut page = Page::new();
        let link = page.create_node(ElementKind::Link, NodeInit::default());
        assert!(page
            .update_property(link, &PropertyEdit::attribute("Title", "Home"))
            .unwrap());
        assert!(page
            .update_property(link, &PropertyEdit::attribute("title", "Start"))
            .unwrap());

        let attributes = &page.document().get(link).unwrap().attributes;
        assert_eq!(attributes.get("title").map(String::as_str), Some("Start"));
        assert!(!attributes.contains_key("Title"));

        let removal = PropertyEdit {
            target: PropertyTarget::Attribute,
            name: "TITLE".into(),
            value: None,
        };
        assert!(page.update_property(link, &removal).unwrap());
        assert!(!page.document().get(link).unwrap().attributes.contains_key("title"));
    }

    #[test]
    fn initial_attributes_are_lowercased() {
        let mut page = Page::new();
        let init = NodeInit {
            attributes: [("HREF".to_string(), "/about".to_string())].into(),
            ..NodeInit::default()
        };
        let link = page.create_node(ElementKind::Link, init);
        let attributes = &page.document().get(link).unwrap().attributes;
        assert_eq!(attributes.get("href").map(String::as_str), Some("/about"));
        assert!(!attributes.contains_key("HREF"));
    }
}
