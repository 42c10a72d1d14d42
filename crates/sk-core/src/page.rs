//! The page aggregate: element tree plus responsive overlay.
//!
//! Mutations operate on a `Page` so overlay cleanup and copying happen in
//! the same step as the structural change.

use crate::document::Document;
use crate::error::{EditError, EditResult};
use crate::id::NodeId;
use crate::model::{ElementKind, NodeInit, StyleMap};
use crate::overlay::{Breakpoint, StyleOverlay};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Page {
    pub(crate) document: Document,
    pub(crate) responsive_styles: StyleOverlay,
}

impl Page {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Combine a document with an overlay, dropping overlay entries for
    /// elements that do not exist.
    pub fn from_parts(document: Document, mut responsive_styles: StyleOverlay) -> Self {
        let dropped = responsive_styles.retain_elements(|id| document.contains(id));
        if dropped > 0 {
            log::warn!("dropped {dropped} responsive entries for missing elements");
        }
        Self {
            document,
            responsive_styles,
        }
    }

    pub fn document(&self) -> &Document {
        &self.document
    }

    pub fn overlay(&self) -> &StyleOverlay {
        &self.responsive_styles
    }

    pub fn into_parts(self) -> (Document, StyleOverlay) {
        (self.document, self.responsive_styles)
    }

    /// Create an element at the end of the root list.
    pub fn create_node(&mut self, kind: ElementKind, init: NodeInit) -> NodeId {
        self.document.create_node(kind, init)
    }

    /// Cascade-delete `id`, pruning overlay entries of every removed
    /// element. Returns removed IDs (empty if `id` was already absent).
    pub fn delete(&mut self, id: NodeId) -> Vec<NodeId> {
        let removed = self.document.delete_cascade(id);
        for gone in &removed {
            self.responsive_styles.remove_element(*gone);
        }
        removed
    }

    /// Base styles of `id` overlaid with the breakpoint's overrides.
    ///
    /// # Errors
    /// `NotFound` if `id` is missing.
    pub fn resolve_styles(&self, id: NodeId, breakpoint: Breakpoint) -> EditResult<StyleMap> {
        let element = self.document.require(id)?;
        Ok(self
            .responsive_styles
            .resolve(&element.styles, id, breakpoint))
    }

    /// Merge `delta` into the overrides for `(id, breakpoint)`.
    ///
    /// # Errors
    /// `NotFound` if `id` is missing.
    pub fn set_override(
        &mut self,
        id: NodeId,
        breakpoint: Breakpoint,
        delta: StyleMap,
    ) -> EditResult<()> {
        if !self.document.contains(id) {
            return Err(EditError::NotFound(id));
        }
        self.responsive_styles.set_override(id, breakpoint, delta);
        Ok(())
    }

    /// Remove overrides for `(id, breakpoint)`: one property, or all of
    /// them when `property` is `None`. Returns whether anything changed.
    ///
    /// # Errors
    /// `NotFound` if `id` is missing.
    pub fn clear_override(
        &mut self,
        id: NodeId,
        breakpoint: Breakpoint,
        property: Option<&str>,
    ) -> EditResult<bool> {
        if !self.document.contains(id) {
            return Err(EditError::NotFound(id));
        }
        Ok(match property {
            Some(name) => self
                .responsive_styles
                .remove_property(id, breakpoint, name),
            None => self.responsive_styles.clear(id, breakpoint),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn mobile_override_scenario() {
        let mut page = Page::new();
        let mut init = NodeInit::default();
        init.styles.insert("color".into(), "blue".into());
        let x = page.create_node(ElementKind::Text, init);

        page.set_override(
            x,
            Breakpoint::Mobile,
            StyleMap::from([("color".to_string(), "red".to_string())]),
        )
        .unwrap();

        assert_eq!(page.resolve_styles(x, Breakpoint::Mobile).unwrap()["color"], "red");
        assert_eq!(page.resolve_styles(x, Breakpoint::Desktop).unwrap()["color"], "blue");
    }

    #[test]
    fn delete_prunes_overlay_for_whole_subtree() {
        let mut page = Page::new();
        let c = page.create_node(ElementKind::Container, NodeInit::default());
        let t = page
            .document
            .create_child(ElementKind::Text, NodeInit::default(), c, 0)
            .unwrap();
        let delta = StyleMap::from([("display".to_string(), "none".to_string())]);
        page.set_override(c, Breakpoint::Tablet, delta.clone()).unwrap();
        page.set_override(t, Breakpoint::Mobile, delta).unwrap();

        page.delete(c);
        assert!(page.overlay().is_empty());
    }

    #[test]
    fn override_on_missing_element_is_not_found() {
        let mut page = Page::new();
        let ghost = NodeId::intern("ghost-1");
        assert_eq!(
            page.set_override(ghost, Breakpoint::Mobile, StyleMap::new()),
            Err(EditError::NotFound(ghost))
        );
        assert_eq!(
            page.resolve_styles(ghost, Breakpoint::Desktop),
            Err(EditError::NotFound(ghost))
        );
    }

    #[test]
    fn from_parts_drops_orphan_overrides() {
        let mut overlay = StyleOverlay::new();
        overlay.set_override(
            NodeId::intern("ghost-2"),
            Breakpoint::Mobile,
            StyleMap::from([("color".to_string(), "red".to_string())]),
        );
        let page = Page::from_parts(Document::new(), overlay);
        assert!(page.overlay().is_empty());
    }
}
