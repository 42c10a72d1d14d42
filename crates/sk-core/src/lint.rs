//! Lint diagnostics for pages.
//!
//! Reports authoring issues without modifying the page. Diagnostics come
//! out in document order, rule by rule.

use crate::id::NodeId;
use crate::model::ElementKind;
use crate::overlay::Breakpoint;
use crate::page::Page;

// ─── Diagnostic types ────────────────────────────────────────────────────

/// Severity of a lint finding.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LintSeverity {
    /// Likely a mistake.
    Warning,
    /// Style suggestion.
    Info,
}

/// A single lint diagnostic for an element.
#[derive(Debug, Clone, PartialEq)]
pub struct LintDiagnostic {
    pub node_id: NodeId,
    pub message: String,
    pub severity: LintSeverity,
    /// Short rule identifier (e.g. "image-missing-alt").
    pub rule: &'static str,
}

// ─── Public API ──────────────────────────────────────────────────────────

/// Run all lint rules over the page and return diagnostics.
#[must_use]
pub fn lint_page(page: &Page) -> Vec<LintDiagnostic> {
    let order = page.document().walk();
    let mut diags = Vec::new();
    lint_content_with_children(page, &order, &mut diags);
    lint_image_alt(page, &order, &mut diags);
    lint_empty_links(page, &order, &mut diags);
    lint_empty_groups(page, &order, &mut diags);
    lint_redundant_overrides(page, &order, &mut diags);
    diags
}

// ─── Rules ───────────────────────────────────────────────────────────────

/// Content on an element that also has children is exported before them
/// and is usually left over from before the children were dropped in.
fn lint_content_with_children(page: &Page, order: &[NodeId], diags: &mut Vec<LintDiagnostic>) {
    for &id in order {
        let Some(el) = page.document().get(id) else {
            continue;
        };
        if el.has_children() && el.content.as_deref().is_some_and(|c| !c.trim().is_empty()) {
            diags.push(LintDiagnostic {
                node_id: id,
                message: format!("`{id}` has both text content and children; the text is exported before the children"),
                severity: LintSeverity::Info,
                rule: "content-with-children",
            });
        }
    }
}

fn lint_image_alt(page: &Page, order: &[NodeId], diags: &mut Vec<LintDiagnostic>) {
    for &id in order {
        let Some(el) = page.document().get(id) else {
            continue;
        };
        if el.kind != ElementKind::Image {
            continue;
        }
        let has_alt = el.attributes.get("alt").is_some_and(|a| !a.trim().is_empty());
        if !has_alt {
            diags.push(LintDiagnostic {
                node_id: id,
                message: format!("Image `{id}` has no alt text"),
                severity: LintSeverity::Warning,
                rule: "image-missing-alt",
            });
        }
    }
}

fn lint_empty_links(page: &Page, order: &[NodeId], diags: &mut Vec<LintDiagnostic>) {
    for &id in order {
        let Some(el) = page.document().get(id) else {
            continue;
        };
        if el.kind == ElementKind::Link
            && el.attributes.get("href").is_none_or(|h| h.trim().is_empty())
        {
            diags.push(LintDiagnostic {
                node_id: id,
                message: format!("Link `{id}` has no href"),
                severity: LintSeverity::Warning,
                rule: "empty-link",
            });
        }
    }
}

fn lint_empty_groups(page: &Page, order: &[NodeId], diags: &mut Vec<LintDiagnostic>) {
    for &id in order {
        let Some(el) = page.document().get(id) else {
            continue;
        };
        if el.kind == ElementKind::Group && el.children.len() < 2 {
            diags.push(LintDiagnostic {
                node_id: id,
                message: format!(
                    "Group `{id}` wraps {} element(s); consider ungrouping",
                    el.children.len()
                ),
                severity: LintSeverity::Info,
                rule: "empty-group",
            });
        }
    }
}

/// Overrides that repeat the base value have no effect.
fn lint_redundant_overrides(page: &Page, order: &[NodeId], diags: &mut Vec<LintDiagnostic>) {
    for &id in order {
        let (Some(el), Some(by_breakpoint)) =
            (page.document().get(id), page.overlay().for_element(id))
        else {
            continue;
        };
        for (breakpoint, overrides) in by_breakpoint {
            if *breakpoint == Breakpoint::Desktop {
                continue;
            }
            for (name, value) in overrides {
                if el.styles.get(name) == Some(value) {
                    diags.push(LintDiagnostic {
                        node_id: id,
                        message: format!(
                            "`{name}: {value}` on `{id}` at {breakpoint} repeats the base style"
                        ),
                        severity: LintSeverity::Info,
                        rule: "redundant-override",
                    });
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{NodeInit, StyleMap};
    use crate::mutations::PropertyEdit;
    use pretty_assertions::assert_eq;

    fn rules(page: &Page) -> Vec<&'static str> {
        lint_page(page).into_iter().map(|d| d.rule).collect()
    }

    #[test]
    fn clean_page_has_no_diagnostics() {
        let mut page = Page::new();
        let c = page.create_node(ElementKind::Container, NodeInit::default());
        page.insert_on_drop(ElementKind::Image, NodeInit::default(), Some(c), 0)
            .unwrap();
        page.insert_on_drop(ElementKind::Link, NodeInit::default(), Some(c), 1)
            .unwrap();
        assert!(lint_page(&page).is_empty());
    }

    #[test]
    fn image_without_alt() {
        let mut page = Page::new();
        let img = page.create_node(ElementKind::Image, NodeInit::default());
        page.update_property(img, &PropertyEdit::attribute("alt", "  "))
            .unwrap();
        let diags = lint_page(&page);
        assert_eq!(diags.len(), 1);
        assert_eq!(diags[0].rule, "image-missing-alt");
        assert_eq!(diags[0].severity, LintSeverity::Warning);
        assert_eq!(diags[0].node_id, img);
    }

    #[test]
    fn link_without_href() {
        let mut page = Page::new();
        let link = page.create_node(ElementKind::Link, NodeInit::default());
        let remove = PropertyEdit {
            target: crate::mutations::PropertyTarget::Attribute,
            name: "href".into(),
            value: None,
        };
        page.update_property(link, &remove).unwrap();
        assert_eq!(rules(&page), vec!["empty-link"]);
    }

    #[test]
    fn content_with_children_and_lonely_group() {
        let mut page = Page::new();
        let b = page.create_node(ElementKind::Button, NodeInit::default());
        page.insert_on_drop(ElementKind::Text, NodeInit::default(), Some(b), 0)
            .unwrap();
        let t1 = page.create_node(ElementKind::Text, NodeInit::default());
        let t2 = page.create_node(ElementKind::Text, NodeInit::default());
        let g = page.group(&[t1, t2]).unwrap();
        page.reorder(t2, None, 0).unwrap();

        let diags = lint_page(&page);
        assert_eq!(rules(&page), vec!["content-with-children", "empty-group"]);
        assert_eq!(diags[1].node_id, g);
    }

    #[test]
    fn redundant_override() {
        let mut page = Page::new();
        let h = page.create_node(ElementKind::Heading, NodeInit::default());
        page.set_override(
            h,
            Breakpoint::Mobile,
            StyleMap::from([
                ("fontSize".to_string(), "32".to_string()),
                ("color".to_string(), "red".to_string()),
            ]),
        )
        .unwrap();
        let diags = lint_page(&page);
        assert_eq!(diags.len(), 1);
        assert_eq!(diags[0].rule, "redundant-override");
        assert!(diags[0].message.contains("fontSize: 32"));
    }
}
