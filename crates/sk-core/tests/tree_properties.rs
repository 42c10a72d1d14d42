//! Integration tests: tree invariants across mutation sequences (sk-core).
//!
//! Every scenario ends with `check_invariants()` so a broken parent/child
//! link anywhere in the sequence fails the test.

use pretty_assertions::assert_eq;
use sk_core::*;

fn button_row(count: usize) -> (Page, NodeId, Vec<NodeId>) {
    let mut page = Page::new();
    let row = page.create_node(ElementKind::Container, NodeInit::default());
    let buttons = (0..count)
        .map(|i| {
            page.insert_on_drop(ElementKind::Button, NodeInit::default(), Some(row), i)
                .unwrap()
        })
        .collect();
    (page, row, buttons)
}

/// Every element appears in exactly one of its parent's children or the
/// root list, and nowhere else.
fn assert_single_membership(page: &Page) {
    let doc = page.document();
    for el in doc.elements() {
        let in_roots = doc.root_elements().iter().filter(|&&r| r == el.id).count();
        let in_children: usize = doc
            .elements()
            .map(|p| p.children.iter().filter(|&&c| c == el.id).count())
            .sum();
        match el.parent {
            Some(p) => {
                assert_eq!(in_roots, 0, "{} is both rooted and parented", el.id);
                assert_eq!(in_children, 1);
                assert!(doc.children(p).contains(&el.id));
            }
            None => {
                assert_eq!(in_roots, 1, "{} is not in the root list", el.id);
                assert_eq!(in_children, 0);
            }
        }
    }
}

// ─── Scenarios ───────────────────────────────────────────────────────────

#[test]
fn paragraph_into_container() {
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
fn group_two_siblings() {
    let (mut page, r, b) = button_row(2);
    let g = page.group(&[b[0], b[1]]).unwrap();
    assert_eq!(page.document().children(r), &[g]);
    assert_eq!(page.document().children(g), &[b[0], b[1]]);
    assert_eq!(page.document().parent_of(b[0]), Some(g));
    assert_eq!(page.document().parent_of(b[1]), Some(g));
    assert_single_membership(&page);
}

#[test]
fn mobile_override_resolution() {
    let mut page = Page::new();
    let x = page.create_node(
        ElementKind::Text,
        NodeInit {
            styles: StyleMap::from([("color".to_string(), "blue".to_string())]),
            ..NodeInit::default()
        },
    );
    page.set_override(
        x,
        Breakpoint::Mobile,
        StyleMap::from([("color".to_string(), "red".to_string())]),
    )
    .unwrap();
    assert_eq!(page.resolve_styles(x, Breakpoint::Mobile).unwrap()["color"], "red");
    assert_eq!(page.resolve_styles(x, Breakpoint::Desktop).unwrap()["color"], "blue");
}

// ─── Properties ──────────────────────────────────────────────────────────

#[test]
fn invariant_holds_through_mixed_sequence() {
    let (mut page, row, b) = button_row(4);
    let section = page.create_node(ElementKind::Section, NodeInit::default());

    page.reorder(b[3], Some(section), 0).unwrap();
    let g = page.group(&[b[0], b[2]]).unwrap();
    let copy = page.duplicate(g).unwrap();
    page.move_sibling(copy, SiblingStep::ToBack).unwrap();
    page.reorder(row, Some(section), 1).unwrap();
    page.ungroup(g).unwrap();
    page.delete(b[1]);

    page.document().check_invariants().unwrap();
    assert_single_membership(&page);
    assert_eq!(page.document().root_elements(), &[section]);
}

#[test]
fn delete_cascade_is_idempotent() {
    let (mut page, row, _) = button_row(3);
    let once = {
        let mut p = page.clone();
        p.delete(row);
        p
    };
    page.delete(row);
    let removed_again = page.delete(row);
    assert!(removed_again.is_empty());
    assert_eq!(page, once);
    assert!(page.document().is_empty());
}

#[test]
fn attach_under_descendant_leaves_document_unchanged() {
    let mut page = Page::new();
    let a = page.create_node(ElementKind::Container, NodeInit::default());
    let mid = page
        .insert_on_drop(ElementKind::Container, NodeInit::default(), Some(a), 0)
        .unwrap();
    let b = page
        .insert_on_drop(ElementKind::Container, NodeInit::default(), Some(mid), 0)
        .unwrap();

    let before = serde_json::to_vec(page.document()).unwrap();
    let err = page.reorder(a, Some(b), 0).unwrap_err();
    assert!(matches!(err, EditError::Structural(_)));
    assert_eq!(serde_json::to_vec(page.document()).unwrap(), before);
}

#[test]
fn duplicate_isolation_both_ways() {
    let (mut page, _, b) = button_row(1);
    let copy = page.duplicate(b[0]).unwrap();

    page.update_property(copy, &PropertyEdit::style("color", "red"))
        .unwrap();
    page.update_property(b[0], &PropertyEdit::content("Original"))
        .unwrap();

    let original = page.document().get(b[0]).unwrap();
    let cloned = page.document().get(copy).unwrap();
    assert_eq!(original.styles.get("color"), None);
    assert_eq!(cloned.styles["color"], "red");
    assert_eq!(cloned.content.as_deref(), Some("Button"));
    assert_eq!(original.content.as_deref(), Some("Original"));
}

#[test]
fn ids_stay_unique_after_deletes_and_duplicates() {
    let (mut page, row, b) = button_row(3);
    page.delete(b[2]);
    let copy = page.duplicate(row).unwrap();
    let fresh = page
        .insert_on_drop(ElementKind::Button, NodeInit::default(), Some(copy), 0)
        .unwrap();
    assert_ne!(fresh, b[2]);
    let mut ids: Vec<NodeId> = page.document().elements().map(|e| e.id).collect();
    let total = ids.len();
    ids.sort();
    ids.dedup();
    assert_eq!(ids.len(), total);
}

#[test]
fn rejected_operations_change_nothing() {
    let (mut page, row, b) = button_row(3);
    let img = page.create_node(ElementKind::Image, NodeInit::default());
    let before = page.clone();

    assert!(page.group(&[b[0]]).is_err());
    assert!(page.ungroup(row).is_err());
    assert!(page.reorder(b[0], Some(img), 0).is_err());
    assert!(page.reorder(row, Some(row), 0).is_err());
    assert!(page.distribute(&[(b[0], Bounds::default())], Axis::Horizontal).is_err());
    assert!(
        page.insert_on_drop(ElementKind::Text, NodeInit::default(), Some(img), 0)
            .is_err()
    );
    assert_eq!(page, before);
}
