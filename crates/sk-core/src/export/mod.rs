//! Export projection: Page → standalone HTML and CSS.
//!
//! Pure readers of the page. The walk is the document pre-order over
//! attached elements; detached elements are never exported.

mod css;
mod html;

pub use css::export_css;
pub use html::export_html;

use crate::id::NodeId;
use crate::model::{Element, ElementKind};
use crate::page::Page;
use serde::{Deserialize, Serialize};
use std::fmt::Write;

/// Knobs for the exporters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ExportOptions {
    /// Indentation per nesting level.
    pub indent: String,
    /// Wrap the markup in `<!DOCTYPE html>` / `<head>` / `<body>`.
    pub full_document: bool,
    /// `<title>` of the full document.
    pub title: String,
    /// Prefix of the generated class names.
    pub class_prefix: String,
    /// Embed the stylesheet in a `<style>` block instead of linking
    /// `stylesheet_href`.
    pub inline_css: bool,
    pub stylesheet_href: String,
}

impl Default for ExportOptions {
    fn default() -> Self {
        Self {
            indent: "  ".to_string(),
            full_document: true,
            title: "My Website".to_string(),
            class_prefix: "sk".to_string(),
            inline_css: false,
            stylesheet_href: "styles.css".to_string(),
        }
    }
}

/// Both halves of an export.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportBundle {
    pub html: String,
    pub css: String,
}

/// Export markup and stylesheet in one pass over the same page state.
#[must_use]
pub fn export(page: &Page, options: &ExportOptions) -> ExportBundle {
    ExportBundle {
        html: export_html(page, options),
        css: export_css(page, options),
    }
}

// ─── Class names ─────────────────────────────────────────────────────────

/// Export-safe class for an element.
///
/// IDs of the allocator's form `{kind}-{n}` map to `{prefix}-{kind}-{n}`.
/// Any other ID maps to `{prefix}-{kind}--{escaped id}`, where every byte
/// outside `[A-Za-z0-9-]` is written as `_{hex}_`. No kind name contains
/// `--`, so the two forms never meet and distinct IDs get distinct classes.
#[must_use]
pub fn class_name(prefix: &str, id: NodeId, kind: ElementKind) -> String {
    let raw = id.as_str();
    let generated = raw
        .strip_prefix(kind.name())
        .and_then(|tail| tail.strip_prefix('-'))
        .is_some_and(|n| !n.is_empty() && n.bytes().all(|b| b.is_ascii_digit()));
    if generated {
        return format!("{prefix}-{raw}");
    }

    let mut escaped = String::with_capacity(raw.len());
    for c in raw.chars() {
        if c.is_ascii_alphanumeric() || c == '-' {
            escaped.push(c);
        } else {
            let _ = write!(escaped, "_{:x}_", c as u32);
        }
    }
    format!("{prefix}-{}--{escaped}", kind.name())
}

pub(crate) fn element_class(options: &ExportOptions, element: &Element) -> String {
    class_name(&options.class_prefix, element.id, element.kind)
}

// ─── CSS property conversion ─────────────────────────────────────────────

/// Properties whose bare numbers are not lengths.
const UNITLESS: &[&str] = &[
    "opacity",
    "z-index",
    "font-weight",
    "line-height",
    "flex",
    "flex-grow",
    "flex-shrink",
    "order",
    "zoom",
    "column-count",
    "orphans",
    "widows",
    "tab-size",
    "animation-iteration-count",
    "grid-row",
    "grid-column",
    "fill-opacity",
    "stroke-opacity",
];

/// `fontSize` → `font-size`, `WebkitTransform` → `-webkit-transform`,
/// `msTransform` → `-ms-transform`. Already hyphenated names pass through.
#[must_use]
pub fn css_property_name(name: &str) -> String {
    if name.contains('-') {
        return name.to_string();
    }
    let mut out = String::with_capacity(name.len() + 4);
    if name.starts_with("ms") && name[2..].starts_with(|c: char| c.is_ascii_uppercase()) {
        out.push('-');
    }
    for c in name.chars() {
        if c.is_ascii_uppercase() {
            out.push('-');
            out.push(c.to_ascii_lowercase());
        } else {
            out.push(c);
        }
    }
    out
}

/// Append `px` to bare numbers unless the property is unitless.
#[must_use]
pub fn css_value(property: &str, value: &str) -> String {
    let trimmed = value.trim();
    if !UNITLESS.contains(&property) && trimmed.parse::<f64>().is_ok_and(f64::is_finite) {
        format!("{trimmed}px")
    } else {
        trimmed.to_string()
    }
}

/// A declaration is dropped when it could break out of its rule.
pub(crate) fn is_safe_css_value(value: &str) -> bool {
    !value.is_empty()
        && !value.contains(['{', '}', ';', '<'])
        && !value.to_ascii_lowercase().contains("expression(")
}

// ─── HTML sanitization ───────────────────────────────────────────────────

pub(crate) fn escape_text(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            _ => out.push(c),
        }
    }
    out
}

pub(crate) fn escape_attr(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

/// Whether an attribute survives export: valid name, not bookkeeping, not
/// an event handler, no script URL.
pub(crate) fn is_exportable_attribute(name: &str, value: &str) -> bool {
    if !crate::mutations::is_valid_name(name) || crate::model::is_internal_attribute(name) {
        return false;
    }
    if name.len() > 2 && name[..2].eq_ignore_ascii_case("on") {
        return false;
    }
    let compact: String = value
        .chars()
        .filter(|c| !c.is_whitespace() && !c.is_control())
        .collect::<String>()
        .to_ascii_lowercase();
    !compact.starts_with("javascript:") && !compact.starts_with("vbscript:")
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn class_names_use_numeric_suffix() {
        let id = NodeId::intern("list-item-12");
        assert_eq!(class_name("sk", id, ElementKind::ListItem), "sk-list-item-12");
    }

    #[test]
    fn class_names_escape_foreign_ids() {
        let spaced = class_name("sk", NodeId::intern("hero banner"), ElementKind::Section);
        let dashed = class_name("sk", NodeId::intern("hero-banner"), ElementKind::Section);
        assert_eq!(spaced, "sk-section--hero_20_banner");
        assert_eq!(dashed, "sk-section--hero-banner");
        assert_eq!(
            class_name("sk", NodeId::intern("a_b"), ElementKind::Text),
            "sk-text--a_5f_b"
        );
    }

    #[test]
    fn same_suffix_different_prefix_does_not_collide() {
        let generated = class_name("sk", NodeId::intern("container-1"), ElementKind::Container);
        let foreign = class_name("sk", NodeId::intern("hero-1"), ElementKind::Container);
        assert_eq!(generated, "sk-container-1");
        assert_eq!(foreign, "sk-container--hero-1");
        // Kind mismatch also takes the escaped form.
        assert_eq!(
            class_name("sk", NodeId::intern("container-1"), ElementKind::Section),
            "sk-section--container-1"
        );
    }

    #[test]
    fn property_names_are_hyphenated() {
        assert_eq!(css_property_name("fontSize"), "font-size");
        assert_eq!(css_property_name("borderTopLeftRadius"), "border-top-left-radius");
        assert_eq!(css_property_name("WebkitTransform"), "-webkit-transform");
        assert_eq!(css_property_name("msTransform"), "-ms-transform");
        assert_eq!(css_property_name("margin-top"), "margin-top");
        assert_eq!(css_property_name("--brandColor"), "--brandColor");
    }

    #[test]
    fn numbers_get_px_unless_unitless() {
        assert_eq!(css_value("font-size", "32"), "32px");
        assert_eq!(css_value("width", "12.5"), "12.5px");
        assert_eq!(css_value("opacity", "0.5"), "0.5");
        assert_eq!(css_value("z-index", "10"), "10");
        assert_eq!(css_value("padding", "10px 20px"), "10px 20px");
        assert_eq!(css_value("max-width", "100%"), "100%");
    }

    #[test]
    fn attribute_filter() {
        assert!(is_exportable_attribute("href", "/about"));
        assert!(!is_exportable_attribute("onclick", "alert(1)"));
        assert!(!is_exportable_attribute("href", " Java\tScript:alert(1)"));
        assert!(!is_exportable_attribute("data-selected", "true"));
        assert!(!is_exportable_attribute("x y", "1"));
    }

    #[test]
    fn escaping() {
        assert_eq!(escape_text("a < b & c"), "a &lt; b &amp; c");
        assert_eq!(escape_attr("say \"hi\""), "say &quot;hi&quot;");
    }
}
