//! CSS projection: one rule per styled element in document order, then one
//! `@media (max-width)` block per narrower breakpoint.

use super::{ExportOptions, css_property_name, css_value, element_class, is_safe_css_value};
use crate::model::StyleMap;
use crate::mutations::is_valid_name;
use crate::overlay::Breakpoint;
use crate::page::Page;
use std::fmt::Write;

/// Render the page's stylesheet. Desktop overrides are folded into the base
/// rules; tablet and mobile overrides go into media blocks, widest first.
#[must_use]
pub fn export_css(page: &Page, options: &ExportOptions) -> String {
    let doc = page.document();
    let order = doc.walk();
    let mut blocks: Vec<String> = Vec::new();

    for &id in &order {
        let (Some(element), Ok(styles)) = (doc.get(id), page.resolve_styles(id, Breakpoint::Desktop))
        else {
            continue;
        };
        let selector = element_class(options, element);
        if let Some(rule) = rule(&selector, &styles, &options.indent, 0) {
            blocks.push(rule);
        }
    }

    for breakpoint in [Breakpoint::Tablet, Breakpoint::Mobile] {
        let Some(width) = breakpoint.max_width() else {
            continue;
        };
        let rules: Vec<String> = order
            .iter()
            .filter_map(|&id| {
                let element = doc.get(id)?;
                let overrides = page.overlay().get(id, breakpoint)?;
                rule(&element_class(options, element), overrides, &options.indent, 1)
            })
            .collect();
        if rules.is_empty() {
            continue;
        }
        let mut block = format!("@media (max-width: {width}px) {{\n");
        block.push_str(&rules.join("\n"));
        block.push_str("}\n");
        blocks.push(block);
    }

    blocks.join("\n")
}

/// `None` when no declaration survives sanitization.
fn rule(class: &str, styles: &StyleMap, indent: &str, depth: usize) -> Option<String> {
    let outer = indent.repeat(depth);
    let inner = indent.repeat(depth + 1);
    let mut body = String::new();
    for (name, value) in styles {
        let property = css_property_name(name);
        if !is_valid_name(&property) || !is_safe_css_value(value.trim()) {
            log::trace!("skipping unsafe declaration {name}: {value}");
            continue;
        }
        let _ = writeln!(body, "{inner}{property}: {};", css_value(&property, value));
    }
    if body.is_empty() {
        return None;
    }
    Some(format!("{outer}.{class} {{\n{body}{outer}}}\n"))
}
