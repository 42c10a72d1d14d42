//! HTML projection.

use super::{ExportOptions, element_class, escape_attr, escape_text, is_exportable_attribute};
use crate::document::Document;
use crate::id::NodeId;
use crate::model::Element;
use crate::page::Page;

struct Context<'a> {
    options: &'a ExportOptions,
    depth: usize,
    buffer: String,
}

impl<'a> Context<'a> {
    fn new(options: &'a ExportOptions) -> Self {
        Self {
            options,
            depth: 0,
            buffer: String::with_capacity(1024),
        }
    }

    fn add_line(&mut self, text: &str) {
        for _ in 0..self.depth {
            self.buffer.push_str(&self.options.indent);
        }
        self.buffer.push_str(text);
        self.buffer.push('\n');
    }

    fn indent(&mut self) {
        self.depth += 1;
    }

    fn dedent(&mut self) {
        self.depth = self.depth.saturating_sub(1);
    }
}

/// Render the page as HTML. With `full_document` the markup is wrapped in a
/// complete document that links (or inlines) the stylesheet.
#[must_use]
pub fn export_html(page: &Page, options: &ExportOptions) -> String {
    let mut ctx = Context::new(options);
    let doc = page.document();

    if !options.full_document {
        emit_roots(&mut ctx, doc);
        return ctx.buffer;
    }

    ctx.add_line("<!DOCTYPE html>");
    ctx.add_line("<html lang=\"en\">");
    ctx.indent();
    ctx.add_line("<head>");
    ctx.indent();
    ctx.add_line("<meta charset=\"UTF-8\">");
    ctx.add_line("<meta name=\"viewport\" content=\"width=device-width, initial-scale=1.0\">");
    ctx.add_line(&format!("<title>{}</title>", escape_text(&options.title)));
    if options.inline_css {
        let css = super::export_css(page, options);
        ctx.add_line("<style>");
        ctx.indent();
        for line in css.lines() {
            if line.is_empty() {
                ctx.buffer.push('\n');
            } else {
                ctx.add_line(line);
            }
        }
        ctx.dedent();
        ctx.add_line("</style>");
    } else {
        ctx.add_line(&format!(
            "<link rel=\"stylesheet\" href=\"{}\">",
            escape_attr(&options.stylesheet_href)
        ));
    }
    ctx.dedent();
    ctx.add_line("</head>");
    ctx.add_line("<body>");
    ctx.indent();
    emit_roots(&mut ctx, doc);
    ctx.dedent();
    ctx.add_line("</body>");
    ctx.dedent();
    ctx.add_line("</html>");
    ctx.buffer
}

fn emit_roots(ctx: &mut Context<'_>, doc: &Document) {
    for &root in doc.root_elements() {
        emit_element(ctx, doc, root);
    }
}

fn emit_element(ctx: &mut Context<'_>, doc: &Document, id: NodeId) {
    let Some(element) = doc.get(id) else {
        return;
    };
    let tag = element.kind.tag_name();
    let open = open_tag(ctx.options, element);

    if element.kind.is_self_closing() {
        ctx.add_line(&open);
        return;
    }

    let content = element.export_content().map(escape_text);
    let children = doc.children(id);
    if children.is_empty() {
        ctx.add_line(&format!("{open}{}</{tag}>", content.unwrap_or_default()));
        return;
    }

    // Content is emitted as a leading text node, then the children.
    ctx.add_line(&open);
    ctx.indent();
    if let Some(text) = content {
        ctx.add_line(&text);
    }
    for &child in children {
        emit_element(ctx, doc, child);
    }
    ctx.dedent();
    ctx.add_line(&format!("</{tag}>"));
}

fn open_tag(options: &ExportOptions, element: &Element) -> String {
    let mut class = element_class(options, element);
    if let Some(extra) = element.attributes.get("class")
        && !extra.trim().is_empty()
    {
        class.push(' ');
        class.push_str(extra.trim());
    }

    let mut out = format!("<{} class=\"{}\"", element.kind.tag_name(), escape_attr(&class));
    let mut written: Vec<String> = Vec::new();
    for (name, value) in &element.attributes {
        let name = name.to_ascii_lowercase();
        if name == "class" || !is_exportable_attribute(&name, value) || written.contains(&name) {
            continue;
        }
        out.push(' ');
        out.push_str(&name);
        out.push_str("=\"");
        out.push_str(&escape_attr(value));
        out.push('"');
        written.push(name);
    }
    out.push('>');
    out
}
