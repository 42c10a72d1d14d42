//! Re-import of exported HTML (and its stylesheet) into a fresh [`Page`].
//!
//! Built on `winnow` 0.7. Understands the dialect the exporter writes:
//! elements with quoted attributes, text, void tags, comments, and the
//! doctype/html/head/body wrapper. Kinds are recovered from the generated
//! class name, falling back to the tag. Every element gets a fresh ID.

use crate::error::{EditError, EditResult};
use crate::id::NodeId;
use crate::model::{AttributeMap, Element, ElementKind, NodeInit, StyleMap};
use crate::overlay::Breakpoint;
use crate::page::Page;
use std::collections::HashMap;
use winnow::combinator::{alt, delimited, opt};
use winnow::error::{ContextError, ErrMode};
use winnow::prelude::*;
use winnow::token::{take_till, take_until, take_while};

/// Parse exported HTML. A `<style>` block in the document, if any, is
/// applied as the stylesheet.
///
/// # Errors
/// `CorruptData` when the markup cannot be parsed or rebuilds into an
/// invalid tree.
pub fn parse_html(input: &str) -> EditResult<Page> {
    parse_html_with_prefix(input, "sk")
}

/// Like [`parse_html`] with a custom generated-class prefix.
///
/// # Errors
/// `CorruptData` on unparsable input.
pub fn parse_html_with_prefix(input: &str, prefix: &str) -> EditResult<Page> {
    let imported = parse_markup(input, prefix)?;
    finish(imported, None)
}

/// Parse exported HTML together with a separately exported stylesheet.
///
/// # Errors
/// `CorruptData` on unparsable markup or CSS.
pub fn parse_site(html: &str, css: &str, prefix: &str) -> EditResult<Page> {
    let imported = parse_markup(html, prefix)?;
    finish(imported, Some(css))
}

fn finish(mut imported: Imported, extra_css: Option<&str>) -> EditResult<Page> {
    let sheets: Vec<String> = std::mem::take(&mut imported.stylesheets)
        .into_iter()
        .chain(extra_css.map(str::to_string))
        .collect();
    for sheet in &sheets {
        let rules = parse_stylesheet(sheet)?;
        imported.apply_rules(rules);
    }
    imported.page.document.check_invariants().map_err(|e| {
        EditError::corrupt(format!("imported tree is inconsistent: {e}"))
    })?;
    log::debug!("imported {} elements", imported.page.document.len());
    Ok(imported.page)
}

// ─── Tree builder ────────────────────────────────────────────────────────

/// Wrapper tags whose children are lifted into the enclosing level.
const TRANSPARENT: &[&str] = &["html", "head", "body", "main"];

/// Tags whose contents are raw text up to the matching close tag.
const RAW_TEXT: &[&str] = &["style", "script", "title"];

/// HTML void tags that never get a close tag.
const VOID: &[&str] = &["meta", "link", "img", "input", "hr", "br", "source", "wbr"];

#[derive(Debug)]
struct Frame {
    tag: String,
    element: Option<NodeId>,
}

struct Imported {
    page: Page,
    prefix: String,
    stack: Vec<Frame>,
    classes: HashMap<String, NodeId>,
    stylesheets: Vec<String>,
}

impl Imported {
    fn new(prefix: &str) -> Self {
        Self {
            page: Page::new(),
            prefix: prefix.to_string(),
            stack: Vec::new(),
            classes: HashMap::new(),
            stylesheets: Vec::new(),
        }
    }

    fn current_parent(&self) -> Option<NodeId> {
        self.stack.iter().rev().find_map(|f| f.element)
    }

    fn open(&mut self, tag: ParsedTag) {
        if TRANSPARENT.contains(&tag.name.as_str()) {
            self.stack.push(Frame {
                tag: tag.name,
                element: None,
            });
            return;
        }

        let mut generated = None;
        let mut extra_classes = Vec::new();
        let mut attributes = AttributeMap::new();
        for (name, value) in tag.attrs {
            if name == "class" {
                for token in value.split_whitespace() {
                    if generated.is_none()
                        && let Some(kind) = self.kind_from_class(token)
                    {
                        generated = Some((kind, token.to_string()));
                    } else {
                        extra_classes.push(token.to_string());
                    }
                }
            } else {
                attributes.insert(name, value);
            }
        }
        if !extra_classes.is_empty() {
            attributes.insert("class".into(), extra_classes.join(" "));
        }

        let kind = generated
            .as_ref()
            .map(|(kind, _)| *kind)
            .or_else(|| ElementKind::from_tag(&tag.name));
        let Some(kind) = kind else {
            if !VOID.contains(&tag.name.as_str()) && !tag.self_closing {
                log::debug!("lifting children of unknown <{}>", tag.name);
                self.stack.push(Frame {
                    tag: tag.name,
                    element: None,
                });
            }
            return;
        };

        let parent = self.current_parent();
        let doc = &mut self.page.document;
        let id = doc.allocate_id(kind);
        let mut element = Element::new(id, kind, NodeInit::default());
        element.content = None;
        element.styles = StyleMap::new();
        element.attributes = attributes;
        element
            .attributes
            .retain(|k, _| !crate::model::is_internal_attribute(k));
        doc.insert_record(element);
        doc.link(id, parent, usize::MAX);
        if let Some((_, class)) = generated {
            self.classes.insert(class, id);
        }

        let is_void = kind.is_self_closing() || VOID.contains(&tag.name.as_str());
        if !is_void && !tag.self_closing {
            self.stack.push(Frame {
                tag: tag.name,
                element: Some(id),
            });
        }
    }

    fn close(&mut self, tag: &str) {
        match self.stack.iter().rposition(|f| f.tag == tag) {
            Some(at) => self.stack.truncate(at),
            None => log::trace!("ignoring stray </{tag}>"),
        }
    }

    fn text(&mut self, raw: &str) {
        let text = collapse_whitespace(&unescape(raw));
        if text.is_empty() {
            return;
        }
        let Some(top) = self.stack.last().and_then(|f| f.element) else {
            log::trace!("dropping text outside any element");
            return;
        };
        if let Some(element) = self.page.document.get_mut(top) {
            match &mut element.content {
                Some(existing) => {
                    existing.push(' ');
                    existing.push_str(&text);
                }
                None => element.content = Some(text),
            }
        }
    }

    /// `sk-list-item-12` → `ListItem`; the longest kind name wins.
    fn kind_from_class(&self, class: &str) -> Option<ElementKind> {
        let rest = class.strip_prefix(self.prefix.as_str())?.strip_prefix('-')?;
        ElementKind::ALL
            .into_iter()
            .filter(|kind| {
                rest.strip_prefix(kind.name())
                    .and_then(|tail| tail.strip_prefix('-'))
                    .is_some_and(|tail| match tail.strip_prefix('-') {
                        Some(escaped) => !escaped.is_empty(),
                        None => !tail.is_empty() && tail.bytes().all(|b| b.is_ascii_digit()),
                    })
            })
            .max_by_key(|kind| kind.name().len())
    }

    fn apply_rules(&mut self, rules: Vec<CssRule>) {
        for rule in rules {
            let Some(&id) = self.classes.get(&rule.class) else {
                log::debug!("no element for .{}", rule.class);
                continue;
            };
            match rule.breakpoint {
                Breakpoint::Desktop => {
                    if let Some(element) = self.page.document.get_mut(id) {
                        element.styles.extend(rule.declarations);
                    }
                }
                bp => self
                    .page
                    .responsive_styles
                    .set_override(id, bp, rule.declarations),
            }
        }
    }
}

fn parse_markup(input: &str, prefix: &str) -> EditResult<Imported> {
    let mut imported = Imported::new(prefix);
    let mut rest = input;

    loop {
        if rest.is_empty() {
            break;
        }
        if rest.starts_with("<!--") {
            parse_comment
                .parse_next(&mut rest)
                .map_err(|e| EditError::corrupt(format!("comment parse error: {e}")))?;
        } else if rest.starts_with("<!") {
            parse_declaration
                .parse_next(&mut rest)
                .map_err(|e| EditError::corrupt(format!("doctype parse error: {e}")))?;
        } else if rest.starts_with("</") {
            let tag = parse_close_tag
                .parse_next(&mut rest)
                .map_err(|e| EditError::corrupt(format!("close tag parse error: {e}")))?;
            imported.close(&tag);
        } else if rest.starts_with('<') {
            let tag = parse_open_tag
                .parse_next(&mut rest)
                .map_err(|e| EditError::corrupt(format!("tag parse error: {e}")))?;
            if RAW_TEXT.contains(&tag.name.as_str()) && !tag.self_closing {
                let body = take_raw_text(&mut rest, &tag.name)?;
                if tag.name == "style" {
                    imported.stylesheets.push(body.to_string());
                }
            } else {
                imported.open(tag);
            }
        } else {
            let text: &str = take_till::<_, _, ContextError>(1.., '<')
                .parse_next(&mut rest)
                .map_err(|e| EditError::corrupt(format!("text parse error: {e}")))?;
            imported.text(text);
        }
    }
    Ok(imported)
}

// ─── Markup parsers ──────────────────────────────────────────────────────

#[derive(Debug, PartialEq)]
struct ParsedTag {
    name: String,
    attrs: Vec<(String, String)>,
    self_closing: bool,
}

fn skip_space(input: &mut &str) {
    *input = input.trim_start();
}

fn parse_tag_name(input: &mut &str) -> ModalResult<String> {
    take_while(1.., |c: char| c.is_ascii_alphanumeric() || c == '-')
        .map(|s: &str| s.to_ascii_lowercase())
        .parse_next(input)
}

fn parse_comment(input: &mut &str) -> ModalResult<()> {
    let _ = "<!--".parse_next(input)?;
    let _ = take_until(0.., "-->").parse_next(input)?;
    let _ = "-->".parse_next(input)?;
    Ok(())
}

fn parse_declaration(input: &mut &str) -> ModalResult<()> {
    let _ = "<!".parse_next(input)?;
    let _ = take_till(0.., '>').parse_next(input)?;
    let _ = '>'.parse_next(input)?;
    Ok(())
}

fn parse_close_tag(input: &mut &str) -> ModalResult<String> {
    let _ = "</".parse_next(input)?;
    let name = parse_tag_name.parse_next(input)?;
    skip_space(input);
    let _ = '>'.parse_next(input)?;
    Ok(name)
}

fn parse_open_tag(input: &mut &str) -> ModalResult<ParsedTag> {
    let _ = '<'.parse_next(input)?;
    let name = parse_tag_name.parse_next(input)?;
    let mut attrs = Vec::new();
    loop {
        skip_space(input);
        if input.starts_with('>') || input.starts_with("/>") {
            break;
        }
        attrs.push(parse_attribute.parse_next(input)?);
    }
    let self_closing = opt('/').parse_next(input)?.is_some();
    let _ = '>'.parse_next(input)?;
    Ok(ParsedTag {
        name,
        attrs,
        self_closing,
    })
}

fn parse_attribute(input: &mut &str) -> ModalResult<(String, String)> {
    let name: &str = take_while(1.., |c: char| {
        c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | ':' | '.')
    })
    .parse_next(input)?;
    let checkpoint = *input;
    skip_space(input);
    if !input.starts_with('=') {
        *input = checkpoint;
        return Ok((name.to_ascii_lowercase(), String::new()));
    }
    let _ = '='.parse_next(input)?;
    skip_space(input);
    let value = parse_attribute_value.parse_next(input)?;
    Ok((name.to_ascii_lowercase(), unescape(value)))
}

fn parse_attribute_value<'a>(input: &mut &'a str) -> ModalResult<&'a str> {
    alt((
        delimited('"', take_till(0.., '"'), '"'),
        delimited('\'', take_till(0.., '\''), '\''),
        take_till(1.., |c: char| c.is_whitespace() || c == '>'),
    ))
    .parse_next(input)
}

/// Contents of a raw-text element up to `</tag>`; consumes the close tag.
fn take_raw_text<'a>(input: &mut &'a str, tag: &str) -> EditResult<&'a str> {
    let close = format!("</{tag}");
    let Some(end) = input.to_ascii_lowercase().find(&close) else {
        return Err(EditError::corrupt(format!("unterminated <{tag}>")));
    };
    let body = &input[..end];
    *input = &input[end..];
    parse_close_tag
        .parse_next(input)
        .map_err(|e| EditError::corrupt(format!("close tag parse error: {e}")))?;
    Ok(body)
}

fn collapse_whitespace(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Decode the entities the exporter writes plus numeric references.
fn unescape(s: &str) -> String {
    if !s.contains('&') {
        return s.to_string();
    }
    let mut out = String::with_capacity(s.len());
    let mut rest = s;
    while let Some(at) = rest.find('&') {
        out.push_str(&rest[..at]);
        rest = &rest[at..];
        let decoded = rest.find(';').and_then(|end| {
            let entity = &rest[1..end];
            let c = match entity {
                "amp" => Some('&'),
                "lt" => Some('<'),
                "gt" => Some('>'),
                "quot" => Some('"'),
                "apos" => Some('\''),
                "nbsp" => Some('\u{a0}'),
                _ => entity
                    .strip_prefix("#x")
                    .or_else(|| entity.strip_prefix("#X"))
                    .and_then(|hex| u32::from_str_radix(hex, 16).ok())
                    .or_else(|| entity.strip_prefix('#').and_then(|d| d.parse().ok()))
                    .and_then(char::from_u32),
            };
            c.map(|c| (c, end + 1))
        });
        match decoded {
            Some((c, len)) => {
                out.push(c);
                rest = &rest[len..];
            }
            None => {
                out.push('&');
                rest = &rest[1..];
            }
        }
    }
    out.push_str(rest);
    out
}

// ─── Stylesheet parser ───────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq)]
struct CssRule {
    class: String,
    breakpoint: Breakpoint,
    declarations: StyleMap,
}

fn parse_stylesheet(input: &str) -> EditResult<Vec<CssRule>> {
    let mut rules = Vec::new();
    let mut rest = input;
    skip_css_space(&mut rest);
    while !rest.is_empty() {
        if rest.starts_with("@media") {
            let (breakpoint, inner) = parse_media_block
                .parse_next(&mut rest)
                .map_err(|e| EditError::corrupt(format!("media block parse error: {e}")))?;
            match breakpoint {
                Some(bp) => rules.extend(inner.into_iter().map(|mut r| {
                    r.breakpoint = bp;
                    r
                })),
                None => log::warn!("skipping media block with an unknown width"),
            }
        } else {
            let rule = parse_css_rule
                .parse_next(&mut rest)
                .map_err(|e| EditError::corrupt(format!("css rule parse error: {e}")))?;
            rules.extend(rule);
        }
        skip_css_space(&mut rest);
    }
    Ok(rules)
}

fn skip_css_space(input: &mut &str) {
    loop {
        let before = *input;
        *input = input.trim_start();
        if let Some(after) = input.strip_prefix("/*") {
            *input = after.find("*/").map_or("", |end| &after[end + 2..]);
        }
        if *input == before {
            break;
        }
    }
}

/// `.class { prop: value; }`. Rules with any other selector are skipped
/// and yield `None`.
fn parse_css_rule(input: &mut &str) -> ModalResult<Option<CssRule>> {
    let selector: &str = take_till(1.., '{').parse_next(input)?;
    let _ = '{'.parse_next(input)?;
    let mut declarations = StyleMap::new();
    loop {
        skip_css_space(input);
        if input.starts_with('}') {
            break;
        }
        let (name, value) = parse_declaration_pair.parse_next(input)?;
        if !value.is_empty() {
            declarations.insert(camel_case_property(name), value.to_string());
        }
    }
    let _ = '}'.parse_next(input)?;

    let selector = selector.trim();
    let Some(class) = selector.strip_prefix('.') else {
        return Ok(None);
    };
    if class.contains(|c: char| c.is_whitespace() || matches!(c, '.' | ',' | ':' | '>')) {
        return Ok(None);
    }
    Ok(Some(CssRule {
        class: class.to_string(),
        breakpoint: Breakpoint::Desktop,
        declarations,
    }))
}

fn parse_declaration_pair<'a>(input: &mut &'a str) -> ModalResult<(&'a str, &'a str)> {
    let name: &str = take_till(1.., |c: char| c == ':' || c == '}' || c == ';').parse_next(input)?;
    let _ = ':'.parse_next(input)?;
    let value: &str = take_till(0.., |c: char| c == ';' || c == '}').parse_next(input)?;
    if input.starts_with(';') {
        *input = &input[1..];
    }
    Ok((name.trim(), value.trim()))
}

fn parse_media_block(input: &mut &str) -> ModalResult<(Option<Breakpoint>, Vec<CssRule>)> {
    let _ = "@media".parse_next(input)?;
    skip_space(input);
    let _ = '('.parse_next(input)?;
    skip_space(input);
    let _ = "max-width".parse_next(input)?;
    skip_space(input);
    let _ = ':'.parse_next(input)?;
    skip_space(input);
    let digits: &str = take_while(1.., |c: char| c.is_ascii_digit()).parse_next(input)?;
    let width: u32 = digits
        .parse()
        .map_err(|_| ErrMode::Backtrack(ContextError::new()))?;
    let _ = "px".parse_next(input)?;
    skip_space(input);
    let _ = ')'.parse_next(input)?;
    skip_space(input);
    let _ = '{'.parse_next(input)?;

    let mut rules = Vec::new();
    loop {
        skip_css_space(input);
        if input.starts_with('}') {
            break;
        }
        rules.extend(parse_css_rule.parse_next(input)?);
    }
    let _ = '}'.parse_next(input)?;

    let breakpoint = Breakpoint::ALL
        .into_iter()
        .find(|bp| bp.max_width() == Some(width));
    Ok((breakpoint, rules))
}

/// `font-size` → `fontSize`, `-webkit-transform` → `WebkitTransform`,
/// `-ms-transform` → `msTransform`. Custom properties keep their name.
fn camel_case_property(name: &str) -> String {
    if name.starts_with("--") {
        return name.to_string();
    }
    let (mut out, body) = match name.strip_prefix("-ms-") {
        Some(body) => (String::from("ms-"), body),
        None => (String::new(), name),
    };
    out.push_str(body);
    let mut camel = String::with_capacity(out.len());
    let mut upper = false;
    for (i, c) in out.chars().enumerate() {
        if c == '-' {
            upper = i > 0 || name.starts_with('-');
            continue;
        }
        if upper {
            camel.push(c.to_ascii_uppercase());
            upper = false;
        } else {
            camel.push(c);
        }
    }
    camel
}
