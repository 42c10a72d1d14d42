//! Element records and the closed set of element kinds.
//!
//! Elements live in a flat ID-keyed table owned by [`Document`](crate::Document);
//! parent and children references are IDs, never pointers.

use crate::error::EditError;
use crate::id::NodeId;
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// Style property name → value. Keys use the internal camelCase form
/// (`fontSize`), converted to hyphenated CSS on export.
pub type StyleMap = BTreeMap<String, String>;

/// Attribute name → value. Names are stored lowercased, matching how HTML
/// treats them.
pub type AttributeMap = BTreeMap<String, String>;

/// Attributes used by the editor surface for bookkeeping. Never stored on
/// elements and never exported.
pub const INTERNAL_ATTRIBUTES: &[&str] = &[
    "data-element-id",
    "data-element-type",
    "data-selected",
    "draggable",
    "contenteditable",
];

pub fn is_internal_attribute(name: &str) -> bool {
    INTERNAL_ATTRIBUTES
        .iter()
        .any(|k| k.eq_ignore_ascii_case(name))
}

// ─── Element Kinds ───────────────────────────────────────────────────────

/// The kinds of element a user can place on the canvas.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ElementKind {
    Container,
    Section,
    Header,
    Footer,
    Nav,
    Heading,
    Paragraph,
    Text,
    Link,
    Button,
    Image,
    Video,
    Input,
    Textarea,
    Select,
    Form,
    Label,
    List,
    ListItem,
    Divider,
    LineBreak,
    /// Synthetic wrapper created by grouping.
    Group,
}

impl ElementKind {
    pub const ALL: [ElementKind; 22] = [
        ElementKind::Container,
        ElementKind::Section,
        ElementKind::Header,
        ElementKind::Footer,
        ElementKind::Nav,
        ElementKind::Heading,
        ElementKind::Paragraph,
        ElementKind::Text,
        ElementKind::Link,
        ElementKind::Button,
        ElementKind::Image,
        ElementKind::Video,
        ElementKind::Input,
        ElementKind::Textarea,
        ElementKind::Select,
        ElementKind::Form,
        ElementKind::Label,
        ElementKind::List,
        ElementKind::ListItem,
        ElementKind::Divider,
        ElementKind::LineBreak,
        ElementKind::Group,
    ];

    /// Kebab-case name; also the prefix of generated IDs.
    pub const fn name(self) -> &'static str {
        match self {
            ElementKind::Container => "container",
            ElementKind::Section => "section",
            ElementKind::Header => "header",
            ElementKind::Footer => "footer",
            ElementKind::Nav => "nav",
            ElementKind::Heading => "heading",
            ElementKind::Paragraph => "paragraph",
            ElementKind::Text => "text",
            ElementKind::Link => "link",
            ElementKind::Button => "button",
            ElementKind::Image => "image",
            ElementKind::Video => "video",
            ElementKind::Input => "input",
            ElementKind::Textarea => "textarea",
            ElementKind::Select => "select",
            ElementKind::Form => "form",
            ElementKind::Label => "label",
            ElementKind::List => "list",
            ElementKind::ListItem => "list-item",
            ElementKind::Divider => "divider",
            ElementKind::LineBreak => "line-break",
            ElementKind::Group => "group",
        }
    }

    /// HTML tag emitted on export.
    pub const fn tag_name(self) -> &'static str {
        match self {
            ElementKind::Container | ElementKind::Group => "div",
            ElementKind::Section => "section",
            ElementKind::Header => "header",
            ElementKind::Footer => "footer",
            ElementKind::Nav => "nav",
            ElementKind::Heading => "h2",
            ElementKind::Paragraph => "p",
            ElementKind::Text => "span",
            ElementKind::Link => "a",
            ElementKind::Button => "button",
            ElementKind::Image => "img",
            ElementKind::Video => "video",
            ElementKind::Input => "input",
            ElementKind::Textarea => "textarea",
            ElementKind::Select => "select",
            ElementKind::Form => "form",
            ElementKind::Label => "label",
            ElementKind::List => "ul",
            ElementKind::ListItem => "li",
            ElementKind::Divider => "hr",
            ElementKind::LineBreak => "br",
        }
    }

    /// Void elements: never receive children or inner content.
    pub const fn is_self_closing(self) -> bool {
        matches!(
            self,
            ElementKind::Image | ElementKind::Input | ElementKind::Divider | ElementKind::LineBreak
        )
    }

    pub const fn accepts_children(self) -> bool {
        !self.is_self_closing()
    }

    pub fn default_content(self) -> Option<&'static str> {
        match self {
            ElementKind::Heading => Some("Heading"),
            ElementKind::Paragraph => Some("Paragraph text"),
            ElementKind::Text => Some("Text"),
            ElementKind::Link => Some("Link"),
            ElementKind::Button => Some("Button"),
            ElementKind::Label => Some("Label"),
            ElementKind::ListItem => Some("List item"),
            _ => None,
        }
    }

    pub fn default_styles(self) -> StyleMap {
        let pairs: &[(&str, &str)] = match self {
            ElementKind::Container | ElementKind::Section => {
                &[("padding", "20"), ("minHeight", "100")]
            }
            ElementKind::Header | ElementKind::Footer => &[("padding", "20")],
            ElementKind::Nav => &[("display", "flex"), ("gap", "16")],
            ElementKind::Heading => &[("fontSize", "32"), ("fontWeight", "700")],
            ElementKind::Paragraph => &[("fontSize", "16"), ("lineHeight", "1.5")],
            ElementKind::Button => &[
                ("padding", "10px 20px"),
                ("borderRadius", "4"),
                ("cursor", "pointer"),
            ],
            ElementKind::Image | ElementKind::Video => &[("maxWidth", "100%")],
            ElementKind::Input | ElementKind::Textarea | ElementKind::Select => {
                &[("padding", "8"), ("borderRadius", "4")]
            }
            ElementKind::Form => &[("display", "flex"), ("flexDirection", "column")],
            ElementKind::Divider => &[("margin", "16px 0")],
            _ => &[],
        };
        pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect()
    }

    pub fn default_attributes(self) -> AttributeMap {
        let pairs: &[(&str, &str)] = match self {
            ElementKind::Link => &[("href", "#")],
            ElementKind::Image => &[("src", "placeholder.png"), ("alt", "Image")],
            ElementKind::Video => &[("controls", "")],
            ElementKind::Input => &[("type", "text"), ("placeholder", "Enter text")],
            ElementKind::Textarea => &[("placeholder", "Enter text")],
            ElementKind::Button => &[("type", "button")],
            _ => &[],
        };
        pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect()
    }

    /// Best-effort mapping from an HTML tag back to a kind.
    pub fn from_tag(tag: &str) -> Option<Self> {
        let kind = match tag.to_ascii_lowercase().as_str() {
            "div" => ElementKind::Container,
            "section" | "main" | "article" | "aside" => ElementKind::Section,
            "header" => ElementKind::Header,
            "footer" => ElementKind::Footer,
            "nav" => ElementKind::Nav,
            "h1" | "h2" | "h3" | "h4" | "h5" | "h6" => ElementKind::Heading,
            "p" => ElementKind::Paragraph,
            "span" | "strong" | "em" | "small" => ElementKind::Text,
            "a" => ElementKind::Link,
            "button" => ElementKind::Button,
            "img" => ElementKind::Image,
            "video" => ElementKind::Video,
            "input" => ElementKind::Input,
            "textarea" => ElementKind::Textarea,
            "select" => ElementKind::Select,
            "form" => ElementKind::Form,
            "label" => ElementKind::Label,
            "ul" | "ol" => ElementKind::List,
            "li" => ElementKind::ListItem,
            "hr" => ElementKind::Divider,
            "br" => ElementKind::LineBreak,
            _ => return None,
        };
        Some(kind)
    }
}

impl fmt::Display for ElementKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for ElementKind {
    type Err = EditError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ElementKind::ALL
            .into_iter()
            .find(|k| k.name() == s)
            .ok_or_else(|| EditError::invalid(format!("unknown element type `{s}`")))
    }
}

// ─── Elements ────────────────────────────────────────────────────────────

/// Initial properties for a new element, layered over the kind's defaults.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NodeInit {
    pub content: Option<String>,
    pub styles: StyleMap,
    pub attributes: AttributeMap,
}

/// One placed element.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Element {
    pub id: NodeId,

    #[serde(rename = "type")]
    pub kind: ElementKind,

    /// Leaf text payload. Ignored structurally once the element has children.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,

    /// Base (desktop) styles.
    #[serde(default)]
    pub styles: StyleMap,

    #[serde(default)]
    pub attributes: AttributeMap,

    /// Child IDs in document order.
    #[serde(default)]
    pub children: SmallVec<[NodeId; 4]>,

    #[serde(default)]
    pub parent: Option<NodeId>,
}

impl Element {
    /// A detached element with the kind's defaults overlaid by `init`.
    pub fn new(id: NodeId, kind: ElementKind, init: NodeInit) -> Self {
        let mut styles = kind.default_styles();
        styles.extend(init.styles);

        let mut attributes = kind.default_attributes();
        attributes.extend(
            init.attributes
                .into_iter()
                .map(|(name, value)| (name.to_ascii_lowercase(), value)),
        );
        attributes.retain(|k, _| !is_internal_attribute(k));

        let content = if kind.is_self_closing() {
            None
        } else {
            init.content
                .or_else(|| kind.default_content().map(str::to_string))
        };

        Self {
            id,
            kind,
            content,
            styles,
            attributes,
            children: SmallVec::new(),
            parent: None,
        }
    }

    pub fn has_children(&self) -> bool {
        !self.children.is_empty()
    }

    /// Content that export should emit: none for void elements.
    pub fn export_content(&self) -> Option<&str> {
        if self.kind.is_self_closing() {
            return None;
        }
        self.content.as_deref().filter(|c| !c.is_empty())
    }
}

// ─── Geometry ────────────────────────────────────────────────────────────

/// Bounding box reported by the render layer, in canvas pixels.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Bounds {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl Bounds {
    pub const fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn right(&self) -> f32 {
        self.x + self.width
    }

    pub fn bottom(&self) -> f32 {
        self.y + self.height
    }

    pub fn center(&self) -> (f32, f32) {
        (self.x + self.width / 2.0, self.y + self.height / 2.0)
    }
}
