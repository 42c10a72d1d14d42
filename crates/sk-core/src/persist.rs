//! Project files: the page plus project metadata as camelCase JSON.
//!
//! Loading is all-or-nothing: the text is shape-checked, deserialized and
//! verified against the tree invariants before a [`Page`] is handed back.

use crate::document::Document;
use crate::error::{EditError, EditResult};
use crate::id::NodeId;
use crate::model::Element;
use crate::overlay::StyleOverlay;
use crate::page::Page;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::{BTreeMap, HashMap};

/// Format version written by [`save_project`].
pub const PROJECT_VERSION: &str = "1.0";

/// Top-level fields a project file must carry.
const REQUIRED_FIELDS: &[&str] = &[
    "id",
    "name",
    "version",
    "created",
    "modified",
    "elements",
    "rootElements",
];

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectMeta {
    pub id: String,
    pub name: String,
    pub version: String,
    pub created: DateTime<Utc>,
    pub modified: DateTime<Utc>,
}

impl ProjectMeta {
    pub fn new(name: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: format!("project-{}", now.timestamp_millis()),
            name: name.into(),
            version: PROJECT_VERSION.to_string(),
            created: now,
            modified: now,
        }
    }

    pub fn touch(&mut self) {
        self.modified = Utc::now();
    }
}

/// A successfully loaded project.
#[derive(Debug, Clone, PartialEq)]
pub struct LoadedProject {
    pub meta: ProjectMeta,
    pub page: Page,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ProjectFileRef<'a> {
    #[serde(flatten)]
    meta: &'a ProjectMeta,
    elements: BTreeMap<NodeId, &'a Element>,
    root_elements: &'a [NodeId],
    next_element_id: u64,
    responsive_styles: &'a StyleOverlay,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ProjectFile {
    #[serde(flatten)]
    meta: ProjectMeta,
    elements: HashMap<String, Element>,
    root_elements: Vec<NodeId>,
    #[serde(default)]
    next_element_id: u64,
    #[serde(default)]
    responsive_styles: StyleOverlay,
}

/// Serialize `page` with `meta`. Elements are written in ID order so saves
/// of the same page are byte-identical.
///
/// # Errors
/// `CapacityExceeded` when the output is larger than `limit` bytes;
/// nothing is returned in that case.
pub fn save_project(page: &Page, meta: &ProjectMeta, limit: usize) -> EditResult<String> {
    let doc = page.document();
    let file = ProjectFileRef {
        meta,
        elements: doc.elements().map(|e| (e.id, e)).collect(),
        root_elements: doc.root_elements(),
        next_element_id: doc.next_element_id(),
        responsive_styles: page.overlay(),
    };
    let text = serde_json::to_string_pretty(&file)
        .map_err(|e| EditError::corrupt(format!("cannot serialize project: {e}")))?;
    if text.len() > limit {
        log::warn!("project save blocked: {} bytes over limit {limit}", text.len());
        return Err(EditError::CapacityExceeded {
            size: text.len(),
            limit,
        });
    }
    Ok(text)
}

/// Parse and validate a project file.
///
/// # Errors
/// `CorruptData` for unparsable JSON, missing or mistyped top-level fields,
/// element keys that disagree with their IDs, or tree invariant violations.
pub fn load_project(text: &str) -> EditResult<LoadedProject> {
    let value: Value = serde_json::from_str(text)
        .map_err(|e| EditError::corrupt(format!("invalid JSON: {e}")))?;
    check_shape(&value)?;

    let file: ProjectFile = serde_json::from_value(value)
        .map_err(|e| EditError::corrupt(format!("invalid project: {e}")))?;

    for (key, element) in &file.elements {
        if key != element.id.as_str() {
            return Err(EditError::corrupt(format!(
                "element stored under `{key}` has id {}",
                element.id
            )));
        }
    }

    let document = Document::from_parts(
        file.elements.into_values(),
        file.root_elements,
        file.next_element_id,
    )?;
    let page = Page::from_parts(document, file.responsive_styles);
    log::debug!(
        "loaded project `{}` ({} elements)",
        file.meta.name,
        page.document().len()
    );
    Ok(LoadedProject {
        meta: file.meta,
        page,
    })
}

fn check_shape(value: &Value) -> EditResult<()> {
    let Some(object) = value.as_object() else {
        return Err(EditError::corrupt("project must be a JSON object"));
    };
    if let Some(missing) = REQUIRED_FIELDS.iter().find(|f| !object.contains_key(**f)) {
        return Err(EditError::corrupt(format!("missing field `{missing}`")));
    }
    if !object["elements"].is_object() {
        return Err(EditError::corrupt("`elements` must be an object"));
    }
    if !object["rootElements"].is_array() {
        return Err(EditError::corrupt("`rootElements` must be an array"));
    }
    Ok(())
}
