pub mod document;
pub mod error;
pub mod export;
pub mod id;
pub mod import;
pub mod lint;
pub mod model;
pub mod mutations;
pub mod overlay;
pub mod page;
pub mod persist;

pub use document::Document;
pub use error::{EditError, EditResult};
pub use export::{ExportBundle, ExportOptions, export, export_css, export_html};
pub use id::{IdAllocator, NodeId};
pub use import::{parse_html, parse_site};
pub use lint::{LintDiagnostic, LintSeverity, lint_page};
pub use model::*;
pub use mutations::{AlignEdge, Axis, PropertyEdit, PropertyTarget, SiblingStep};
pub use overlay::{Breakpoint, StyleOverlay};
pub use page::Page;
pub use persist::{LoadedProject, ProjectMeta, load_project, save_project};
