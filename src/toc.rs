//! TOC and homepage assembly.
//!
//! After generation the output directory holds one folder per resource root.
//! [`create_toc`] reorganizes it into:
//!
//! ```text
//! docs/
//! ├── keyword_docs.html        # TOC: navigation tree + iframe
//! └── src/
//!     ├── homepage.html        # Landing page shown in the iframe
//!     ├── project_a/...        # Everything that was in docs/ before
//!     └── project_b/...
//! ```
//!
//! The move into `src/` is not idempotent: running it twice nests the first
//! run's TOC inside `src/`. The pipeline always starts from a fresh output
//! directory.

use crate::template::{Slot, SlotValues, Template, TemplateError};
use crate::tree::{build_nav_tree, relative_href, render_nav};
use chrono::NaiveDateTime;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum TocError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Template(#[from] TemplateError),
    #[error("cannot walk generated docs: {0}")]
    Walk(#[from] walkdir::Error),
}

/// Subdirectory every generated document is moved into.
pub const SRC_DIR: &str = "src";

const DEFAULT_TOC_TEMPLATE: &str = include_str!("../static/toc_template.html");
const DEFAULT_HOMEPAGE_TEMPLATE: &str = include_str!("../static/homepage_template.html");

#[derive(Debug, Clone)]
pub struct TocOptions {
    pub toc_file: String,
    pub homepage_file: String,
    /// Custom TOC template; the embedded default when `None`.
    pub toc_template: Option<PathBuf>,
    /// Custom homepage template; the embedded default when `None`.
    pub homepage_template: Option<PathBuf>,
}

impl Default for TocOptions {
    fn default() -> Self {
        Self {
            toc_file: "keyword_docs.html".to_string(),
            homepage_file: "homepage.html".to_string(),
            toc_template: None,
            homepage_template: None,
        }
    }
}

/// A custom template that renders without a slot its page depends on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MissingSlot {
    pub template: PathBuf,
    pub slot: Slot,
}

impl fmt::Display for MissingSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "template {} has no {{{{{}}}}} slot, the {} will be empty",
            self.template.display(),
            self.slot.name(),
            self.slot.name()
        )
    }
}

/// Slots a custom TOC template must contain.
const TOC_REQUIRED: &[Slot] = &[Slot::Navigation];

/// Paths of the two synthesized documents.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TocOutput {
    pub toc_path: PathBuf,
    pub homepage_path: PathBuf,
    pub warnings: Vec<MissingSlot>,
}

/// `DD.MM.YYYY HH:MM:SS`
pub fn format_timestamp(at: NaiveDateTime) -> String {
    at.format("%d.%m.%Y %H:%M:%S").to_string()
}

pub fn load_homepage_template(path: Option<&Path>) -> Result<Template, TemplateError> {
    Template::load(path, DEFAULT_HOMEPAGE_TEMPLATE, &[Slot::Timestamp])
}

pub fn load_toc_template(path: Option<&Path>) -> Result<Template, TemplateError> {
    Template::load(
        path,
        DEFAULT_TOC_TEMPLATE,
        &[Slot::Homepage, Slot::Navigation, Slot::Timestamp],
    )
}

pub fn render_homepage(template: &Template, timestamp: &str) -> String {
    template.render(&SlotValues {
        timestamp,
        ..SlotValues::default()
    })
}

pub fn render_toc(
    template: &Template,
    navigation: &str,
    timestamp: &str,
    homepage_path: &str,
) -> String {
    template.render(&SlotValues {
        homepage: homepage_path,
        navigation,
        timestamp,
    })
}

/// Move everything in `docs_dir` into `src/`, write the homepage there, and
/// write the TOC next to `src/`.
///
/// Templates are loaded before anything is moved, so a bad template leaves
/// the directory untouched.
pub fn create_toc(
    docs_dir: &Path,
    options: &TocOptions,
    timestamp: &str,
) -> Result<TocOutput, TocError> {
    let homepage_template = load_homepage_template(options.homepage_template.as_deref())?;
    let toc_template = load_toc_template(options.toc_template.as_deref())?;
    let warnings: Vec<MissingSlot> = match &options.toc_template {
        Some(path) => toc_template
            .missing_slots(TOC_REQUIRED)
            .into_iter()
            .map(|slot| MissingSlot {
                template: path.clone(),
                slot,
            })
            .collect(),
        None => Vec::new(),
    };

    let docs_dir = std::path::absolute(docs_dir)?;
    let src_dir = docs_dir.join(SRC_DIR);
    fs::create_dir_all(&src_dir)?;

    let mut to_move: Vec<_> = fs::read_dir(&docs_dir)?
        .filter_map(|e| e.ok())
        .map(|e| e.file_name())
        .filter(|name| name != SRC_DIR)
        .collect();
    to_move.sort();
    for name in to_move {
        fs::rename(docs_dir.join(&name), src_dir.join(&name))?;
    }

    let homepage_path = src_dir.join(&options.homepage_file);
    fs::write(&homepage_path, render_homepage(&homepage_template, timestamp))?;

    let tree = build_nav_tree(&src_dir, &docs_dir)?;
    let navigation = render_nav(&tree).into_string();

    let toc_path = docs_dir.join(&options.toc_file);
    let html = render_toc(
        &toc_template,
        &navigation,
        timestamp,
        &relative_href(&homepage_path, &docs_dir),
    );
    fs::write(&toc_path, html)?;

    Ok(TocOutput {
        toc_path,
        homepage_path,
        warnings,
    })
}
