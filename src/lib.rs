//! # libtoc
//!
//! Generates keyword documentation for Robot Framework resource files and
//! libraries, and ties all of it together behind a single table-of-contents
//! page. Each project declares what to document in a small `.libtoc` file;
//! the actual HTML for every resource is produced by the external `libdoc`
//! tool.
//!
//! # Architecture: Resolve, Generate, Assemble
//!
//! ```text
//! 1. Config    .libtoc          →  DocConfig         (three declaration lists)
//! 2. Resolve   DocConfig        →  ResolvedTarget[]  (globs, packages, libs)
//! 3. Generate  ResolvedTarget[] →  docs/<root>/...   (one libdoc run per target)
//! 4. TOC       docs/            →  keyword_docs.html (nav tree + homepage)
//! ```
//!
//! Stages 1 to 3 run once per resource root, stage 4 once per run. A failure
//! for one target never stops the batch: failures are collected per category
//! and reported at the end, and they make the process exit nonzero.
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`config`] | Line-based `.libtoc` parser: `[Paths]`, `[Packages]`, `[Libs]` sections |
//! | [`resolve`] | Turns declarations into concrete targets: globbing, package lookup, env expansion, renames |
//! | [`generate`] | The [`generate::DocGenerator`] seam and the sequential, non-aborting batch driver |
//! | [`tree`] | Builds the navigation tree from the output directory and renders it with Maud |
//! | [`template`] | Named-slot templates (`{{navigation}}`, `{{homepage}}`, `{{timestamp}}`) |
//! | [`toc`] | Moves generated docs under `src/`, writes the homepage and the TOC |
//! | [`pipeline`] | Resource-root discovery and the end-to-end run |
//! | [`types`] | Shared types: categories, resolved targets, failure lists |
//! | [`output`] | CLI output formatting for progress events and the final report |
//!
//! # Design Decisions
//!
//! ## External Generator Behind a Trait
//!
//! Rendering keyword docs is the job of `libdoc`, which only exists inside a
//! Python environment. The crate never links against it: [`generate::LibdocCommand`]
//! spawns it, and every test uses a recording double instead. Package lookup
//! is the same story: [`resolve::SearchPathLocator`] searches the filesystem
//! first and only asks a Python interpreter as a fallback.
//!
//! ## Tree First, HTML Second
//!
//! The navigation is built as an explicit [`tree::NavFolder`] value and then
//! rendered with Maud. Markup is escaped by construction, and the structure
//! of the tree can be asserted on without parsing HTML.
//!
//! ## Named Template Slots
//!
//! Templates carry inline CSS and JavaScript full of literal braces, so
//! substitution only recognizes `{{identifier}}`. Anything else is copied
//! through unchanged.

pub mod config;
pub mod generate;
pub mod output;
pub mod pipeline;
pub mod resolve;
pub mod template;
pub mod toc;
pub mod tree;
pub mod types;

#[cfg(test)]
pub(crate) mod test_helpers;
