//! CLI output formatting.
//!
//! # Output Format
//!
//! ```text
//! > Creating docs for dir: /work/resources
//! >> Processing paths
//! >>> Processing file: keywords/login.resource
//! ---
//! >> Processing package: my_pkg
//! >>> Processing file: my_pkg/res/common.resource
//! ---
//! >> Processing libraries
//! >>> Processing lib: SeleniumLibrary
//!     !!! SeleniumLibrary: exit code 252
//!
//! ---> !!! Errors occurred while generating docs for 1 libs (see details above):
//!          - SeleniumLibrary
//!
//! > Creating TOC in: /work/docs
//! ---
//! TOC finished. Output file: /work/docs/keyword_docs.html
//! ```
//!
//! # Architecture
//!
//! Every `format_*` function is pure and returns the lines to print, so the
//! exact wording is unit-tested. The `print_*` wrappers write to stdout.

use crate::generate::GenerateEvent;
use crate::pipeline::{RunEvent, RunReport};
use crate::types::{Category, Failures};

const SEPARATOR: &str = "---";

/// Indentation for the entries of the failure summary.
const LIST_INDENT: &str = "         ";

fn processing_line(category: Category, label: &str) -> String {
    match category {
        Category::Files | Category::Packages => format!(">>> Processing file: {label}"),
        Category::Libs => format!(">>> Processing lib: {label}"),
    }
}

/// Lines for one progress event.
pub fn format_run_event(event: &RunEvent) -> Vec<String> {
    match event {
        RunEvent::OutputReset(path) => {
            vec![format!(
                "Output dir already exists, deleting it: {}",
                path.display()
            )]
        }
        RunEvent::ResourceDir(path) => {
            vec![String::new(), format!("> Creating docs for dir: {}", path.display())]
        }
        RunEvent::ConfigWarning { config, warning } => {
            vec![format!("Warning: {}: {}", config.display(), warning)]
        }
        RunEvent::SectionStarted(Category::Files) => vec![">> Processing paths".to_string()],
        RunEvent::SectionStarted(Category::Packages) => vec![SEPARATOR.to_string()],
        RunEvent::SectionStarted(Category::Libs) => {
            vec![SEPARATOR.to_string(), ">> Processing libraries".to_string()]
        }
        RunEvent::PackageStarted(name) => vec![format!(">> Processing package: {name}")],
        RunEvent::Unresolved(unresolved) => vec![format!("    {}", unresolved.reason)],
        RunEvent::Generate(GenerateEvent::Processing { category, label }) => {
            vec![processing_line(*category, label)]
        }
        RunEvent::Generate(GenerateEvent::Failed { label, reason, .. }) => {
            vec![format!("    !!! {label}: {reason}")]
        }
        RunEvent::FailureSummary(failures) => format_failure_summary(failures),
        RunEvent::TemplateWarning(warning) => vec![format!("Warning: {warning}")],
        RunEvent::TocStarted(path) => {
            vec![String::new(), format!("> Creating TOC in: {}", path.display())]
        }
        RunEvent::TocFinished(path) => vec![
            SEPARATOR.to_string(),
            format!("TOC finished. Output file: {}", path.display()),
        ],
    }
}

/// The per-category failure summary. Empty when nothing failed.
pub fn format_failure_summary(failures: &Failures) -> Vec<String> {
    let mut lines = Vec::new();
    for category in Category::ALL {
        let ids = failures.list(category);
        if ids.is_empty() {
            continue;
        }
        lines.push(String::new());
        lines.push(format!(
            "---> !!! Errors occurred while generating docs for {} {} (see details above):",
            ids.len(),
            category
        ));
        lines.extend(ids.iter().map(|id| format!("{LIST_INDENT}- {id}")));
    }
    lines
}

/// Closing lines of a run. The failure summary went out with the progress
/// events; this only adds the "no docs" notice.
pub fn format_report(report: &RunReport) -> Vec<String> {
    let mut lines = Vec::new();
    if report.nothing_created() {
        lines.push("No docs were created!".to_string());
    }
    lines.push(String::new());
    lines
}

pub fn print_run_event(event: &RunEvent) {
    for line in format_run_event(event) {
        println!("{}", line);
    }
}

pub fn print_report(report: &RunReport) {
    for line in format_report(report) {
        println!("{}", line);
    }
}
