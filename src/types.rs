//! Shared types passed between the resolve, generate, and pipeline stages.

use std::fmt;
use std::path::PathBuf;

/// The three kinds of resources a config file can declare.
///
/// Failures are grouped by category in the final report, in this order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Category {
    Files,
    Packages,
    Libs,
}

impl Category {
    pub const ALL: [Category; 3] = [Category::Files, Category::Packages, Category::Libs];

    /// Plural noun used in the failure summary ("... for 2 files").
    pub fn noun(self) -> &'static str {
        match self {
            Category::Files => "files",
            Category::Packages => "packages",
            Category::Libs => "libs",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.noun())
    }
}

/// One concrete doc generator invocation.
///
/// `source` is what the generator receives (absolute file path or lib import
/// string); `label` is the identifier shown to the user and recorded when the
/// target fails.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedTarget {
    pub category: Category,
    pub source: String,
    pub output_path: PathBuf,
    pub display_name: Option<String>,
    pub label: String,
}

/// Failed source identifiers, grouped by category.
///
/// Per-target failures are values, not errors: each stage returns one of
/// these and the orchestrator merges them across resource roots.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Failures {
    pub files: Vec<String>,
    pub packages: Vec<String>,
    pub libs: Vec<String>,
}

impl Failures {
    pub fn record(&mut self, category: Category, id: impl Into<String>) {
        self.list_mut(category).push(id.into());
    }

    pub fn list(&self, category: Category) -> &[String] {
        match category {
            Category::Files => &self.files,
            Category::Packages => &self.packages,
            Category::Libs => &self.libs,
        }
    }

    fn list_mut(&mut self, category: Category) -> &mut Vec<String> {
        match category {
            Category::Files => &mut self.files,
            Category::Packages => &mut self.packages,
            Category::Libs => &mut self.libs,
        }
    }

    /// Append all of `other`'s failures, preserving order.
    pub fn merge(&mut self, other: Failures) {
        self.files.extend(other.files);
        self.packages.extend(other.packages);
        self.libs.extend(other.libs);
    }

    pub fn total(&self) -> usize {
        self.files.len() + self.packages.len() + self.libs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.total() == 0
    }
}
