//! Shared test utilities for the libtoc test suite.
//!
//! Provides filesystem fixture builders and recording doubles for the two
//! external collaborators (doc generator and package locator).
//!
//! # Usage
//!
//! ```rust
//! use crate::test_helpers::*;
//!
//! let tmp = TempDir::new().unwrap();
//! write_config(&tmp.path().join("project"), "[Paths]\n*.resource\n");
//! touch(&tmp.path().join("project/common.resource"));
//!
//! let generator = MockGenerator::failing(&["broken.resource"]);
//! // ... run the stage under test ...
//! assert_eq!(generator.calls().len(), 1);
//! ```

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use crate::generate::{DocGenerator, GeneratorError};
use crate::resolve::{PackageLocator, PackageNotFoundError};
use crate::types::{Category, ResolvedTarget};

// =========================================================================
// Fixture setup
// =========================================================================

/// Create an empty file, including any missing parent directories.
pub fn touch(path: &Path) {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(path, "").unwrap();
}

/// Write a `.libtoc` config into `dir`, creating the directory.
pub fn write_config(dir: &Path, text: &str) -> PathBuf {
    fs::create_dir_all(dir).unwrap();
    let path = dir.join(".libtoc");
    fs::write(&path, text).unwrap();
    path
}

/// A target whose label and source are both `label`.
pub fn target(category: Category, label: &str, output: &Path) -> ResolvedTarget {
    ResolvedTarget {
        category,
        source: label.to_string(),
        output_path: output.to_path_buf(),
        display_name: None,
        label: label.to_string(),
    }
}

// =========================================================================
// Doc generator double
// =========================================================================

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedCall {
    pub source: String,
    pub output: PathBuf,
    pub name: Option<String>,
}

/// Records every call and writes a stub HTML file for each success.
///
/// Sources listed in `failing` (matched against the end of the source
/// string, so a relative path matches an absolute source) return exit code 1
/// and write nothing.
#[derive(Default)]
pub struct MockGenerator {
    failing: Vec<String>,
    calls: Mutex<Vec<RecordedCall>>,
}

impl MockGenerator {
    pub fn failing(sources: &[&str]) -> Self {
        Self {
            failing: sources.iter().map(|s| s.to_string()).collect(),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().unwrap().clone()
    }
}

impl DocGenerator for MockGenerator {
    fn generate(
        &self,
        source: &str,
        output: &Path,
        name: Option<&str>,
    ) -> Result<i32, GeneratorError> {
        self.calls.lock().unwrap().push(RecordedCall {
            source: source.to_string(),
            output: output.to_path_buf(),
            name: name.map(str::to_string),
        });
        if self.failing.iter().any(|f| source.ends_with(f.as_str())) {
            return Ok(1);
        }
        if let Some(parent) = output.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        let title = name.unwrap_or(source);
        fs::write(output, format!("<html><body>{title}</body></html>")).unwrap();
        Ok(0)
    }
}

// =========================================================================
// Package locator double
// =========================================================================

/// Locates only the packages registered with it and records every lookup.
#[derive(Default)]
pub struct MockLocator {
    packages: HashMap<String, PathBuf>,
    lookups: Mutex<Vec<String>>,
}

impl MockLocator {
    pub fn with_package(name: &str, root: &Path) -> Self {
        let mut locator = Self::default();
        locator.packages.insert(name.to_string(), root.to_path_buf());
        locator
    }

    pub fn lookups(&self) -> Vec<String> {
        self.lookups.lock().unwrap().clone()
    }
}

impl PackageLocator for MockLocator {
    fn locate(&self, package: &str) -> Result<PathBuf, PackageNotFoundError> {
        self.lookups.lock().unwrap().push(package.to_string());
        self.packages
            .get(package)
            .cloned()
            .ok_or_else(|| PackageNotFoundError {
                package: package.to_string(),
                reason: format!("No module named '{package}'"),
            })
    }
}
