//! Per-resource-root config file parsing.
//!
//! Each resource root carries one config file (`.libtoc` by default) listing
//! what to document. The format is a sectioned plain-text list:
//!
//! ```text
//! # Comments starting with # are ignored
//! [Paths]
//! *.resource
//! **/my_subfolder/*.py
//!
//! [Packages]
//! my_package:keywords/**/*.resource
//!
//! [Libs]
//! SeleniumLibrary
//! SomeLibrary::some_import_param
//! ${LIB_DIR}/Custom.py  AS  Custom
//! ```
//!
//! ## Rules
//!
//! - Section markers are matched case-insensitively after trimming;
//!   `[Libs]` and `[Libraries]` are synonyms.
//! - Every other non-empty, non-comment line belongs to the most recently
//!   seen section. Lines before the first marker are dropped.
//! - Missing sections simply yield empty lists.
//!
//! Parsing is total: only an unreadable file is an error. Lines that are
//! dropped, and bracketed lines that are not a known marker, are kept as
//! [`ConfigWarning`]s so a typo like `[Path]` does not vanish silently.

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("cannot read config file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("config file {0} is not valid UTF-8")]
    Utf8(PathBuf),
}

/// A filesystem glob relative to the resource root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathPattern {
    pub glob: String,
}

/// A glob relative to an installed package's root, written `package:glob`.
///
/// `glob` is `None` when the line has no `:` separator; the resolver reports
/// such declarations as broken packages.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackagePattern {
    pub package_name: String,
    pub glob: Option<String>,
}

impl PackagePattern {
    fn parse(line: &str) -> Self {
        match line.split_once(':') {
            Some((name, glob)) => Self {
                package_name: name.trim().to_string(),
                glob: Some(glob.trim().to_string()),
            },
            None => Self {
                package_name: line.to_string(),
                glob: None,
            },
        }
    }
}

/// A library import string, optionally with `::` arguments and a rename
/// suffix. Kept raw; see [`crate::resolve::parse_lib_spec`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LibSpec {
    pub raw: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResourceDeclaration {
    Path(PathPattern),
    Package(PackagePattern),
    Lib(LibSpec),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Section {
    Paths,
    Packages,
    Libs,
}

impl Section {
    fn from_marker(line: &str) -> Option<Self> {
        match line.to_lowercase().as_str() {
            "[paths]" => Some(Section::Paths),
            "[packages]" => Some(Section::Packages),
            "[libs]" | "[libraries]" => Some(Section::Libs),
            _ => None,
        }
    }

    fn declare(self, line: &str) -> ResourceDeclaration {
        match self {
            Section::Paths => ResourceDeclaration::Path(PathPattern {
                glob: line.to_string(),
            }),
            Section::Packages => ResourceDeclaration::Package(PackagePattern::parse(line)),
            Section::Libs => ResourceDeclaration::Lib(LibSpec {
                raw: line.to_string(),
            }),
        }
    }
}

/// A line the parser kept quiet about but the user probably wants to know.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigWarning {
    /// 1-based line number.
    pub line: usize,
    pub kind: WarningKind,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WarningKind {
    /// Appeared before any section marker and was dropped.
    OutsideSection(String),
    /// Looks like a section marker but is not one; treated as a value.
    UnknownMarker(String),
}

impl fmt::Display for ConfigWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            WarningKind::OutsideSection(text) => {
                write!(f, "line {}: '{}' is outside any section, ignored", self.line, text)
            }
            WarningKind::UnknownMarker(text) => write!(
                f,
                "line {}: '{}' is not a known section marker, read as a value",
                self.line, text
            ),
        }
    }
}

/// Parsed config. Immutable once built.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DocConfig {
    pub paths: Vec<PathPattern>,
    pub packages: Vec<PackagePattern>,
    pub libs: Vec<LibSpec>,
    pub warnings: Vec<ConfigWarning>,
}

impl DocConfig {
    fn push(&mut self, declaration: ResourceDeclaration) {
        match declaration {
            ResourceDeclaration::Path(p) => self.paths.push(p),
            ResourceDeclaration::Package(p) => self.packages.push(p),
            ResourceDeclaration::Lib(l) => self.libs.push(l),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.paths.is_empty() && self.packages.is_empty() && self.libs.is_empty()
    }
}

/// Parse config text. Never fails.
pub fn parse_config(text: &str) -> DocConfig {
    let mut config = DocConfig::default();
    let mut current: Option<Section> = None;

    for (idx, raw_line) in text.lines().enumerate() {
        let line = raw_line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        if let Some(section) = Section::from_marker(line) {
            current = Some(section);
            continue;
        }
        let line_no = idx + 1;
        match current {
            Some(section) => {
                if line.starts_with('[') && line.ends_with(']') {
                    config.warnings.push(ConfigWarning {
                        line: line_no,
                        kind: WarningKind::UnknownMarker(line.to_string()),
                    });
                }
                config.push(section.declare(line));
            }
            None => config.warnings.push(ConfigWarning {
                line: line_no,
                kind: WarningKind::OutsideSection(line.to_string()),
            }),
        }
    }

    config
}

/// Read and parse a config file.
pub fn read_config(path: &Path) -> Result<DocConfig, ConfigError> {
    let bytes = fs::read(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let text = String::from_utf8(bytes).map_err(|_| ConfigError::Utf8(path.to_path_buf()))?;
    let text = text.strip_prefix('\u{feff}').unwrap_or(&text);
    Ok(parse_config(text))
}
