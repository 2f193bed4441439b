//! Expands config declarations into concrete generator targets.
//!
//! Every target lands under the resource root's *target directory*,
//! `<output_dir>/<basename of resource root>`:
//!
//! ```text
//! [Paths]     keywords/login.resource     →  <target>/keywords/login.html
//! [Packages]  my_pkg:res/*.resource       →  <target>/my_pkg/res/common.html
//! [Libs]      SomeLib::arg1               →  <target>/SomeLib.html
//! [Libs]      SomeLib::arg1  AS  MyLib    →  <target>/MyLib.html  (named "MyLib")
//! ```
//!
//! Nothing in here is fatal. A glob with zero matches yields zero targets; an
//! invalid glob, a package that cannot be located, or a malformed package
//! line becomes an [`Unresolved`] entry that the pipeline reports as broken.
//!
//! ## Rename grammar
//!
//! A lib spec may end with `AS <name>` or `WITH NAME <name>`, where the
//! keyword is case-sensitive and surrounded by at least two spaces on each
//! side. The import part is matched greedily, so an import string that
//! itself contains two spaces followed by `AS` and two more spaces is read as
//! a rename at its last such occurrence. That ambiguity is inherent to the
//! format and is not resolved here.

use crate::config::{DocConfig, LibSpec, PackagePattern, PathPattern};
use crate::types::{Category, ResolvedTarget};
use glob::MatchOptions;
use regex::{Captures, Regex};
use std::ffi::OsString;
use std::path::{Component, Path, PathBuf};
use std::process::Command;
use std::sync::LazyLock;
use thiserror::Error;

static RENAME: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(.+)\s{2,}(?:AS|WITH NAME)\s{2,}(.+)$").expect("rename pattern is valid")
});

static ENV_REF: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\$\{([^}]+)\}|\$(\w+)|%(\w+)%").expect("env reference pattern is valid")
});

const GLOB_OPTIONS: MatchOptions = MatchOptions {
    case_sensitive: true,
    require_literal_separator: true,
    require_literal_leading_dot: true,
};

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("package '{package}' not found: {reason}")]
pub struct PackageNotFoundError {
    pub package: String,
    pub reason: String,
}

/// Finds the on-disk root directory of an installed package.
pub trait PackageLocator {
    fn locate(&self, package: &str) -> Result<PathBuf, PackageNotFoundError>;
}

/// Looks for a package directory in a list of search paths, falling back to
/// asking a Python interpreter where the package lives.
///
/// Dotted names map to nested directories: `a.b` is looked up as `a/b`.
#[derive(Debug, Clone, Default)]
pub struct SearchPathLocator {
    search_paths: Vec<PathBuf>,
    interpreter: Option<OsString>,
}

const LOCATE_SCRIPT: &str =
    "import sys, importlib.resources as r; print(r.files(sys.argv[1]))";

impl SearchPathLocator {
    pub fn new(search_paths: Vec<PathBuf>) -> Self {
        Self {
            search_paths,
            interpreter: None,
        }
    }

    /// `extra` first, then every entry of `PYTHONPATH`.
    pub fn from_env(extra: &[PathBuf]) -> Self {
        let mut search_paths = extra.to_vec();
        if let Some(value) = std::env::var_os("PYTHONPATH") {
            search_paths.extend(std::env::split_paths(&value).filter(|p| !p.as_os_str().is_empty()));
        }
        Self::new(search_paths)
    }

    pub fn with_interpreter(mut self, program: impl Into<OsString>) -> Self {
        self.interpreter = Some(program.into());
        self
    }

    fn ask_interpreter(&self, program: &OsString, package: &str) -> Result<PathBuf, String> {
        let mut cmd = Command::new(program);
        cmd.args(["-c", LOCATE_SCRIPT, package]);
        if !self.search_paths.is_empty() {
            let mut paths = self.search_paths.clone();
            if let Some(existing) = std::env::var_os("PYTHONPATH") {
                paths.extend(std::env::split_paths(&existing));
            }
            if let Ok(joined) = std::env::join_paths(paths) {
                cmd.env("PYTHONPATH", joined);
            }
        }
        let output = cmd.output().map_err(|e| e.to_string())?;
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            let last = stderr.lines().rev().find(|l| !l.trim().is_empty());
            return Err(last.unwrap_or("interpreter lookup failed").trim().to_string());
        }
        let path = PathBuf::from(String::from_utf8_lossy(&output.stdout).trim());
        if path.is_dir() {
            Ok(path)
        } else {
            Err(format!("{} is not a directory", path.display()))
        }
    }
}

impl PackageLocator for SearchPathLocator {
    fn locate(&self, package: &str) -> Result<PathBuf, PackageNotFoundError> {
        let relative: PathBuf = package.split('.').collect();
        if let Some(found) = self
            .search_paths
            .iter()
            .map(|dir| dir.join(&relative))
            .find(|candidate| candidate.is_dir())
        {
            return Ok(found);
        }

        let reason = match &self.interpreter {
            Some(program) => match self.ask_interpreter(program, package) {
                Ok(path) => return Ok(path),
                Err(reason) => reason,
            },
            None => "not found in any search path".to_string(),
        };
        Err(PackageNotFoundError {
            package: package.to_string(),
            reason,
        })
    }
}

/// An input that produced no target. `reason` is a complete sentence shown
/// to the user as is; `id` goes into the failure summary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Unresolved {
    pub id: String,
    pub reason: String,
}

/// Targets for one category, plus whatever could not be resolved.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Resolved {
    pub targets: Vec<ResolvedTarget>,
    pub unresolved: Vec<Unresolved>,
}

/// All declarations for one package name, merged so the package is looked
/// up once.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackageGroup {
    pub name: String,
    pub resolved: Resolved,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Resolution {
    pub files: Resolved,
    pub packages: Vec<PackageGroup>,
    pub libs: Vec<ResolvedTarget>,
}

/// A lib spec split into the import string and optional rename target.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LibImport {
    pub import: String,
    pub rename: Option<String>,
}

/// Split a (substituted) lib spec on the `AS` / `WITH NAME` rename suffix.
///
/// Extra whitespace before the keyword is not part of the import string.
pub fn parse_lib_spec(spec: &str) -> LibImport {
    match RENAME.captures(spec) {
        Some(caps) => LibImport {
            import: caps[1].trim_end().to_string(),
            rename: Some(caps[2].trim().to_string()),
        },
        None => LibImport {
            import: spec.to_string(),
            rename: None,
        },
    }
}

/// Substitute `$NAME`, `${NAME}` and `%NAME%` references using `lookup`.
/// Unknown variables are left untouched.
fn expand_env_with(input: &str, lookup: impl Fn(&str) -> Option<String>) -> String {
    ENV_REF
        .replace_all(input, |caps: &Captures| {
            let name = caps
                .get(1)
                .or_else(|| caps.get(2))
                .or_else(|| caps.get(3))
                .map(|m| m.as_str())
                .unwrap_or_default();
            lookup(name).unwrap_or_else(|| caps[0].to_string())
        })
        .into_owned()
}

/// Expand `pattern` below `base`, returning matching files in glob order.
///
/// `*` does not cross directory boundaries, `**` does, and hidden entries
/// only match patterns that name the leading dot explicitly.
pub fn expand_glob(base: &Path, pattern: &str) -> Result<Vec<PathBuf>, glob::PatternError> {
    let escaped = PathBuf::from(glob::Pattern::escape(&base.to_string_lossy())).join(pattern);
    let matches = glob::glob_with(&escaped.to_string_lossy(), GLOB_OPTIONS)?;
    Ok(matches.filter_map(Result::ok).filter(|p| p.is_file()).collect())
}

type EnvLookup = fn(&str) -> Option<String>;

fn process_env(name: &str) -> Option<String> {
    std::env::var(name).ok()
}

/// Resolves declarations for a single resource root.
pub struct Resolver<'a> {
    root: PathBuf,
    target_dir: PathBuf,
    locator: &'a dyn PackageLocator,
    env: EnvLookup,
}

impl<'a> Resolver<'a> {
    /// `root` and `output_dir` are made absolute against the current
    /// directory so every target carries absolute paths.
    pub fn new(
        root: &Path,
        output_dir: &Path,
        locator: &'a dyn PackageLocator,
    ) -> std::io::Result<Self> {
        let root = std::path::absolute(root)?;
        let output_dir = std::path::absolute(output_dir)?;
        let target_dir = match root.file_name() {
            Some(name) => output_dir.join(name),
            None => output_dir,
        };
        Ok(Self {
            root,
            target_dir,
            locator,
            env: process_env,
        })
    }

    #[cfg(test)]
    fn with_env(mut self, env: EnvLookup) -> Self {
        self.env = env;
        self
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn target_dir(&self) -> &Path {
        &self.target_dir
    }

    pub fn resolve(&self, config: &DocConfig) -> Resolution {
        Resolution {
            files: self.resolve_paths(&config.paths),
            packages: self.resolve_packages(&config.packages),
            libs: self.resolve_libs(&config.libs),
        }
    }

    pub fn resolve_paths(&self, patterns: &[PathPattern]) -> Resolved {
        let mut resolved = Resolved::default();
        for pattern in patterns {
            match expand_glob(&self.root, &pattern.glob) {
                Ok(matches) => {
                    for path in matches {
                        let relative = relative_or_name(&path, &self.root);
                        resolved.targets.push(ResolvedTarget {
                            category: Category::Files,
                            source: path.to_string_lossy().into_owned(),
                            output_path: self.target_dir.join(relative.with_extension("html")),
                            display_name: None,
                            label: relative.to_string_lossy().into_owned(),
                        });
                    }
                }
                Err(e) => resolved.unresolved.push(Unresolved {
                    id: pattern.glob.clone(),
                    reason: format!("Invalid pattern '{}': {e}", pattern.glob),
                }),
            }
        }
        resolved
    }

    pub fn resolve_packages(&self, patterns: &[PackagePattern]) -> Vec<PackageGroup> {
        let mut grouped: Vec<(&str, Vec<Option<&str>>)> = Vec::new();
        for pattern in patterns {
            let glob = pattern.glob.as_deref();
            match grouped
                .iter_mut()
                .find(|(name, _)| *name == pattern.package_name)
            {
                Some((_, globs)) => globs.push(glob),
                None => grouped.push((pattern.package_name.as_str(), vec![glob])),
            }
        }

        grouped
            .into_iter()
            .map(|(name, globs)| PackageGroup {
                name: name.to_string(),
                resolved: self.resolve_package(name, &globs),
            })
            .collect()
    }

    fn resolve_package(&self, name: &str, globs: &[Option<&str>]) -> Resolved {
        let mut resolved = Resolved::default();
        if globs.iter().any(Option::is_none) {
            resolved.unresolved.push(Unresolved {
                id: name.to_string(),
                reason: format!("Package declaration '{name}' has no ':<pattern>' part"),
            });
        }
        let globs: Vec<&str> = globs.iter().flatten().copied().collect();
        if globs.is_empty() {
            return resolved;
        }

        let package_root = match self.locator.locate(name) {
            Ok(path) => path,
            Err(e) => {
                resolved.unresolved.push(Unresolved {
                    id: name.to_string(),
                    reason: format!("Importing package '{name}' failed: {}", e.reason),
                });
                return resolved;
            }
        };

        for glob in globs {
            match expand_glob(&package_root, glob) {
                Ok(matches) => {
                    for path in matches {
                        let relative = Path::new(name).join(relative_or_name(&path, &package_root));
                        resolved.targets.push(ResolvedTarget {
                            category: Category::Packages,
                            source: path.to_string_lossy().into_owned(),
                            output_path: self.target_dir.join(relative.with_extension("html")),
                            display_name: None,
                            label: relative.to_string_lossy().into_owned(),
                        });
                    }
                }
                Err(e) => resolved.unresolved.push(Unresolved {
                    id: format!("{name}:{glob}"),
                    reason: format!("Invalid pattern '{glob}' for package '{name}': {e}"),
                }),
            }
        }
        resolved
    }

    pub fn resolve_libs(&self, specs: &[LibSpec]) -> Vec<ResolvedTarget> {
        specs
            .iter()
            .map(|spec| {
                let substituted = expand_env_with(&spec.raw, self.env);
                let LibImport { import, rename } = parse_lib_spec(&substituted);
                let (output_path, display_name) = match rename {
                    Some(name) => {
                        let display = Path::new(&name)
                            .file_name()
                            .map(|n| n.to_string_lossy().into_owned())
                            .unwrap_or_else(|| name.clone());
                        (html_under(&self.target_dir, &name), Some(display))
                    }
                    None => {
                        let stem = import.split("::").next().unwrap_or_default();
                        (html_under(&self.target_dir, stem), None)
                    }
                };
                ResolvedTarget {
                    category: Category::Libs,
                    source: import.clone(),
                    output_path,
                    display_name,
                    label: import,
                }
            })
            .collect()
    }
}

/// `<name>.html` under `dir`. Only the plain components of `name` are kept,
/// so an absolute path or `..` cannot leave `dir`.
fn html_under(dir: &Path, name: &str) -> PathBuf {
    let mut relative: PathBuf = Path::new(name)
        .components()
        .filter(|c| matches!(c, Component::Normal(_)))
        .collect();
    let file_name = relative
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    relative.set_file_name(format!("{file_name}.html"));
    dir.join(relative)
}

fn relative_or_name(path: &Path, base: &Path) -> PathBuf {
    match path.strip_prefix(base) {
        Ok(relative) => relative.to_path_buf(),
        Err(_) => path.file_name().map(PathBuf::from).unwrap_or_default(),
    }
}
