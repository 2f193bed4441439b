//! Per-target doc generation.
//!
//! The actual rendering of a resource file or library into HTML is done by an
//! external tool behind the [`DocGenerator`] trait. The production
//! implementation, [`LibdocCommand`], runs Robot Framework's `libdoc`
//! command line; tests use a recording mock.
//!
//! [`generate_all`] is a batch job: every target is attempted, in order, no
//! matter how many earlier ones failed. A nonzero exit code (or a tool that
//! cannot be started at all) marks that target's label as failed and the
//! batch moves on.

use crate::types::{Category, Failures, ResolvedTarget};
use std::ffi::OsString;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::sync::mpsc::Sender;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum GeneratorError {
    #[error("failed to run '{program}': {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },
    #[error("cannot create {path}: {source}")]
    OutputDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Renders one resource into one HTML file.
///
/// Returns the tool's exit code: `0` is success, anything else is a failure
/// for that target only.
pub trait DocGenerator {
    fn generate(
        &self,
        source: &str,
        output: &Path,
        name: Option<&str>,
    ) -> Result<i32, GeneratorError>;
}

/// Runs the `libdoc` command line tool.
///
/// ```text
/// libdoc --quiet [--pythonpath DIR]... [--name NAME] SOURCE OUTPUT
/// ```
#[derive(Debug, Clone)]
pub struct LibdocCommand {
    program: OsString,
    pythonpath: Vec<PathBuf>,
}

impl Default for LibdocCommand {
    fn default() -> Self {
        Self::new("libdoc")
    }
}

impl LibdocCommand {
    pub fn new(program: impl Into<OsString>) -> Self {
        Self {
            program: program.into(),
            pythonpath: Vec::new(),
        }
    }

    pub fn with_pythonpath(mut self, paths: &[PathBuf]) -> Self {
        self.pythonpath.extend_from_slice(paths);
        self
    }

    fn command(&self, source: &str, output: &Path, name: Option<&str>) -> Command {
        let mut cmd = Command::new(&self.program);
        cmd.arg("--quiet");
        for path in &self.pythonpath {
            cmd.arg("--pythonpath").arg(path);
        }
        if let Some(name) = name {
            cmd.arg("--name").arg(name);
        }
        cmd.arg(source).arg(output);
        cmd
    }
}

impl DocGenerator for LibdocCommand {
    fn generate(
        &self,
        source: &str,
        output: &Path,
        name: Option<&str>,
    ) -> Result<i32, GeneratorError> {
        let parent = output.parent().unwrap_or(Path::new(""));
        let created = first_missing_ancestor(parent);
        fs::create_dir_all(parent).map_err(|source| GeneratorError::OutputDir {
            path: parent.to_path_buf(),
            source,
        })?;

        let status = self
            .command(source, output, name)
            .stdin(Stdio::null())
            .status();
        // Killed by a signal: no code, still a failure.
        let code = status.map(|s| s.code().unwrap_or(-1));
        if !matches!(code, Ok(0)) {
            if let Some(top) = &created {
                remove_empty_dirs(parent, top);
            }
        }
        code.map_err(|source| GeneratorError::Spawn {
            program: self.program.to_string_lossy().into_owned(),
            source,
        })
    }
}

/// Outermost ancestor of `dir` (or `dir` itself) that does not exist yet.
fn first_missing_ancestor(dir: &Path) -> Option<PathBuf> {
    dir.ancestors()
        .take_while(|a| !a.as_os_str().is_empty() && !a.exists())
        .last()
        .map(Path::to_path_buf)
}

/// Remove `dir` and its ancestors up to and including `top`, stopping at the
/// first one that is not empty.
fn remove_empty_dirs(dir: &Path, top: &Path) {
    for ancestor in dir.ancestors() {
        if fs::remove_dir(ancestor).is_err() || ancestor == top {
            break;
        }
    }
}

/// Progress events, one `Processing` per target and a `Failed` for each
/// target that did not produce its output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GenerateEvent {
    Processing {
        category: Category,
        label: String,
    },
    Failed {
        category: Category,
        label: String,
        reason: String,
    },
}

/// What one batch produced.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BatchOutcome {
    pub succeeded: Vec<ResolvedTarget>,
    pub failed: Failures,
}

impl BatchOutcome {
    pub fn merge(&mut self, other: BatchOutcome) {
        self.succeeded.extend(other.succeeded);
        self.failed.merge(other.failed);
    }
}

/// Invoke `generator` once per target, sequentially, without early abort.
///
/// Progress goes to any channel whose event type wraps [`GenerateEvent`].
pub fn generate_all<E: From<GenerateEvent>>(
    targets: &[ResolvedTarget],
    generator: &dyn DocGenerator,
    progress: Option<&Sender<E>>,
) -> BatchOutcome {
    let emit = |event: GenerateEvent| {
        if let Some(tx) = progress {
            tx.send(E::from(event)).ok();
        }
    };

    let mut outcome = BatchOutcome::default();
    for target in targets {
        emit(GenerateEvent::Processing {
            category: target.category,
            label: target.label.clone(),
        });

        let result = generator.generate(
            &target.source,
            &target.output_path,
            target.display_name.as_deref(),
        );
        let reason = match result {
            Ok(0) => {
                outcome.succeeded.push(target.clone());
                continue;
            }
            Ok(code) => format!("exit code {code}"),
            Err(e) => e.to_string(),
        };

        outcome.failed.record(target.category, target.label.clone());
        emit(GenerateEvent::Failed {
            category: target.category,
            label: target.label.clone(),
            reason,
        });
    }
    outcome
}
