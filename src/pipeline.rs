//! End-to-end run: discover resource roots, generate docs for each, build
//! the TOC.
//!
//! ## Resource roots
//!
//! Each directory given on the command line is searched one level deep:
//!
//! ```text
//! resources/              ← passed on the command line
//! ├── .libtoc             ← makes resources/ itself a resource root
//! ├── project_a/
//! │   ├── .libtoc         ← project_a/ is a resource root
//! │   └── keywords/...
//! └── scratch/            ← no config file, skipped
//! ```
//!
//! ## Failure policy
//!
//! Unreadable config files, a stale output directory that cannot be removed,
//! and TOC assembly errors abort the run with a [`PipelineError`]. Everything
//! per-target is collected into the [`RunReport`] instead, and the run always
//! continues to the next target, package, and resource root.

use crate::config::{ConfigError, ConfigWarning, read_config};
use crate::generate::{BatchOutcome, DocGenerator, GenerateEvent, generate_all};
use crate::resolve::{PackageLocator, Resolved, Resolver, Unresolved};
use crate::toc::{MissingSlot, TocError, TocOptions, TocOutput, create_toc};
use crate::types::{Category, Failures};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::mpsc::Sender;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Toc(#[from] TocError),
    #[error("cannot remove existing output directory {path}: {source}")]
    RemoveOutput {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

#[derive(Debug, Clone)]
pub struct RunOptions {
    pub output_dir: PathBuf,
    /// Config file name looked up in every resource root.
    pub config_file: String,
    pub toc: TocOptions,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from("docs"),
            config_file: ".libtoc".to_string(),
            toc: TocOptions::default(),
        }
    }
}

/// Everything the CLI prints while a run is in progress.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunEvent {
    OutputReset(PathBuf),
    ResourceDir(PathBuf),
    ConfigWarning {
        config: PathBuf,
        warning: ConfigWarning,
    },
    SectionStarted(Category),
    PackageStarted(String),
    Unresolved(Unresolved),
    Generate(GenerateEvent),
    /// Failures of the whole run, sent once before the TOC is assembled.
    FailureSummary(Failures),
    TocStarted(PathBuf),
    TemplateWarning(MissingSlot),
    TocFinished(PathBuf),
}

impl From<GenerateEvent> for RunEvent {
    fn from(event: GenerateEvent) -> Self {
        RunEvent::Generate(event)
    }
}

/// Outcome of a complete run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunReport {
    pub failures: Failures,
    /// Number of documents the generator produced.
    pub generated: usize,
    /// `None` when no output directory was ever created.
    pub toc: Option<TocOutput>,
}

impl RunReport {
    /// No docs, and nothing failed either: there was nothing to document.
    pub fn nothing_created(&self) -> bool {
        self.toc.is_none() && self.failures.is_empty()
    }

    pub fn success(&self) -> bool {
        self.toc.is_some() && self.failures.is_empty()
    }

    pub fn exit_code(&self) -> u8 {
        if self.success() { 0 } else { 1 }
    }
}

/// A directory holding a config file, and that config file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceRoot {
    pub root: PathBuf,
    pub config: PathBuf,
}

/// Resource roots in `resources_dir`: the directory itself if it holds the
/// config file, and every direct child directory that does. Sorted by name.
pub fn find_resource_roots(
    resources_dir: &Path,
    config_file: &str,
) -> std::io::Result<Vec<ResourceRoot>> {
    let mut children: Vec<PathBuf> = fs::read_dir(resources_dir)?
        .filter_map(|e| e.ok())
        .map(|e| e.path())
        .collect();
    children.sort();

    let mut roots = Vec::new();
    for child in children {
        if child.is_dir() {
            let config = child.join(config_file);
            if config.is_file() {
                roots.push(ResourceRoot { root: child, config });
            }
        } else if child.file_name().is_some_and(|n| n == config_file) {
            roots.push(ResourceRoot {
                root: resources_dir.to_path_buf(),
                config: child,
            });
        }
    }
    Ok(roots)
}

/// Resolve and generate everything one config file declares.
pub fn create_docs_for_dir(
    resource: &ResourceRoot,
    output_dir: &Path,
    generator: &dyn DocGenerator,
    locator: &dyn PackageLocator,
    progress: Option<&Sender<RunEvent>>,
) -> Result<BatchOutcome, PipelineError> {
    let emit = |event: RunEvent| {
        if let Some(tx) = progress {
            tx.send(event).ok();
        }
    };

    let config = read_config(&resource.config)?;
    for warning in &config.warnings {
        emit(RunEvent::ConfigWarning {
            config: resource.config.clone(),
            warning: warning.clone(),
        });
    }

    let resolver = Resolver::new(&resource.root, output_dir, locator)?;
    let resolution = resolver.resolve(&config);
    let mut outcome = BatchOutcome::default();

    let run_batch = |category: Category, resolved: &Resolved, outcome: &mut BatchOutcome| {
        for unresolved in &resolved.unresolved {
            emit(RunEvent::Unresolved(unresolved.clone()));
            outcome.failed.record(category, unresolved.id.clone());
        }
        outcome.merge(generate_all(&resolved.targets, generator, progress));
    };

    if !config.paths.is_empty() {
        emit(RunEvent::SectionStarted(Category::Files));
        run_batch(Category::Files, &resolution.files, &mut outcome);
    }

    if !config.packages.is_empty() {
        emit(RunEvent::SectionStarted(Category::Packages));
        for group in &resolution.packages {
            emit(RunEvent::PackageStarted(group.name.clone()));
            run_batch(Category::Packages, &group.resolved, &mut outcome);
        }
    }

    if !config.libs.is_empty() {
        emit(RunEvent::SectionStarted(Category::Libs));
        outcome.merge(generate_all(&resolution.libs, generator, progress));
    }

    Ok(outcome)
}

/// Run the whole tool: reset the output directory, document every resource
/// root found in `resource_dirs`, and assemble the TOC if anything was
/// written.
pub fn run(
    resource_dirs: &[PathBuf],
    options: &RunOptions,
    generator: &dyn DocGenerator,
    locator: &dyn PackageLocator,
    timestamp: &str,
    progress: Option<&Sender<RunEvent>>,
) -> Result<RunReport, PipelineError> {
    let emit = |event: RunEvent| {
        if let Some(tx) = progress {
            tx.send(event).ok();
        }
    };

    let output_dir = &options.output_dir;
    if output_dir.is_dir() {
        emit(RunEvent::OutputReset(output_dir.clone()));
        fs::remove_dir_all(output_dir).map_err(|source| PipelineError::RemoveOutput {
            path: output_dir.clone(),
            source,
        })?;
    }

    let mut outcome = BatchOutcome::default();
    for resources_dir in resource_dirs {
        emit(RunEvent::ResourceDir(std::path::absolute(resources_dir)?));
        for resource in find_resource_roots(resources_dir, &options.config_file)? {
            outcome.merge(create_docs_for_dir(
                &resource, output_dir, generator, locator, progress,
            )?);
        }
    }

    emit(RunEvent::FailureSummary(outcome.failed.clone()));

    let toc = if output_dir.is_dir() {
        emit(RunEvent::TocStarted(std::path::absolute(output_dir)?));
        let toc = create_toc(output_dir, &options.toc, timestamp)?;
        for warning in &toc.warnings {
            emit(RunEvent::TemplateWarning(warning.clone()));
        }
        emit(RunEvent::TocFinished(toc.toc_path.clone()));
        Some(toc)
    } else {
        None
    };

    Ok(RunReport {
        failures: outcome.failed,
        generated: outcome.succeeded.len(),
        toc,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::{MockGenerator, MockLocator, touch, write_config};
    use std::sync::mpsc;
    use tempfile::TempDir;

    const STAMP: &str = "01.01.2025 00:00:00";

    fn options(tmp: &TempDir) -> RunOptions {
        RunOptions {
            output_dir: tmp.path().join("docs"),
            ..RunOptions::default()
        }
    }

    #[test]
    fn finds_child_roots_and_the_dir_itself() {
        let tmp = TempDir::new().unwrap();
        let res = tmp.path().join("res");
        write_config(&res, "[Libs]\nA\n");
        write_config(&res.join("b_project"), "[Libs]\nB\n");
        write_config(&res.join("a_project"), "[Libs]\nC\n");
        std::fs::create_dir_all(res.join("no_config")).unwrap();

        let roots = find_resource_roots(&res, ".libtoc").unwrap();
        let dirs: Vec<PathBuf> = roots.iter().map(|r| r.root.clone()).collect();
        assert_eq!(dirs, vec![res.clone(), res.join("a_project"), res.join("b_project")]);
    }

    #[test]
    fn custom_config_file_name() {
        let tmp = TempDir::new().unwrap();
        let res = tmp.path().join("res");
        touch(&res.join("proj/docs.cfg"));
        touch(&res.join("other/.libtoc"));

        let roots = find_resource_roots(&res, "docs.cfg").unwrap();
        assert_eq!(roots.len(), 1);
        assert_eq!(roots[0].config, res.join("proj/docs.cfg"));
    }

    #[test]
    fn generates_all_categories_into_target_dir() {
        let tmp = TempDir::new().unwrap();
        let res = tmp.path().join("res");
        let project = res.join("project");
        write_config(
            &project,
            "[Paths]\n**/*.resource\n[Packages]\npkg:*.resource\n[Libs]\nSomeLib::x  AS  Renamed\n",
        );
        touch(&project.join("kw/login.resource"));
        let pkg_root = tmp.path().join("site/pkg");
        touch(&pkg_root.join("shared.resource"));

        let generator = MockGenerator::default();
        let locator = MockLocator::with_package("pkg", &pkg_root);
        let report = run(&[res], &options(&tmp), &generator, &locator, STAMP, None).unwrap();

        assert!(report.success());
        assert_eq!(report.generated, 3);
        let docs = tmp.path().join("docs");
        assert!(docs.join("src/project/kw/login.html").is_file());
        assert!(docs.join("src/project/pkg/shared.html").is_file());
        assert!(docs.join("src/project/Renamed.html").is_file());
        assert!(docs.join("keyword_docs.html").is_file());
        assert!(docs.join("src/homepage.html").is_file());
    }

    #[test]
    fn failures_accumulate_across_roots_without_aborting() {
        let tmp = TempDir::new().unwrap();
        let res = tmp.path().join("res");
        write_config(&res.join("one"), "[Paths]\n*.resource\n[Libs]\nBadLib\nGoodLib\n");
        touch(&res.join("one/broken.resource"));
        touch(&res.join("one/fine.resource"));
        write_config(&res.join("two"), "[Packages]\nmissing:*.resource\n[Libs]\nOther\n");

        let generator = MockGenerator::failing(&["broken.resource", "BadLib"]);
        let locator = MockLocator::default();
        let report = run(&[res], &options(&tmp), &generator, &locator, STAMP, None).unwrap();

        assert_eq!(report.failures.files, vec!["broken.resource"]);
        assert_eq!(report.failures.packages, vec!["missing"]);
        assert_eq!(report.failures.libs, vec!["BadLib"]);
        assert_eq!(report.generated, 3);
        assert!(report.toc.is_some());
        assert_eq!(report.exit_code(), 1);
        assert!(tmp.path().join("docs/src/two/Other.html").is_file());
    }

    #[test]
    fn nothing_to_document_is_a_failure() {
        let tmp = TempDir::new().unwrap();
        let res = tmp.path().join("res");
        write_config(&res.join("empty"), "# nothing here\n[Paths]\n*.none\n");

        let generator = MockGenerator::default();
        let locator = MockLocator::default();
        let report = run(&[res], &options(&tmp), &generator, &locator, STAMP, None).unwrap();

        assert!(report.nothing_created());
        assert_eq!(report.exit_code(), 1);
        assert!(!tmp.path().join("docs").exists());
    }

    #[test]
    fn only_failures_means_no_toc_but_not_nothing_created() {
        let tmp = TempDir::new().unwrap();
        let res = tmp.path().join("res");
        write_config(&res.join("p"), "[Libs]\nBadLib\n");

        let generator = MockGenerator::failing(&["BadLib"]);
        let locator = MockLocator::default();
        let report = run(&[res], &options(&tmp), &generator, &locator, STAMP, None).unwrap();

        assert!(report.toc.is_none());
        assert!(!report.nothing_created());
        assert_eq!(report.exit_code(), 1);
    }

    #[test]
    fn existing_output_dir_is_replaced() {
        let tmp = TempDir::new().unwrap();
        touch(&tmp.path().join("docs/stale.html"));
        let res = tmp.path().join("res");
        write_config(&res.join("p"), "[Libs]\nLib\n");

        let generator = MockGenerator::default();
        let locator = MockLocator::default();
        let (tx, rx) = mpsc::channel();
        run(&[res], &options(&tmp), &generator, &locator, STAMP, Some(&tx)).unwrap();
        drop(tx);

        assert!(!tmp.path().join("docs/src/stale.html").exists());
        let events: Vec<RunEvent> = rx.into_iter().collect();
        assert_eq!(events[0], RunEvent::OutputReset(tmp.path().join("docs")));
    }

    #[test]
    fn failure_summary_precedes_toc() {
        let tmp = TempDir::new().unwrap();
        let res = tmp.path().join("res");
        write_config(&res.join("p"), "[Libs]\nGood\nBadLib\n");

        let generator = MockGenerator::failing(&["BadLib"]);
        let locator = MockLocator::default();
        let (tx, rx) = mpsc::channel();
        run(&[res], &options(&tmp), &generator, &locator, STAMP, Some(&tx)).unwrap();
        drop(tx);

        let events: Vec<RunEvent> = rx.into_iter().collect();
        let summary = events
            .iter()
            .position(|e| matches!(e, RunEvent::FailureSummary(f) if f.libs == vec!["BadLib"]))
            .unwrap();
        let toc = events
            .iter()
            .position(|e| matches!(e, RunEvent::TocStarted(_)))
            .unwrap();
        assert!(summary < toc);
    }

    #[test]
    fn template_warnings_are_forwarded() {
        let tmp = TempDir::new().unwrap();
        let res = tmp.path().join("res");
        write_config(&res.join("p"), "[Libs]\nLib\n");
        let template = tmp.path().join("toc.html");
        std::fs::write(&template, "<html>{{timestamp}}</html>").unwrap();
        let mut opts = options(&tmp);
        opts.toc.toc_template = Some(template.clone());

        let generator = MockGenerator::default();
        let locator = MockLocator::default();
        let (tx, rx) = mpsc::channel();
        run(&[res], &opts, &generator, &locator, STAMP, Some(&tx)).unwrap();
        drop(tx);

        let events: Vec<RunEvent> = rx.into_iter().collect();
        assert!(events.contains(&RunEvent::TemplateWarning(MissingSlot {
            template,
            slot: crate::template::Slot::Navigation,
        })));
    }

    #[test]
    fn unreadable_config_is_fatal() {
        let tmp = TempDir::new().unwrap();
        let res = tmp.path().join("res");
        let config = write_config(&res.join("p"), "");
        std::fs::write(&config, [0xff, 0xfe, 0x00]).unwrap();

        let generator = MockGenerator::default();
        let locator = MockLocator::default();
        let err = run(&[res], &options(&tmp), &generator, &locator, STAMP, None).unwrap_err();
        assert!(matches!(err, PipelineError::Config(ConfigError::Utf8(_))));
    }

    #[test]
    fn event_stream_for_one_root() {
        let tmp = TempDir::new().unwrap();
        let res = tmp.path().join("res");
        write_config(&res.join("p"), "stray\n[Packages]\nnope:*.x\n[Libs]\nLib\n");

        let generator = MockGenerator::default();
        let locator = MockLocator::default();
        let (tx, rx) = mpsc::channel();
        let resource = ResourceRoot {
            root: res.join("p"),
            config: res.join("p/.libtoc"),
        };
        create_docs_for_dir(&resource, &tmp.path().join("docs"), &generator, &locator, Some(&tx))
            .unwrap();
        drop(tx);

        let events: Vec<RunEvent> = rx.into_iter().collect();
        assert!(matches!(events[0], RunEvent::ConfigWarning { .. }));
        assert_eq!(events[1], RunEvent::SectionStarted(Category::Packages));
        assert_eq!(events[2], RunEvent::PackageStarted("nope".into()));
        assert!(matches!(events[3], RunEvent::Unresolved(ref u) if u.id == "nope"));
        assert_eq!(events[4], RunEvent::SectionStarted(Category::Libs));
        assert_eq!(
            events[5],
            RunEvent::Generate(GenerateEvent::Processing {
                category: Category::Libs,
                label: "Lib".into(),
            })
        );
        assert_eq!(events.len(), 6);
    }
}
