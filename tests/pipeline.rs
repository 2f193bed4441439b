//! End-to-end runs through the public library API.
//!
//! The doc generator is replaced with a stub that writes a tiny HTML page,
//! so these tests need neither Python nor `libdoc`.

use libtoc::generate::{DocGenerator, GeneratorError, LibdocCommand};
use libtoc::output::{format_failure_summary, format_report};
use libtoc::pipeline::{RunEvent, RunOptions, run};
use libtoc::resolve::SearchPathLocator;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::mpsc;
use tempfile::TempDir;

const STAMP: &str = "24.12.2025 18:30:00";

/// Writes `<html>NAME</html>` for every source, except those ending in
/// `.broken`, which exit with 252.
struct StubGenerator;

impl DocGenerator for StubGenerator {
    fn generate(
        &self,
        source: &str,
        output: &Path,
        name: Option<&str>,
    ) -> Result<i32, GeneratorError> {
        if source.ends_with(".broken") {
            return Ok(252);
        }
        fs::create_dir_all(output.parent().unwrap()).unwrap();
        fs::write(output, format!("<html>{}</html>", name.unwrap_or(source))).unwrap();
        Ok(0)
    }
}

fn write(path: &Path, text: &str) {
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, text).unwrap();
}

fn options(tmp: &TempDir) -> RunOptions {
    RunOptions {
        output_dir: tmp.path().join("docs"),
        ..RunOptions::default()
    }
}

// =========================================================================
// Full runs
// =========================================================================

#[test]
fn documents_a_workspace_of_projects() {
    let tmp = TempDir::new().unwrap();
    let res = tmp.path().join("resources");
    write(
        &res.join("web/.libtoc"),
        "# web tests\n[Paths]\nkeywords/*.resource\n[Libs]\nBrowser::timeout=5s  AS  Browser\n",
    );
    write(&res.join("web/keywords/login.resource"), "");
    write(&res.join("web/keywords/search.resource"), "");
    write(
        &res.join("api/.libtoc"),
        "[Packages]\nshared_kw:**/*.resource\n",
    );
    write(&tmp.path().join("site/shared_kw/http/requests.resource"), "");

    let locator = SearchPathLocator::new(vec![tmp.path().join("site")]);
    let report = run(&[res], &options(&tmp), &StubGenerator, &locator, STAMP, None).unwrap();

    assert!(report.success());
    assert_eq!(report.exit_code(), 0);
    assert_eq!(report.generated, 4);

    let docs = tmp.path().join("docs");
    assert!(docs.join("src/web/keywords/login.html").is_file());
    assert!(docs.join("src/web/keywords/search.html").is_file());
    assert!(docs.join("src/api/shared_kw/http/requests.html").is_file());
    assert_eq!(
        fs::read_to_string(docs.join("src/web/Browser.html")).unwrap(),
        "<html>Browser</html>"
    );

    let toc = fs::read_to_string(docs.join("keyword_docs.html")).unwrap();
    assert!(toc.contains(r#"href="src/web/keywords/login.html""#));
    assert!(toc.contains(r#"href="src/api/shared_kw/http/requests.html""#));
    assert!(toc.contains(r#"src="src/homepage.html""#));
    assert!(toc.contains(STAMP));
    assert!(!toc.contains("{{"));

    let homepage = fs::read_to_string(docs.join("src/homepage.html")).unwrap();
    assert!(homepage.contains(STAMP));
}

#[test]
fn failures_are_reported_but_the_toc_is_still_built() {
    let tmp = TempDir::new().unwrap();
    let res = tmp.path().join("resources");
    write(&res.join(".libtoc"), "[Libs]\nGood\nBad.broken\n[Packages]\nghost:*.resource\n");

    let locator = SearchPathLocator::new(Vec::new());
    let report = run(&[res], &options(&tmp), &StubGenerator, &locator, STAMP, None).unwrap();

    assert_eq!(report.exit_code(), 1);
    assert_eq!(report.failures.libs, vec!["Bad.broken"]);
    assert_eq!(report.failures.packages, vec!["ghost"]);
    assert!(tmp.path().join("docs/keyword_docs.html").is_file());
    assert!(tmp.path().join("docs/src/resources/Good.html").is_file());

    let lines = format_failure_summary(&report.failures);
    assert!(lines.contains(
        &"---> !!! Errors occurred while generating docs for 1 libs (see details above):"
            .to_string()
    ));
    assert!(lines.contains(&"         - ghost".to_string()));
}

#[test]
fn no_docs_exits_nonzero() {
    let tmp = TempDir::new().unwrap();
    let res = tmp.path().join("resources");
    write(&res.join("p/.libtoc"), "[Paths]\n*.resource\n");

    let locator = SearchPathLocator::new(Vec::new());
    let report = run(&[res], &options(&tmp), &StubGenerator, &locator, STAMP, None).unwrap();

    assert_eq!(report.exit_code(), 1);
    assert!(report.toc.is_none());
    assert!(!tmp.path().join("docs").exists());
    assert!(format_report(&report).contains(&"No docs were created!".to_string()));
}

#[cfg(unix)]
#[test]
fn failing_generator_command_creates_no_output() {
    let tmp = TempDir::new().unwrap();
    let res = tmp.path().join("resources");
    write(&res.join("p/.libtoc"), "[Paths]\n**/*.resource\n");
    write(&res.join("p/sub/deep/x.resource"), "");

    let generator = LibdocCommand::new("false");
    let locator = SearchPathLocator::new(Vec::new());
    let report = run(&[res], &options(&tmp), &generator, &locator, STAMP, None).unwrap();

    assert_eq!(report.failures.files, vec!["sub/deep/x.resource"]);
    assert!(report.toc.is_none());
    assert!(!tmp.path().join("docs").exists());
    assert_eq!(report.exit_code(), 1);
}

#[test]
fn second_run_starts_from_a_clean_output_dir() {
    let tmp = TempDir::new().unwrap();
    let res = tmp.path().join("resources");
    write(&res.join("p/.libtoc"), "[Libs]\nOnlyLib\n");
    let locator = SearchPathLocator::new(Vec::new());

    run(&[res.clone()], &options(&tmp), &StubGenerator, &locator, STAMP, None).unwrap();
    run(&[res], &options(&tmp), &StubGenerator, &locator, STAMP, None).unwrap();

    let docs = tmp.path().join("docs");
    assert!(docs.join("src/p/OnlyLib.html").is_file());
    assert!(!docs.join("src/src").exists());
    assert!(!docs.join("src/keyword_docs.html").exists());
}

// =========================================================================
// Progress events
// =========================================================================

#[test]
fn events_bracket_the_run() {
    let tmp = TempDir::new().unwrap();
    let res = tmp.path().join("resources");
    write(&res.join("p/.libtoc"), "[Libs]\nOnlyLib\n");
    let locator = SearchPathLocator::new(Vec::new());

    let (tx, rx) = mpsc::channel();
    run(&[res.clone()], &options(&tmp), &StubGenerator, &locator, STAMP, Some(&tx)).unwrap();
    drop(tx);
    let events: Vec<RunEvent> = rx.into_iter().collect();

    assert_eq!(events.first(), Some(&RunEvent::ResourceDir(res)));
    assert_eq!(
        events.last(),
        Some(&RunEvent::TocFinished(tmp.path().join("docs/keyword_docs.html")))
    );
    let toc_dirs: Vec<&PathBuf> = events
        .iter()
        .filter_map(|e| match e {
            RunEvent::TocStarted(dir) => Some(dir),
            _ => None,
        })
        .collect();
    assert_eq!(toc_dirs, vec![&tmp.path().join("docs")]);
}
