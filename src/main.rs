use clap::Parser;
use libtoc::generate::LibdocCommand;
use libtoc::output;
use libtoc::pipeline::{self, RunOptions};
use libtoc::resolve::SearchPathLocator;
use libtoc::toc::{TocOptions, format_timestamp};
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Parser)]
#[command(name = "libtoc")]
#[command(about = "Keyword documentation with a table of contents for Robot Framework resources")]
#[command(long_about = "\
Keyword documentation with a table of contents for Robot Framework resources

Every resources directory is searched for resource roots: the directory
itself and each direct child that contains a config file.

  resources/
  ├── project_a/
  │   ├── .libtoc                  # Declares what to document
  │   └── keywords/login.resource
  └── project_b/
      └── .libtoc

Config file format:

  [Paths]
  **/*.resource                    # Glob relative to the resource root
  [Packages]
  my_pkg:**/*.resource             # Glob inside an installed package
  [Libs]
  SeleniumLibrary
  Remote::http://host:8270  AS  RemoteLib

Output:

  docs/
  ├── keyword_docs.html            # Open this: navigation + viewer
  └── src/
      ├── homepage.html
      └── project_a/keywords/login.html

Exits with 1 if any document failed or nothing was generated.")]
#[command(version)]
struct Cli {
    /// Directories containing resource roots
    #[arg(required = true)]
    resources_dirs: Vec<PathBuf>,

    /// Output directory (deleted and recreated on every run)
    #[arg(short = 'd', long, default_value = "docs")]
    output_dir: PathBuf,

    /// Name of the config file marking a resource root
    #[arg(long, default_value = ".libtoc")]
    config_file: String,

    /// File name of the generated TOC
    #[arg(long, default_value = "keyword_docs.html")]
    toc_file: String,

    /// File name of the generated homepage
    #[arg(long, default_value = "homepage.html")]
    homepage_file: String,

    /// Custom TOC template (slots: {{navigation}}, {{homepage}}, {{timestamp}})
    #[arg(long)]
    toc_template: Option<PathBuf>,

    /// Custom homepage template (slot: {{timestamp}})
    #[arg(long)]
    homepage_template: Option<PathBuf>,

    /// Additional package search path, also passed to the generator
    #[arg(short = 'P', long)]
    pythonpath: Vec<PathBuf>,

    /// Doc generator command
    #[arg(long, default_value = "libdoc")]
    generator: String,

    /// Python interpreter used to locate packages not found on the search path
    #[arg(long, default_value = "python3")]
    python: String,
}

fn main() -> Result<ExitCode, Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let options = RunOptions {
        output_dir: cli.output_dir,
        config_file: cli.config_file,
        toc: TocOptions {
            toc_file: cli.toc_file,
            homepage_file: cli.homepage_file,
            toc_template: cli.toc_template,
            homepage_template: cli.homepage_template,
        },
    };
    let generator = LibdocCommand::new(&cli.generator).with_pythonpath(&cli.pythonpath);
    let locator = SearchPathLocator::from_env(&cli.pythonpath).with_interpreter(&cli.python);
    let timestamp = format_timestamp(chrono::Local::now().naive_local());

    let (tx, rx) = std::sync::mpsc::channel();
    let printer = std::thread::spawn(move || {
        for event in rx {
            output::print_run_event(&event);
        }
    });
    let result = pipeline::run(
        &cli.resources_dirs,
        &options,
        &generator,
        &locator,
        &timestamp,
        Some(&tx),
    );
    drop(tx);
    printer.join().map_err(|_| "output thread panicked")?;

    let report = result?;
    output::print_report(&report);
    Ok(ExitCode::from(report.exit_code()))
}
