//! # Check Command
//!
//! This module implements the header check, the default command when no
//! subcommand is specified.

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Args;
use tracing::debug;

use crate::analyzer::Analyzer;
use crate::config::load_config;
use crate::diagnostic::CollectingSink;
use crate::diff::DiffManager;
use crate::git::{GitModYear, changed_files, workdir_root};
use crate::logging::{ColorMode, init_tracing, set_quiet, set_verbose};
use crate::output::{
  DiagnosticCounts, print_all_files_ok, print_blank_line, print_diagnostic, print_file_error, print_fixed_files,
  print_hint, print_start_message, print_summary,
};
use crate::processor::{FileCollector, Processor, ProcessorConfig, filter_changed};
use crate::report::{Report, ReportGenerator};
use crate::{info_log, verbose_log};

/// Arguments for the check command
#[derive(Args, Debug, Default)]
pub struct CheckArgs {
  /// Files or directories to check. Directories are walked recursively,
  /// honouring .gitignore and skipping vendor and testdata. Defaults to the
  /// current directory.
  #[arg(required = false, value_name = "PATHS")]
  pub paths: Vec<PathBuf>,

  /// Path to config file (default: .go-header.yml in the current directory)
  #[arg(long, short = 'c', value_name = "FILE")]
  pub config: Option<PathBuf>,

  /// Number of worker threads (default: config value, then number of CPUs)
  #[arg(long, short = 'j', value_name = "N")]
  pub parallel: Option<usize>,

  /// Apply the suggested header fixes in place
  #[arg(long)]
  pub fix: bool,

  /// Show a diff of the expected header for each finding
  #[arg(long)]
  pub show_diff: bool,

  /// Write a JSON report of the findings to the specified path
  #[arg(long, value_name = "OUTPUT")]
  pub report_json: Option<PathBuf>,

  /// Ratchet mode: only check files that have changed relative to a git
  /// reference
  #[arg(long, value_name = "REF")]
  pub ratchet: Option<String>,

  /// With --ratchet, only check files added since the reference
  #[arg(long, requires = "ratchet")]
  pub new_only: bool,

  /// Increase verbosity (-v info, -vv debug, -vvv trace)
  #[arg(short, long, action = clap::ArgAction::Count)]
  pub verbose: u8,

  /// Suppress all output except diagnostics and errors
  #[arg(short, long, conflicts_with = "verbose")]
  pub quiet: bool,

  /// Control when to use colored output (auto, never, always)
  #[arg(
    long,
    value_name = "WHEN",
    num_args = 0..=1,
    default_value_t = ColorMode::Auto,
    default_missing_value = "always",
    value_enum
  )]
  pub colors: ColorMode,
}

/// Run the check command with the given arguments.
///
/// # Returns
///
/// `ExitCode::SUCCESS` when no diagnostic was emitted, exit code 1 otherwise.
/// Configuration problems are returned as errors.
pub fn run_check(args: CheckArgs) -> Result<ExitCode> {
  init_tracing(args.quiet, args.verbose);

  if args.verbose > 0 {
    set_verbose();
  } else if args.quiet {
    set_quiet();
  }
  args.colors.apply();

  let workdir = std::env::current_dir().context("Failed to get current directory")?;

  let config = load_config(args.config.as_deref(), &workdir)?;
  let mut settings = config.into_settings().context("Invalid configuration")?;
  if let Some(parallel) = args.parallel {
    anyhow::ensure!(parallel > 0, "--parallel must be at least 1");
    settings.parallel = parallel;
  }
  debug!("Running with {} worker(s), cgo: {}", settings.parallel, settings.cgo);

  let analyzer = Analyzer::new(settings, Box::new(GitModYear)).context("Invalid configuration")?;

  let paths = if args.paths.is_empty() {
    vec![PathBuf::from(".")]
  } else {
    args.paths.clone()
  };
  let mut files = FileCollector::new().collect(&paths)?;

  if let Some(reference) = &args.ratchet {
    let changed = changed_files(reference, args.new_only)?;
    let repo_root = workdir_root()?;
    files = filter_changed(files, &changed, &repo_root)?;
    info_log!("Ratchet mode: {} file(s) changed relative to {}", files.len(), reference);
  }

  print_start_message(files.len(), args.fix);

  if files.is_empty() {
    print_blank_line();
    print_all_files_ok();
    return Ok(ExitCode::SUCCESS);
  }

  let processor = Processor::new(ProcessorConfig {
    fix: args.fix,
    ..ProcessorConfig::new(analyzer)
  })?;
  let sink = CollectingSink::new();
  let summary = processor.run(&files, &sink);

  let diagnostics = sink.diagnostics();
  let errors = sink.errors();
  let counts = DiagnosticCounts::from_diagnostics(&diagnostics);
  let root = Some(workdir.as_path());

  print_blank_line();

  let diff_manager = DiffManager::new(args.show_diff);
  for diagnostic in &diagnostics {
    print_diagnostic(diagnostic, root);
    diff_manager.display(diagnostic, root);
  }
  for (path, error) in &errors {
    print_file_error(path, error, root);
  }

  if args.fix {
    let fixed: Vec<&Path> = diagnostics
      .iter()
      .filter(|diagnostic| diagnostic.fix.is_some())
      .map(|diagnostic| diagnostic.path.as_path())
      .collect();
    if !fixed.is_empty() {
      if !diagnostics.is_empty() {
        print_blank_line();
      }
      print_fixed_files(&fixed, root);
    }
  }

  if diagnostics.is_empty() && errors.is_empty() {
    print_all_files_ok();
  }

  print_blank_line();
  print_summary(&summary, &counts);

  if !args.fix && counts.fixable > 0 {
    print_blank_line();
    print_hint("Run with --fix to apply the suggested headers.");
  }

  if let Some(ref output_path) = args.report_json {
    let report = Report::new(&summary, &diagnostics, &errors, root);
    if let Err(e) = ReportGenerator::new(output_path).generate(&report) {
      eprintln!("Error generating JSON report: {e:#}");
    } else {
      verbose_log!("Generated JSON report at {}", output_path.display());
    }
  }

  if counts.total() > 0 {
    Ok(ExitCode::from(1))
  } else {
    Ok(ExitCode::SUCCESS)
  }
}
