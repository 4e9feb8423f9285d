//! # Processor Module
//!
//! This module runs the analyzer over many files in parallel and delivers the
//! results to a [`DiagnosticSink`].
//!
//! The module is organized into several submodules:
//! - [`file_io`] - File reading and writing operations
//! - [`file_collector`] - File collection and git-change filtering
//!
//! The [`Processor`] owns a fixed-size worker pool. The file list is fully
//! enumerated before any worker starts, and each file is analysed
//! independently: the analyzer and its values are shared read-only, and any
//! per-file values are private to the worker handling that file. A failure on
//! one file is reported through [`DiagnosticSink::file_error`] and never stops
//! the others.

mod file_collector;
mod file_io;

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
pub use file_collector::{FileCollector, SKIPPED_DIRS, absolutize_path, filter_changed, is_go_file};
pub use file_io::FileIO;
use rayon::prelude::*;
use rayon::{ThreadPool, ThreadPoolBuilder};
use tracing::{debug, trace, warn};

use crate::analyzer::Analyzer;
use crate::diagnostic::{Diagnostic, DiagnosticSink};
use crate::source::Target;

/// Configuration for creating a Processor instance.
pub struct ProcessorConfig {
  pub analyzer: Analyzer,

  /// Number of worker threads.
  pub parallel: usize,

  /// Apply suggested fixes to the files on disk.
  pub fix: bool,
}

impl ProcessorConfig {
  /// Creates a new ProcessorConfig using the analyzer's worker count.
  ///
  /// Use struct update syntax to override specific fields:
  /// ```ignore
  /// ProcessorConfig {
  ///     fix: true,
  ///     ..ProcessorConfig::new(analyzer)
  /// }
  /// ```
  pub fn new(analyzer: Analyzer) -> Self {
    let parallel = analyzer.settings().parallel;
    Self {
      analyzer,
      parallel,
      fix: false,
    }
  }
}

/// Totals for one run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunSummary {
  pub files_processed: usize,
  pub files_with_findings: usize,
  pub files_failed: usize,
  pub files_fixed: usize,
  pub elapsed: Duration,
}

impl RunSummary {
  /// Returns `true` if any file produced a diagnostic.
  pub const fn has_findings(&self) -> bool {
    self.files_with_findings > 0
  }
}

#[derive(Default)]
struct Counters {
  processed: AtomicUsize,
  with_findings: AtomicUsize,
  failed: AtomicUsize,
  fixed: AtomicUsize,
}

/// Processor for checking headers across many files.
///
/// The `Processor` is responsible for:
/// - Running the analyzer on a fixed-size pool of worker threads
/// - Skipping files that are not Go sources
/// - Applying fixes when requested
/// - Isolating per-file failures
pub struct Processor {
  analyzer: Analyzer,
  pool: ThreadPool,
  parallel: usize,
  fix: bool,
}

impl Processor {
  /// Creates a processor and its worker pool.
  ///
  /// # Errors
  ///
  /// Fails if `parallel` is zero or the pool cannot be started.
  pub fn new(config: ProcessorConfig) -> Result<Self> {
    anyhow::ensure!(config.parallel > 0, "parallel must be at least 1");

    let pool = ThreadPoolBuilder::new()
      .num_threads(config.parallel)
      .thread_name(|index| format!("go-header-worker-{index}"))
      .build()
      .context("Failed to start worker pool")?;

    debug!("Started worker pool with {} threads", config.parallel);

    Ok(Self {
      analyzer: config.analyzer,
      pool,
      parallel: config.parallel,
      fix: config.fix,
    })
  }

  pub const fn analyzer(&self) -> &Analyzer {
    &self.analyzer
  }

  pub const fn parallel(&self) -> usize {
    self.parallel
  }

  /// Analyses every file and reports to `sink`.
  ///
  /// # Parameters
  ///
  /// * `files` - The complete list of files to check
  /// * `sink` - Receives diagnostics and per-file errors
  ///
  /// # Returns
  ///
  /// Totals for the run.
  pub fn run(&self, files: &[PathBuf], sink: &dyn DiagnosticSink) -> RunSummary {
    let start = Instant::now();
    let counters = Counters::default();

    debug!("Processing {} files with {} workers", files.len(), self.parallel);

    self.pool.install(|| {
      files.par_iter().for_each(|path| {
        if !is_go_file(path) {
          trace!("Skipping non-Go file {}", path.display());
          return;
        }
        counters.processed.fetch_add(1, Ordering::Relaxed);

        match self.process_file(path) {
          Ok(None) => {}
          Ok(Some((diagnostic, fixed))) => {
            counters.with_findings.fetch_add(1, Ordering::Relaxed);
            if fixed {
              counters.fixed.fetch_add(1, Ordering::Relaxed);
            }
            sink.report(diagnostic);
          }
          Err(err) => {
            warn!("Skipping {}: {:#}", path.display(), err);
            counters.failed.fetch_add(1, Ordering::Relaxed);
            sink.file_error(path, &err);
          }
        }
      });
    });

    let summary = RunSummary {
      files_processed: counters.processed.into_inner(),
      files_with_findings: counters.with_findings.into_inner(),
      files_failed: counters.failed.into_inner(),
      files_fixed: counters.fixed.into_inner(),
      elapsed: start.elapsed(),
    };
    debug!(
      "Processed {} files in {}ms",
      summary.files_processed,
      summary.elapsed.as_millis()
    );
    summary
  }

  /// Checks a single file without touching it.
  pub fn check_file(&self, path: &Path) -> Result<Option<Diagnostic>> {
    let content = FileIO::read_source(path)?;
    let target = Target::parse(path, content).with_context(|| format!("Failed to parse {}", path.display()))?;
    self.analyzer.check(&target)
  }

  /// Checks one file and, in fix mode, rewrites it. Returns the diagnostic and
  /// whether the file was rewritten.
  fn process_file(&self, path: &Path) -> Result<Option<(Diagnostic, bool)>> {
    let content = FileIO::read_source(path)?;
    let target = Target::parse(path, content).with_context(|| format!("Failed to parse {}", path.display()))?;

    let Some(diagnostic) = self.analyzer.check(&target)? else {
      return Ok(None);
    };

    let mut fixed = false;
    if self.fix
      && let Some(fix) = &diagnostic.fix
    {
      let updated = fix.edit.apply(target.content());
      FileIO::write_file(path, &updated)?;
      debug!("Fixed header in {}", path.display());
      fixed = true;
    }

    Ok(Some((diagnostic, fixed)))
  }
}
