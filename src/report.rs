//! # Report Module
//!
//! This module writes a machine-readable JSON report of a run.
//!
//! The report holds a summary, every diagnostic with its position and
//! suggested fix, and the files that could not be analysed.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::Local;
use serde::Serialize;

use crate::diagnostic::{Diagnostic, FindingKind};
use crate::output::{DiagnosticCounts, make_relative_path};
use crate::processor::RunSummary;

/// Summary section of the report.
#[derive(Debug, Clone, Serialize)]
pub struct ReportSummary {
  pub files_processed: usize,
  pub files_with_findings: usize,
  pub files_failed: usize,
  pub files_fixed: usize,
  pub missing_headers: usize,
  pub template_mismatches: usize,
  pub processing_time_seconds: f64,
  /// Timestamp when the report was generated
  #[serde(skip_serializing_if = "Option::is_none")]
  pub timestamp: Option<i64>,
}

impl ReportSummary {
  pub fn new(summary: &RunSummary, diagnostics: &[Diagnostic]) -> Self {
    let counts = DiagnosticCounts::from_diagnostics(diagnostics);
    Self {
      files_processed: summary.files_processed,
      files_with_findings: summary.files_with_findings,
      files_failed: summary.files_failed,
      files_fixed: summary.files_fixed,
      missing_headers: counts.missing,
      template_mismatches: counts.mismatched,
      processing_time_seconds: summary.elapsed.as_secs_f64(),
      timestamp: Some(Local::now().timestamp()),
    }
  }
}

/// One diagnostic in the report.
#[derive(Debug, Clone, Serialize)]
pub struct DiagnosticEntry {
  pub path: String,
  pub kind: FindingKind,
  pub message: String,
  pub line: usize,
  pub column: usize,
  pub end_line: usize,
  pub end_column: usize,
  pub fixable: bool,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub fix_error: Option<String>,
  #[serde(skip_serializing_if = "Vec::is_empty")]
  pub actual: Vec<String>,
  #[serde(skip_serializing_if = "Vec::is_empty")]
  pub expected: Vec<String>,
}

impl DiagnosticEntry {
  fn new(diagnostic: &Diagnostic, workspace_root: Option<&Path>) -> Self {
    let (actual, expected) = diagnostic
      .fix
      .as_ref()
      .map(|fix| (fix.actual.clone(), fix.expected.clone()))
      .unwrap_or_default();
    Self {
      path: make_relative_path(&diagnostic.path, workspace_root),
      kind: diagnostic.kind,
      message: diagnostic.message.clone(),
      line: diagnostic.start.line,
      column: diagnostic.start.column,
      end_line: diagnostic.end.line,
      end_column: diagnostic.end.column,
      fixable: diagnostic.fix.is_some(),
      fix_error: diagnostic.fix_error.clone(),
      actual,
      expected,
    }
  }
}

/// A file that could not be analysed.
#[derive(Debug, Clone, Serialize)]
pub struct ErrorEntry {
  pub path: String,
  pub error: String,
}

/// The complete report document.
#[derive(Debug, Clone, Serialize)]
pub struct Report {
  pub summary: ReportSummary,
  pub diagnostics: Vec<DiagnosticEntry>,
  pub errors: Vec<ErrorEntry>,
}

impl Report {
  /// Builds a report from the outcome of a run.
  ///
  /// # Parameters
  ///
  /// * `summary` - Totals returned by the processor
  /// * `diagnostics` - Every diagnostic, in output order
  /// * `errors` - Files that failed, with their error messages
  /// * `workspace_root` - Paths are written relative to this directory
  pub fn new(
    summary: &RunSummary,
    diagnostics: &[Diagnostic],
    errors: &[(PathBuf, String)],
    workspace_root: Option<&Path>,
  ) -> Self {
    Self {
      summary: ReportSummary::new(summary, diagnostics),
      diagnostics: diagnostics
        .iter()
        .map(|diagnostic| DiagnosticEntry::new(diagnostic, workspace_root))
        .collect(),
      errors: errors
        .iter()
        .map(|(path, error)| ErrorEntry {
          path: make_relative_path(path, workspace_root),
          error: error.clone(),
        })
        .collect(),
    }
  }

  /// Serializes the report as pretty-printed JSON.
  pub fn to_json(&self) -> Result<String> {
    serde_json::to_string_pretty(self).context("Failed to serialize report")
  }
}

/// Report generator writing JSON reports to disk.
pub struct ReportGenerator<'a> {
  /// Path where the report will be saved
  output_path: &'a Path,
}

impl<'a> ReportGenerator<'a> {
  pub const fn new(output_path: &'a Path) -> Self {
    Self { output_path }
  }

  /// Writes `report` to the output path.
  ///
  /// # Returns
  ///
  /// `Ok(())` if the report was written, or an error if it couldn't be
  /// serialized or written to disk.
  pub fn generate(&self, report: &Report) -> Result<()> {
    let content = report.to_json()?;
    fs::write(self.output_path, content)
      .with_context(|| format!("Failed to write report to {}", self.output_path.display()))
  }
}
