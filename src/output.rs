//! # Output Module
//!
//! This module centralizes all user-facing output for go-header.
//! It provides consistent formatting, colors, and symbols for terminal output.
//!
//! ## Design Goals
//!
//! - **Compiler-like**: Diagnostics print as `path:line:col: message`
//! - **Progressive**: More detail with `-v`, silence with `-q`
//! - **Scriptable**: Diagnostics always go to stdout, even with `-q`

use std::path::Path;

use owo_colors::{OwoColorize, Stream};

use crate::diagnostic::{Diagnostic, FindingKind};
use crate::logging::{is_quiet, is_verbose};
use crate::processor::RunSummary;

/// Symbols used in output
pub mod symbols {
  /// Success/header matches
  pub const SUCCESS: &str = "\u{2713}"; // ✓
  /// Finding/failure
  pub const FAILURE: &str = "\u{2717}"; // ✗
  /// Header rewritten
  pub const FIXED: &str = "\u{21bb}"; // ↻
}

/// Maximum number of fixed files listed before truncating
const DEFAULT_FILE_LIST_LIMIT: usize = 20;

/// Print the initial "Checking N files..." or "Fixing N files..." message.
pub fn print_start_message(file_count: usize, fix_mode: bool) {
  if is_quiet() {
    return;
  }

  let verb = if fix_mode { "Fixing" } else { "Checking" };
  println!("{} {} {}...", verb, file_count, plural(file_count, "file", "files"));
}

/// Print a blank line for visual separation (respects quiet mode).
pub fn print_blank_line() {
  if !is_quiet() {
    println!();
  }
}

/// Formats the `path:line:col` part of a diagnostic, with the path shown
/// relative to `workspace_root` when possible.
pub fn format_location(diagnostic: &Diagnostic, workspace_root: Option<&Path>) -> String {
  format!(
    "{}:{}:{}",
    make_relative_path(&diagnostic.path, workspace_root),
    diagnostic.start.line,
    diagnostic.start.column
  )
}

/// Print one diagnostic as `path:line:col: message`.
///
/// In verbose mode the reason a fix could not be offered follows on its own
/// line.
pub fn print_diagnostic(diagnostic: &Diagnostic, workspace_root: Option<&Path>) {
  let location = format_location(diagnostic, workspace_root);
  println!(
    "{}: {}",
    location.if_supports_color(Stream::Stdout, |s| s.bold()),
    diagnostic.message.if_supports_color(Stream::Stdout, |s| s.red())
  );

  if is_verbose()
    && let Some(reason) = &diagnostic.fix_error
  {
    println!(
      "  {} no fix available: {}",
      "note:".if_supports_color(Stream::Stdout, |s| s.dimmed()),
      reason
    );
  }
}

/// Print a file that could not be analysed. Goes to stderr.
pub fn print_file_error(path: &Path, error: &str, workspace_root: Option<&Path>) {
  eprintln!(
    "{} {}: {}",
    "error:".if_supports_color(Stream::Stderr, |s| s.red()),
    make_relative_path(path, workspace_root),
    error
  );
}

/// Print the list of files whose header was rewritten.
///
/// Shows up to `DEFAULT_FILE_LIST_LIMIT` files unless verbose.
pub fn print_fixed_files(files: &[&Path], workspace_root: Option<&Path>) {
  if is_quiet() || files.is_empty() {
    return;
  }

  let count = files.len();
  println!(
    "{} Fixed header in {} {}:",
    symbols::FIXED.if_supports_color(Stream::Stdout, |s| s.green()),
    count,
    plural(count, "file", "files")
  );

  let show_all = is_verbose();
  let limit = if show_all { count } else { DEFAULT_FILE_LIST_LIMIT };

  for file in files.iter().take(limit) {
    println!("  {}", make_relative_path(file, workspace_root));
  }

  if !show_all && count > limit {
    println!("  ... and {} more (use -v to see all)", count - limit);
  }
}

/// Print the success message when every header matches.
pub fn print_all_files_ok() {
  if is_quiet() {
    return;
  }

  println!(
    "{} All files have a valid header.",
    symbols::SUCCESS.if_supports_color(Stream::Stdout, |s| s.green())
  );
}

/// Counts of diagnostics by kind.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DiagnosticCounts {
  pub missing: usize,
  pub mismatched: usize,
  /// Diagnostics that carry a suggested fix.
  pub fixable: usize,
}

impl DiagnosticCounts {
  pub fn from_diagnostics(diagnostics: &[Diagnostic]) -> Self {
    let mut counts = Self::default();
    for diagnostic in diagnostics {
      match diagnostic.kind {
        FindingKind::MissingHeader => counts.missing += 1,
        FindingKind::TemplateMismatch => counts.mismatched += 1,
      }
      if diagnostic.fix.is_some() {
        counts.fixable += 1;
      }
    }
    counts
  }

  pub const fn total(&self) -> usize {
    self.missing + self.mismatched
  }
}

/// Print the processing summary.
///
/// Format: "Summary: X OK, Y missing, Z mismatched, W failed"
/// In verbose mode, also shows timing.
pub fn print_summary(summary: &RunSummary, counts: &DiagnosticCounts) {
  if is_quiet() {
    return;
  }

  let ok_count = summary
    .files_processed
    .saturating_sub(summary.files_with_findings + summary.files_failed);
  let color_count = |count: usize| {
    if count > 0 {
      count.if_supports_color(Stream::Stdout, |s| s.red()).to_string()
    } else {
      count.if_supports_color(Stream::Stdout, |s| s.cyan()).to_string()
    }
  };

  let mut summary_line = format!(
    "Summary: {} OK, {} missing, {} mismatched, {} failed",
    ok_count.if_supports_color(Stream::Stdout, |s| s.cyan()),
    color_count(counts.missing),
    color_count(counts.mismatched),
    color_count(summary.files_failed)
  );

  if is_verbose() {
    summary_line.push_str(&format!(" ({:.2}s)", summary.elapsed.as_secs_f64()));
  }

  println!("{}", summary_line);
}

/// Print a hint for the user about what to do next.
pub fn print_hint(message: &str) {
  if is_quiet() {
    return;
  }

  println!("{}", message.if_supports_color(Stream::Stdout, |s| s.yellow()));
}

/// Make a path relative to the workspace root for display.
pub fn make_relative_path(path: &Path, workspace_root: Option<&Path>) -> String {
  if let Some(root) = workspace_root {
    path
      .strip_prefix(root)
      .map(|p| p.to_string_lossy().to_string())
      .unwrap_or_else(|_| path.to_string_lossy().to_string())
  } else {
    path.to_string_lossy().to_string()
  }
}

const fn plural<'a>(count: usize, one: &'a str, many: &'a str) -> &'a str {
  if count == 1 { one } else { many }
}
