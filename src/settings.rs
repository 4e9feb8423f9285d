//! # Settings Module
//!
//! The resolved configuration of one analysis run.

use chrono::{Datelike, Local};

use crate::templates::{CommentStyle, Delimiters};
use crate::value::ValueSet;

/// Everything the analyzer needs to know about a run.
///
/// Settings are produced by the configuration loader (or built directly by
/// library users) and validated by [`Analyzer::new`](crate::analyzer::Analyzer::new).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
  /// The header template. `None` or blank disables the check.
  pub template: Option<String>,
  /// Placeholder markers used in the template.
  pub delimiters: Delimiters,
  /// Built-in and user values, unresolved.
  pub values: ValueSet,
  /// Style used to render a header for files that have none.
  pub comment_style: CommentStyle,
  /// Number of worker threads.
  pub parallel: usize,
  /// Skip cgo preamble comments when looking for the header.
  pub cgo: bool,
}

impl Default for Settings {
  fn default() -> Self {
    Self {
      template: None,
      delimiters: Delimiters::default(),
      values: ValueSet::builtin(current_year()),
      comment_style: CommentStyle::default(),
      parallel: num_cpus::get(),
      cgo: false,
    }
  }
}

impl Settings {
  /// Creates settings for `template` with every other field at its default.
  pub fn new(template: impl Into<String>) -> Self {
    Self {
      template: Some(template.into()),
      ..Default::default()
    }
  }

  /// Returns the template normalized like an extracted header: trimmed as a
  /// whole and with trailing whitespace stripped from every line. `None` when
  /// the check is disabled.
  pub fn template_text(&self) -> Option<String> {
    let text = self.template.as_deref()?.trim();
    if text.is_empty() {
      return None;
    }
    Some(text.lines().map(str::trim_end).collect::<Vec<_>>().join("\n"))
  }
}

/// The current local calendar year.
pub fn current_year() -> i32 {
  Local::now().year()
}
