//! # Diagnostic Module
//!
//! Types describing what the analyzer found and how to fix it.
//!
//! A [`Finding`] is produced by the analyzer in header-relative coordinates.
//! The position remapper turns it into a [`Diagnostic`] with absolute file
//! positions and a ready-to-apply [`TextEdit`]. Diagnostics are delivered to a
//! [`DiagnosticSink`].

use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};

use serde::Serialize;

use crate::header::HeaderLocation;
use crate::position::Position;

/// Message reported when a file has no header at all.
pub const MISSING_HEADER_MESSAGE: &str = "missed copyright header";

/// Message reported when the header does not satisfy the template.
pub const TEMPLATE_MISMATCH_MESSAGE: &str = "template doesn't match";

/// What kind of problem a finding describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum FindingKind {
  MissingHeader,
  TemplateMismatch,
}

impl FindingKind {
  pub const fn message(self) -> &'static str {
    match self {
      Self::MissingHeader => MISSING_HEADER_MESSAGE,
      Self::TemplateMismatch => TEMPLATE_MISMATCH_MESSAGE,
    }
  }
}

/// A zero-based (line, byte column) pair inside the extracted header text.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct HeaderPosition {
  pub line: usize,
  pub column: usize,
}

/// Whether a fix adds a new header or rewrites the existing one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FixKind {
  Insert,
  Replace,
}

/// A suggested fix, before it is anchored in the file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fix {
  pub kind: FixKind,
  /// Header lines as found in the file (empty for an insertion).
  pub actual: Vec<String>,
  /// Header lines the template expects.
  pub expected: Vec<String>,
  /// `expected` reflowed into a comment, ending with a newline.
  pub rendered: String,
}

/// One problem found in a file, in header-relative coordinates.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Finding {
  pub kind: FindingKind,
  pub message: String,
  pub position: HeaderPosition,
  pub fix: Option<Fix>,
  /// Why no fix is offered, when one could not be rendered.
  pub fix_error: Option<String>,
  /// Where the header is, or where a new one would go.
  pub location: HeaderLocation,
}

/// A byte-range replacement in a file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TextEdit {
  pub start: usize,
  pub end: usize,
  pub new_text: String,
}

impl TextEdit {
  /// Returns `content` with this edit applied.
  ///
  /// Out-of-range offsets are clamped to the end of the content.
  pub fn apply(&self, content: &str) -> String {
    let start = self.start.min(content.len());
    let end = self.end.clamp(start, content.len());
    let mut result = String::with_capacity(content.len() + self.new_text.len());
    result.push_str(&content[..start]);
    result.push_str(&self.new_text);
    result.push_str(&content[end..]);
    result
  }
}

/// A fix anchored in absolute file coordinates.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SuggestedFix {
  pub actual: Vec<String>,
  pub expected: Vec<String>,
  pub edit: TextEdit,
}

/// A finding with absolute positions, ready for reporting.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Diagnostic {
  pub path: PathBuf,
  pub kind: FindingKind,
  pub message: String,
  pub start: Position,
  pub end: Position,
  pub fix: Option<SuggestedFix>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub fix_error: Option<String>,
}

impl Diagnostic {
  /// Formats the diagnostic as `path:line:column: message`.
  pub fn location_line(&self) -> String {
    format!(
      "{}:{}:{}: {}",
      self.path.display(),
      self.start.line,
      self.start.column,
      self.message
    )
  }
}

/// Receives the outcome of analysing each file.
///
/// Implementations are shared between worker threads.
pub trait DiagnosticSink: Send + Sync {
  /// Called once per diagnostic.
  fn report(&self, diagnostic: Diagnostic);

  /// Called when a file could not be analysed at all.
  fn file_error(&self, path: &Path, error: &anyhow::Error);
}

/// A sink that keeps everything in memory.
#[derive(Debug, Default)]
pub struct CollectingSink {
  diagnostics: Mutex<Vec<Diagnostic>>,
  errors: Mutex<Vec<(PathBuf, String)>>,
}

impl CollectingSink {
  pub fn new() -> Self {
    Self::default()
  }

  /// Returns the collected diagnostics sorted by path and offset, so the
  /// result does not depend on the order workers finished in.
  pub fn diagnostics(&self) -> Vec<Diagnostic> {
    let mut diagnostics = self.diagnostics.lock().unwrap_or_else(PoisonError::into_inner).clone();
    diagnostics.sort_by(|a, b| a.path.cmp(&b.path).then(a.start.offset.cmp(&b.start.offset)));
    diagnostics
  }

  /// Returns the per-file errors sorted by path.
  pub fn errors(&self) -> Vec<(PathBuf, String)> {
    let mut errors = self.errors.lock().unwrap_or_else(PoisonError::into_inner).clone();
    errors.sort();
    errors
  }
}

impl DiagnosticSink for CollectingSink {
  fn report(&self, diagnostic: Diagnostic) {
    self
      .diagnostics
      .lock()
      .unwrap_or_else(PoisonError::into_inner)
      .push(diagnostic);
  }

  fn file_error(&self, path: &Path, error: &anyhow::Error) {
    self
      .errors
      .lock()
      .unwrap_or_else(PoisonError::into_inner)
      .push((path.to_path_buf(), format!("{error:#}")));
  }
}
