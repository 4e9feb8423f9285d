//! # Position Module
//!
//! Line bookkeeping for source files and the remapper that turns
//! header-relative findings into absolute diagnostics.

use serde::Serialize;

use crate::diagnostic::{Diagnostic, Finding, SuggestedFix, TextEdit};
use crate::header::HeaderLocation;
use crate::source::Target;

/// An absolute position in a file. `line` and `column` are 1-based, `column`
/// counts bytes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub struct Position {
  pub offset: usize,
  pub line: usize,
  pub column: usize,
}

/// Line-start offset table of a file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LineIndex {
  starts: Vec<usize>,
  len: usize,
}

impl LineIndex {
  pub fn new(content: &str) -> Self {
    let mut starts = vec![0];
    starts.extend(
      content
        .bytes()
        .enumerate()
        .filter(|&(_, b)| b == b'\n')
        .map(|(i, _)| i + 1),
    );
    Self {
      starts,
      len: content.len(),
    }
  }

  /// Number of lines, counting an empty last line after a trailing newline.
  pub fn line_count(&self) -> usize {
    self.starts.len()
  }

  /// Returns the 1-based line containing `offset`.
  pub fn line_of(&self, offset: usize) -> usize {
    match self.starts.binary_search(&offset.min(self.len)) {
      Ok(index) => index + 1,
      Err(index) => index,
    }
  }

  /// Returns the offset where 1-based `line` starts.
  pub fn line_start(&self, line: usize) -> Option<usize> {
    line.checked_sub(1).and_then(|index| self.starts.get(index)).copied()
  }

  /// Returns the offset just past the newline ending `line`, or the end of
  /// the file for the last line.
  pub fn line_end(&self, line: usize) -> usize {
    self.starts.get(line).copied().unwrap_or(self.len)
  }

  pub fn position(&self, offset: usize) -> Position {
    let offset = offset.min(self.len);
    let line = self.line_of(offset);
    let start = self.line_start(line).unwrap_or(0);
    Position {
      offset,
      line,
      column: offset - start + 1,
    }
  }
}

/// Returns `true` if the line starting at `offset` is empty or whitespace.
fn line_is_blank(content: &str, offset: usize) -> bool {
  content[offset..].split('\n').next().is_none_or(|line| line.trim().is_empty())
}

/// Returns `true` if the line ending right before `offset` is empty or
/// whitespace. `offset` must be a line start.
fn previous_line_is_blank(content: &str, offset: usize) -> bool {
  let before = &content[..offset];
  let before = before.strip_suffix('\n').unwrap_or(before);
  before.rsplit('\n').next().is_none_or(|line| line.trim().is_empty())
}

/// Converts a header-relative finding into an absolute diagnostic.
///
/// A replacement covers every physical line the header occupies. If the
/// header is followed directly by code, a blank line is added after the fix.
/// An insertion is separated from neighbouring non-blank lines by one blank
/// line on each side.
///
/// # Parameters
///
/// * `target` - The file the finding belongs to
/// * `finding` - The analyzer's finding
///
/// # Returns
///
/// The diagnostic, with a suggested edit when the finding carried a fix.
pub fn remap(target: &Target, finding: Finding) -> Diagnostic {
  let content = target.content();
  let index = target.line_index();

  let (start, end, edit_range) = match &finding.location {
    HeaderLocation::Missing { anchor, .. } => {
      let anchor = (*anchor).min(content.len());
      let position = index.position(anchor);
      (position, position, (anchor, anchor))
    }
    HeaderLocation::Present(header) => {
      let span = header.span();
      let first_line = index.line_of(span.start);
      let line_start = index.line_start(first_line).unwrap_or(span.start);
      let edit_start = if content[line_start..span.start].trim().is_empty() {
        line_start
      } else {
        span.start
      };

      let last_line = index.line_of(span.end.saturating_sub(1).max(span.start));
      let line_end = index.line_end(last_line);
      let edit_end = if content[span.end..line_end].trim().is_empty() {
        line_end
      } else {
        span.end
      };

      let start = index.position(header.offset_of(finding.position));
      (start, index.position(span.end), (edit_start, edit_end))
    }
  };

  let fix = finding.fix.map(|fix| {
    let (edit_start, edit_end) = edit_range;
    let mut new_text = String::new();

    if matches!(finding.location, HeaderLocation::Missing { .. }) && edit_start > target.body_start() {
      if !content[..edit_start].ends_with('\n') {
        new_text.push('\n');
      }
      if !previous_line_is_blank(content, edit_start) {
        new_text.push('\n');
      }
    }

    new_text.push_str(&fix.rendered);
    if edit_end < content.len() && !line_is_blank(content, edit_end) {
      new_text.push('\n');
    }

    SuggestedFix {
      actual: fix.actual,
      expected: fix.expected,
      edit: TextEdit {
        start: edit_start,
        end: edit_end,
        new_text,
      },
    }
  });

  Diagnostic {
    path: target.path().to_path_buf(),
    kind: finding.kind,
    message: finding.message,
    start,
    end,
    fix,
    fix_error: finding.fix_error,
  }
}
