//! # Source Module
//!
//! A lightweight view of a Go source file: its leading comments, grouped the
//! way the Go parser groups them, and the offset of the first real token.
//!
//! Only the region before the package clause is scanned. Comments are
//! grouped when a comment starts on the same line as the previous one ends,
//! or on the line right after it; a blank line starts a new group.

use std::ops::Range;
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::position::LineIndex;

const BOM: &str = "\u{feff}";

/// Errors raised while scanning a source file.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
  #[error("unterminated block comment starting at line {line}")]
  UnterminatedComment { line: usize },
}

/// A single `//` or `/* */` comment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Comment {
  text: String,
  span: Range<usize>,
}

impl Comment {
  /// The comment text including its markers. Line comments exclude the
  /// trailing newline and any `\r`.
  pub fn text(&self) -> &str {
    &self.text
  }

  pub fn span(&self) -> Range<usize> {
    self.span.clone()
  }

  pub fn start(&self) -> usize {
    self.span.start
  }

  pub fn end(&self) -> usize {
    self.span.end
  }

  pub fn is_block(&self) -> bool {
    self.text.starts_with("/*")
  }
}

/// Adjacent comments with no blank line between them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommentGroup {
  comments: Vec<Comment>,
}

impl CommentGroup {
  pub fn comments(&self) -> &[Comment] {
    &self.comments
  }

  pub fn start(&self) -> usize {
    self.comments.first().map_or(0, Comment::start)
  }

  pub fn end(&self) -> usize {
    self.comments.last().map_or(0, Comment::end)
  }

  /// Returns `true` if any comment in the group contains `needle`.
  pub fn contains(&self, needle: &str) -> bool {
    self.comments.iter().any(|comment| comment.text.contains(needle))
  }
}

/// One Go file under analysis.
#[derive(Debug, Clone)]
pub struct Target {
  path: PathBuf,
  content: String,
  groups: Vec<CommentGroup>,
  body_start: usize,
  package_offset: usize,
  lines: LineIndex,
}

impl Target {
  /// Scans the leading comments of `content`.
  ///
  /// # Parameters
  ///
  /// * `path` - Path reported in diagnostics
  /// * `content` - The complete file content
  ///
  /// # Returns
  ///
  /// The target, or an error if a leading block comment never terminates.
  pub fn parse(path: impl Into<PathBuf>, content: impl Into<String>) -> Result<Self, ParseError> {
    let content = content.into();
    let lines = LineIndex::new(&content);
    let body_start = if content.starts_with(BOM) { BOM.len() } else { 0 };

    let (comments, package_offset) = scan_leading_comments(&content, body_start).map_err(|start| {
      ParseError::UnterminatedComment {
        line: lines.line_of(start),
      }
    })?;
    let groups = group_comments(comments, &lines);

    Ok(Self {
      path: path.into(),
      content,
      groups,
      body_start,
      package_offset,
      lines,
    })
  }

  pub fn path(&self) -> &Path {
    &self.path
  }

  pub fn content(&self) -> &str {
    &self.content
  }

  /// Comment groups found before the first token.
  pub fn comment_groups(&self) -> &[CommentGroup] {
    &self.groups
  }

  /// Offset of the first byte after a leading byte-order mark.
  pub const fn body_start(&self) -> usize {
    self.body_start
  }

  /// Offset of the first non-comment token, or the file length.
  pub const fn package_offset(&self) -> usize {
    self.package_offset
  }

  pub const fn line_index(&self) -> &LineIndex {
    &self.lines
  }
}

/// Collects the comments before the first token. On an unterminated block
/// comment, returns its start offset as the error.
fn scan_leading_comments(content: &str, from: usize) -> Result<(Vec<Comment>, usize), usize> {
  let bytes = content.as_bytes();
  let mut comments = Vec::new();
  let mut i = from;

  while i < bytes.len() {
    match bytes[i] {
      b' ' | b'\t' | b'\r' | b'\n' => i += 1,
      b'/' if bytes.get(i + 1) == Some(&b'/') => {
        let line_end = content[i..].find('\n').map_or(bytes.len(), |n| i + n);
        let text = content[i..line_end].trim_end_matches('\r');
        comments.push(Comment {
          text: text.to_string(),
          span: i..i + text.len(),
        });
        i = line_end;
      }
      b'/' if bytes.get(i + 1) == Some(&b'*') => {
        let Some(close) = content[i + 2..].find("*/") else {
          return Err(i);
        };
        let end = i + 2 + close + 2;
        comments.push(Comment {
          text: content[i..end].to_string(),
          span: i..end,
        });
        i = end;
      }
      _ => break,
    }
  }

  Ok((comments, i))
}

fn group_comments(comments: Vec<Comment>, lines: &LineIndex) -> Vec<CommentGroup> {
  let mut groups: Vec<CommentGroup> = Vec::new();
  let mut last_end_line = 0;

  for comment in comments {
    let start_line = lines.line_of(comment.start());
    let end_line = lines.line_of(comment.end().saturating_sub(1).max(comment.start()));

    match groups.last_mut() {
      Some(group) if start_line <= last_end_line + 1 => group.comments.push(comment),
      _ => groups.push(CommentGroup {
        comments: vec![comment],
      }),
    }
    last_end_line = end_line;
  }

  groups
}

#[cfg(test)]
mod tests {
  use super::*;

  fn texts(target: &Target) -> Vec<Vec<&str>> {
    target
      .comment_groups()
      .iter()
      .map(|group| group.comments().iter().map(Comment::text).collect())
      .collect()
  }

  #[test]
  fn test_groups_by_blank_lines() {
    let content = "// a\n// b\n\n/* c\n*/ // d\n// e\n\npackage main\n// not scanned\n";
    let target = Target::parse("a.go", content).expect("parse");

    assert_eq!(texts(&target), vec![vec!["// a", "// b"], vec!["/* c\n*/", "// d", "// e"]]);
    assert_eq!(&content[target.package_offset()..], "package main\n// not scanned\n");
  }

  #[test]
  fn test_strips_carriage_returns() {
    let target = Target::parse("a.go", "// a\r\n// b\r\npackage a\r\n").expect("parse");
    assert_eq!(texts(&target), vec![vec!["// a", "// b"]]);
    assert_eq!(target.comment_groups()[0].comments()[1].span(), 6..10);
  }

  #[test]
  fn test_skips_bom() {
    let target = Target::parse("a.go", "\u{feff}// a\npackage a\n").expect("parse");
    assert_eq!(target.body_start(), 3);
    assert_eq!(target.comment_groups()[0].start(), 3);
  }

  #[test]
  fn test_no_comments() {
    let target = Target::parse("a.go", "\n\npackage a\n").expect("parse");
    assert!(target.comment_groups().is_empty());
    assert_eq!(target.package_offset(), 2);

    let empty = Target::parse("a.go", "").expect("parse");
    assert!(empty.comment_groups().is_empty());
    assert_eq!(empty.package_offset(), 0);
  }

  #[test]
  fn test_unterminated_block_comment() {
    let err = Target::parse("a.go", "// ok\n\n/* never closed\npackage a\n").expect_err("should fail");
    assert_eq!(err, ParseError::UnterminatedComment { line: 3 });
  }

  #[test]
  fn test_group_contains() {
    let target = Target::parse("a.go", "// Code generated by x. DO NOT EDIT.\n\npackage a\n").expect("parse");
    assert!(target.comment_groups()[0].contains("DO NOT EDIT"));
  }
}
