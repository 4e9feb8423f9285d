//! # Header Module
//!
//! Locates the license header of a Go file among its leading comments.
//!
//! The first comment group is skipped when it is a generator banner
//! (`Code generated ... DO NOT EDIT.`). Directive comments such as
//! `//go:build`, `// +build`, `//line` or `//export` are skipped one by one,
//! across groups. The first remaining comment starts the header:
//!
//! - a block comment is the whole header on its own, classified as
//!   [`CommentStyle::BlockStarAligned`] when its lines carry ` * ` bullets
//! - a line comment starts a run of consecutive `//` comments in the same
//!   group; inside the run only Go-style directives (`//go:build`,
//!   `//line `, no space after `//`) are dropped
//!
//! Every extracted line keeps the byte offset it starts at in the file, so a
//! position inside the header text maps back to the file exactly.

use std::ops::Range;
use std::sync::LazyLock;

use regex::Regex;
use tracing::trace;

use crate::diagnostic::HeaderPosition;
use crate::source::{Comment, CommentGroup, Target};
use crate::templates::CommentStyle;

/// Marker identifying generated files.
pub const GENERATED_MARKER: &str = "DO NOT EDIT";

const CGO_PREAMBLE_PREFIXES: [&str; 3] = ["#cgo", "#include", "#define"];

static DIRECTIVE_TOKEN: LazyLock<Regex> =
  LazyLock::new(|| Regex::new(r"^(?:[a-z0-9]+:[a-z0-9]|\+build)").expect("directive regex must compile"));

static GO_DIRECTIVE: LazyLock<Regex> =
  LazyLock::new(|| Regex::new(r"^//(?:line |extern |export |[a-z0-9]+:[a-z0-9])").expect("directive regex must compile"));

/// One line of extracted header text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeaderLine {
  pub text: String,
  /// Absolute offset of the first byte of `text`.
  pub offset: usize,
}

/// The header found in a file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeaderInfo {
  style: CommentStyle,
  lines: Vec<HeaderLine>,
  span: Range<usize>,
}

impl HeaderInfo {
  pub const fn style(&self) -> CommentStyle {
    self.style
  }

  pub fn lines(&self) -> &[HeaderLine] {
    &self.lines
  }

  /// Byte range of the comments making up the header.
  pub fn span(&self) -> Range<usize> {
    self.span.clone()
  }

  /// The trimmed header text the template is matched against.
  pub fn text(&self) -> String {
    self
      .lines
      .iter()
      .map(|line| line.text.as_str())
      .collect::<Vec<_>>()
      .join("\n")
  }

  /// Maps a header-relative position to an absolute file offset.
  ///
  /// Positions past the end of a line are clamped to the line end.
  pub fn offset_of(&self, position: HeaderPosition) -> usize {
    let Some(line) = self.lines.get(position.line).or_else(|| self.lines.last()) else {
      return self.span.start;
    };
    let mut column = position.column.min(line.text.len());
    while !line.text.is_char_boundary(column) {
      column -= 1;
    }
    line.offset + column
  }
}

/// Where the header is, or where a missing one should be inserted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HeaderLocation {
  Present(HeaderInfo),
  /// `anchor` is where the header is inserted: the start of the file, or
  /// the line after a generator banner. `after_directives` is the line after
  /// the leading directive comments, where a block comment can go without
  /// detaching a build constraint from the package clause.
  Missing { anchor: usize, after_directives: usize },
}

impl HeaderLocation {
  /// Returns where a missing header written in `style` is inserted.
  pub const fn insertion_point(&self, style: CommentStyle) -> Option<usize> {
    match self {
      Self::Present(_) => None,
      Self::Missing { anchor, .. } if matches!(style, CommentStyle::Line) => Some(*anchor),
      Self::Missing { after_directives, .. } => Some(*after_directives),
    }
  }
}

/// Returns `true` if a comment is a compiler or tool directive rather than
/// prose.
///
/// The first whitespace-separated token after the comment marker decides:
/// `line`, `extern` and `export` pragmas, `key:value` shaped tokens such as
/// `go:build` or `nolint:all`, and `+build` constraints.
pub fn is_directive(comment: &str) -> bool {
  let body = comment
    .strip_prefix("//")
    .or_else(|| comment.strip_prefix("/*"))
    .unwrap_or(comment);
  let token = body.trim().split(' ').next().unwrap_or_default();

  ["line", "extern", "export"].iter().any(|pragma| token.starts_with(pragma)) || DIRECTIVE_TOKEN.is_match(token)
}

/// Returns `true` if a line comment is a directive as written by Go tools.
///
/// Stricter than [`is_directive`]: the pragma must follow `//` directly, so
/// prose such as `// external contributors` stays part of the header.
pub fn is_go_directive(comment: &str) -> bool {
  GO_DIRECTIVE.is_match(comment)
}

/// Returns `true` if the group is a generated-code banner.
pub fn is_generator_banner(group: &CommentGroup) -> bool {
  group.contains(GENERATED_MARKER)
}

/// Returns `true` if the comment is a cgo preamble block.
pub fn is_cgo_preamble(comment: &Comment) -> bool {
  comment.is_block()
    && block_body(comment.text()).lines().any(|line| {
      let line = line.trim();
      CGO_PREAMBLE_PREFIXES.iter().any(|prefix| line.starts_with(prefix))
    })
}

fn skippable(comment: &Comment, cgo: bool) -> bool {
  is_directive(comment.text()) || (cgo && is_cgo_preamble(comment))
}

/// Locates the header of `target`.
///
/// # Parameters
///
/// * `target` - The scanned file
/// * `cgo` - Whether cgo preamble blocks are skipped like directives
///
/// # Returns
///
/// The header, or the insertion anchor when the file has none. A header
/// whose text is empty counts as missing.
pub fn extract(target: &Target, cgo: bool) -> HeaderLocation {
  let groups = target.comment_groups();
  let mut anchor = target.body_start();
  let mut first_group = 0;

  if let Some(banner) = groups.first()
    && is_generator_banner(banner)
  {
    let index = target.line_index();
    anchor = index.line_end(index.line_of(banner.end().saturating_sub(1)));
    first_group = 1;
    trace!("{}: skipping generator banner", target.path().display());
  }

  let candidate = groups[first_group..].iter().find_map(|group| {
    let comments = group.comments();
    comments
      .iter()
      .position(|comment| !skippable(comment, cgo))
      .map(|at| &comments[at..])
  });

  let missing = || HeaderLocation::Missing {
    anchor,
    after_directives: directives_end(target, &groups[first_group..]).max(anchor),
  };

  let Some(run) = candidate else {
    return missing();
  };
  if run[0].start() >= target.package_offset() {
    return missing();
  }

  let header = if run[0].is_block() {
    block_header(&run[0])
  } else {
    line_header(run)
  };

  if header.lines.is_empty() {
    trace!("{}: header comment is empty", target.path().display());
    return missing();
  }
  HeaderLocation::Present(header)
}

/// Offset of the line after the last directive comment leading the file, or
/// 0 when the file does not start with directives.
fn directives_end(target: &Target, groups: &[CommentGroup]) -> usize {
  let index = target.line_index();
  groups
    .iter()
    .flat_map(CommentGroup::comments)
    .take_while(|comment| comment.start() < target.package_offset() && is_directive(comment.text()))
    .last()
    .map_or(0, |comment| index.line_end(index.line_of(comment.end().saturating_sub(1))))
}

fn block_body(text: &str) -> &str {
  let body = text.strip_prefix("/*").unwrap_or(text);
  body.strip_suffix("*/").unwrap_or(body)
}

fn line_header(run: &[Comment]) -> HeaderInfo {
  let mut lines = Vec::new();
  let mut span = run[0].start()..run[0].end();

  for comment in run.iter().take_while(|comment| !comment.is_block()) {
    if is_go_directive(comment.text()) {
      continue;
    }
    let body = &comment.text()[2..];
    let (text, skipped) = match body.strip_prefix(' ') {
      Some(text) => (text, 3),
      None => (body, 2),
    };
    lines.push(HeaderLine {
      text: text.to_string(),
      offset: comment.start() + skipped,
    });
    span.end = comment.end();
  }

  HeaderInfo {
    style: CommentStyle::Line,
    lines: tidy(lines),
    span,
  }
}

fn block_header(comment: &Comment) -> HeaderInfo {
  let body_offset = comment.start() + 2;
  let mut raw_lines = Vec::new();
  let mut offset = body_offset;
  for line in block_body(comment.text()).split('\n') {
    raw_lines.push(HeaderLine {
      text: line.to_string(),
      offset,
    });
    offset += line.len() + 1;
  }

  let starred = raw_lines
    .iter()
    .filter(|line| !line.text.trim().is_empty())
    .all(|line| line.text.trim_start().starts_with('*'));
  let has_bullets = raw_lines.iter().any(|line| !line.text.trim().is_empty());

  let (style, lines) = if starred && has_bullets {
    let lines = raw_lines
      .into_iter()
      .map(|line| {
        let indent = line.text.len() - line.text.trim_start().len();
        let rest = &line.text[indent..];
        let (text, skipped) = if let Some(text) = rest.strip_prefix("* ") {
          (text, 2)
        } else if let Some(text) = rest.strip_prefix('*') {
          (text, 1)
        } else {
          (rest, 0)
        };
        HeaderLine {
          text: text.to_string(),
          offset: line.offset + indent + skipped,
        }
      })
      .collect();
    (CommentStyle::BlockStarAligned, lines)
  } else {
    (CommentStyle::Block, raw_lines)
  };

  HeaderInfo {
    style,
    lines: tidy(lines),
    span: comment.span(),
  }
}

/// Strips trailing whitespace, drops blank lines at both ends and left-trims
/// the first line.
fn tidy(lines: Vec<HeaderLine>) -> Vec<HeaderLine> {
  let mut lines: Vec<HeaderLine> = lines
    .into_iter()
    .map(|line| HeaderLine {
      text: line.text.trim_end().to_string(),
      offset: line.offset,
    })
    .collect();

  while lines.last().is_some_and(|line| line.text.is_empty()) {
    lines.pop();
  }
  let leading = lines.iter().take_while(|line| line.text.is_empty()).count();
  lines.drain(..leading);

  if let Some(first) = lines.first_mut() {
    let trimmed = first.text.trim_start();
    first.offset += first.text.len() - trimmed.len();
    first.text = trimmed.to_string();
  }
  lines
}
