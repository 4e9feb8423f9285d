//! # Templates Module
//!
//! This module turns a header template into the two artefacts the analyzer
//! needs: an anchored regular expression used to check an extracted header,
//! and a literal rendering used to build suggested fixes.
//!
//! The module includes:
//! - [`Delimiters`] for the placeholder markers used inside the template
//! - [`Template`] for parsing, matching and literal rendering
//! - [`CommentStyle`] for reflowing rendered text into a Go comment
//!
//! ## Example
//!
//! ```rust
//! use goheader::templates::{CommentStyle, Delimiters, Template};
//! use goheader::value::ValueSet;
//!
//! # fn main() -> anyhow::Result<()> {
//! let mut values = ValueSet::builtin(2024);
//! values.calculate()?;
//!
//! let template = Template::parse("Copyright {{ YEAR }} Example Corp", &Delimiters::default())?;
//! let matcher = template.compile_matcher(&values)?;
//! assert!(matcher.is_match("Copyright 2024 Example Corp"));
//!
//! let fix = template.render_literal(&values)?;
//! assert_eq!(CommentStyle::Line.render(&fix), "// Copyright 2024 Example Corp\n");
//! # Ok(())
//! # }
//! ```

use std::fmt;

use regex::Regex;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::value::{ValueSet, normalize_key};

/// Errors raised while parsing or expanding a template.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TemplateError {
  #[error("template delimiters must be non-empty (got {left:?} and {right:?})")]
  InvalidDelimiters { left: String, right: String },

  #[error("unclosed placeholder at byte {offset} of the template")]
  UnclosedPlaceholder { offset: usize },

  #[error("empty placeholder at byte {offset} of the template")]
  EmptyPlaceholder { offset: usize },

  #[error("template references unknown value '{name}'")]
  UnknownValue { name: String },

  #[error("template does not compile to a valid pattern: {message}")]
  InvalidPattern { message: String },

  /// The value has no literal representative, so no fix text can be built.
  #[error("fixes are not supported for regexp value '{key}' without an example")]
  FixUnsupported { key: String },
}

/// The pair of markers that surround a placeholder inside a template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Delimiters {
  left: String,
  right: String,
}

impl Default for Delimiters {
  fn default() -> Self {
    Self {
      left: "{{".to_string(),
      right: "}}".to_string(),
    }
  }
}

impl Delimiters {
  /// Creates a delimiter pair, rejecting empty markers.
  pub fn new(left: impl Into<String>, right: impl Into<String>) -> Result<Self, TemplateError> {
    let left = left.into();
    let right = right.into();
    if left.is_empty() || right.is_empty() {
      return Err(TemplateError::InvalidDelimiters { left, right });
    }
    Ok(Self { left, right })
  }

  pub fn left(&self) -> &str {
    &self.left
  }

  pub fn right(&self) -> &str {
    &self.right
  }
}

/// One piece of a parsed template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment {
  /// Text that must appear verbatim in the header.
  Literal(String),
  /// A reference to a value, with its normalized name and its byte offset in
  /// the raw template.
  Placeholder { name: String, offset: usize },
}

/// A parsed header template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Template {
  raw: String,
  segments: Vec<Segment>,
}

impl Template {
  /// Parses a template into literal and placeholder segments.
  ///
  /// Placeholder names are trimmed and normalized the same way value keys are,
  /// so `{{ .Year }}` and `{{YEAR}}` refer to the same value.
  ///
  /// # Parameters
  ///
  /// * `raw` - The template text, already trimmed by the caller
  /// * `delims` - The placeholder markers to look for
  ///
  /// # Returns
  ///
  /// The parsed template, or an error for unclosed or empty placeholders.
  pub fn parse(raw: &str, delims: &Delimiters) -> Result<Self, TemplateError> {
    let mut segments = Vec::new();
    let mut rest = raw;
    let mut consumed = 0;

    while let Some(start) = rest.find(delims.left()) {
      if start > 0 {
        segments.push(Segment::Literal(rest[..start].to_string()));
      }
      let offset = consumed + start;
      let inner_start = start + delims.left().len();
      let Some(inner_len) = rest[inner_start..].find(delims.right()) else {
        return Err(TemplateError::UnclosedPlaceholder { offset });
      };

      let name = normalize_key(&rest[inner_start..inner_start + inner_len]);
      if name.is_empty() {
        return Err(TemplateError::EmptyPlaceholder { offset });
      }
      segments.push(Segment::Placeholder { name, offset });

      let next = inner_start + inner_len + delims.right().len();
      consumed += next;
      rest = &rest[next..];
    }

    if !rest.is_empty() {
      segments.push(Segment::Literal(rest.to_string()));
    }

    Ok(Self {
      raw: raw.to_string(),
      segments,
    })
  }

  pub fn raw(&self) -> &str {
    &self.raw
  }

  pub fn segments(&self) -> &[Segment] {
    &self.segments
  }

  pub fn is_empty(&self) -> bool {
    self.segments.is_empty()
  }

  /// Returns the distinct placeholder names in order of first appearance.
  pub fn placeholders(&self) -> Vec<&str> {
    let mut names: Vec<&str> = Vec::new();
    for segment in &self.segments {
      if let Segment::Placeholder { name, .. } = segment
        && !names.contains(&name.as_str())
      {
        names.push(name);
      }
    }
    names
  }

  /// Checks that every placeholder names a known value.
  pub fn validate(&self, values: &ValueSet) -> Result<(), TemplateError> {
    for name in self.placeholders() {
      if !values.contains_key(name) {
        return Err(TemplateError::UnknownValue { name: name.to_string() });
      }
    }
    Ok(())
  }

  /// Builds the pattern source for the matcher.
  ///
  /// Literal text is escaped; the computed text of every value is spliced in
  /// unchanged, so regexp values contribute live pattern syntax.
  pub fn matcher_pattern(&self, values: &ValueSet) -> Result<String, TemplateError> {
    let mut pattern = String::from(r"\A(?:");
    for segment in &self.segments {
      match segment {
        Segment::Literal(text) => pattern.push_str(&regex::escape(text)),
        Segment::Placeholder { name, .. } => {
          let computed = values
            .get(name)
            .and_then(|value| value.get())
            .ok_or_else(|| TemplateError::UnknownValue { name: name.clone() })?;
          pattern.push_str(computed);
        }
      }
    }
    pattern.push_str(r")\z");
    Ok(pattern)
  }

  /// Compiles the anchored matcher for this template.
  pub fn compile_matcher(&self, values: &ValueSet) -> Result<Regex, TemplateError> {
    let pattern = self.matcher_pattern(values)?;
    Regex::new(&pattern).map_err(|err| TemplateError::InvalidPattern {
      message: err.to_string(),
    })
  }

  /// Expands the template with the literal representative of every value.
  ///
  /// Fails with [`TemplateError::FixUnsupported`] as soon as a placeholder
  /// resolves to a regexp value that has no example.
  pub fn render_literal(&self, values: &ValueSet) -> Result<String, TemplateError> {
    let mut out = String::with_capacity(self.raw.len());
    for segment in &self.segments {
      match segment {
        Segment::Literal(text) => out.push_str(text),
        Segment::Placeholder { name, .. } => {
          let value = values
            .get(name)
            .ok_or_else(|| TemplateError::UnknownValue { name: name.clone() })?;
          let literal = value
            .literal()
            .ok_or_else(|| TemplateError::FixUnsupported { key: value.key().to_string() })?;
          out.push_str(literal);
        }
      }
    }
    Ok(out)
  }
}

/// The comment flavour a header is written in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CommentStyle {
  /// Consecutive `//` comments.
  #[default]
  Line,
  /// A bare `/* ... */` block.
  Block,
  /// A `/* ... */` block whose lines start with ` * `.
  #[serde(rename = "star-block")]
  BlockStarAligned,
}

impl fmt::Display for CommentStyle {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    let name = match self {
      Self::Line => "line",
      Self::Block => "block",
      Self::BlockStarAligned => "star-block",
    };
    f.write_str(name)
  }
}

impl CommentStyle {
  const fn markers(self) -> (&'static str, &'static str, &'static str) {
    match self {
      Self::Line => ("", "// ", ""),
      Self::Block => ("/*", "", "*/"),
      Self::BlockStarAligned => ("/*", " * ", " */"),
    }
  }

  /// Reflows header text into a comment of this style.
  ///
  /// The result always ends with a single newline. Empty lines get the
  /// trimmed line marker so no trailing whitespace is produced.
  pub fn render(self, text: &str) -> String {
    let (top, middle, bottom) = self.markers();
    let mut result = String::new();

    if !top.is_empty() {
      result.push_str(top);
      result.push('\n');
    }

    for line in text.split('\n') {
      if line.is_empty() {
        result.push_str(middle.trim_end());
      } else {
        result.push_str(middle);
        result.push_str(line);
      }
      result.push('\n');
    }

    if !bottom.is_empty() {
      result.push_str(bottom);
      result.push('\n');
    }

    result
  }
}
