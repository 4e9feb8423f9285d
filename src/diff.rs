//! # Diff Module
//!
//! Renders the difference between the header a file has and the header the
//! template expects. Used by `--show-diff`.

use std::fmt::Write as _;

use owo_colors::{OwoColorize, Stream};
use similar::{ChangeTag, TextDiff};

use crate::diagnostic::Diagnostic;
use crate::output::format_location;

/// Manages diff rendering for header findings.
///
/// Diffs go to stderr so stdout stays a plain list of diagnostics.
pub struct DiffManager {
  /// Whether to show diffs at all
  pub show_diff: bool,
}

impl DiffManager {
  pub const fn new(show_diff: bool) -> Self {
    Self { show_diff }
  }

  /// Renders the actual-vs-expected header diff of a diagnostic.
  ///
  /// # Returns
  ///
  /// `None` when the diagnostic carries no suggested fix.
  pub fn render(diagnostic: &Diagnostic) -> Option<String> {
    let fix = diagnostic.fix.as_ref()?;
    let actual = join_lines(&fix.actual);
    let expected = join_lines(&fix.expected);

    let diff = TextDiff::from_lines(&actual, &expected);
    let mut rendered = String::new();
    let _ = writeln!(rendered, "--- {} (actual)", diagnostic.path.display());
    let _ = writeln!(rendered, "+++ {} (expected)", diagnostic.path.display());

    for change in diff.iter_all_changes() {
      let sign = match change.tag() {
        ChangeTag::Delete => "-",
        ChangeTag::Insert => "+",
        ChangeTag::Equal => " ",
      };
      let _ = write!(rendered, "{sign}{change}");
    }

    Some(rendered)
  }

  /// Prints the diff of a diagnostic to stderr, if enabled.
  ///
  /// # Parameters
  ///
  /// * `diagnostic` - The diagnostic to show
  /// * `workspace_root` - Used to shorten the path in the heading
  pub fn display(&self, diagnostic: &Diagnostic, workspace_root: Option<&std::path::Path>) {
    if !self.show_diff {
      return;
    }
    let Some(rendered) = Self::render(diagnostic) else {
      return;
    };

    eprintln!("Diff for {}:", format_location(diagnostic, workspace_root));
    for line in rendered.lines() {
      if line.starts_with("---") || line.starts_with("+++") {
        eprintln!("{}", line.if_supports_color(Stream::Stderr, |s| s.bold()));
      } else if line.starts_with('-') {
        eprintln!("{}", line.if_supports_color(Stream::Stderr, |s| s.red()));
      } else if line.starts_with('+') {
        eprintln!("{}", line.if_supports_color(Stream::Stderr, |s| s.green()));
      } else {
        eprintln!("{line}");
      }
    }
    eprintln!();
  }
}

fn join_lines(lines: &[String]) -> String {
  let mut joined = String::new();
  for line in lines {
    joined.push_str(line);
    joined.push('\n');
  }
  joined
}
