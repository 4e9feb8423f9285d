//! # Analyzer Module
//!
//! Checks one file's header against the configured template.
//!
//! An [`Analyzer`] is built once per run from validated [`Settings`]: values
//! are resolved, the template is parsed and its matcher compiled up front, so
//! a broken configuration is rejected before any file is read. Analysing a
//! file never mutates the analyzer, which makes it safe to share between
//! worker threads.
//!
//! ## Example
//!
//! ```rust
//! use goheader::analyzer::Analyzer;
//! use goheader::git::FsModYear;
//! use goheader::settings::Settings;
//! use goheader::source::Target;
//!
//! # fn main() -> anyhow::Result<()> {
//! let analyzer = Analyzer::new(Settings::new("Copyright {{YEAR}} Acme"), Box::new(FsModYear))?;
//! let target = Target::parse("main.go", "package main\n")?;
//!
//! let diagnostic = analyzer.check(&target)?.expect("the header is missing");
//! assert_eq!(diagnostic.message, "missed copyright header");
//! # Ok(())
//! # }
//! ```

use std::borrow::Cow;
use std::path::Path;

use anyhow::{Context, Result};
use regex::Regex;
use tracing::{debug, trace};

use crate::config::ConfigError;
use crate::diagnostic::{Diagnostic, Finding, FindingKind, Fix, FixKind, HeaderPosition};
use crate::git::ModYearProvider;
use crate::header::{self, HeaderInfo, HeaderLocation};
use crate::position;
use crate::settings::Settings;
use crate::source::Target;
use crate::templates::{CommentStyle, Template};
use crate::value::{MOD_YEAR, MOD_YEAR_RANGE, ValueSet};

/// A compiled template, ready to check files.
struct Compiled {
  template: Template,
  values: ValueSet,
  matcher: Regex,
  /// The template reaches `MOD_YEAR` or `MOD_YEAR_RANGE`, so values and
  /// matcher are rebuilt per file.
  file_dependent: bool,
}

/// Checks file headers against a template.
pub struct Analyzer {
  settings: Settings,
  compiled: Option<Compiled>,
  mod_year: Box<dyn ModYearProvider>,
}

impl std::fmt::Debug for Analyzer {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("Analyzer")
      .field("settings", &self.settings)
      .field("enabled", &self.compiled.is_some())
      .finish()
  }
}

impl Analyzer {
  /// Validates `settings` and compiles the template.
  ///
  /// # Parameters
  ///
  /// * `settings` - The run configuration
  /// * `mod_year` - Source of per-file modification years
  ///
  /// # Returns
  ///
  /// The analyzer, or a configuration error for value cycles, unknown
  /// references, malformed placeholders or a template that does not compile.
  /// A missing or blank template yields an analyzer that reports nothing.
  pub fn new(settings: Settings, mod_year: Box<dyn ModYearProvider>) -> Result<Self, ConfigError> {
    let Some(raw) = settings.template_text() else {
      debug!("No template configured; header checks are disabled");
      return Ok(Self {
        settings,
        compiled: None,
        mod_year,
      });
    };

    let mut values = settings.values.clone();
    values.calculate()?;

    let template = Template::parse(&raw, &settings.delimiters)?;
    template.validate(&values)?;
    let matcher = template.compile_matcher(&values)?;
    let file_dependent = values.references_any(template.placeholders(), &[MOD_YEAR, MOD_YEAR_RANGE]);

    debug!(
      "Compiled template with {} placeholder(s); per-file values: {}",
      template.placeholders().len(),
      file_dependent
    );
    trace!("Header matcher: {}", matcher.as_str());

    Ok(Self {
      compiled: Some(Compiled {
        template,
        values,
        matcher,
        file_dependent,
      }),
      settings,
      mod_year,
    })
  }

  pub const fn settings(&self) -> &Settings {
    &self.settings
  }

  /// Returns `false` when no template is configured.
  pub const fn is_enabled(&self) -> bool {
    self.compiled.is_some()
  }

  /// Analyses one file and returns the finding in header-relative
  /// coordinates.
  ///
  /// # Errors
  ///
  /// Fails only when per-file values cannot be resolved or compiled.
  pub fn analyze(&self, target: &Target) -> Result<Option<Finding>> {
    let Some(compiled) = &self.compiled else {
      return Ok(None);
    };

    let location = header::extract(target, self.settings.cgo);
    let values = self.values_for(compiled, target.path())?;

    let finding = match location {
      HeaderLocation::Missing { after_directives, .. } => {
        let style = self.settings.comment_style;
        let anchor = location.insertion_point(style).unwrap_or(after_directives);
        let (fix, fix_error) = render_fix(&compiled.template, &values, style, FixKind::Insert, Vec::new());
        Finding {
          kind: FindingKind::MissingHeader,
          message: FindingKind::MissingHeader.message().to_string(),
          position: HeaderPosition::default(),
          fix,
          fix_error,
          location: HeaderLocation::Missing {
            anchor,
            after_directives,
          },
        }
      }
      HeaderLocation::Present(ref info) => {
        let text = info.text();
        let matcher = match &values {
          Cow::Borrowed(_) => Cow::Borrowed(&compiled.matcher),
          Cow::Owned(values) => Cow::Owned(
            compiled
              .template
              .compile_matcher(values)
              .with_context(|| format!("Failed to compile header matcher for {}", target.path().display()))?,
          ),
        };

        if matcher.is_match(&text) {
          trace!("{}: header matches", target.path().display());
          return Ok(None);
        }

        let actual = header_lines(info);
        let (fix, fix_error) = render_fix(
          &compiled.template,
          &values,
          info.style(),
          FixKind::Replace,
          actual.clone(),
        );
        let position = fix
          .as_ref()
          .map_or_else(HeaderPosition::default, |fix| first_difference(&actual, &fix.expected));

        Finding {
          kind: FindingKind::TemplateMismatch,
          message: FindingKind::TemplateMismatch.message().to_string(),
          position,
          fix,
          fix_error,
          location,
        }
      }
    };

    debug!("{}: {}", target.path().display(), finding.message);
    Ok(Some(finding))
  }

  /// Analyses one file and returns the finding as an absolute diagnostic.
  pub fn check(&self, target: &Target) -> Result<Option<Diagnostic>> {
    Ok(self.analyze(target)?.map(|finding| position::remap(target, finding)))
  }

  /// Returns the values for `path`, rebuilt with its modification year when
  /// the template depends on it.
  fn values_for<'a>(&self, compiled: &'a Compiled, path: &Path) -> Result<Cow<'a, ValueSet>> {
    if !compiled.file_dependent {
      return Ok(Cow::Borrowed(&compiled.values));
    }

    match self.mod_year.mod_year(path) {
      Ok(year) => {
        let values = compiled
          .values
          .with_mod_year(year)
          .with_context(|| format!("Failed to resolve values for {}", path.display()))?;
        Ok(Cow::Owned(values))
      }
      Err(err) => {
        debug!("{}: modification year unavailable, using YEAR: {:#}", path.display(), err);
        Ok(Cow::Borrowed(&compiled.values))
      }
    }
  }
}

fn header_lines(info: &HeaderInfo) -> Vec<String> {
  info.lines().iter().map(|line| line.text.clone()).collect()
}

/// Renders the fix for a finding, or explains why none can be offered.
fn render_fix(
  template: &Template,
  values: &ValueSet,
  style: CommentStyle,
  kind: FixKind,
  actual: Vec<String>,
) -> (Option<Fix>, Option<String>) {
  match template.render_literal(values) {
    Ok(text) => {
      let fix = Fix {
        kind,
        actual,
        expected: text.split('\n').map(str::to_string).collect(),
        rendered: style.render(&text),
      };
      (Some(fix), None)
    }
    Err(err) => {
      debug!("No fix offered: {}", err);
      (None, Some(err.to_string()))
    }
  }
}

/// Finds the first position where `actual` and `expected` differ.
fn first_difference(actual: &[String], expected: &[String]) -> HeaderPosition {
  for (line, (a, e)) in actual.iter().zip(expected).enumerate() {
    if a != e {
      let column = a
        .char_indices()
        .zip(e.chars())
        .find(|((_, ac), ec)| ac != ec)
        .map_or_else(|| a.len().min(e.len()), |((index, _), _)| index);
      return HeaderPosition { line, column };
    }
  }

  match actual.len().cmp(&expected.len()) {
    std::cmp::Ordering::Less => HeaderPosition {
      line: actual.len().saturating_sub(1),
      column: actual.last().map_or(0, String::len),
    },
    std::cmp::Ordering::Greater => HeaderPosition {
      line: expected.len(),
      column: 0,
    },
    std::cmp::Ordering::Equal => HeaderPosition::default(),
  }
}
