//! # CLI Module
//!
//! This module contains the command-line interface implementation.
//! It uses clap for argument parsing; checking is the default command, so
//! `go-header ./...`-style invocations need no subcommand.

mod check;

pub use check::{CheckArgs, run_check};
use clap::builder::styling::{AnsiColor, Color, Style, Styles};
use clap::{Parser, Subcommand};

const CUSTOM_STYLES: Styles = Styles::styled()
  .header(Style::new().fg_color(Some(Color::Ansi(AnsiColor::Green))).bold())
  .usage(Style::new().fg_color(Some(Color::Ansi(AnsiColor::Green))).bold())
  .literal(Style::new().fg_color(Some(Color::Ansi(AnsiColor::Blue))).bold())
  .placeholder(Style::new().fg_color(Some(Color::Ansi(AnsiColor::Cyan))))
  .error(Style::new().fg_color(Some(Color::Ansi(AnsiColor::Red))).bold())
  .valid(Style::new().fg_color(Some(Color::Ansi(AnsiColor::Green))))
  .invalid(Style::new().fg_color(Some(Color::Ansi(AnsiColor::Yellow))));

/// Top-level CLI arguments
#[derive(Parser, Debug)]
#[command(
  name = "go-header",
  author,
  version,
  about,
  styles = CUSTOM_STYLES,
  after_help = "Examples:
  # Check every Go file below the current directory using .go-header.yml
  go-header

  # Check specific packages with an explicit config
  go-header --config ci/header.yml ./cmd ./pkg

  # Apply the suggested headers in place
  go-header --fix .

  # Show expected vs actual header for each finding
  go-header --show-diff .

  # Only check files changed since a git reference
  go-header --ratchet origin/main .

  # Only check files added since a git reference
  go-header --ratchet origin/main --new-only .

  # Write a JSON report for CI
  go-header --report-json header-report.json .
",
  help_template = "{before-help}{name} v{version}
{about-section}
{usage-heading} {usage}

{all-args}{after-help}
"
)]
pub struct Cli {
  #[command(subcommand)]
  pub command: Option<Command>,

  #[command(flatten)]
  pub check_args: CheckArgs,
}

/// Available subcommands
#[derive(Subcommand, Debug)]
pub enum Command {
  /// Check Go file headers against the template (default)
  Check(CheckArgs),

  /// Print version information
  Version,
}

impl Cli {
  /// Parse CLI arguments and return the Cli struct
  pub fn parse_args() -> Self {
    Self::parse()
  }
}

/// Returns the version line printed by `go-header version`.
pub fn version_string() -> String {
  let mut version = format!("go-header v{}", env!("CARGO_PKG_VERSION"));
  match (option_env!("GIT_HASH"), option_env!("GIT_DATE")) {
    (Some(hash), Some(date)) if !hash.is_empty() => version.push_str(&format!(" ({hash} {date})")),
    (Some(hash), _) if !hash.is_empty() => version.push_str(&format!(" ({hash})")),
    _ => {}
  }
  version
}
