//! # goheader
//!
//! Checks that Go source files start with a license/copyright header matching
//! a template, and suggests ready-to-apply fixes in the file's own comment
//! style.
//!
//! A template is plain text with `{{ KEY }}` placeholders. Each key names a
//! value: a constant (matched literally) or a regular expression. The
//! built-in values `YEAR`, `YEAR_RANGE`, `MOD_YEAR` and `MOD_YEAR_RANGE`
//! cover the usual copyright year forms.
//!
//! ## Features
//!
//! * Line (`//`), block (`/* */`) and star-block headers
//! * Directive and generator-banner aware header extraction
//! * Per-file modification years from git history
//! * Exact fix edits that preserve the file's comment style
//! * Parallel analysis with a fixed-size worker pool
//! * Ratchet mode - only check files changed relative to a git reference
//!
//! ## Usage as a Library
//!
//! ```rust,no_run
//! use goheader::analyzer::Analyzer;
//! use goheader::diagnostic::CollectingSink;
//! use goheader::git::GitModYear;
//! use goheader::processor::{FileCollector, Processor, ProcessorConfig};
//! use goheader::settings::Settings;
//! use std::path::PathBuf;
//!
//! fn main() -> anyhow::Result<()> {
//!     let settings = Settings::new("Copyright {{ YEAR_RANGE }} Acme Inc.");
//!     let analyzer = Analyzer::new(settings, Box::new(GitModYear))?;
//!     let processor = Processor::new(ProcessorConfig::new(analyzer))?;
//!
//!     let files = FileCollector::new().collect(&[PathBuf::from(".")])?;
//!     let sink = CollectingSink::new();
//!     let summary = processor.run(&files, &sink);
//!
//!     for diagnostic in sink.diagnostics() {
//!         println!("{}", diagnostic.location_line());
//!     }
//!     println!("{} file(s) with findings", summary.files_with_findings);
//!     Ok(())
//! }
//! ```
//!
//! ## Modules
//!
//! * [`analyzer`] - Matching headers against the template
//! * [`templates`] - Template parsing, matchers and comment rendering
//! * [`value`] - Template values and their resolution
//! * [`processor`] - Parallel processing of many files
//! * [`config`] - Configuration file loading
//!
//! [`analyzer`]: crate::analyzer
//! [`templates`]: crate::templates
//! [`value`]: crate::value
//! [`processor`]: crate::processor
//! [`config`]: crate::config

pub mod analyzer;
pub mod cli;
pub mod config;
pub mod diagnostic;
pub mod diff;
pub mod git;
pub mod header;
pub mod logging;
pub mod output;
pub mod position;
pub mod processor;
pub mod report;
pub mod settings;
pub mod source;
pub mod templates;
pub mod value;
