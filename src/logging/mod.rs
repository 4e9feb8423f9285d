//! # Logging Module
//!
//! This module provides logging utilities for go-header, including:
//! - The tracing subscriber setup driven by `-v`/`-q` and `RUST_LOG`
//! - Verbose logging that can be enabled/disabled
//! - Standard info logging with color support
//!
//! Diagnostics go to stdout; tracing output and verbose logs go to stderr.
//!
//! ## Example
//!
//! ```rust
//! use goheader::logging::{ColorMode, init_tracing, set_verbose};
//! use goheader::{info_log, verbose_log};
//!
//! init_tracing(false, 1);
//! set_verbose();
//! ColorMode::Auto.apply();
//!
//! verbose_log!("Checking file: {}", "main.go");
//! info_log!("Fixed header in: {}", "main.go");
//! ```

mod modes;

pub use modes::{ColorMode, init_tracing, is_quiet, is_verbose, set_quiet, set_verbose};
use owo_colors::{OwoColorize, Stream};

/// Logs a message to stderr if verbose mode is enabled.
///
/// Uses the same format string syntax as [`eprintln!`].
#[macro_export]
macro_rules! verbose_log {
    ($($arg:tt)*) => {
        if $crate::logging::is_verbose() {
            eprintln!($($arg)*);
        }
    };
}

/// Logs a message to stdout unless quiet mode is enabled.
#[macro_export]
macro_rules! info_log {
    ($($arg:tt)*) => {
        if !$crate::logging::is_quiet() {
            $crate::logging::print_info_log(&format!($($arg)*));
        }
    };
}

/// Prints an info message, in yellow when the terminal supports it.
///
/// # Parameters
///
/// * `message` - The message to print
pub fn print_info_log(message: &str) {
  println!("{}", message.if_supports_color(Stream::Stdout, |m| m.yellow()));
}
