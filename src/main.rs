//! # go-header
//!
//! Checks that Go source files start with a license/copyright header matching
//! a template.

use std::process::ExitCode;

use goheader::cli::{Cli, Command, run_check, version_string};

fn main() -> ExitCode {
  let cli = Cli::parse_args();

  let args = match cli.command {
    Some(Command::Version) => {
      println!("{}", version_string());
      return ExitCode::SUCCESS;
    }
    Some(Command::Check(args)) => args,
    None => cli.check_args,
  };

  match run_check(args) {
    Ok(code) => code,
    Err(err) => {
      eprintln!("ERROR: {err:#}");
      ExitCode::from(2)
    }
  }
}
