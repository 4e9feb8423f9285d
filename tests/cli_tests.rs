mod common;

use std::fs;
use std::path::Path;

use anyhow::Result;
use assert_cmd::Command;
use common::{TEMPLATE, licensed_go, write_config, write_file};
use goheader::settings::current_year;
use predicates::prelude::*;
use tempfile::tempdir;

fn go_header(dir: &Path) -> Command {
  let mut cmd = Command::cargo_bin("go-header").expect("binary should be built");
  cmd.current_dir(dir).env_remove("GO_HEADER_CONFIG").env_remove("RUST_LOG");
  cmd.arg("--colors=never");
  cmd
}

#[test]
fn test_clean_tree_exits_zero() -> Result<()> {
  let temp_dir = tempdir()?;
  write_config(temp_dir.path(), TEMPLATE)?;
  write_file(temp_dir.path(), "main.go", &licensed_go(current_year(), "main"))?;
  write_file(temp_dir.path(), "pkg/util/util.go", &licensed_go(current_year(), "util"))?;

  go_header(temp_dir.path())
    .assert()
    .success()
    .stdout(predicate::str::contains("Checking 2 files..."))
    .stdout(predicate::str::contains("All files have a valid header."));
  Ok(())
}

#[test]
fn test_findings_exit_one_with_locations() -> Result<()> {
  let temp_dir = tempdir()?;
  write_config(temp_dir.path(), TEMPLATE)?;
  write_file(temp_dir.path(), "main.go", "package main\n")?;
  write_file(temp_dir.path(), "old.go", &licensed_go(1999, "main"))?;

  go_header(temp_dir.path())
    .arg(".")
    .assert()
    .code(1)
    .stdout(predicate::str::contains("main.go:1:1: missed copyright header"))
    .stdout(predicate::str::contains("old.go:1:14: template doesn't match"))
    .stdout(predicate::str::contains("Summary: 0 OK, 1 missing, 1 mismatched, 0 failed"))
    .stdout(predicate::str::contains("Run with --fix"))
    .stdout(predicate::str::contains("\x1b[").not());
  Ok(())
}

#[test]
fn test_fix_rewrites_files() -> Result<()> {
  let temp_dir = tempdir()?;
  write_config(temp_dir.path(), TEMPLATE)?;
  let main = write_file(temp_dir.path(), "main.go", "package main\n")?;

  go_header(temp_dir.path())
    .arg("--fix")
    .assert()
    .code(1)
    .stdout(predicate::str::contains("Fixed header in 1 file:"));

  assert_eq!(fs::read_to_string(&main)?, licensed_go(current_year(), "main"));

  go_header(temp_dir.path()).assert().success();
  Ok(())
}

#[test]
fn test_quiet_keeps_diagnostics_only() -> Result<()> {
  let temp_dir = tempdir()?;
  write_config(temp_dir.path(), TEMPLATE)?;
  write_file(temp_dir.path(), "main.go", "package main\n")?;

  go_header(temp_dir.path())
    .arg("-q")
    .assert()
    .code(1)
    .stdout(predicate::str::contains("missed copyright header"))
    .stdout(predicate::str::contains("Summary").not())
    .stdout(predicate::str::contains("Checking").not());
  Ok(())
}

#[test]
fn test_show_diff_prints_expected_header() -> Result<()> {
  let temp_dir = tempdir()?;
  write_config(temp_dir.path(), TEMPLATE)?;
  write_file(temp_dir.path(), "old.go", &licensed_go(1999, "main"))?;

  go_header(temp_dir.path())
    .arg("--show-diff")
    .assert()
    .code(1)
    .stderr(predicate::str::contains("-Copyright 1999 Acme Inc."))
    .stderr(predicate::str::contains(format!("+Copyright {} Acme Inc.", current_year())));
  Ok(())
}

#[test]
fn test_report_json_is_written() -> Result<()> {
  let temp_dir = tempdir()?;
  write_config(temp_dir.path(), TEMPLATE)?;
  write_file(temp_dir.path(), "main.go", "package main\n")?;
  let report_path = temp_dir.path().join("report.json");

  go_header(temp_dir.path())
    .arg("--report-json")
    .arg(&report_path)
    .assert()
    .code(1);

  let report: serde_json::Value = serde_json::from_str(&fs::read_to_string(&report_path)?)?;
  assert_eq!(report["summary"]["files_processed"], 1);
  assert_eq!(report["summary"]["missing_headers"], 1);
  assert_eq!(report["diagnostics"][0]["kind"], "missing-header");
  assert_eq!(report["diagnostics"][0]["fixable"], true);
  Ok(())
}

#[test]
fn test_explicit_config_and_paths() -> Result<()> {
  let temp_dir = tempdir()?;
  let config = write_file(
    temp_dir.path(),
    "ci/header.toml",
    "template = \"Owned by {{ TEAM }}\"\n\n[vars.TEAM]\npattern = \"team-[a-z]+\"\nexample = \"team-core\"\n",
  )?;
  write_file(temp_dir.path(), "cmd/tool.go", "// Owned by team-infra\n\npackage main\n")?;
  write_file(temp_dir.path(), "other/bad.go", "package other\n")?;

  go_header(temp_dir.path())
    .arg("--config")
    .arg(&config)
    .arg("-j")
    .arg("2")
    .arg("cmd")
    .assert()
    .success();
  Ok(())
}

#[test]
fn test_missing_config_exits_two() -> Result<()> {
  let temp_dir = tempdir()?;
  write_file(temp_dir.path(), "main.go", "package main\n")?;

  go_header(temp_dir.path())
    .assert()
    .code(2)
    .stderr(predicate::str::contains("No configuration found"));
  Ok(())
}

#[test]
fn test_invalid_config_exits_two() -> Result<()> {
  let temp_dir = tempdir()?;
  write_file(
    temp_dir.path(),
    ".go-header.yml",
    "template: \"{{ A }}\"\nvalues:\n  const:\n    A: \"{{ B }}\"\n    B: \"{{ A }}\"\n",
  )?;
  write_file(temp_dir.path(), "main.go", "package main\n")?;

  go_header(temp_dir.path())
    .assert()
    .code(2)
    .stderr(predicate::str::contains("recursive value"));
  Ok(())
}

#[test]
fn test_zero_parallel_is_rejected() -> Result<()> {
  let temp_dir = tempdir()?;
  write_config(temp_dir.path(), TEMPLATE)?;

  go_header(temp_dir.path()).args(["-j", "0"]).assert().code(2);
  Ok(())
}

#[test]
fn test_version_subcommand() {
  let mut cmd = Command::cargo_bin("go-header").expect("binary should be built");
  cmd
    .arg("version")
    .assert()
    .success()
    .stdout(predicate::str::starts_with("go-header v"));
}
