use std::process::Command;

fn main() {
  stamp_version();
  println!("cargo:rerun-if-changed=build.rs");
  println!("cargo:rerun-if-changed=.git/HEAD");
}

/// Exposes the commit `go-header version` reports as `GIT_HASH` and
/// `GIT_DATE`. Both stay unset outside a git checkout.
fn stamp_version() {
  if let Some(hash) = git_output(&["rev-parse", "--short", "HEAD"]) {
    println!("cargo:rustc-env=GIT_HASH={hash}");
  }
  // %cs is the committer date as YYYY-MM-DD.
  if let Some(date) = git_output(&["log", "-1", "--format=%cs"]) {
    println!("cargo:rustc-env=GIT_DATE={date}");
  }
}

fn git_output(args: &[&str]) -> Option<String> {
  let output = Command::new("git").args(args).output().ok()?;
  if !output.status.success() {
    return None;
  }
  let text = String::from_utf8(output.stdout).ok()?.trim().to_string();
  (!text.is_empty()).then_some(text)
}
