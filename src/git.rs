//! # Git Module
//!
//! This module contains functionality for interacting with git repositories:
//! looking up the year a file was last modified, for the `MOD_YEAR` and
//! `MOD_YEAR_RANGE` values, and identifying changed files relative to a
//! reference for ratchet mode.

use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, anyhow};
use chrono::{DateTime, Datelike, Local, TimeZone};
use git2::{Delta, DiffOptions, Repository, Sort, Status, StatusOptions};
use tracing::{debug, trace};

/// Looks up the year a file was last modified.
///
/// Implementations are shared between worker threads.
pub trait ModYearProvider: Send + Sync {
  /// Returns the modification year of `path`.
  ///
  /// # Errors
  ///
  /// Returns an error when no year can be determined; the caller then falls
  /// back to the current year.
  fn mod_year(&self, path: &Path) -> Result<i32>;
}

/// Uses the filesystem modification time.
#[derive(Debug, Default, Clone, Copy)]
pub struct FsModYear;

impl ModYearProvider for FsModYear {
  fn mod_year(&self, path: &Path) -> Result<i32> {
    let modified = fs::metadata(path)
      .and_then(|meta| meta.modified())
      .with_context(|| format!("Failed to read modification time of {}", path.display()))?;
    Ok(DateTime::<Local>::from(modified).year())
  }
}

/// Uses git history for clean files and the filesystem otherwise.
///
/// A file without local changes gets the year of the newest commit touching
/// it. A modified, untracked or unversioned file is being edited now, so its
/// filesystem modification time is used instead.
#[derive(Debug, Default, Clone, Copy)]
pub struct GitModYear;

impl ModYearProvider for GitModYear {
  fn mod_year(&self, path: &Path) -> Result<i32> {
    match last_commit_year(path) {
      Ok(Some(year)) => {
        trace!("{}: last commit year {}", path.display(), year);
        Ok(year)
      }
      Ok(None) => FsModYear.mod_year(path),
      Err(err) => {
        debug!("{}: git lookup failed, using mtime: {:#}", path.display(), err);
        FsModYear.mod_year(path)
      }
    }
  }
}

/// Returns the year of the newest commit touching a clean, tracked file.
///
/// Returns `Ok(None)` when the file has local changes or is not tracked.
fn last_commit_year(path: &Path) -> Result<Option<i32>> {
  let absolute = path
    .canonicalize()
    .with_context(|| format!("Failed to resolve {}", path.display()))?;
  let repo = Repository::discover(&absolute).with_context(|| "Failed to open git repository")?;
  let workdir = repo.workdir().ok_or_else(|| anyhow!("repository has no working directory"))?;
  let workdir = workdir.canonicalize().unwrap_or_else(|_| workdir.to_path_buf());
  let relative = absolute
    .strip_prefix(&workdir)
    .with_context(|| format!("{} is outside the repository", path.display()))?;

  let status = repo
    .status_file(relative)
    .with_context(|| format!("Failed to get git status of {}", relative.display()))?;
  if status != Status::CURRENT {
    trace!("{}: has local changes ({:?})", relative.display(), status);
    return Ok(None);
  }

  let mut revwalk = repo.revwalk().with_context(|| "Failed to walk history")?;
  revwalk.push_head().with_context(|| "Failed to get HEAD commit")?;
  revwalk.set_sorting(Sort::TIME)?;

  for oid in revwalk {
    let commit = repo.find_commit(oid?)?;
    let tree = commit.tree()?;
    let parent_tree = match commit.parents().next() {
      Some(parent) => Some(parent.tree()?),
      None => None,
    };

    let mut options = DiffOptions::new();
    options.pathspec(relative);
    let diff = repo.diff_tree_to_tree(parent_tree.as_ref(), Some(&tree), Some(&mut options))?;
    if diff.deltas().len() > 0 {
      let year = Local
        .timestamp_opt(commit.time().seconds(), 0)
        .single()
        .map(|time| time.year())
        .ok_or_else(|| anyhow!("invalid commit time"))?;
      return Ok(Some(year));
    }
  }

  Ok(None)
}

/// Gets the list of files that have changed relative to a git reference.
///
/// This function is used in ratchet mode to restrict the check to files that
/// have been added, modified, or renamed since the specified git reference,
/// including uncommitted and untracked files.
///
/// # Parameters
///
/// * `reference` - Git reference (branch, tag, or commit hash)
/// * `new_only` - Only report files that did not exist at `reference`
///
/// # Returns
///
/// A `HashSet` of paths relative to the repository root, or an error if the
/// git operations fail.
///
/// # Errors
///
/// Returns an error if:
/// - The git repository cannot be opened
/// - The specified reference cannot be found
/// - Git operations fail
pub fn changed_files(reference: &str, new_only: bool) -> Result<HashSet<PathBuf>> {
  debug!("Getting changed files relative to: {}", reference);

  let repo = Repository::discover(".").with_context(|| "Failed to open git repository")?;

  let reference_tree = repo
    .revparse_single(reference)
    .with_context(|| format!("Failed to find git reference: {reference}"))?
    .peel_to_commit()
    .with_context(|| format!("Failed to get commit for reference: {reference}"))?
    .tree()
    .with_context(|| "Failed to get tree for reference commit")?;

  let mut changed = HashSet::new();

  let mut status_opts = StatusOptions::new();
  status_opts.include_untracked(true).recurse_untracked_dirs(true);
  let statuses = repo
    .statuses(Some(&mut status_opts))
    .with_context(|| "Failed to get git status")?;

  for entry in statuses.iter() {
    let Some(path) = entry.path() else { continue };
    let status = entry.status();
    let is_new = status.is_wt_new() || status.is_index_new();
    let is_changed = is_new
      || status.is_wt_modified()
      || status.is_wt_renamed()
      || status.is_index_modified()
      || status.is_index_renamed();

    if (new_only && is_new) || (!new_only && is_changed) {
      trace!("Changed file: {}", path);
      changed.insert(PathBuf::from(path));
    }
  }

  let head_tree = repo
    .head()
    .with_context(|| "Failed to get HEAD reference")?
    .peel_to_commit()
    .with_context(|| "Failed to get HEAD commit")?
    .tree()
    .with_context(|| "Failed to get tree for HEAD commit")?;

  let diff = repo
    .diff_tree_to_tree(Some(&reference_tree), Some(&head_tree), None)
    .with_context(|| "Failed to create diff between reference and HEAD")?;

  for delta in diff.deltas() {
    if new_only && delta.status() != Delta::Added {
      continue;
    }
    if delta.status() == Delta::Deleted {
      continue;
    }
    if let Some(path) = delta.new_file().path() {
      trace!("Changed file (in diff): {}", path.display());
      changed.insert(path.to_path_buf());
    }
  }

  debug!("Found {} changed files", changed.len());
  Ok(changed)
}

/// Returns the root of the working tree containing the current directory.
pub fn workdir_root() -> Result<PathBuf> {
  let repo = Repository::discover(".").with_context(|| "Failed to open git repository")?;
  repo
    .workdir()
    .map(Path::to_path_buf)
    .ok_or_else(|| anyhow!("repository has no working directory"))
}
