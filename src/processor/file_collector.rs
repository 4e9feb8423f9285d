//! # File Collector Module
//!
//! This module provides utilities for collecting Go files from the paths
//! given on the command line, and for narrowing them to the files changed
//! relative to a git reference.

use std::collections::{BTreeSet, HashSet};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use ignore::WalkBuilder;
use tracing::{debug, trace};

/// Directories never descended into.
pub const SKIPPED_DIRS: [&str; 2] = ["vendor", "testdata"];

/// File collector for directory traversal.
///
/// The `FileCollector` handles:
/// - Expanding directory arguments into the Go files below them
/// - Honouring `.gitignore` and skipping `vendor` and `testdata`
/// - Filtering by the set of files changed in git
#[derive(Debug, Default, Clone, Copy)]
pub struct FileCollector;

impl FileCollector {
  pub const fn new() -> Self {
    Self
  }

  /// Collects files under every path, sorted and without duplicates.
  ///
  /// File arguments are kept as given. Directory arguments are walked.
  ///
  /// # Parameters
  ///
  /// * `paths` - Files or directories to scan
  ///
  /// # Returns
  ///
  /// A vector of file paths, or an error if a path does not exist.
  pub fn collect(&self, paths: &[PathBuf]) -> Result<Vec<PathBuf>> {
    let start_time = std::time::Instant::now();
    let mut files = BTreeSet::new();

    for path in paths {
      let metadata = std::fs::metadata(path).with_context(|| format!("Failed to access path: {}", path.display()))?;
      if metadata.is_dir() {
        files.extend(self.traverse_directory(path)?);
      } else {
        files.insert(path.clone());
      }
    }

    debug!(
      "Found {} files in {}ms",
      files.len(),
      start_time.elapsed().as_millis()
    );
    Ok(files.into_iter().collect())
  }

  /// Traverses a directory recursively and collects its Go files.
  ///
  /// # Parameters
  ///
  /// * `dir` - The directory to traverse
  ///
  /// # Returns
  ///
  /// A vector of file paths found in the directory.
  pub fn traverse_directory(&self, dir: &Path) -> Result<Vec<PathBuf>> {
    debug!("Scanning directory: {}", dir.display());

    let walker = WalkBuilder::new(dir)
      .hidden(true)
      .git_ignore(true)
      .require_git(false)
      .filter_entry(|entry| {
        let is_dir = entry.file_type().is_some_and(|ft| ft.is_dir());
        !(is_dir && entry.depth() > 0 && is_skipped_dir(entry.file_name().to_str().unwrap_or_default()))
      })
      .build();

    let mut files = Vec::new();
    for entry in walker {
      let entry = match entry {
        Ok(entry) => entry,
        Err(err) => {
          debug!("Skipping unreadable entry: {}", err);
          continue;
        }
      };
      if !entry.file_type().is_some_and(|ft| ft.is_file()) {
        continue;
      }
      if is_go_file(entry.path()) {
        trace!("Collected {}", entry.path().display());
        files.push(entry.into_path());
      }
    }

    Ok(files)
  }
}

fn is_skipped_dir(name: &str) -> bool {
  SKIPPED_DIRS.contains(&name) || name.starts_with('_')
}

/// Returns `true` for `.go` files.
pub fn is_go_file(path: &Path) -> bool {
  path.extension().is_some_and(|ext| ext == "go")
}

/// Keeps only the files whose repository-relative path is in `changed`.
///
/// # Parameters
///
/// * `files` - Collected files, relative to the working directory or absolute
/// * `changed` - Paths relative to `repo_root`
/// * `repo_root` - Root of the git working tree
pub fn filter_changed(files: Vec<PathBuf>, changed: &HashSet<PathBuf>, repo_root: &Path) -> Result<Vec<PathBuf>> {
  let repo_root = repo_root.canonicalize().unwrap_or_else(|_| repo_root.to_path_buf());
  let mut kept = Vec::with_capacity(files.len().min(changed.len()));

  for file in files {
    let absolute = absolutize_path(&file)?;
    let absolute = absolute.canonicalize().unwrap_or(absolute);
    let keep = absolute
      .strip_prefix(&repo_root)
      .is_ok_and(|relative| changed.contains(relative));
    if keep {
      kept.push(file);
    } else {
      trace!("Unchanged, skipping {}", file.display());
    }
  }

  Ok(kept)
}

/// Converts a potentially relative path to an absolute path.
///
/// # Parameters
///
/// * `path` - The path to absolutize
///
/// # Returns
///
/// The absolute path.
pub fn absolutize_path(path: &Path) -> Result<PathBuf> {
  if path.is_absolute() {
    Ok(path.to_path_buf())
  } else {
    let current_dir = std::env::current_dir().with_context(|| "Failed to get current directory")?;
    Ok(current_dir.join(path))
  }
}
