//! # Configuration Module
//!
//! This module loads the go-header configuration file and turns it into
//! [`Settings`].
//!
//! Configuration is read from `.go-header.yml` (YAML) by default. A file whose
//! name ends in `.toml` is read as TOML instead. The path can be given with
//! `--config` or the `GO_HEADER_CONFIG` environment variable.
//!
//! ```yaml
//! template: |-
//!   Copyright {{ YEAR_RANGE }} {{ COMPANY }}
//!   SPDX-License-Identifier: Apache-2.0
//! vars:
//!   COMPANY:
//!     pattern: '[A-Z][a-z]+ (Inc|Ltd)\.'
//!     example: Acme Inc.
//! delims:
//!   left: "{{"
//!   right: "}}"
//! parallel: 4
//! comment-style: line
//! ```

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, anyhow};
use serde::Deserialize;

use crate::settings::{Settings, current_year};
use crate::templates::{CommentStyle, Delimiters, TemplateError};
use crate::value::{Value, ValueError, ValueSet};
use crate::verbose_log;

/// The default config file name.
pub const DEFAULT_CONFIG_FILENAME: &str = ".go-header.yml";

/// File names probed in the working directory, in order.
pub const CONFIG_CANDIDATES: [&str; 3] = [DEFAULT_CONFIG_FILENAME, ".go-header.yaml", ".go-header.toml"];

/// Environment variable for specifying config file path.
pub const CONFIG_ENV_VAR: &str = "GO_HEADER_CONFIG";

/// A regexp value: either a bare pattern or a pattern with a literal example
/// used when rendering fixes.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(untagged)]
pub enum RegexpConfig {
  Pattern(String),
  Detailed {
    pattern: String,
    #[serde(default)]
    example: Option<String>,
  },
}

impl RegexpConfig {
  fn into_value(self, key: &str) -> Value {
    match self {
      Self::Pattern(pattern)
      | Self::Detailed { pattern, example: None } => Value::regexp(key, pattern),
      Self::Detailed {
        pattern,
        example: Some(example),
      } => Value::regexp_with_example(key, pattern, example),
    }
  }
}

/// The deprecated `values` section.
#[derive(Debug, Default, Clone, Deserialize, PartialEq, Eq)]
pub struct ValuesConfig {
  #[serde(default, rename = "const")]
  pub constants: BTreeMap<String, String>,

  #[serde(default)]
  pub regexp: BTreeMap<String, RegexpConfig>,
}

/// Template placeholder markers.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct DelimsConfig {
  pub left: String,
  pub right: String,
}

/// Main configuration struct for go-header.
#[derive(Debug, Default, Clone, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub struct Config {
  /// Inline header template.
  #[serde(default)]
  pub template: Option<String>,

  /// Path to a file holding the template, used when `template` is unset.
  #[serde(default)]
  pub template_path: Option<PathBuf>,

  /// Constant and regexp values. Superseded by `vars`.
  #[serde(default)]
  pub values: ValuesConfig,

  /// Regexp values.
  #[serde(default)]
  pub vars: BTreeMap<String, RegexpConfig>,

  #[serde(default)]
  pub delims: Option<DelimsConfig>,

  /// Number of worker threads; defaults to the number of CPUs.
  #[serde(default)]
  pub parallel: Option<usize>,

  /// Skip cgo preamble comments when looking for the header.
  #[serde(default)]
  pub cgo: bool,

  /// Style of headers inserted into files that have none.
  #[serde(default)]
  pub comment_style: Option<CommentStyle>,
}

/// Error type for configuration operations.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
  /// The config file could not be read.
  #[error("Failed to read config file '{path}': {source}")]
  ReadError { path: PathBuf, source: std::io::Error },

  /// The config file contains invalid YAML.
  #[error("Failed to parse config file '{path}': {source}")]
  ParseError { path: PathBuf, source: serde_yaml::Error },

  /// The config file contains invalid TOML.
  #[error("Failed to parse config file '{path}': {source}")]
  TomlParseError { path: PathBuf, source: toml::de::Error },

  /// Neither `template` nor `template-path` is set.
  #[error("template has not been passed: set 'template' or 'template-path'")]
  MissingTemplate,

  /// The file named by `template-path` could not be read.
  #[error("Failed to read template file '{path}': {source}")]
  TemplateReadError { path: PathBuf, source: std::io::Error },

  #[error("Invalid delimiters {left:?} and {right:?}: both must be non-empty")]
  InvalidDelimiters { left: String, right: String },

  #[error("parallel must be at least 1")]
  InvalidParallel,

  #[error(transparent)]
  Value(#[from] ValueError),

  #[error(transparent)]
  Template(#[from] TemplateError),
}

impl Config {
  /// Load configuration from a file.
  ///
  /// # Arguments
  ///
  /// * `path` - Path to the configuration file
  ///
  /// # Returns
  ///
  /// The loaded configuration, or an error if the file cannot be read or
  /// parsed.
  pub fn load(path: &Path) -> Result<Self, ConfigError> {
    verbose_log!("Loading config from: {}", path.display());

    let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
      path: path.to_path_buf(),
      source: e,
    })?;

    if path.extension().is_some_and(|ext| ext.eq_ignore_ascii_case("toml")) {
      Self::from_toml(&content).map_err(|e| ConfigError::TomlParseError {
        path: path.to_path_buf(),
        source: e,
      })
    } else {
      Self::from_yaml(&content).map_err(|e| ConfigError::ParseError {
        path: path.to_path_buf(),
        source: e,
      })
    }
  }

  pub fn from_yaml(content: &str) -> Result<Self, serde_yaml::Error> {
    if content.trim().is_empty() {
      return Ok(Self::default());
    }
    serde_yaml::from_str(content)
  }

  pub fn from_toml(content: &str) -> Result<Self, toml::de::Error> {
    toml::from_str(content)
  }

  /// Returns the trimmed template text, reading `template-path` if needed.
  pub fn template_text(&self) -> Result<String, ConfigError> {
    if let Some(template) = self.template.as_deref().filter(|t| !t.trim().is_empty()) {
      return Ok(template.trim().to_string());
    }

    let path = self.template_path.as_ref().ok_or(ConfigError::MissingTemplate)?;
    verbose_log!("Reading template from: {}", path.display());
    let content = std::fs::read_to_string(path).map_err(|e| ConfigError::TemplateReadError {
      path: path.clone(),
      source: e,
    })?;
    Ok(content.trim().to_string())
  }

  /// Builds the values declared in this configuration on top of the
  /// built-in ones.
  ///
  /// Later sections override earlier ones: `values.const`, then
  /// `values.regexp`, then `vars`.
  pub fn value_set(&self, year: i32) -> ValueSet {
    let mut values = ValueSet::builtin(year);
    for (key, raw) in &self.values.constants {
      values.insert(Value::constant(key.as_str(), raw.as_str()));
    }
    for (key, regexp) in self.values.regexp.iter().chain(&self.vars) {
      values.insert(regexp.clone().into_value(key));
    }
    values
  }

  /// Converts the configuration into run settings.
  ///
  /// Only structural checks happen here; values and the template are
  /// validated by [`Analyzer::new`](crate::analyzer::Analyzer::new).
  pub fn into_settings(self) -> Result<Settings, ConfigError> {
    let template = self.template_text()?;

    let delimiters = match &self.delims {
      Some(delims) => {
        Delimiters::new(delims.left.as_str(), delims.right.as_str()).map_err(|_| ConfigError::InvalidDelimiters {
          left: delims.left.clone(),
          right: delims.right.clone(),
        })?
      }
      None => Delimiters::default(),
    };

    let parallel = match self.parallel {
      Some(0) => return Err(ConfigError::InvalidParallel),
      Some(parallel) => parallel,
      None => num_cpus::get(),
    };

    Ok(Settings {
      template: Some(template),
      delimiters,
      values: self.value_set(current_year()),
      comment_style: self.comment_style.unwrap_or_default(),
      parallel,
      cgo: self.cgo,
    })
  }
}

/// Discover the configuration file path.
///
/// The configuration file is discovered in the following order:
/// 1. Path specified via `--config` flag (passed as `explicit_path`)
/// 2. Path specified via `GO_HEADER_CONFIG` environment variable
/// 3. `.go-header.yml`, `.go-header.yaml` or `.go-header.toml` in the working
///    directory
///
/// # Arguments
///
/// * `explicit_path` - Optional explicit path from CLI flag
/// * `workdir` - The directory probed for default file names
///
/// # Returns
///
/// The path to the configuration file, or `None` if no config file is found.
pub fn discover_config_path(explicit_path: Option<&Path>, workdir: &Path) -> Option<PathBuf> {
  if let Some(path) = explicit_path {
    verbose_log!("Using explicit config path: {}", path.display());
    return Some(path.to_path_buf());
  }

  if let Ok(env_path) = std::env::var(CONFIG_ENV_VAR)
    && !env_path.is_empty()
  {
    verbose_log!("Using config from {}: {}", CONFIG_ENV_VAR, env_path);
    return Some(PathBuf::from(env_path));
  }

  let found = CONFIG_CANDIDATES
    .iter()
    .map(|name| workdir.join(name))
    .find(|path| path.exists());
  match &found {
    Some(path) => verbose_log!("Using config: {}", path.display()),
    None => verbose_log!("No config file found"),
  }
  found
}

/// Load the configuration from the discovered path.
///
/// # Arguments
///
/// * `explicit_path` - Optional explicit path from CLI flag
/// * `workdir` - The directory probed for default file names
///
/// # Errors
///
/// Fails when no configuration file exists or it cannot be loaded.
pub fn load_config(explicit_path: Option<&Path>, workdir: &Path) -> Result<Config> {
  let path = discover_config_path(explicit_path, workdir).ok_or_else(|| {
    anyhow!(
      "No configuration found: create {} or pass --config",
      DEFAULT_CONFIG_FILENAME
    )
  })?;
  Config::load(&path).with_context(|| format!("Failed to load config from {}", path.display()))
}
