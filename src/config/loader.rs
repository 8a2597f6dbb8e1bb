// mass-file-edit: batch file edits across hosted repositories
//
// SPDX-FileCopyrightText: 2026 Romeo Ahmed
// SPDX-License-Identifier: GPL-3.0-or-later

//! Layered configuration loading.
//!
//! ```text
//! defaults (Config::default)
//!   < mass-edit.toml in the working directory (optional)
//!   < --ini FILE ... (required, in order)
//!   < MFE_SECTION__KEY environment variables
//!   < --set section.key=value / global flags
//!        |
//!        v
//!    build() --> Config (validated) | ConfigError
//! ```

use std::fmt;
use std::path::{Path, PathBuf};

use config::{ConfigBuilder, Environment, File, FileFormat, builder::DefaultState};

use super::Config;
use crate::error::{ConfigError, MassEditResult};

/// Where a layer of configuration came from, for `mfe inis`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigSource {
    /// `--ini` file; missing files fail the build.
    File(PathBuf),
    /// Default file that was present on disk.
    Optional(PathBuf),
    /// Inline TOML.
    Inline,
    /// Environment variables with this prefix.
    Env(String),
}

impl fmt::Display for ConfigSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::File(path) => write!(f, "[file] {}", path.display()),
            Self::Optional(path) => write!(f, "[optional] {}", path.display()),
            Self::Inline => f.write_str("[string] <string>"),
            Self::Env(prefix) => write!(f, "[env] {prefix}_*"),
        }
    }
}

/// Accumulates configuration layers; later layers win.
pub struct ConfigLoader {
    builder: ConfigBuilder<DefaultState>,
    env_prefix: Option<String>,
    sources: Vec<ConfigSource>,
}

impl ConfigLoader {
    #[must_use]
    pub fn new() -> Self {
        Self {
            builder: config::Config::builder(),
            env_prefix: None,
            sources: Vec::new(),
        }
    }

    /// Adds a TOML file that must exist when `build()` runs.
    #[must_use]
    pub fn add_toml_file<P: AsRef<Path>>(mut self, path: P) -> Self {
        let path = path.as_ref();
        self.builder = self
            .builder
            .add_source(File::from(path).format(FileFormat::Toml).required(true));
        self.sources.push(ConfigSource::File(path.to_path_buf()));
        self
    }

    /// Adds a TOML file that is skipped when absent (`mass-edit.toml`).
    #[must_use]
    pub fn add_toml_file_optional<P: AsRef<Path>>(mut self, path: P) -> Self {
        let path = path.as_ref();
        self.builder = self
            .builder
            .add_source(File::from(path).format(FileFormat::Toml).required(false));
        if path.exists() {
            self.sources.push(ConfigSource::Optional(path.to_path_buf()));
        }
        self
    }

    #[must_use]
    pub fn add_toml_str(mut self, content: &str) -> Self {
        self.builder = self
            .builder
            .add_source(File::from_str(content, FileFormat::Toml));
        self.sources.push(ConfigSource::Inline);
        self
    }

    /// Reads `PREFIX_SECTION__KEY` environment variables, e.g.
    /// `MFE_GITHUB__DEFAULT_OWNER=acme` sets `github.default_owner`.
    #[must_use]
    pub fn with_env_prefix(mut self, prefix: &str) -> Self {
        self.env_prefix = Some(prefix.to_string());
        self.sources.push(ConfigSource::Env(prefix.to_string()));
        self
    }

    /// Overrides `key` (dotted, e.g. `batch.concurrency`) above every file
    /// and environment layer.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Load` if `key` is not a valid path expression.
    pub fn set<T: Into<config::Value>>(mut self, key: &str, value: T) -> MassEditResult<Self> {
        self.builder = self
            .builder
            .set_override(key, value)
            .map_err(ConfigError::from)?;
        Ok(self)
    }

    /// Merges all layers and validates the result.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Load` for a missing `--ini` file, malformed TOML,
    /// unknown keys or mistyped values, and `ConfigError::InvalidValue` when
    /// validation fails.
    pub fn build(self) -> MassEditResult<Config> {
        let builder = match &self.env_prefix {
            Some(prefix) => self.builder.add_source(
                Environment::with_prefix(prefix)
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            ),
            None => self.builder,
        };
        let config: Config = builder
            .build()
            .and_then(config::Config::try_deserialize)
            .map_err(ConfigError::from)?;
        config.validate()?;
        Ok(config)
    }

    /// Numbered source list, lowest precedence first.
    #[must_use]
    pub fn format_loaded_files(&self) -> Vec<String> {
        self.sources
            .iter()
            .enumerate()
            .map(|(i, source)| format!("{}. {source}", i + 1))
            .collect()
    }
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}
