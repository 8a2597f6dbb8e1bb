// mass-file-edit: batch file edits across hosted repositories
//
// SPDX-FileCopyrightText: 2026 Romeo Ahmed
// SPDX-License-Identifier: GPL-3.0-or-later

//! Configuration management for mass-file-edit.
//!
//! # Configuration Hierarchy
//!
//! ```text
//! Priority (low → high)
//! 1. defaults
//! 2. mass-edit.toml (cwd, optional)
//! 3. --ini files
//! 4. MFE_* env vars
//! 5. CLI overrides
//! ```
//!
//! # Environment Variable Mapping
//!
//! ```text
//! MFE_GLOBAL__DRY=true             → global.dry = true
//! MFE_GITHUB__DEFAULT_OWNER=acme   → github.default_owner = "acme"
//! MFE_BATCH__CONCURRENCY=8         → batch.concurrency = 8
//! ```
//!
//! # Example
//!
//! ```toml
//! [github]
//! api_url = "https://ghe.example.com/api/v3"
//! default_owner = "platform"
//! timeout_secs = 20
//!
//! [batch]
//! concurrency = 8
//! branch_prefix = "bulk-edit"
//! ```

pub mod loader;
pub mod types;


use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

use crate::error::{ConfigError, MassEditResult};

use loader::ConfigLoader;
use types::{BatchConfig, GithubConfig, GlobalConfig};

/// Complete application configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// Global options.
    pub global: GlobalConfig,
    /// Hosting service settings.
    pub github: GithubConfig,
    /// Batch execution settings.
    pub batch: BatchConfig,
}

impl Config {
    /// Create a new configuration builder.
    ///
    /// # Example
    ///
    /// ```no_run
    /// use mass_file_edit::config::Config;
    ///
    /// let config = Config::builder()
    ///     .add_toml_file("config/default.toml")
    ///     .add_toml_file_optional("mass-edit.toml")
    ///     .with_env_prefix("MFE")
    ///     .build()?;
    /// # Ok::<(), anyhow::Error>(())
    /// ```
    #[must_use]
    pub fn builder() -> ConfigLoader {
        ConfigLoader::new()
    }

    /// Load configuration from a single TOML file (simple API).
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, contains invalid TOML, or
    /// does not match the `Config` structure.
    pub fn from_file<P: AsRef<Path>>(path: P) -> MassEditResult<Self> {
        Self::builder().add_toml_file(path).build()
    }

    /// Load configuration from a TOML string.
    ///
    /// # Errors
    ///
    /// Returns an error if the content is not valid TOML or does not match the
    /// `Config` structure.
    pub fn parse(content: &str) -> MassEditResult<Self> {
        Self::builder().add_toml_str(content).build()
    }

    /// Validate all sections.
    ///
    /// # Errors
    ///
    /// Returns the first `ConfigError` found.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.github.validate()?;
        self.batch.validate()
    }

    /// Format configuration options for display.
    ///
    /// Sensitive fields (the API token) are shown as `[hidden]`.
    /// Output is deterministically ordered using `BTreeMap`.
    #[must_use]
    pub fn format_options(&self) -> Vec<String> {
        let mut options = BTreeMap::new();
        self.format_global_options(&mut options);
        self.format_github_options(&mut options);
        self.format_batch_options(&mut options);

        let max_key_len = options.keys().map(String::len).max().unwrap_or(0);

        options
            .into_iter()
            .map(|(key, value)| format!("{key:<max_key_len$} = {value}"))
            .collect()
    }

    fn format_global_options(&self, options: &mut BTreeMap<String, String>) {
        options.insert("global.dry".into(), self.global.dry.to_string());
        options.insert(
            "global.output_log_level".into(),
            self.global.output_log_level.as_u8().to_string(),
        );
        options.insert(
            "global.file_log_level".into(),
            self.global.file_log_level.as_u8().to_string(),
        );
        options.insert(
            "global.log_file".into(),
            self.global
                .log_file
                .as_ref()
                .map_or_else(String::new, |p| p.display().to_string()),
        );
        options.insert("global.json_logs".into(), self.global.json_logs.to_string());
    }

    fn format_github_options(&self, options: &mut BTreeMap<String, String>) {
        options.insert("github.api_url".into(), self.github.api_url.clone());
        if !self.github.token.is_empty() {
            options.insert("github.token".into(), "[hidden]".into());
        }
        if let Some(owner) = self.github.default_owner() {
            options.insert("github.default_owner".into(), owner.to_string());
        }
        options.insert(
            "github.timeout_secs".into(),
            self.github.timeout_secs.to_string(),
        );
        options.insert(
            "github.topic_search_limit".into(),
            self.github.topic_search_limit.to_string(),
        );
        if !self.github.user_agent.is_empty() {
            options.insert("github.user_agent".into(), self.github.user_agent.clone());
        }
    }

    fn format_batch_options(&self, options: &mut BTreeMap<String, String>) {
        options.insert(
            "batch.concurrency".into(),
            self.batch.concurrency.to_string(),
        );
        options.insert(
            "batch.branch_prefix".into(),
            self.batch.branch_prefix.clone(),
        );
    }
}
