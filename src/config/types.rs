// mass-file-edit: batch file edits across hosted repositories
//
// SPDX-FileCopyrightText: 2026 Romeo Ahmed
// SPDX-License-Identifier: GPL-3.0-or-later

//! Configuration types for mass-file-edit.
//!
//! # Config Structure
//!
//! ```text
//! Config: GlobalConfig, GithubConfig, BatchConfig
//! ```

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

use crate::error::ConfigError;
use crate::logging::LogLevel;

/// Default GitHub REST endpoint.
pub const DEFAULT_API_URL: &str = "https://api.github.com";

/// Default maximum number of repositories discovered per topic.
pub const DEFAULT_TOPIC_SEARCH_LIMIT: usize = 50;

/// Default number of repositories processed at once.
pub const DEFAULT_CONCURRENCY: usize = 4;

/// Default prefix of generated working branch names.
pub const DEFAULT_BRANCH_PREFIX: &str = "mass-file-edit";

/// Global configuration options.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GlobalConfig {
    /// Resolve and list target repositories without writing anything.
    pub dry: bool,
    /// Log level for console output (0-6).
    pub output_log_level: LogLevel,
    /// Log level for file output (0-6).
    pub file_log_level: LogLevel,
    /// Path to log file.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub log_file: Option<PathBuf>,
    /// Emit console logs as JSON lines.
    pub json_logs: bool,
}

impl Default for GlobalConfig {
    fn default() -> Self {
        Self {
            dry: false,
            output_log_level: LogLevel::INFO,
            file_log_level: LogLevel::TRACE,
            log_file: None,
            json_logs: false,
        }
    }
}

/// Hosting service (GitHub REST API) settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct GithubConfig {
    /// Base URL of the REST API, or of a proxy forwarding to it.
    pub api_url: String,
    /// API token. Optional when a proxy injects credentials.
    #[serde(skip_serializing_if = "String::is_empty")]
    pub token: String,
    /// Owner used for bare repository names when the authenticated
    /// identity cannot be determined.
    #[serde(skip_serializing_if = "String::is_empty")]
    pub default_owner: String,
    /// Per-request timeout in seconds (0 disables the timeout).
    pub timeout_secs: u64,
    /// Maximum number of repositories discovered per topic.
    pub topic_search_limit: usize,
    /// Override for the User-Agent header.
    #[serde(skip_serializing_if = "String::is_empty")]
    pub user_agent: String,
}

impl Default for GithubConfig {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            token: String::new(),
            default_owner: String::new(),
            timeout_secs: 30,
            topic_search_limit: DEFAULT_TOPIC_SEARCH_LIMIT,
            user_agent: String::new(),
        }
    }
}

impl GithubConfig {
    /// Request timeout, `None` when disabled.
    #[must_use]
    pub const fn timeout(&self) -> Option<Duration> {
        if self.timeout_secs == 0 {
            None
        } else {
            Some(Duration::from_secs(self.timeout_secs))
        }
    }

    /// Configured fallback owner, if any.
    #[must_use]
    pub fn default_owner(&self) -> Option<&str> {
        let owner = self.default_owner.trim();
        (!owner.is_empty()).then_some(owner)
    }

    /// Checks the values that would otherwise only fail at request time.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidValue` for a malformed `api_url` or an
    /// out-of-range `topic_search_limit`.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let invalid = |key: &str, message: String| ConfigError::InvalidValue {
            section: "github".to_string(),
            key: key.to_string(),
            message,
        };

        match reqwest::Url::parse(&self.api_url) {
            Ok(url) if matches!(url.scheme(), "http" | "https") => {}
            Ok(url) => {
                return Err(invalid(
                    "api_url",
                    format!("unsupported scheme '{}'", url.scheme()),
                ));
            }
            Err(e) => return Err(invalid("api_url", e.to_string())),
        }

        if !(1..=1000).contains(&self.topic_search_limit) {
            return Err(invalid(
                "topic_search_limit",
                format!("must be 1-1000, got {}", self.topic_search_limit),
            ));
        }

        Ok(())
    }
}

/// Batch execution settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct BatchConfig {
    /// Number of repository pipelines run concurrently.
    pub concurrency: usize,
    /// Prefix of generated working branch names.
    pub branch_prefix: String,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            concurrency: DEFAULT_CONCURRENCY,
            branch_prefix: DEFAULT_BRANCH_PREFIX.to_string(),
        }
    }
}

impl BatchConfig {
    /// Checks pool size and branch prefix.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidValue` if `concurrency` is zero or
    /// `branch_prefix` is empty or contains whitespace.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.concurrency == 0 {
            return Err(ConfigError::InvalidValue {
                section: "batch".to_string(),
                key: "concurrency".to_string(),
                message: "must be at least 1".to_string(),
            });
        }
        if self.branch_prefix.is_empty() || self.branch_prefix.contains(char::is_whitespace) {
            return Err(ConfigError::InvalidValue {
                section: "batch".to_string(),
                key: "branch_prefix".to_string(),
                message: format!("invalid branch prefix '{}'", self.branch_prefix),
            });
        }
        Ok(())
    }
}
