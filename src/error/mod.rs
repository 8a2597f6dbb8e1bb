// mass-file-edit: batch file edits across hosted repositories
//
// SPDX-FileCopyrightText: 2026 Romeo Ahmed
// SPDX-License-Identifier: GPL-3.0-or-later

//! Error handling module.
//!
//! ```text
//!       MassEditError (~24 bytes)
//!               |
//!     +---------+---------+
//!     |         |         |
//!     v         v         v
//!   Bail     Request   Config
//!  Box<str>    Box       Box
//!
//! Engine errors (never escape a batch):
//!   Gateway  NotFound, Conflict, NotFastForward, Http, Timeout, Transport, Decode
//!   Edit     Resolution, RepositoryAccess, FileNotFound, VersionConflict, Transport
//!
//! Command errors:
//!   Request  EmptyPath, MissingPattern, InvalidPattern, EmptyContent, ...
//!   Config   Load, InvalidValue
//! ```
//!
//! Recovery scopes: `GatewayError`s are classified into `EditError`s at the
//! smallest scope that keeps the batch going (operation, repository, batch).
//! Only request, configuration and batch-outcome failures reach `main` as a
//! [`MassEditError`].

use thiserror::Error;

/// Convenience alias for `anyhow::Result`.
pub type Result<T> = anyhow::Result<T>;

/// Result type using [`MassEditError`].
pub type MassEditResult<T> = std::result::Result<T, MassEditError>;

/// Result type for hosting-service calls.
pub type GatewayResult<T> = std::result::Result<T, GatewayError>;

/// Top-level application error type.
///
/// All sub-errors are boxed to keep this enum at ~24 bytes on the stack.
#[derive(Debug, Error)]
pub enum MassEditError {
    /// Fatal error that should terminate the application.
    #[error("{0}")]
    Bailed(Box<str>),

    /// Malformed edit request.
    #[error("invalid request: {0}")]
    Request(#[from] Box<RequestError>),

    /// Configuration error.
    #[error("config error: {0}")]
    Config(#[from] Box<ConfigError>),
}

impl MassEditError {
    /// Returns `true` when the user's input was rejected before any remote
    /// call (request or configuration).
    #[must_use]
    pub const fn is_usage(&self) -> bool {
        matches!(self, Self::Request(_) | Self::Config(_))
    }
}

/// Create a fatal [`MassEditError::Bailed`] that terminates the application.
pub fn bail_out(message: impl Into<String>) -> MassEditError {
    MassEditError::Bailed(message.into().into_boxed_str())
}

// --- From implementations for boxing ---

/// Macro to generate `From` implementations that box the source error.
macro_rules! impl_from_boxed {
    ($($error:ty => $variant:ident),+ $(,)?) => {
        $(
            impl From<$error> for MassEditError {
                fn from(err: $error) -> Self {
                    MassEditError::$variant(Box::new(err))
                }
            }
        )+
    };
}

impl_from_boxed! {
    RequestError => Request,
    ConfigError => Config,
}

// --- Gateway Errors ---

/// Errors reported by the hosting service gateway.
#[derive(Debug, Error)]
pub enum GatewayError {
    /// The resource does not exist or is not accessible.
    #[error("not found: {what}")]
    NotFound { what: String },

    /// A precondition failed: the ref already exists or a version token is stale.
    #[error("conflict on {what}: {message}")]
    Conflict { what: String, message: String },

    /// A ref update was rejected because it is not a fast-forward.
    #[error("update of branch '{branch}' is not a fast-forward")]
    NotFastForward { branch: String },

    /// Any other non-success HTTP response.
    #[error("http error {status}: {url} ({body})")]
    Http { status: u16, url: String, body: String },

    /// The call exceeded the configured timeout.
    #[error("request timed out: {url}")]
    Timeout { url: String },

    /// Network-level failure.
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// The response body could not be decoded.
    #[error("failed to decode response from {url}: {message}")]
    Decode { url: String, message: String },
}

impl GatewayError {
    /// Returns `true` for [`GatewayError::NotFound`].
    #[must_use]
    pub const fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    /// Returns `true` for [`GatewayError::Conflict`].
    #[must_use]
    pub const fn is_conflict(&self) -> bool {
        matches!(self, Self::Conflict { .. })
    }
}

// --- Edit Errors ---

/// Failure taxonomy of the edit engine.
///
/// Each variant names the scope at which the failure is recovered.
#[derive(Debug, Error)]
pub enum EditError {
    /// Owner, identity or discovery failure (batch-level, non-fatal).
    #[error("resolution failed: {0}")]
    Resolution(String),

    /// Repository or branch lookup failed (terminates that repository).
    #[error("{context}: {source}")]
    RepositoryAccess {
        context: String,
        #[source]
        source: GatewayError,
    },

    /// The file to edit does not exist on the working branch.
    #[error("file not found: {path}")]
    FileNotFound { path: String },

    /// The file changed between read and write.
    #[error("version conflict on {path}: {message}")]
    VersionConflict { path: String, message: String },

    /// Any other hosting-service failure.
    #[error(transparent)]
    Transport(GatewayError),
}

impl EditError {
    /// Classifies a gateway error raised while reading or writing `path`.
    #[must_use]
    pub fn for_file(path: &str, err: GatewayError) -> Self {
        match err {
            GatewayError::NotFound { .. } => Self::FileNotFound {
                path: path.to_string(),
            },
            GatewayError::Conflict { message, .. } => Self::VersionConflict {
                path: path.to_string(),
                message,
            },
            other => Self::Transport(other),
        }
    }
}

// --- Request Errors ---

/// Malformed edit requests, rejected before any remote call.
#[derive(Debug, Error)]
pub enum RequestError {
    /// Operation has no file path.
    #[error("file operation #{index} has an empty file path")]
    EmptyPath { index: usize },

    /// Replace operation without a search pattern.
    #[error("replace operation on '{path}' requires a search pattern")]
    MissingPattern { path: String },

    /// Replace operation without a replacement field.
    #[error("replace operation on '{path}' requires a replacement (may be empty)")]
    MissingReplacement { path: String },

    /// Search pattern is not a valid regular expression.
    #[error("invalid search pattern for '{path}': {message}")]
    InvalidPattern { path: String, message: String },

    /// Append or prepend without content.
    #[error("{operation} operation on '{path}' requires non-empty content")]
    EmptyContent { operation: String, path: String },

    /// Unrecognized operation tag.
    #[error("unknown operation '{operation}' for '{path}'")]
    UnknownOperation { operation: String, path: String },

    /// No file operations were given.
    #[error("no file operations specified")]
    NoOperations,

    /// Commit message is missing.
    #[error("commit message is required")]
    MissingCommitMessage,

    /// Branch name Git would refuse.
    #[error("invalid branch name '{branch}'")]
    InvalidBranchName { branch: String },

    /// Request file could not be parsed.
    #[error("failed to parse request file '{path}': {message}")]
    Parse { path: String, message: String },
}

// --- Config Errors ---

/// Configuration-related errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Sources could not be read, parsed or deserialized.
    #[error("failed to load configuration: {message}")]
    Load { message: String },

    /// Invalid configuration value.
    #[error("invalid value for '{key}' in section '[{section}]': {message}")]
    InvalidValue {
        section: String,
        key: String,
        message: String,
    },
}

impl From<config::ConfigError> for ConfigError {
    fn from(err: config::ConfigError) -> Self {
        Self::Load {
            message: err.to_string(),
        }
    }
}
