// mass-file-edit: batch file edits across hosted repositories
//
// SPDX-FileCopyrightText: 2026 Romeo Ahmed
// SPDX-License-Identifier: GPL-3.0-or-later

//! Targets, per-file and per-repository outcomes, and the batch summary.
//!
//! ```text
//! RepositoryTarget --pipeline--> RepoEditOutcome { files_touched: [FileOutcome] }
//!                                         |
//!                      fold all ----------+--> BatchSummary
//! ```

use std::fmt;
use std::hash::{Hash, Hasher};

use serde::{Deserialize, Serialize};

use crate::error::EditError;

/// A repository to edit. Identity is `(owner, name)`, compared exactly.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RepositoryTarget {
    owner: String,
    name: String,
    /// Default branch as reported by discovery. Never used as the branch
    /// source; the pipeline always reads the live value.
    #[serde(skip_serializing_if = "Option::is_none")]
    default_branch: Option<String>,
}

impl RepositoryTarget {
    #[must_use]
    pub fn new(owner: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            owner: owner.into(),
            name: name.into(),
            default_branch: None,
        }
    }

    /// Parses `owner/name`. Returns `None` unless there are exactly two
    /// non-empty segments.
    #[must_use]
    pub fn parse(full_name: &str) -> Option<Self> {
        let (owner, name) = full_name.trim().split_once('/')?;
        if owner.is_empty() || name.is_empty() || name.contains('/') {
            return None;
        }
        Some(Self::new(owner, name))
    }

    #[must_use]
    pub fn with_default_branch(mut self, branch: Option<String>) -> Self {
        self.default_branch = branch;
        self
    }

    #[must_use]
    pub fn owner(&self) -> &str {
        &self.owner
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn default_branch_hint(&self) -> Option<&str> {
        self.default_branch.as_deref()
    }

    /// `owner/name`.
    #[must_use]
    pub fn full_name(&self) -> String {
        format!("{}/{}", self.owner, self.name)
    }
}

impl PartialEq for RepositoryTarget {
    fn eq(&self, other: &Self) -> bool {
        self.owner == other.owner && self.name == other.name
    }
}

impl Eq for RepositoryTarget {}

impl Hash for RepositoryTarget {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.owner.hash(state);
        self.name.hash(state);
    }
}

impl fmt::Display for RepositoryTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.owner, self.name)
    }
}

/// Result of one file operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FileStatus {
    /// Content written or file deleted.
    Updated,
    /// New content identical to current; nothing written.
    NoChanges,
    /// File absent on the working branch; nothing written.
    NotFound,
    /// Read or write failed.
    Failed,
}

impl FileStatus {
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Updated => "updated",
            Self::NoChanges => "no_changes",
            Self::NotFound => "not_found",
            Self::Failed => "failed",
        }
    }
}

impl fmt::Display for FileStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Why a file operation did not succeed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FileErrorKind {
    NotFound,
    /// The version token was stale at write time. Not retried.
    VersionConflict,
    Transport,
    /// Existing content cannot be edited as text.
    InvalidContent,
}

/// Outcome of one file operation, one per requested operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileOutcome {
    pub path: String,
    pub status: FileStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_kind: Option<FileErrorKind>,
}

impl FileOutcome {
    #[must_use]
    pub fn updated(path: impl Into<String>) -> Self {
        Self::with_status(path, FileStatus::Updated)
    }

    #[must_use]
    pub fn no_changes(path: impl Into<String>) -> Self {
        Self::with_status(path, FileStatus::NoChanges)
    }

    #[must_use]
    pub fn failed(path: impl Into<String>, kind: FileErrorKind, error: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            status: FileStatus::Failed,
            error: Some(error.into()),
            error_kind: Some(kind),
        }
    }

    /// Maps an engine error onto the outcome the caller sees.
    #[must_use]
    pub fn from_error(path: impl Into<String>, err: &EditError) -> Self {
        let path = path.into();
        let kind = match err {
            EditError::FileNotFound { .. } => {
                return Self {
                    path,
                    status: FileStatus::NotFound,
                    error: Some(err.to_string()),
                    error_kind: Some(FileErrorKind::NotFound),
                };
            }
            EditError::VersionConflict { .. } => FileErrorKind::VersionConflict,
            _ => FileErrorKind::Transport,
        };
        Self::failed(path, kind, err.to_string())
    }

    fn with_status(path: impl Into<String>, status: FileStatus) -> Self {
        Self {
            path: path.into(),
            status,
            error: None,
            error_kind: None,
        }
    }
}

/// How the working branch came to point where it does.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BranchAction {
    /// Newly created at the default branch tip.
    Created,
    /// Existed; moved forward to the default branch tip.
    FastForwarded,
    /// Existed with its own commits on top of the tip; used as-is.
    Reused,
}

/// Stage at which a repository pipeline gave up.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RepoFailureKind {
    /// Repository or default branch could not be read.
    RepositoryAccess,
    /// Working branch could not be created or updated.
    BranchCreation,
    /// Error or panic outside the modeled failure paths.
    Unexpected,
}

/// Terminal result of one repository's pipeline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RepoEditOutcome {
    pub repository: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub branch_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub branch_action: Option<BranchAction>,
    #[serde(default)]
    pub files_touched: Vec<FileOutcome>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pull_request_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pull_request_number: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pull_request_error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub failure_reason: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub failure_kind: Option<RepoFailureKind>,
}

impl RepoEditOutcome {
    /// Empty outcome at pipeline start.
    #[must_use]
    pub fn new(repository: impl Into<String>) -> Self {
        Self {
            repository: repository.into(),
            branch_name: None,
            branch_action: None,
            files_touched: Vec::new(),
            pull_request_url: None,
            pull_request_number: None,
            pull_request_error: None,
            failure_reason: None,
            failure_kind: None,
        }
    }

    /// Outcome for a repository that failed before any file was touched.
    #[must_use]
    pub fn failed(
        repository: impl Into<String>,
        kind: RepoFailureKind,
        reason: impl Into<String>,
    ) -> Self {
        let mut outcome = Self::new(repository);
        outcome.fail(kind, reason);
        outcome
    }

    /// Marks the pipeline as failed. File outcomes recorded so far are kept.
    pub fn fail(&mut self, kind: RepoFailureKind, reason: impl Into<String>) {
        self.failure_kind = Some(kind);
        self.failure_reason = Some(reason.into());
    }

    /// Number of files with status `updated`.
    #[must_use]
    pub fn files_modified(&self) -> usize {
        self.files_touched
            .iter()
            .filter(|f| f.status == FileStatus::Updated)
            .count()
    }

    /// Whether the pipeline applied its operations without a failure reason.
    /// Individual file failures do not count against this.
    #[must_use]
    pub const fn succeeded(&self) -> bool {
        self.failure_reason.is_none()
    }
}

/// Category of a batch-level message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BatchMessageKind {
    /// Nothing to do: no repository was named or discovered.
    NoRepositories,
    /// Identity lookup failed; the configured owner was used.
    OwnerFallback,
    /// No owner could be determined; bare names were skipped.
    OwnerUnavailable,
    /// A repository selector could not be parsed.
    InvalidRepositoryName,
    /// A topic search failed; other topics were still searched.
    DiscoveryFailed,
    /// A repository pipeline failed unexpectedly.
    RepositoryFailed,
    /// The batch was cancelled before every repository ran.
    Cancelled,
}

/// A non-fatal problem not attributable to a single file operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchMessage {
    pub kind: BatchMessageKind,
    pub message: String,
}

impl BatchMessage {
    #[must_use]
    pub fn new(kind: BatchMessageKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

impl fmt::Display for BatchMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

/// Aggregate result of a batch run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchSummary {
    pub total_repositories: usize,
    pub successful_repositories: usize,
    pub failed_repositories: usize,
    /// Resolved but never started because the batch was cancelled.
    pub skipped_repositories: usize,
    pub total_files_modified: usize,
    pub discovered_repositories: Vec<String>,
    pub errors: Vec<BatchMessage>,
    pub results: Vec<RepoEditOutcome>,
    pub cancelled: bool,
}

impl BatchSummary {
    /// Summary for a batch that never reached any repository.
    #[must_use]
    pub fn empty(discovered: Vec<String>, errors: Vec<BatchMessage>) -> Self {
        Self {
            discovered_repositories: discovered,
            errors,
            ..Self::default()
        }
    }

    /// Folds per-repository outcomes into counters.
    #[must_use]
    pub fn fold(
        results: Vec<RepoEditOutcome>,
        skipped: usize,
        discovered: Vec<String>,
        errors: Vec<BatchMessage>,
    ) -> Self {
        let successful = results.iter().filter(|r| r.succeeded()).count();
        let files = results.iter().map(RepoEditOutcome::files_modified).sum();
        Self {
            total_repositories: results.len() + skipped,
            successful_repositories: successful,
            failed_repositories: results.len() - successful,
            skipped_repositories: skipped,
            total_files_modified: files,
            discovered_repositories: discovered,
            cancelled: skipped > 0
                || errors.iter().any(|e| e.kind == BatchMessageKind::Cancelled),
            errors,
            results,
        }
    }

    /// Whether anything went wrong at repository level or above.
    #[must_use]
    pub fn has_failures(&self) -> bool {
        self.failed_repositories > 0
            || self.cancelled
            || self
                .errors
                .iter()
                .any(|e| e.kind != BatchMessageKind::OwnerFallback)
    }

    /// Outcome for `repository` (`owner/name`), if it ran.
    #[must_use]
    pub fn outcome(&self, repository: &str) -> Option<&RepoEditOutcome> {
        self.results.iter().find(|r| r.repository == repository)
    }
}
