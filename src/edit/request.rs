// mass-file-edit: batch file edits across hosted repositories
//
// SPDX-FileCopyrightText: 2026 Romeo Ahmed
// SPDX-License-Identifier: GPL-3.0-or-later

//! Edit requests and file operations.
//!
//! ```text
//! request file (TOML/JSON) --> RawEditRequest --+
//! CLI flags ------------------------------------+--> EditRequest (validated)
//!
//! FileOperation: Replace{pattern, replacement} | Append | Prepend | Delete
//! ```
//!
//! Malformed operations are rejected here, before any remote call.

use std::path::Path;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::RequestError;

/// Kind tag of a [`FileOperation`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OperationKind {
    Replace,
    Append,
    Prepend,
    Delete,
}

impl OperationKind {
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Replace => "replace",
            Self::Append => "append",
            Self::Prepend => "prepend",
            Self::Delete => "delete",
        }
    }
}

impl std::fmt::Display for OperationKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for OperationKind {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "replace" => Ok(Self::Replace),
            "append" => Ok(Self::Append),
            "prepend" => Ok(Self::Prepend),
            "delete" => Ok(Self::Delete),
            _ => Err(()),
        }
    }
}

/// One declarative mutation of one file.
#[derive(Debug, Clone)]
pub enum FileOperation {
    /// Replace every match of `pattern` with `replacement` (`$1` expands).
    Replace {
        path: String,
        pattern: Regex,
        /// Replacement rewritten to the `regex` crate's `${N}` syntax.
        replacement: String,
    },
    /// Add `content` after the current content, separated by a newline.
    Append { path: String, content: String },
    /// Add `content` before the current content, separated by a newline.
    Prepend { path: String, content: String },
    /// Remove the file.
    Delete { path: String },
}

fn checked_path(path: impl Into<String>, index: usize) -> Result<String, RequestError> {
    let path = path.into().trim().trim_start_matches('/').to_string();
    if path.is_empty() {
        return Err(RequestError::EmptyPath { index });
    }
    Ok(path)
}

impl FileOperation {
    /// # Errors
    ///
    /// Returns an error for an empty path, an empty pattern, or a pattern
    /// that does not compile.
    pub fn replace(
        path: impl Into<String>,
        pattern: &str,
        replacement: impl Into<String>,
    ) -> Result<Self, RequestError> {
        let path = checked_path(path, 0)?;
        if pattern.is_empty() {
            return Err(RequestError::MissingPattern { path });
        }
        let pattern = Regex::new(pattern).map_err(|e| RequestError::InvalidPattern {
            path: path.clone(),
            message: e.to_string(),
        })?;
        let replacement = expansion_template(&replacement.into(), &pattern);
        Ok(Self::Replace {
            path,
            pattern,
            replacement,
        })
    }

    /// # Errors
    ///
    /// Returns an error for an empty path or empty content.
    pub fn append(path: impl Into<String>, content: impl Into<String>) -> Result<Self, RequestError> {
        let path = checked_path(path, 0)?;
        let content = non_empty_content(OperationKind::Append, &path, content.into())?;
        Ok(Self::Append { path, content })
    }

    /// # Errors
    ///
    /// Returns an error for an empty path or empty content.
    pub fn prepend(path: impl Into<String>, content: impl Into<String>) -> Result<Self, RequestError> {
        let path = checked_path(path, 0)?;
        let content = non_empty_content(OperationKind::Prepend, &path, content.into())?;
        Ok(Self::Prepend { path, content })
    }

    /// # Errors
    ///
    /// Returns an error for an empty path.
    pub fn delete(path: impl Into<String>) -> Result<Self, RequestError> {
        Ok(Self::Delete {
            path: checked_path(path, 0)?,
        })
    }

    /// Repository-relative path of the target file.
    #[must_use]
    pub fn path(&self) -> &str {
        match self {
            Self::Replace { path, .. }
            | Self::Append { path, .. }
            | Self::Prepend { path, .. }
            | Self::Delete { path } => path,
        }
    }

    #[must_use]
    pub const fn kind(&self) -> OperationKind {
        match self {
            Self::Replace { .. } => OperationKind::Replace,
            Self::Append { .. } => OperationKind::Append,
            Self::Prepend { .. } => OperationKind::Prepend,
            Self::Delete { .. } => OperationKind::Delete,
        }
    }

    /// New text for the text-editing variants; `None` for `Delete`.
    #[must_use]
    pub fn render(&self, current: &str) -> Option<String> {
        match self {
            Self::Replace {
                pattern,
                replacement,
                ..
            } => Some(pattern.replace_all(current, replacement.as_str()).into_owned()),
            Self::Append { content, .. } => Some(format!("{current}\n{content}")),
            Self::Prepend { content, .. } => Some(format!("{content}\n{current}")),
            Self::Delete { .. } => None,
        }
    }
}

/// Rewrites `$` references to `${N}` form so the regex crate expands them
/// like `String.prototype.replace` does.
///
/// - `$$` is a literal `$`, `$&` the whole match
/// - `$NN`/`$N` name a group that exists in `pattern`, two digits first
/// - `$<name>` names a group when `pattern` has named groups
///
/// Any other `$` is kept literally.
fn expansion_template(replacement: &str, pattern: &Regex) -> String {
    let groups = pattern.captures_len().saturating_sub(1);
    let named = pattern.capture_names().flatten().next().is_some();

    let mut out = String::with_capacity(replacement.len());
    let mut rest = replacement;
    while let Some(pos) = rest.find('$') {
        out.push_str(&rest[..pos]);
        let tail = &rest[pos + 1..];
        let (reference, consumed) = dollar_reference(tail, groups, named);
        match reference {
            Some(reference) => out.push_str(&reference),
            None => out.push_str("$$"),
        }
        rest = &tail[consumed..];
    }
    out.push_str(rest);
    out
}

/// Parses what follows a `$`. Returns the expansion (`None` for a literal
/// dollar) and the number of bytes consumed after the `$`.
fn dollar_reference(tail: &str, groups: usize, named: bool) -> (Option<String>, usize) {
    let bytes = tail.as_bytes();
    let digit = |i: usize| {
        bytes
            .get(i)
            .filter(|b| b.is_ascii_digit())
            .map(|b| usize::from(*b - b'0'))
    };
    let valid = |n: usize| (1..=groups).contains(&n);

    match bytes.first() {
        Some(b'$') => (None, 1),
        Some(b'&') => (Some("${0}".to_string()), 1),
        Some(b'<') if named => tail[1..].find('>').map_or((None, 0), |end| {
            (Some(format!("${{{}}}", &tail[1..=end])), end + 2)
        }),
        Some(_) => match (digit(0), digit(1)) {
            (Some(tens), Some(ones)) if valid(tens * 10 + ones) => {
                (Some(format!("${{{}}}", tens * 10 + ones)), 2)
            }
            (Some(n), _) if valid(n) => (Some(format!("${{{n}}}")), 1),
            _ => (None, 0),
        },
        None => (None, 0),
    }
}

fn non_empty_content(
    kind: OperationKind,
    path: &str,
    content: String,
) -> Result<String, RequestError> {
    if content.is_empty() {
        return Err(RequestError::EmptyContent {
            operation: kind.to_string(),
            path: path.to_string(),
        });
    }
    Ok(content)
}

/// Which repositories a request targets.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RepositorySelectors {
    /// `name` or `owner/name`.
    pub explicit: Vec<String>,
    pub topics: Vec<String>,
}

impl RepositorySelectors {
    #[must_use]
    pub fn new(explicit: Vec<String>, topics: Vec<String>) -> Self {
        Self { explicit, topics }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.explicit.iter().all(|s| s.trim().is_empty())
            && self.topics.iter().all(|s| s.trim().is_empty())
    }
}

/// A validated batch edit request.
#[derive(Debug, Clone)]
pub struct EditRequest {
    selectors: RepositorySelectors,
    operations: Vec<FileOperation>,
    commit_message: String,
    branch_name: Option<String>,
    want_pull_request: bool,
    pr_title: Option<String>,
    pr_body: Option<String>,
}

impl EditRequest {
    /// Creates a request without a pull request and with a generated branch.
    ///
    /// # Errors
    ///
    /// Returns `RequestError::NoOperations` or
    /// `RequestError::MissingCommitMessage`.
    pub fn new(
        selectors: RepositorySelectors,
        operations: Vec<FileOperation>,
        commit_message: impl Into<String>,
    ) -> Result<Self, RequestError> {
        if operations.is_empty() {
            return Err(RequestError::NoOperations);
        }
        let commit_message = commit_message.into().trim().to_string();
        if commit_message.is_empty() {
            return Err(RequestError::MissingCommitMessage);
        }
        Ok(Self {
            selectors,
            operations,
            commit_message,
            branch_name: None,
            want_pull_request: false,
            pr_title: None,
            pr_body: None,
        })
    }

    /// Uses `branch` instead of a generated name. Blank names are ignored.
    ///
    /// # Errors
    ///
    /// Returns `RequestError::InvalidBranchName` for names Git would reject.
    pub fn with_branch_name(mut self, branch: impl Into<String>) -> Result<Self, RequestError> {
        let branch = branch.into().trim().to_string();
        if branch.is_empty() {
            self.branch_name = None;
            return Ok(self);
        }
        let invalid = branch.contains(char::is_whitespace)
            || branch.contains("..")
            || branch.starts_with('/')
            || branch.ends_with('/')
            || branch.ends_with(".lock")
            || branch.chars().any(|c| matches!(c, '~' | '^' | ':' | '?' | '*' | '[' | '\\'));
        if invalid {
            return Err(RequestError::InvalidBranchName { branch });
        }
        self.branch_name = Some(branch);
        Ok(self)
    }

    /// Requests a pull request per modified repository.
    #[must_use]
    pub fn with_pull_request(mut self, title: Option<String>, body: Option<String>) -> Self {
        self.want_pull_request = true;
        self.pr_title = title.filter(|t| !t.trim().is_empty());
        self.pr_body = body.filter(|b| !b.trim().is_empty());
        self
    }

    /// Disables pull request creation.
    #[must_use]
    pub fn without_pull_request(mut self) -> Self {
        self.want_pull_request = false;
        self
    }

    #[must_use]
    pub const fn selectors(&self) -> &RepositorySelectors {
        &self.selectors
    }

    #[must_use]
    pub fn operations(&self) -> &[FileOperation] {
        &self.operations
    }

    #[must_use]
    pub fn commit_message(&self) -> &str {
        &self.commit_message
    }

    #[must_use]
    pub fn branch_name(&self) -> Option<&str> {
        self.branch_name.as_deref()
    }

    #[must_use]
    pub const fn want_pull_request(&self) -> bool {
        self.want_pull_request
    }

    /// Pull request title, defaulting to `Mass file edit: <commit message>`.
    #[must_use]
    pub fn pr_title(&self) -> String {
        self.pr_title
            .clone()
            .unwrap_or_else(|| format!("Mass file edit: {}", self.commit_message))
    }

    /// Pull request body, defaulting to a note quoting the commit message.
    #[must_use]
    pub fn pr_body(&self) -> String {
        self.pr_body.clone().unwrap_or_else(|| {
            format!(
                "This PR was created automatically by the mass file editor.\n\nCommit message: {}",
                self.commit_message
            )
        })
    }
}

/// String-tagged operation as written in request files.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawFileOperation {
    #[serde(alias = "file_path", alias = "path")]
    pub file_path: String,
    pub operation: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(default, alias = "search_pattern", skip_serializing_if = "Option::is_none")]
    pub search_pattern: Option<String>,
    #[serde(default, alias = "replace_with", skip_serializing_if = "Option::is_none")]
    pub replace_with: Option<String>,
}

impl RawFileOperation {
    /// Converts to a [`FileOperation`]; `index` is only used in messages.
    ///
    /// # Errors
    ///
    /// Returns the `RequestError` describing the malformed combination.
    pub fn into_operation(self, index: usize) -> Result<FileOperation, RequestError> {
        let path = checked_path(self.file_path, index)?;
        let kind: OperationKind =
            self.operation
                .parse()
                .map_err(|()| RequestError::UnknownOperation {
                    operation: self.operation.clone(),
                    path: path.clone(),
                })?;

        match kind {
            OperationKind::Replace => {
                let pattern = self
                    .search_pattern
                    .filter(|p| !p.is_empty())
                    .ok_or_else(|| RequestError::MissingPattern { path: path.clone() })?;
                let replacement = self
                    .replace_with
                    .ok_or_else(|| RequestError::MissingReplacement { path: path.clone() })?;
                FileOperation::replace(path, &pattern, replacement)
            }
            OperationKind::Append => FileOperation::append(path, self.content.unwrap_or_default()),
            OperationKind::Prepend => {
                FileOperation::prepend(path, self.content.unwrap_or_default())
            }
            OperationKind::Delete => FileOperation::delete(path),
        }
    }
}

impl TryFrom<RawFileOperation> for FileOperation {
    type Error = RequestError;

    fn try_from(raw: RawFileOperation) -> Result<Self, Self::Error> {
        raw.into_operation(1)
    }
}

/// Request file contents, field names compatible with the JSON API shape.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RawEditRequest {
    pub repositories: Vec<String>,
    pub topics: Vec<String>,
    #[serde(alias = "file_operations", alias = "operations")]
    pub file_operations: Vec<RawFileOperation>,
    #[serde(alias = "commit_message")]
    pub commit_message: String,
    #[serde(alias = "branch_name", skip_serializing_if = "Option::is_none")]
    pub branch_name: Option<String>,
    #[serde(alias = "create_pull_request")]
    pub create_pull_request: bool,
    #[serde(alias = "pull_request_title", skip_serializing_if = "Option::is_none")]
    pub pull_request_title: Option<String>,
    #[serde(alias = "pull_request_body", skip_serializing_if = "Option::is_none")]
    pub pull_request_body: Option<String>,
}

impl RawEditRequest {
    /// Reads a request file; `.json` is parsed as JSON, anything else as TOML.
    ///
    /// # Errors
    ///
    /// Returns `RequestError::Parse` if the file cannot be read or parsed.
    pub fn from_path(path: &Path) -> Result<Self, RequestError> {
        let parse_error = |message: String| RequestError::Parse {
            path: path.display().to_string(),
            message,
        };
        let text = std::fs::read_to_string(path).map_err(|e| parse_error(e.to_string()))?;
        let is_json = path
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));
        if is_json {
            serde_json::from_str(&text).map_err(|e| parse_error(e.to_string()))
        } else {
            toml::from_str(&text).map_err(|e| parse_error(e.to_string()))
        }
    }

    /// Validates into an [`EditRequest`].
    ///
    /// # Errors
    ///
    /// Returns the first malformed operation or missing field.
    pub fn into_request(self) -> Result<EditRequest, RequestError> {
        let operations = self
            .file_operations
            .into_iter()
            .enumerate()
            .map(|(i, op)| op.into_operation(i + 1))
            .collect::<Result<Vec<_>, _>>()?;

        let mut request = EditRequest::new(
            RepositorySelectors::new(self.repositories, self.topics),
            operations,
            self.commit_message,
        )?;
        if let Some(branch) = self.branch_name {
            request = request.with_branch_name(branch)?;
        }
        if self.create_pull_request {
            request = request.with_pull_request(self.pull_request_title, self.pull_request_body);
        }
        Ok(request)
    }
}
