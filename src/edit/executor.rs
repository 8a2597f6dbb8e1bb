// mass-file-edit: batch file edits across hosted repositories
//
// SPDX-FileCopyrightText: 2026 Romeo Ahmed
// SPDX-License-Identifier: GPL-3.0-or-later

//! Applies one [`FileOperation`] to one file on the working branch.
//!
//! ```text
//! read (content, sha) --not found--> not_found
//!        |
//!     render --identical--> no_changes
//!        |
//! write/delete with sha --stale--> failed(version_conflict)
//!        |
//!     updated
//! ```
//!
//! Never returns an error: every failure is folded into the [`FileOutcome`].

use super::model::{FileErrorKind, FileOutcome, RepositoryTarget};
use super::request::FileOperation;
use crate::error::EditError;
use crate::github::{FileDelete, FileWrite, HostingApi};

pub async fn apply(
    api: &dyn HostingApi,
    target: &RepositoryTarget,
    branch: &str,
    operation: &FileOperation,
    commit_message: &str,
) -> FileOutcome {
    let path = operation.path();
    let outcome = match try_apply(api, target, branch, operation, commit_message).await {
        Ok(outcome) => outcome,
        Err(err) => FileOutcome::from_error(path, &err),
    };

    tracing::info!(
        repo = %target,
        branch,
        path,
        operation = %operation.kind(),
        status = %outcome.status,
        "File operation finished"
    );
    if let Some(error) = &outcome.error {
        tracing::debug!(repo = %target, path, error = %error, "File operation detail");
    }
    outcome
}

async fn try_apply(
    api: &dyn HostingApi,
    target: &RepositoryTarget,
    branch: &str,
    operation: &FileOperation,
    commit_message: &str,
) -> Result<FileOutcome, EditError> {
    let (owner, name) = (target.owner(), target.name());
    let path = operation.path();

    let current = api
        .file_content(owner, name, path, branch)
        .await
        .map_err(|e| EditError::for_file(path, e))?;

    if let FileOperation::Delete { .. } = operation {
        api.delete_file(
            owner,
            name,
            FileDelete {
                path,
                sha: &current.sha,
                branch,
                message: commit_message,
            },
        )
        .await
        .map_err(|e| EditError::for_file(path, e))?;
        return Ok(FileOutcome::updated(path));
    }

    let Ok(text) = std::str::from_utf8(&current.content) else {
        return Ok(FileOutcome::failed(
            path,
            FileErrorKind::InvalidContent,
            format!("{path} is not valid UTF-8 text"),
        ));
    };
    let Some(updated) = operation.render(text) else {
        return Ok(FileOutcome::no_changes(path));
    };
    if updated.as_bytes() == current.content.as_slice() {
        return Ok(FileOutcome::no_changes(path));
    }

    api.write_file(
        owner,
        name,
        FileWrite {
            path,
            content: updated.as_bytes(),
            sha: Some(&current.sha),
            branch,
            message: commit_message,
        },
    )
    .await
    .map_err(|e| EditError::for_file(path, e))?;

    Ok(FileOutcome::updated(path))
}
