// mass-file-edit: batch file edits across hosted repositories
//
// SPDX-FileCopyrightText: 2026 Romeo Ahmed
// SPDX-License-Identifier: GPL-3.0-or-later

//! Per-repository edit pipeline.
//!
//! ```text
//! Start --> BranchResolved --> BranchCreated --> OperationsApplied --> PullRequest?
//!   |             |                  |
//!   '-------------+------------------+--> Failed (outcome with failure_reason)
//! ```
//!
//! Branch step: create the ref at the default branch tip. If it exists, try a
//! fast-forward update; if that is refused the branch already carries our
//! commits and is reused as-is.

use super::executor;
use super::model::{BranchAction, RepoEditOutcome, RepoFailureKind, RepositoryTarget};
use super::request::EditRequest;
use crate::error::{EditError, GatewayError};
use crate::github::{HostingApi, NewPullRequest};

/// Default branch name and its tip commit.
#[derive(Debug, Clone, PartialEq, Eq)]
struct BaseBranch {
    name: String,
    tip: String,
}

/// Runs the full pipeline for `target` on working branch `branch`.
///
/// Always returns an outcome; failures are recorded in it.
pub async fn run(
    api: &dyn HostingApi,
    target: &RepositoryTarget,
    branch: &str,
    request: &EditRequest,
) -> RepoEditOutcome {
    let mut outcome = RepoEditOutcome::new(target.full_name());

    let base = match resolve_base(api, target).await {
        Ok(base) => base,
        Err(err) => {
            tracing::warn!(repo = %target, error = %err, "Cannot resolve default branch");
            outcome.fail(RepoFailureKind::RepositoryAccess, err.to_string());
            return outcome;
        }
    };
    tracing::debug!(repo = %target, base = %base.name, tip = %base.tip, "Resolved default branch");

    if branch == base.name {
        tracing::warn!(repo = %target, branch, "Working branch is the default branch");
        outcome.fail(
            RepoFailureKind::BranchCreation,
            format!("working branch must differ from default branch '{}'", base.name),
        );
        return outcome;
    }

    let action = match prepare_branch(api, target, branch, &base.tip).await {
        Ok(action) => action,
        Err(err) => {
            tracing::warn!(repo = %target, branch, error = %err, "Cannot create working branch");
            outcome.fail(
                RepoFailureKind::BranchCreation,
                format!("could not create branch '{branch}': {err}"),
            );
            return outcome;
        }
    };
    tracing::info!(repo = %target, branch, action = ?action, "Working branch ready");
    outcome.branch_name = Some(branch.to_string());
    outcome.branch_action = Some(action);

    for operation in request.operations() {
        let file = executor::apply(api, target, branch, operation, request.commit_message()).await;
        outcome.files_touched.push(file);
    }

    let modified = outcome.files_modified();
    if request.want_pull_request() && modified > 0 {
        open_pull_request(api, target, branch, &base.name, request, &mut outcome).await;
    } else if request.want_pull_request() {
        tracing::info!(repo = %target, "No files modified, skipping pull request");
    }

    outcome
}

async fn resolve_base(api: &dyn HostingApi, target: &RepositoryTarget) -> Result<BaseBranch, EditError> {
    let access = |source: GatewayError| EditError::RepositoryAccess {
        context: "could not resolve default branch".to_string(),
        source,
    };
    let info = api
        .repository(target.owner(), target.name())
        .await
        .map_err(access)?;
    let tip = api
        .branch_tip(target.owner(), target.name(), &info.default_branch)
        .await
        .map_err(access)?;
    Ok(BaseBranch {
        name: info.default_branch,
        tip,
    })
}

async fn prepare_branch(
    api: &dyn HostingApi,
    target: &RepositoryTarget,
    branch: &str,
    tip: &str,
) -> Result<BranchAction, EditError> {
    let (owner, name) = (target.owner(), target.name());
    match api.create_ref(owner, name, branch, tip).await {
        Ok(()) => return Ok(BranchAction::Created),
        Err(e) if e.is_conflict() => {
            tracing::debug!(repo = %target, branch, "Branch already exists, updating to default branch tip");
        }
        Err(e) => return Err(EditError::Transport(e)),
    }

    match api.update_ref(owner, name, branch, tip).await {
        Ok(()) => Ok(BranchAction::FastForwarded),
        Err(GatewayError::NotFastForward { .. }) => {
            tracing::info!(repo = %target, branch, "Branch has commits ahead of the tip, reusing it");
            Ok(BranchAction::Reused)
        }
        Err(e) => Err(EditError::Transport(e)),
    }
}

async fn open_pull_request(
    api: &dyn HostingApi,
    target: &RepositoryTarget,
    branch: &str,
    base: &str,
    request: &EditRequest,
    outcome: &mut RepoEditOutcome,
) {
    let title = request.pr_title();
    let body = request.pr_body();
    let pr = NewPullRequest {
        title: &title,
        body: &body,
        head: branch,
        base,
    };
    match api.create_pull_request(target.owner(), target.name(), pr).await {
        Ok(created) => {
            tracing::info!(repo = %target, url = %created.url, number = created.number, "Pull request opened");
            outcome.pull_request_url = Some(created.url);
            outcome.pull_request_number = Some(created.number);
        }
        Err(e) => {
            tracing::warn!(repo = %target, error = %e, "Pull request creation failed");
            outcome.pull_request_error = Some(e.to_string());
        }
    }
}
