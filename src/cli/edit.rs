// mass-file-edit: batch file edits across hosted repositories
//
// SPDX-FileCopyrightText: 2026 Romeo Ahmed
// SPDX-License-Identifier: GPL-3.0-or-later

//! CLI arguments for the `edit` and `resolve` commands.
//!
//! ```text
//! mfe edit [--request FILE] <selectors> <operations> -m MESSAGE [--pr]
//!
//! USAGE:
//! $ mfe edit --repo svcA --replace deploy.yaml 'app:v1\.0\.0' 'app:v1.1.0' -m "Bump app"
//! $ mfe edit --topic payments --append CODEOWNERS '* @platform' -m "Owners" --pr
//! $ mfe edit --request bump.toml --json
//! $ mfe resolve --topic payments
//! ```
//!
//! Flags add to the request file: selectors and operations are appended,
//! scalar settings override.

use clap::Args;
use std::path::PathBuf;

/// Repository selection shared by `edit` and `resolve`.
#[derive(Debug, Clone, Default, Args)]
pub struct SelectorArgs {
    /// Repository as `name` or `owner/name`. Can be repeated.
    #[arg(long = "repo", value_name = "REPO", action = clap::ArgAction::Append)]
    pub repos: Vec<String>,

    /// Topic to search repositories by. Can be repeated.
    #[arg(long = "topic", value_name = "TOPIC", action = clap::ArgAction::Append)]
    pub topics: Vec<String>,

    /// GitHub API token, overrides `github.token`.
    #[arg(long = "github-token", value_name = "TOKEN", env = "GITHUB_TOKEN", hide_env_values = true)]
    pub github_token: Option<String>,
}

/// Arguments for the `edit` command.
#[derive(Debug, Clone, Default, Args)]
pub struct EditArgs {
    /// Request file (TOML, or JSON with a `.json` extension).
    #[arg(short = 'r', long = "request", value_name = "FILE")]
    pub request: Option<PathBuf>,

    #[command(flatten)]
    pub selectors: SelectorArgs,

    /// Replaces every regex match in a file. Can be repeated.
    #[arg(
        long = "replace",
        num_args = 3,
        value_names = ["PATH", "PATTERN", "REPLACEMENT"],
        action = clap::ArgAction::Append,
        allow_hyphen_values = true
    )]
    pub replace: Vec<String>,

    /// Appends a line to a file. Can be repeated.
    #[arg(
        long = "append",
        num_args = 2,
        value_names = ["PATH", "CONTENT"],
        action = clap::ArgAction::Append,
        allow_hyphen_values = true
    )]
    pub append: Vec<String>,

    /// Prepends a line to a file. Can be repeated.
    #[arg(
        long = "prepend",
        num_args = 2,
        value_names = ["PATH", "CONTENT"],
        action = clap::ArgAction::Append,
        allow_hyphen_values = true
    )]
    pub prepend: Vec<String>,

    /// Deletes a file. Can be repeated.
    #[arg(long = "delete", value_name = "PATH", action = clap::ArgAction::Append)]
    pub delete: Vec<String>,

    /// Commit message used for every file operation.
    #[arg(short = 'm', long = "message", value_name = "MESSAGE")]
    pub message: Option<String>,

    /// Working branch name (default: generated `<prefix>-<millis>`).
    #[arg(short = 'b', long = "branch", value_name = "BRANCH")]
    pub branch: Option<String>,

    /// Opens a pull request for each modified repository.
    #[arg(long = "pr", conflicts_with = "no_pr")]
    pub pr: bool,

    /// Never opens pull requests, even if the request file asks for them.
    #[arg(long = "no-pr")]
    pub no_pr: bool,

    /// Pull request title.
    #[arg(long = "pr-title", value_name = "TITLE")]
    pub pr_title: Option<String>,

    /// Pull request body.
    #[arg(long = "pr-body", value_name = "BODY")]
    pub pr_body: Option<String>,

    /// Repositories processed at once, overrides `batch.concurrency`.
    #[arg(
        short = 'j',
        long = "concurrency",
        value_name = "N",
        value_parser = clap::value_parser!(u16).range(1..)
    )]
    pub concurrency: Option<u16>,

    /// Prints the summary as JSON.
    #[arg(long = "json")]
    pub json: bool,
}

/// Arguments for the `resolve` command.
#[derive(Debug, Clone, Default, Args)]
pub struct ResolveArgs {
    #[command(flatten)]
    pub selectors: SelectorArgs,

    /// Prints the result as JSON.
    #[arg(long = "json")]
    pub json: bool,
}
