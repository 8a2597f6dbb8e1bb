// mass-file-edit: batch file edits across hosted repositories
//
// SPDX-FileCopyrightText: 2026 Romeo Ahmed
// SPDX-License-Identifier: GPL-3.0-or-later

//! Hosting service gateway.
//!
//! ```text
//! edit engine --> dyn HostingApi --> GitHubClient --> REST API (or proxy)
//!                        ^
//!                        '--------- in-memory fakes in tests
//! ```
//!
//! # Key Types
//!
//! | Type                   | Purpose                                   |
//! |------------------------|-------------------------------------------|
//! | `HostingApi`           | Calls the edit engine depends on          |
//! | `GitHubClient`         | reqwest implementation for GitHub         |
//! | `FileContent`          | Blob bytes plus version token (blob SHA)  |
//! | `FileWrite`            | Create/update request with precondition   |
//! | `DiscoveredRepository` | Topic search hit                          |

pub mod client;


use futures_util::future::BoxFuture;

use crate::error::GatewayResult;

pub use client::GitHubClient;

/// Repository metadata needed by the edit pipeline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepositoryInfo {
    pub default_branch: String,
}

/// Current content of a file and its version token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileContent {
    pub content: Vec<u8>,
    /// Opaque version token; must be echoed back on write and delete.
    pub sha: String,
}

/// A file create/update on a branch.
#[derive(Debug, Clone, Copy)]
pub struct FileWrite<'a> {
    pub path: &'a str,
    pub content: &'a [u8],
    /// Expected current version; `None` creates a new file.
    pub sha: Option<&'a str>,
    pub branch: &'a str,
    pub message: &'a str,
}

/// A file deletion on a branch.
#[derive(Debug, Clone, Copy)]
pub struct FileDelete<'a> {
    pub path: &'a str,
    pub sha: &'a str,
    pub branch: &'a str,
    pub message: &'a str,
}

/// A pull request to open.
#[derive(Debug, Clone, Copy)]
pub struct NewPullRequest<'a> {
    pub title: &'a str,
    pub body: &'a str,
    pub head: &'a str,
    pub base: &'a str,
}

/// A pull request that was opened.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PullRequest {
    pub url: String,
    pub number: u64,
}

/// A repository found by topic search.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiscoveredRepository {
    /// `owner/name`.
    pub full_name: String,
    pub default_branch: Option<String>,
}

/// Authenticated interface to the hosting service.
///
/// Every call is a suspension point; implementations must be shareable across
/// concurrently running repository pipelines.
///
/// Error contract:
/// - missing repositories, refs and files map to `GatewayError::NotFound`
/// - `create_ref` on an existing ref and writes with a stale `sha` map to
///   `GatewayError::Conflict`
/// - a rejected non-fast-forward `update_ref` maps to
///   `GatewayError::NotFastForward`
pub trait HostingApi: Send + Sync {
    /// Login of the authenticated identity.
    fn authenticated_login(&self) -> BoxFuture<'_, GatewayResult<String>>;

    /// Repository metadata.
    fn repository<'a>(
        &'a self,
        owner: &'a str,
        name: &'a str,
    ) -> BoxFuture<'a, GatewayResult<RepositoryInfo>>;

    /// Commit SHA at the tip of `branch`.
    fn branch_tip<'a>(
        &'a self,
        owner: &'a str,
        name: &'a str,
        branch: &'a str,
    ) -> BoxFuture<'a, GatewayResult<String>>;

    /// Creates `refs/heads/{branch}` at `sha`.
    fn create_ref<'a>(
        &'a self,
        owner: &'a str,
        name: &'a str,
        branch: &'a str,
        sha: &'a str,
    ) -> BoxFuture<'a, GatewayResult<()>>;

    /// Moves an existing `refs/heads/{branch}` to `sha` (fast-forward only).
    fn update_ref<'a>(
        &'a self,
        owner: &'a str,
        name: &'a str,
        branch: &'a str,
        sha: &'a str,
    ) -> BoxFuture<'a, GatewayResult<()>>;

    /// File content at `git_ref`.
    fn file_content<'a>(
        &'a self,
        owner: &'a str,
        name: &'a str,
        path: &'a str,
        git_ref: &'a str,
    ) -> BoxFuture<'a, GatewayResult<FileContent>>;

    /// Creates or updates a file, committing to `write.branch`.
    fn write_file<'a>(
        &'a self,
        owner: &'a str,
        name: &'a str,
        write: FileWrite<'a>,
    ) -> BoxFuture<'a, GatewayResult<()>>;

    /// Deletes a file, committing to `delete.branch`.
    fn delete_file<'a>(
        &'a self,
        owner: &'a str,
        name: &'a str,
        delete: FileDelete<'a>,
    ) -> BoxFuture<'a, GatewayResult<()>>;

    /// Opens a pull request.
    fn create_pull_request<'a>(
        &'a self,
        owner: &'a str,
        name: &'a str,
        pr: NewPullRequest<'a>,
    ) -> BoxFuture<'a, GatewayResult<PullRequest>>;

    /// Repositories tagged with `topic`, most recently updated first, at most
    /// `limit` entries.
    fn search_repositories_by_topic<'a>(
        &'a self,
        topic: &'a str,
        limit: usize,
    ) -> BoxFuture<'a, GatewayResult<Vec<DiscoveredRepository>>>;
}
