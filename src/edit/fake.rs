// mass-file-edit: batch file edits across hosted repositories
//
// SPDX-FileCopyrightText: 2026 Romeo Ahmed
// SPDX-License-Identifier: GPL-3.0-or-later

//! In-memory [`HostingApi`] for unit tests.
//!
//! Models branches as refs to commits with parent links, so fast-forward
//! checks and stale blob SHAs behave like the real service.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use futures_util::future::BoxFuture;

use crate::error::{GatewayError, GatewayResult};
use crate::github::{
    DiscoveredRepository, FileContent, FileDelete, FileWrite, HostingApi, NewPullRequest,
    PullRequest, RepositoryInfo,
};

/// Injected failure points.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Fault {
    /// `repository()` returns 404.
    Repository,
    /// `branch_tip()` returns 404.
    BranchTip,
    /// `create_ref()` returns 500.
    CreateRef,
    /// `write_file()` on this path returns 409.
    WriteConflict(String),
    /// `write_file()` on this path returns 500.
    WriteError(String),
    /// `create_pull_request()` returns 422.
    PullRequest,
    /// `repository()` panics.
    Panic,
}

#[derive(Debug, Clone)]
struct Blob {
    content: Vec<u8>,
    sha: String,
}

#[derive(Debug, Clone, Default)]
struct Commit {
    parent: Option<String>,
    files: BTreeMap<String, Blob>,
}

#[derive(Debug, Clone, Default)]
struct Repo {
    default_branch: String,
    branches: HashMap<String, String>,
    commits: HashMap<String, Commit>,
    faults: HashSet<Fault>,
}

impl Repo {
    fn is_ancestor<'a>(&'a self, ancestor: &str, mut sha: &'a str) -> bool {
        loop {
            if sha == ancestor {
                return true;
            }
            match self.commits.get(sha).and_then(|c| c.parent.as_deref()) {
                Some(parent) => sha = parent,
                None => return false,
            }
        }
    }
}

/// A pull request recorded by the fake.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedPullRequest {
    pub repository: String,
    pub title: String,
    pub body: String,
    pub head: String,
    pub base: String,
}

#[derive(Debug, Default)]
struct State {
    login: Option<String>,
    repos: HashMap<String, Repo>,
    topics: HashMap<String, Vec<String>>,
    failing_topics: HashSet<String>,
    calls: Vec<String>,
    pull_requests: Vec<RecordedPullRequest>,
    next_id: usize,
}

impl State {
    fn next_id(&mut self, prefix: &str) -> String {
        self.next_id += 1;
        format!("{prefix}{}", self.next_id)
    }
}

#[derive(Debug, Default)]
pub struct FakeHost {
    state: Mutex<State>,
    latency: Option<Duration>,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
}

fn key(owner: &str, name: &str) -> String {
    format!("{owner}/{name}")
}

fn not_found(what: impl Into<String>) -> GatewayError {
    GatewayError::NotFound { what: what.into() }
}

fn server_error(url: &str) -> GatewayError {
    GatewayError::Http {
        status: 500,
        url: url.to_string(),
        body: "internal error".to_string(),
    }
}

impl FakeHost {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_login(self, login: &str) -> Self {
        self.state.lock().unwrap().login = Some(login.to_string());
        self
    }

    /// Sleeps in `repository()` so concurrent pipelines overlap.
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = Some(latency);
        self
    }

    /// Adds `full_name` with one commit on `default_branch` holding `files`.
    pub fn with_repo(self, full_name: &str, default_branch: &str, files: &[(&str, &str)]) -> Self {
        {
            let mut state = self.state.lock().unwrap();
            let mut commit = Commit::default();
            for (path, content) in files {
                let sha = state.next_id("blob");
                commit.files.insert(
                    (*path).to_string(),
                    Blob {
                        content: content.as_bytes().to_vec(),
                        sha,
                    },
                );
            }
            let commit_sha = state.next_id("commit");
            let mut repo = Repo {
                default_branch: default_branch.to_string(),
                ..Repo::default()
            };
            repo.commits.insert(commit_sha.clone(), commit);
            repo.branches.insert(default_branch.to_string(), commit_sha);
            state.repos.insert(full_name.to_string(), repo);
        }
        self
    }

    /// Adds a raw binary file to the default branch head in place.
    pub fn with_binary_file(self, full_name: &str, path: &str, content: &[u8]) -> Self {
        {
            let mut state = self.state.lock().unwrap();
            let sha = state.next_id("blob");
            let repo = state.repos.get_mut(full_name).unwrap();
            let head = repo.branches[&repo.default_branch].clone();
            repo.commits.get_mut(&head).unwrap().files.insert(
                path.to_string(),
                Blob {
                    content: content.to_vec(),
                    sha,
                },
            );
        }
        self
    }

    pub fn with_topic(self, topic: &str, repos: &[&str]) -> Self {
        self.state
            .lock()
            .unwrap()
            .topics
            .insert(topic.to_string(), repos.iter().map(|r| (*r).to_string()).collect());
        self
    }

    pub fn with_failing_topic(self, topic: &str) -> Self {
        self.state
            .lock()
            .unwrap()
            .failing_topics
            .insert(topic.to_string());
        self
    }

    pub fn with_fault(self, full_name: &str, fault: Fault) -> Self {
        self.state
            .lock()
            .unwrap()
            .repos
            .get_mut(full_name)
            .unwrap()
            .faults
            .insert(fault);
        self
    }

    /// Text of `path` at the head of `branch`.
    pub fn file(&self, full_name: &str, branch: &str, path: &str) -> Option<String> {
        let state = self.state.lock().unwrap();
        let repo = state.repos.get(full_name)?;
        let head = repo.branches.get(branch)?;
        let blob = repo.commits.get(head)?.files.get(path)?;
        String::from_utf8(blob.content.clone()).ok()
    }

    pub fn branch_exists(&self, full_name: &str, branch: &str) -> bool {
        let state = self.state.lock().unwrap();
        state
            .repos
            .get(full_name)
            .is_some_and(|r| r.branches.contains_key(branch))
    }

    /// Moves the default branch to the head of `branch`, like a merge.
    pub fn merge(&self, full_name: &str, branch: &str) {
        let mut state = self.state.lock().unwrap();
        let repo = state.repos.get_mut(full_name).unwrap();
        let head = repo.branches[branch].clone();
        let default_branch = repo.default_branch.clone();
        repo.branches.insert(default_branch, head);
    }

    /// Every mutating call as `"<op> <owner/name> <detail>"`.
    pub fn calls(&self) -> Vec<String> {
        self.state.lock().unwrap().calls.clone()
    }

    pub fn count_calls(&self, op: &str) -> usize {
        self.calls()
            .iter()
            .filter(|c| c.split(' ').next() == Some(op))
            .count()
    }

    pub fn pull_requests(&self) -> Vec<RecordedPullRequest> {
        self.state.lock().unwrap().pull_requests.clone()
    }

    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }

    fn with_repo_mut<T>(
        &self,
        owner: &str,
        name: &str,
        f: impl FnOnce(&mut State, &str) -> GatewayResult<T>,
    ) -> GatewayResult<T> {
        let mut state = self.state.lock().unwrap();
        let full = key(owner, name);
        if !state.repos.contains_key(&full) {
            return Err(not_found(format!("repository {full}")));
        }
        f(&mut *state, &full)
    }

    fn has_fault(&self, owner: &str, name: &str, fault: &Fault) -> bool {
        let state = self.state.lock().unwrap();
        state
            .repos
            .get(&key(owner, name))
            .is_some_and(|r| r.faults.contains(fault))
    }

    fn commit_change(
        state: &mut State,
        full: &str,
        branch: &str,
        path: &str,
        expected_sha: Option<&str>,
        content: Option<&[u8]>,
    ) -> GatewayResult<()> {
        let blob_sha = state.next_id("blob");
        let commit_sha = state.next_id("commit");
        let repo = state
            .repos
            .get_mut(full)
            .ok_or_else(|| not_found(full.to_string()))?;
        let head = repo
            .branches
            .get(branch)
            .cloned()
            .ok_or_else(|| not_found(format!("branch {branch}")))?;
        let mut files = repo.commits[&head].files.clone();

        let current = files.get(path).map(|b| b.sha.as_str());
        if current != expected_sha {
            if content.is_none() && current.is_none() {
                return Err(not_found(path.to_string()));
            }
            return Err(GatewayError::Conflict {
                what: path.to_string(),
                message: "sha does not match".to_string(),
            });
        }

        match content {
            Some(bytes) => {
                files.insert(
                    path.to_string(),
                    Blob {
                        content: bytes.to_vec(),
                        sha: blob_sha,
                    },
                );
            }
            None => {
                files.remove(path);
            }
        }
        repo.commits.insert(
            commit_sha.clone(),
            Commit {
                parent: Some(head),
                files,
            },
        );
        repo.branches.insert(branch.to_string(), commit_sha);
        Ok(())
    }
}

impl HostingApi for FakeHost {
    fn authenticated_login(&self) -> BoxFuture<'_, GatewayResult<String>> {
        Box::pin(async move {
            self.state
                .lock()
                .unwrap()
                .login
                .clone()
                .ok_or_else(|| GatewayError::Http {
                    status: 401,
                    url: "/user".to_string(),
                    body: "Bad credentials".to_string(),
                })
        })
    }

    fn repository<'a>(
        &'a self,
        owner: &'a str,
        name: &'a str,
    ) -> BoxFuture<'a, GatewayResult<RepositoryInfo>> {
        Box::pin(async move {
            let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
            self.max_in_flight.fetch_max(now, Ordering::SeqCst);
            if let Some(latency) = self.latency {
                tokio::time::sleep(latency).await;
            }
            self.in_flight.fetch_sub(1, Ordering::SeqCst);

            if self.has_fault(owner, name, &Fault::Panic) {
                panic!("injected panic for {owner}/{name}");
            }
            if self.has_fault(owner, name, &Fault::Repository) {
                return Err(not_found(format!("repository {owner}/{name}")));
            }
            self.with_repo_mut(owner, name, |state, full| {
                Ok(RepositoryInfo {
                    default_branch: state.repos[full].default_branch.clone(),
                })
            })
        })
    }

    fn branch_tip<'a>(
        &'a self,
        owner: &'a str,
        name: &'a str,
        branch: &'a str,
    ) -> BoxFuture<'a, GatewayResult<String>> {
        Box::pin(async move {
            if self.has_fault(owner, name, &Fault::BranchTip) {
                return Err(not_found(format!("ref heads/{branch}")));
            }
            self.with_repo_mut(owner, name, |state, full| {
                state.repos[full]
                    .branches
                    .get(branch)
                    .cloned()
                    .ok_or_else(|| not_found(format!("ref heads/{branch}")))
            })
        })
    }

    fn create_ref<'a>(
        &'a self,
        owner: &'a str,
        name: &'a str,
        branch: &'a str,
        sha: &'a str,
    ) -> BoxFuture<'a, GatewayResult<()>> {
        Box::pin(async move {
            let faulty = self.has_fault(owner, name, &Fault::CreateRef);
            self.with_repo_mut(owner, name, |state, full| {
                state.calls.push(format!("create_ref {full} {branch}"));
                if faulty {
                    return Err(server_error("/git/refs"));
                }
                let repo = state.repos.get_mut(full).unwrap();
                if repo.branches.contains_key(branch) {
                    return Err(GatewayError::Conflict {
                        what: format!("refs/heads/{branch}"),
                        message: "Reference already exists".to_string(),
                    });
                }
                repo.branches.insert(branch.to_string(), sha.to_string());
                Ok(())
            })
        })
    }

    fn update_ref<'a>(
        &'a self,
        owner: &'a str,
        name: &'a str,
        branch: &'a str,
        sha: &'a str,
    ) -> BoxFuture<'a, GatewayResult<()>> {
        Box::pin(async move {
            self.with_repo_mut(owner, name, |state, full| {
                state.calls.push(format!("update_ref {full} {branch}"));
                let repo = state.repos.get_mut(full).unwrap();
                let head = repo
                    .branches
                    .get(branch)
                    .cloned()
                    .ok_or_else(|| not_found(format!("ref heads/{branch}")))?;
                if !repo.is_ancestor(&head, sha) {
                    return Err(GatewayError::NotFastForward {
                        branch: branch.to_string(),
                    });
                }
                repo.branches.insert(branch.to_string(), sha.to_string());
                Ok(())
            })
        })
    }

    fn file_content<'a>(
        &'a self,
        owner: &'a str,
        name: &'a str,
        path: &'a str,
        git_ref: &'a str,
    ) -> BoxFuture<'a, GatewayResult<FileContent>> {
        Box::pin(async move {
            self.with_repo_mut(owner, name, |state, full| {
                let repo = &state.repos[full];
                let head = repo
                    .branches
                    .get(git_ref)
                    .ok_or_else(|| not_found(format!("ref {git_ref}")))?;
                let blob = repo.commits[head]
                    .files
                    .get(path)
                    .ok_or_else(|| not_found(path.to_string()))?;
                Ok(FileContent {
                    content: blob.content.clone(),
                    sha: blob.sha.clone(),
                })
            })
        })
    }

    fn write_file<'a>(
        &'a self,
        owner: &'a str,
        name: &'a str,
        write: FileWrite<'a>,
    ) -> BoxFuture<'a, GatewayResult<()>> {
        Box::pin(async move {
            let conflict = self.has_fault(owner, name, &Fault::WriteConflict(write.path.to_string()));
            let broken = self.has_fault(owner, name, &Fault::WriteError(write.path.to_string()));
            self.with_repo_mut(owner, name, |state, full| {
                state
                    .calls
                    .push(format!("write_file {full} {} {}", write.branch, write.path));
                if conflict {
                    return Err(GatewayError::Conflict {
                        what: write.path.to_string(),
                        message: "sha does not match".to_string(),
                    });
                }
                if broken {
                    return Err(server_error(write.path));
                }
                Self::commit_change(
                    state,
                    full,
                    write.branch,
                    write.path,
                    write.sha,
                    Some(write.content),
                )
            })
        })
    }

    fn delete_file<'a>(
        &'a self,
        owner: &'a str,
        name: &'a str,
        delete: FileDelete<'a>,
    ) -> BoxFuture<'a, GatewayResult<()>> {
        Box::pin(async move {
            self.with_repo_mut(owner, name, |state, full| {
                state
                    .calls
                    .push(format!("delete_file {full} {} {}", delete.branch, delete.path));
                Self::commit_change(state, full, delete.branch, delete.path, Some(delete.sha), None)
            })
        })
    }

    fn create_pull_request<'a>(
        &'a self,
        owner: &'a str,
        name: &'a str,
        pr: NewPullRequest<'a>,
    ) -> BoxFuture<'a, GatewayResult<PullRequest>> {
        Box::pin(async move {
            let faulty = self.has_fault(owner, name, &Fault::PullRequest);
            self.with_repo_mut(owner, name, |state, full| {
                state.calls.push(format!("create_pull_request {full} {}", pr.head));
                if faulty {
                    return Err(GatewayError::Http {
                        status: 422,
                        url: format!("/repos/{full}/pulls"),
                        body: "Validation Failed".to_string(),
                    });
                }
                state.pull_requests.push(RecordedPullRequest {
                    repository: full.to_string(),
                    title: pr.title.to_string(),
                    body: pr.body.to_string(),
                    head: pr.head.to_string(),
                    base: pr.base.to_string(),
                });
                let number = state.pull_requests.len() as u64;
                Ok(PullRequest {
                    url: format!("https://github.example/{full}/pull/{number}"),
                    number,
                })
            })
        })
    }

    fn search_repositories_by_topic<'a>(
        &'a self,
        topic: &'a str,
        limit: usize,
    ) -> BoxFuture<'a, GatewayResult<Vec<DiscoveredRepository>>> {
        Box::pin(async move {
            let state = self.state.lock().unwrap();
            if state.failing_topics.contains(topic) {
                return Err(server_error("/search/repositories"));
            }
            Ok(state
                .topics
                .get(topic)
                .map(|repos| {
                    repos
                        .iter()
                        .take(limit)
                        .map(|full_name| DiscoveredRepository {
                            full_name: full_name.clone(),
                            default_branch: state
                                .repos
                                .get(full_name)
                                .map(|r| r.default_branch.clone()),
                        })
                        .collect()
                })
                .unwrap_or_default())
        })
    }
}
