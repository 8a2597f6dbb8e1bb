// mass-file-edit: batch file edits across hosted repositories
//
// SPDX-FileCopyrightText: 2026 Romeo Ahmed
// SPDX-License-Identifier: GPL-3.0-or-later

//! Batch orchestration.
//!
//! ```text
//! MassFileEditor::new(api)
//!   .with_concurrency()  .with_cancel_token()  .with_progress()
//!   .execute_file_edit(request).await
//!       resolve --> [permit --> pipeline] x N (JoinSet) --> fold --> BatchSummary
//! ```
//!
//! Cancellation is checked before each repository starts; running pipelines
//! finish, the rest are counted as skipped.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::Instrument;

use super::model::{
    BatchMessage, BatchMessageKind, BatchSummary, RepoEditOutcome, RepoFailureKind,
    RepositoryTarget,
};
use super::pipeline;
use super::request::{EditRequest, RepositorySelectors};
use super::resolver::{self, Resolution};
use crate::config::Config;
use crate::config::types::{
    DEFAULT_BRANCH_PREFIX, DEFAULT_CONCURRENCY, DEFAULT_TOPIC_SEARCH_LIMIT,
};
use crate::github::HostingApi;

/// Progress notification emitted while a batch runs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BatchEvent {
    /// Targets resolved; `total` pipelines will be attempted.
    Resolved { total: usize },
    /// A repository pipeline started.
    Started { repository: String },
    /// A repository pipeline finished.
    Finished {
        repository: String,
        succeeded: bool,
        files_modified: usize,
    },
    /// A repository was skipped due to cancellation.
    Skipped { repository: String },
}

/// Entry point for batch edits.
pub struct MassFileEditor {
    api: Arc<dyn HostingApi>,
    default_owner: Option<String>,
    topic_limit: usize,
    concurrency: usize,
    branch_prefix: String,
    cancel_token: CancellationToken,
    progress: Option<flume::Sender<BatchEvent>>,
}

impl MassFileEditor {
    #[must_use]
    pub fn new(api: Arc<dyn HostingApi>) -> Self {
        Self {
            api,
            default_owner: None,
            topic_limit: DEFAULT_TOPIC_SEARCH_LIMIT,
            concurrency: DEFAULT_CONCURRENCY,
            branch_prefix: DEFAULT_BRANCH_PREFIX.to_string(),
            cancel_token: CancellationToken::new(),
            progress: None,
        }
    }

    /// Creates an editor using the `[github]` and `[batch]` settings.
    #[must_use]
    pub fn from_config(api: Arc<dyn HostingApi>, config: &Config) -> Self {
        Self::new(api)
            .with_default_owner(config.github.default_owner().map(str::to_string))
            .with_topic_limit(config.github.topic_search_limit)
            .with_concurrency(config.batch.concurrency)
            .with_branch_prefix(config.batch.branch_prefix.clone())
    }

    /// Owner used when the authenticated identity cannot be read.
    #[must_use]
    pub fn with_default_owner(mut self, owner: Option<String>) -> Self {
        self.default_owner = owner.filter(|o| !o.trim().is_empty());
        self
    }

    #[must_use]
    pub const fn with_topic_limit(mut self, limit: usize) -> Self {
        self.topic_limit = limit;
        self
    }

    /// Maximum repositories in flight. Values below 1 are treated as 1.
    #[must_use]
    pub const fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = if concurrency == 0 { 1 } else { concurrency };
        self
    }

    #[must_use]
    pub fn with_branch_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.branch_prefix = prefix.into();
        self
    }

    #[must_use]
    pub fn with_cancel_token(mut self, token: CancellationToken) -> Self {
        self.cancel_token = token;
        self
    }

    #[must_use]
    pub fn with_progress(mut self, sender: flume::Sender<BatchEvent>) -> Self {
        self.progress = Some(sender);
        self
    }

    #[must_use]
    pub const fn concurrency(&self) -> usize {
        self.concurrency
    }

    #[must_use]
    pub fn cancel_token(&self) -> CancellationToken {
        self.cancel_token.clone()
    }

    /// Resolves selectors without touching any repository.
    pub async fn resolve(&self, selectors: &RepositorySelectors) -> Resolution {
        resolver::resolve(
            self.api.as_ref(),
            selectors,
            self.default_owner.as_deref(),
            self.topic_limit,
        )
        .await
    }

    /// Working branch for a run: the requested name or `<prefix>-<epoch millis>`.
    #[must_use]
    pub fn working_branch(&self, request: &EditRequest) -> String {
        request.branch_name().map_or_else(
            || {
                format!(
                    "{}-{}",
                    self.branch_prefix,
                    chrono::Utc::now().timestamp_millis()
                )
            },
            str::to_string,
        )
    }

    /// Applies `request` to every resolved repository.
    ///
    /// Never fails: every problem is reported in the returned summary.
    pub async fn execute_file_edit(&self, request: EditRequest) -> BatchSummary {
        let Resolution {
            targets,
            discovered,
            mut messages,
            ..
        } = self.resolve(request.selectors()).await;

        if targets.is_empty() {
            tracing::warn!("No repositories to process");
            messages.push(BatchMessage::new(
                BatchMessageKind::NoRepositories,
                "no repositories specified or found",
            ));
            return BatchSummary::empty(discovered, messages);
        }

        let branch: Arc<str> = Arc::from(self.working_branch(&request));
        tracing::info!(
            repositories = targets.len(),
            branch = %branch,
            concurrency = self.concurrency,
            "Starting batch edit"
        );
        self.emit(BatchEvent::Resolved {
            total: targets.len(),
        });

        let (slots, skipped) = self.run_pipelines(&targets, &branch, Arc::new(request)).await;

        if skipped > 0 {
            for target in &targets[targets.len() - skipped..] {
                self.emit(BatchEvent::Skipped {
                    repository: target.full_name(),
                });
            }
            messages.push(BatchMessage::new(
                BatchMessageKind::Cancelled,
                format!("batch cancelled; {skipped} repositories were not processed"),
            ));
        }

        let mut results = Vec::with_capacity(slots.len());
        for (target, slot) in targets.iter().zip(slots) {
            let Some(slot) = slot else { continue };
            let outcome = slot.unwrap_or_else(|reason| {
                messages.push(BatchMessage::new(
                    BatchMessageKind::RepositoryFailed,
                    format!("{target}: {reason}"),
                ));
                RepoEditOutcome::failed(target.full_name(), RepoFailureKind::Unexpected, reason)
            });
            results.push(outcome);
        }

        let summary = BatchSummary::fold(results, skipped, discovered, messages);
        tracing::info!(
            total = summary.total_repositories,
            successful = summary.successful_repositories,
            failed = summary.failed_repositories,
            skipped = summary.skipped_repositories,
            files_modified = summary.total_files_modified,
            "Batch edit finished"
        );
        summary
    }

    /// Runs pipelines in resolution order on the bounded pool.
    ///
    /// Returns one slot per started target (`Err` holds an unexpected failure
    /// message) and the number of targets never started.
    async fn run_pipelines(
        &self,
        targets: &[RepositoryTarget],
        branch: &Arc<str>,
        request: Arc<EditRequest>,
    ) -> (Vec<Option<Result<RepoEditOutcome, String>>>, usize) {
        let semaphore = Arc::new(Semaphore::new(self.concurrency));
        let mut set = JoinSet::new();
        let mut index_of = HashMap::new();
        let mut slots: Vec<Option<Result<RepoEditOutcome, String>>> = vec![None; targets.len()];
        let mut skipped = 0;

        for (index, target) in targets.iter().enumerate() {
            let permit = tokio::select! {
                biased;
                () = self.cancel_token.cancelled() => None,
                permit = Arc::clone(&semaphore).acquire_owned() => permit.ok(),
            };
            let Some(permit) = permit else {
                tracing::warn!(remaining = targets.len() - index, "Cancelled, skipping remaining repositories");
                skipped = targets.len() - index;
                break;
            };

            self.emit(BatchEvent::Started {
                repository: target.full_name(),
            });
            let api = Arc::clone(&self.api);
            let target = target.clone();
            let branch = Arc::clone(branch);
            let request = Arc::clone(&request);
            let progress = self.progress.clone();
            let span = tracing::info_span!("repo", repo = %target);

            let handle = set.spawn(
                async move {
                    let _permit = permit;
                    let outcome = pipeline::run(api.as_ref(), &target, &branch, &request).await;
                    if let Some(tx) = progress {
                        let _ = tx.send(BatchEvent::Finished {
                            repository: outcome.repository.clone(),
                            succeeded: outcome.succeeded(),
                            files_modified: outcome.files_modified(),
                        });
                    }
                    outcome
                }
                .instrument(span),
            );
            index_of.insert(handle.id(), index);
        }

        while let Some(joined) = set.join_next_with_id().await {
            match joined {
                Ok((id, outcome)) => {
                    if let Some(&index) = index_of.get(&id) {
                        slots[index] = Some(Ok(outcome));
                    }
                }
                Err(e) => {
                    tracing::error!(error = %e, "Repository pipeline panicked");
                    if let Some(&index) = index_of.get(&e.id()) {
                        self.emit(BatchEvent::Finished {
                            repository: targets[index].full_name(),
                            succeeded: false,
                            files_modified: 0,
                        });
                        slots[index] = Some(Err(format!("pipeline aborted unexpectedly: {e}")));
                    }
                }
            }
        }

        (slots, skipped)
    }

    fn emit(&self, event: BatchEvent) {
        if let Some(tx) = &self.progress {
            let _ = tx.send(event);
        }
    }
}

#[cfg(test)]
mod tests;
