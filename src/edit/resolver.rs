// mass-file-edit: batch file edits across hosted repositories
//
// SPDX-FileCopyrightText: 2026 Romeo Ahmed
// SPDX-License-Identifier: GPL-3.0-or-later

//! Repository resolution.
//!
//! ```text
//! explicit names --+-- "owner/name" --------------------------+
//!                  '-- "name" + owner (identity | config) ----+--> dedup --> targets
//! topics ---------- search topic:<t> (updated desc) ----------+
//! ```
//!
//! Resolution never fails as a whole: problems become [`BatchMessage`]s and
//! the affected selector is skipped.

use std::collections::HashSet;
use std::sync::Arc;

use super::model::{BatchMessage, BatchMessageKind, RepositoryTarget};
use super::request::RepositorySelectors;
use crate::error::EditError;
use crate::github::HostingApi;

/// Targets plus everything learned while resolving them.
#[derive(Debug, Clone, Default)]
pub struct Resolution {
    /// Deduplicated, explicit first then discovered, first occurrence wins.
    pub targets: Vec<RepositoryTarget>,
    /// `owner/name` of every topic search hit, in discovery order.
    pub discovered: Vec<String>,
    /// Owner used to qualify bare names, if one was needed and found.
    pub owner: Option<Arc<str>>,
    pub messages: Vec<BatchMessage>,
}

/// Resolves `selectors` into concrete repositories.
///
/// `default_owner` is only consulted when the identity lookup fails, and the
/// identity is only looked up when a bare name is present.
pub async fn resolve(
    api: &dyn HostingApi,
    selectors: &RepositorySelectors,
    default_owner: Option<&str>,
    topic_limit: usize,
) -> Resolution {
    let mut resolution = Resolution::default();
    let mut seen = HashSet::new();

    let explicit: Vec<&str> = selectors
        .explicit
        .iter()
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
        .collect();

    if explicit.iter().any(|s| !s.contains('/')) {
        resolution.owner = resolve_owner(api, default_owner, &mut resolution.messages).await;
    }

    for selector in explicit {
        let target = if selector.contains('/') {
            RepositoryTarget::parse(selector)
        } else if let Some(owner) = &resolution.owner {
            Some(RepositoryTarget::new(owner.as_ref(), selector))
        } else {
            tracing::debug!(repo = selector, "Skipping bare repository name without owner");
            continue;
        };

        match target {
            Some(target) => push_unique(&mut resolution.targets, &mut seen, target),
            None => {
                tracing::warn!(repo = selector, "Invalid repository name");
                resolution.messages.push(BatchMessage::new(
                    BatchMessageKind::InvalidRepositoryName,
                    format!("invalid repository name '{selector}': expected 'name' or 'owner/name'"),
                ));
            }
        }
    }

    for topic in selectors.topics.iter().map(|t| t.trim()).filter(|t| !t.is_empty()) {
        match api.search_repositories_by_topic(topic, topic_limit).await {
            Ok(hits) => {
                tracing::debug!(topic, count = hits.len(), "Topic search complete");
                for hit in hits {
                    let Some(target) = RepositoryTarget::parse(&hit.full_name) else {
                        resolution.messages.push(BatchMessage::new(
                            BatchMessageKind::InvalidRepositoryName,
                            format!(
                                "topic '{topic}' returned invalid repository name '{}'",
                                hit.full_name
                            ),
                        ));
                        continue;
                    };
                    if !resolution.discovered.contains(&hit.full_name) {
                        resolution.discovered.push(hit.full_name);
                    }
                    push_unique(
                        &mut resolution.targets,
                        &mut seen,
                        target.with_default_branch(hit.default_branch),
                    );
                }
            }
            Err(e) => {
                let err = EditError::Resolution(format!("topic '{topic}': {e}"));
                tracing::warn!(topic, error = %e, "Topic search failed");
                resolution
                    .messages
                    .push(BatchMessage::new(BatchMessageKind::DiscoveryFailed, err.to_string()));
            }
        }
    }

    tracing::info!(
        targets = resolution.targets.len(),
        discovered = resolution.discovered.len(),
        "Resolved repositories"
    );
    resolution
}

async fn resolve_owner(
    api: &dyn HostingApi,
    default_owner: Option<&str>,
    messages: &mut Vec<BatchMessage>,
) -> Option<Arc<str>> {
    let err = match api.authenticated_login().await {
        Ok(login) if !login.trim().is_empty() => {
            tracing::debug!(owner = %login, "Using authenticated identity as owner");
            return Some(Arc::from(login.trim()));
        }
        Ok(_) => "identity has an empty login".to_string(),
        Err(e) => e.to_string(),
    };

    if let Some(owner) = default_owner {
        tracing::warn!(owner, error = %err, "Identity lookup failed, using configured owner");
        messages.push(BatchMessage::new(
            BatchMessageKind::OwnerFallback,
            format!("could not determine authenticated user ({err}); using configured owner '{owner}'"),
        ));
        return Some(Arc::from(owner));
    }

    tracing::warn!(error = %err, "No owner available for bare repository names");
    messages.push(BatchMessage::new(
        BatchMessageKind::OwnerUnavailable,
        format!("could not determine repository owner ({err}); bare repository names were skipped"),
    ));
    None
}

fn push_unique(
    targets: &mut Vec<RepositoryTarget>,
    seen: &mut HashSet<RepositoryTarget>,
    target: RepositoryTarget,
) {
    if seen.insert(target.clone()) {
        targets.push(target);
    }
}
