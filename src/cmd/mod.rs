// mass-file-edit: batch file edits across hosted repositories
//
// SPDX-FileCopyrightText: 2026 Romeo Ahmed
// SPDX-License-Identifier: GPL-3.0-or-later

//! Command implementations.
//!
//! ```text
//! CLI args --> cmd::run_* handlers
//!   config (options, inis), edit, resolve
//! ```

pub mod config;
pub mod edit;
pub mod resolve;

use std::sync::Arc;

use crate::config::Config;
use crate::error::MassEditResult;
use crate::github::{GitHubClient, HostingApi};

/// Builds the hosting client; `token` overrides `github.token`.
pub(crate) fn hosting_client(
    config: &Config,
    token: Option<&str>,
) -> MassEditResult<Arc<dyn HostingApi>> {
    let client = GitHubClient::from_config(&config.github, token)?;
    tracing::debug!(api_url = %client.base_url(), "Using hosting service");
    Ok(Arc::new(client))
}
