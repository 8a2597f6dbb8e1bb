// mass-file-edit: batch file edits across hosted repositories
//
// SPDX-FileCopyrightText: 2026 Romeo Ahmed
// SPDX-License-Identifier: GPL-3.0-or-later

//! Resolve command: list the repositories a selection targets.

use std::fmt::Write as _;

use anyhow::Context;

use crate::cli::edit::ResolveArgs;
use crate::config::Config;
use crate::edit::{MassFileEditor, RepositorySelectors, Resolution};
use crate::error::Result;

use super::hosting_client;

/// Main handler for the resolve command.
///
/// # Errors
///
/// Returns an error if the client cannot be built or output fails.
pub async fn run_resolve_command(args: &ResolveArgs, config: &Config) -> Result<()> {
    let api = hosting_client(config, args.selectors.github_token.as_deref())?;
    let editor = MassFileEditor::from_config(api, config);
    let selectors = RepositorySelectors::new(
        args.selectors.repos.clone(),
        args.selectors.topics.clone(),
    );
    let resolution = editor.resolve(&selectors).await;
    print_resolution(&resolution, args.json)
}

pub(crate) fn print_resolution(resolution: &Resolution, json: bool) -> Result<()> {
    if json {
        let value = serde_json::json!({
            "targets": resolution.targets.iter().map(|t| t.full_name()).collect::<Vec<_>>(),
            "discoveredRepositories": resolution.discovered,
            "errors": resolution.messages,
        });
        println!(
            "{}",
            serde_json::to_string_pretty(&value).context("Failed to serialize resolution")?
        );
        return Ok(());
    }

    print!("{}", render_resolution(resolution));
    Ok(())
}

/// One line per target (with the default branch when search reported it),
/// then warnings.
#[must_use]
pub fn render_resolution(resolution: &Resolution) -> String {
    let mut out = String::new();
    if resolution.targets.is_empty() {
        out.push_str("No repositories resolved\n");
    }
    for target in &resolution.targets {
        match target.default_branch_hint() {
            Some(branch) => {
                let _ = writeln!(out, "{target}  (default branch: {branch})");
            }
            None => {
                let _ = writeln!(out, "{target}");
            }
        }
    }
    for message in &resolution.messages {
        let _ = writeln!(out, "warning: {message}");
    }
    out
}
