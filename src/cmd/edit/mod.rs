// mass-file-edit: batch file edits across hosted repositories
//
// SPDX-FileCopyrightText: 2026 Romeo Ahmed
// SPDX-License-Identifier: GPL-3.0-or-later

//! Edit command: build a request, run the batch, report.
//!
//! ```text
//! --request FILE + flags --> EditRequest
//!        |
//!   MassFileEditor ----flume----> progress bar
//!        |      ^
//!        |      '-- Ctrl+C cancels between repositories
//!        v
//!   BatchSummary --> table | JSON --> exit status
//! ```

use std::fmt::Write as _;
use std::sync::OnceLock;

use anyhow::Context;
use indicatif::{ProgressBar, ProgressStyle};

use crate::cli::edit::EditArgs;
use crate::config::Config;
use crate::edit::{
    BatchEvent, BatchSummary, EditRequest, FileStatus, MassFileEditor, RawEditRequest,
    RawFileOperation,
};
use crate::error::{MassEditResult, Result, bail_out};

use super::hosting_client;
use super::resolve::print_resolution;

fn bar_style() -> ProgressStyle {
    static STYLE: OnceLock<ProgressStyle> = OnceLock::new();
    STYLE
        .get_or_init(|| {
            ProgressStyle::with_template(
                "{spinner:.green} [{elapsed_precise}] [{wide_bar:.cyan/blue}] {pos}/{len} {msg}",
            )
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("#>-")
        })
        .clone()
}

/// Main handler for the edit command.
///
/// # Errors
///
/// Returns an error if the request is invalid, the client cannot be built,
/// or any repository failed.
pub async fn run_edit_command(args: &EditArgs, config: &Config, dry_run: bool) -> Result<()> {
    let request = build_request(args)?;

    let api = hosting_client(config, args.selectors.github_token.as_deref())?;
    let mut editor = MassFileEditor::from_config(api, config);
    if let Some(concurrency) = args.concurrency {
        editor = editor.with_concurrency(usize::from(concurrency));
    }

    if dry_run {
        tracing::info!("Dry run, resolving targets only");
        let resolution = editor.resolve(request.selectors()).await;
        print_resolution(&resolution, args.json)?;
        return Ok(());
    }

    let cancel_token = editor.cancel_token();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("Received Ctrl+C, finishing running repositories...");
            cancel_token.cancel();
        }
    });

    let (tx, rx) = flume::unbounded();
    let progress = tokio::spawn(track_progress(rx));
    let editor = editor.with_progress(tx);

    let summary = editor.execute_file_edit(request).await;
    drop(editor);
    if let Err(e) = progress.await {
        tracing::debug!(error = %e, "Progress task ended abnormally");
    }

    if args.json {
        println!(
            "{}",
            serde_json::to_string_pretty(&summary).context("Failed to serialize summary")?
        );
    } else {
        print!("{}", render_summary(&summary));
    }

    if summary.has_failures() {
        return Err(bail_out(format!(
            "{} of {} repositories failed{}",
            summary.failed_repositories,
            summary.total_repositories,
            if summary.cancelled { " (cancelled)" } else { "" }
        ))
        .into());
    }
    Ok(())
}

/// Merges the request file (if any) with command-line flags.
///
/// # Errors
///
/// Returns `MassEditError::Request` for unreadable files and malformed
/// operations.
pub fn build_request(args: &EditArgs) -> MassEditResult<EditRequest> {
    let mut raw = match &args.request {
        Some(path) => RawEditRequest::from_path(path)?,
        None => RawEditRequest::default(),
    };

    raw.repositories.extend(args.selectors.repos.iter().cloned());
    raw.topics.extend(args.selectors.topics.iter().cloned());

    for chunk in args.replace.chunks_exact(3) {
        raw.file_operations.push(RawFileOperation {
            file_path: chunk[0].clone(),
            operation: "replace".to_string(),
            search_pattern: Some(chunk[1].clone()),
            replace_with: Some(chunk[2].clone()),
            ..RawFileOperation::default()
        });
    }
    for (operation, values) in [("append", &args.append), ("prepend", &args.prepend)] {
        for chunk in values.chunks_exact(2) {
            raw.file_operations.push(RawFileOperation {
                file_path: chunk[0].clone(),
                operation: operation.to_string(),
                content: Some(chunk[1].clone()),
                ..RawFileOperation::default()
            });
        }
    }
    for path in &args.delete {
        raw.file_operations.push(RawFileOperation {
            file_path: path.clone(),
            operation: "delete".to_string(),
            ..RawFileOperation::default()
        });
    }

    if let Some(message) = &args.message {
        raw.commit_message.clone_from(message);
    }
    if args.branch.is_some() {
        raw.branch_name.clone_from(&args.branch);
    }
    if args.pr {
        raw.create_pull_request = true;
    }
    if args.no_pr {
        raw.create_pull_request = false;
    }
    if args.pr_title.is_some() {
        raw.pull_request_title.clone_from(&args.pr_title);
    }
    if args.pr_body.is_some() {
        raw.pull_request_body.clone_from(&args.pr_body);
    }

    Ok(raw.into_request()?)
}

async fn track_progress(rx: flume::Receiver<BatchEvent>) {
    let mut bar: Option<ProgressBar> = None;
    while let Ok(event) = rx.recv_async().await {
        match event {
            BatchEvent::Resolved { total } => {
                let pb = ProgressBar::new(total as u64);
                pb.set_style(bar_style());
                bar = Some(pb);
            }
            BatchEvent::Started { repository } => {
                if let Some(pb) = &bar {
                    pb.set_message(repository);
                }
            }
            BatchEvent::Finished {
                repository,
                succeeded,
                ..
            } => {
                if let Some(pb) = &bar {
                    if !succeeded {
                        pb.println(format!("failed: {repository}"));
                    }
                    pb.inc(1);
                }
            }
            BatchEvent::Skipped { .. } => {
                if let Some(pb) = &bar {
                    pb.inc(1);
                }
            }
        }
    }
    if let Some(pb) = bar {
        pb.finish_and_clear();
    }
}

/// Human-readable summary, one block per repository.
#[must_use]
pub fn render_summary(summary: &BatchSummary) -> String {
    let mut out = String::new();

    for result in &summary.results {
        let state = if result.succeeded() { "ok" } else { "FAILED" };
        let _ = write!(out, "{state:<6} {}", result.repository);
        if let (Some(branch), Some(action)) = (&result.branch_name, result.branch_action) {
            let _ = write!(out, "  branch={branch} ({action:?})");
        }
        let _ = writeln!(
            out,
            "  files={}/{}",
            result.files_modified(),
            result.files_touched.len()
        );

        if let Some(reason) = &result.failure_reason {
            let _ = writeln!(out, "       error: {reason}");
        }
        for file in &result.files_touched {
            let _ = write!(out, "       {}: {}", file.path, file.status);
            match (&file.error, file.status) {
                (Some(error), FileStatus::Failed) => {
                    let _ = writeln!(out, " ({error})");
                }
                _ => out.push('\n'),
            }
        }
        if let Some(url) = &result.pull_request_url {
            let _ = writeln!(out, "       pull request: {url}");
        }
        if let Some(error) = &result.pull_request_error {
            let _ = writeln!(out, "       pull request failed: {error}");
        }
    }

    for message in &summary.errors {
        let _ = writeln!(out, "warning: {message}");
    }

    let _ = writeln!(
        out,
        "repositories: {} total, {} succeeded, {} failed, {} skipped; files modified: {}",
        summary.total_repositories,
        summary.successful_repositories,
        summary.failed_repositories,
        summary.skipped_repositories,
        summary.total_files_modified
    );
    out
}
