// mass-file-edit: batch file edits across hosted repositories
//
// SPDX-FileCopyrightText: 2026 Romeo Ahmed
// SPDX-License-Identifier: GPL-3.0-or-later

use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;

use super::{BatchEvent, MassFileEditor};
use crate::config::Config;
use crate::edit::fake::{FakeHost, Fault};
use crate::edit::model::{
    BatchMessageKind, BranchAction, FileStatus, RepoFailureKind, RepositoryTarget,
};
use crate::edit::pipeline;
use crate::edit::request::{EditRequest, FileOperation, RepositorySelectors};
use crate::github::HostingApi;

const DEPLOY: &str = "image: app:v1.0.0\n";

fn bump_request(repos: &[&str]) -> EditRequest {
    EditRequest::new(
        RepositorySelectors::new(repos.iter().map(|r| (*r).to_string()).collect(), vec![]),
        vec![FileOperation::replace("deploy.yaml", r"app:v1\.0\.0", "app:v1.1.0").unwrap()],
        "Bump app image",
    )
    .unwrap()
}

fn svc_host() -> Arc<FakeHost> {
    Arc::new(
        FakeHost::new()
            .with_login("acme")
            .with_repo("acme/svcA", "main", &[("deploy.yaml", DEPLOY)]),
    )
}

fn editor(host: &Arc<FakeHost>) -> MassFileEditor {
    let api: Arc<dyn HostingApi> = Arc::clone(host) as Arc<dyn HostingApi>;
    MassFileEditor::new(api)
}

// --- Pipeline ---

#[tokio::test]
async fn test_pipeline_bumps_image_and_opens_pull_request() {
    let host = svc_host();
    let target = RepositoryTarget::new("acme", "svcA");
    let request = bump_request(&["svcA"]).with_pull_request(None, None);

    let outcome = pipeline::run(host.as_ref(), &target, "bump-app", &request).await;

    assert!(outcome.succeeded());
    assert_eq!(outcome.branch_action, Some(BranchAction::Created));
    assert_eq!(outcome.files_touched[0].status, FileStatus::Updated);
    assert_eq!(outcome.files_modified(), 1);
    assert_eq!(
        outcome.pull_request_url.as_deref(),
        Some("https://github.example/acme/svcA/pull/1")
    );
    assert_eq!(
        host.file("acme/svcA", "bump-app", "deploy.yaml").as_deref(),
        Some("image: app:v1.1.0\n")
    );

    let prs = host.pull_requests();
    assert_eq!(prs.len(), 1);
    assert_eq!(prs[0].head, "bump-app");
    assert_eq!(prs[0].base, "main");
    assert_eq!(prs[0].title, "Mass file edit: Bump app image");
}

#[tokio::test]
async fn test_pipeline_rerun_reuses_branch_without_changes() {
    let host = svc_host();
    let target = RepositoryTarget::new("acme", "svcA");
    let request = bump_request(&["svcA"]).with_pull_request(None, None);

    let first = pipeline::run(host.as_ref(), &target, "bump-app", &request).await;
    let second = pipeline::run(host.as_ref(), &target, "bump-app", &request).await;

    assert_eq!(first.files_modified(), 1);
    assert!(second.succeeded());
    assert_eq!(second.branch_action, Some(BranchAction::Reused));
    assert_eq!(second.files_touched[0].status, FileStatus::NoChanges);
    assert_eq!(second.pull_request_url, None);
    assert_eq!(host.count_calls("update_ref"), 1);
    assert_eq!(host.count_calls("write_file"), 1);
    assert_eq!(host.pull_requests().len(), 1);
}

#[tokio::test]
async fn test_pipeline_fast_forwards_stale_branch() {
    let host = svc_host();
    let target = RepositoryTarget::new("acme", "svcA");
    let tip = host.branch_tip("acme", "svcA", "main").await.unwrap();
    host.create_ref("acme", "svcA", "stale", &tip).await.unwrap();

    let bump = pipeline::run(host.as_ref(), &target, "bump-app", &bump_request(&["svcA"])).await;
    assert_eq!(bump.files_modified(), 1);
    host.merge("acme/svcA", "bump-app");

    let append = EditRequest::new(
        RepositorySelectors::default(),
        vec![FileOperation::append("deploy.yaml", "replicas: 2").unwrap()],
        "Scale",
    )
    .unwrap();
    let outcome = pipeline::run(host.as_ref(), &target, "stale", &append).await;

    assert_eq!(outcome.branch_action, Some(BranchAction::FastForwarded));
    assert_eq!(
        host.file("acme/svcA", "stale", "deploy.yaml").as_deref(),
        Some("image: app:v1.1.0\n\nreplicas: 2")
    );
}

#[tokio::test]
async fn test_pipeline_repository_access_failure() {
    let host = Arc::new(
        FakeHost::new()
            .with_repo("acme/svcA", "main", &[("deploy.yaml", DEPLOY)])
            .with_fault("acme/svcA", Fault::BranchTip),
    );
    let target = RepositoryTarget::new("acme", "svcA");

    let outcome = pipeline::run(host.as_ref(), &target, "b", &bump_request(&[])).await;

    assert!(!outcome.succeeded());
    assert_eq!(outcome.failure_kind, Some(RepoFailureKind::RepositoryAccess));
    assert!(outcome.files_touched.is_empty());
    insta::assert_snapshot!(
        outcome.failure_reason.unwrap(),
        @"could not resolve default branch: not found: ref heads/main"
    );
    assert_eq!(host.count_calls("create_ref"), 0);
}

#[tokio::test]
async fn test_pipeline_missing_repository() {
    let host = svc_host();
    let target = RepositoryTarget::new("acme", "ghost");

    let outcome = pipeline::run(host.as_ref(), &target, "b", &bump_request(&[])).await;

    assert_eq!(outcome.failure_kind, Some(RepoFailureKind::RepositoryAccess));
    assert!(
        outcome
            .failure_reason
            .unwrap()
            .starts_with("could not resolve default branch: ")
    );
}

#[tokio::test]
async fn test_pipeline_branch_creation_failure() {
    let host = Arc::new(
        FakeHost::new()
            .with_repo("acme/svcA", "main", &[("deploy.yaml", DEPLOY)])
            .with_fault("acme/svcA", Fault::CreateRef),
    );
    let target = RepositoryTarget::new("acme", "svcA");

    let outcome = pipeline::run(host.as_ref(), &target, "b", &bump_request(&[])).await;

    assert_eq!(outcome.failure_kind, Some(RepoFailureKind::BranchCreation));
    assert!(outcome.files_touched.is_empty());
    assert_eq!(host.count_calls("write_file"), 0);
}

#[tokio::test]
async fn test_pipeline_refuses_default_branch_as_working_branch() {
    let host = svc_host();
    let target = RepositoryTarget::new("acme", "svcA");
    let request = bump_request(&["svcA"])
        .with_branch_name("main")
        .unwrap()
        .with_pull_request(None, None);

    let outcome = pipeline::run(host.as_ref(), &target, "main", &request).await;

    assert!(!outcome.succeeded());
    assert_eq!(outcome.failure_kind, Some(RepoFailureKind::BranchCreation));
    insta::assert_snapshot!(
        outcome.failure_reason.as_deref().unwrap(),
        @"working branch must differ from default branch 'main'"
    );
    assert!(outcome.files_touched.is_empty());
    assert_eq!(host.count_calls("create_ref"), 0);
    assert_eq!(host.count_calls("update_ref"), 0);
    assert_eq!(host.count_calls("write_file"), 0);
    assert_eq!(
        host.file("acme/svcA", "main", "deploy.yaml").as_deref(),
        Some(DEPLOY)
    );
}

#[tokio::test]
async fn test_pipeline_continues_after_file_failure() {
    let host = Arc::new(
        FakeHost::new()
            .with_repo("acme/svcA", "main", &[("a.txt", "a"), ("b.txt", "b")])
            .with_fault("acme/svcA", Fault::WriteError("a.txt".to_string())),
    );
    let target = RepositoryTarget::new("acme", "svcA");
    let request = EditRequest::new(
        RepositorySelectors::default(),
        vec![
            FileOperation::append("a.txt", "1").unwrap(),
            FileOperation::append("missing.txt", "1").unwrap(),
            FileOperation::append("b.txt", "1").unwrap(),
        ],
        "msg",
    )
    .unwrap();

    let outcome = pipeline::run(host.as_ref(), &target, "b", &request).await;

    let statuses: Vec<_> = outcome.files_touched.iter().map(|f| f.status).collect();
    assert_eq!(
        statuses,
        vec![FileStatus::Failed, FileStatus::NotFound, FileStatus::Updated]
    );
    assert!(outcome.succeeded());
}

#[tokio::test]
async fn test_pipeline_pull_request_failure_keeps_success() {
    let host = Arc::new(
        FakeHost::new()
            .with_repo("acme/svcA", "main", &[("deploy.yaml", DEPLOY)])
            .with_fault("acme/svcA", Fault::PullRequest),
    );
    let target = RepositoryTarget::new("acme", "svcA");
    let request = bump_request(&[]).with_pull_request(Some("Custom".to_string()), None);

    let outcome = pipeline::run(host.as_ref(), &target, "b", &request).await;

    assert!(outcome.succeeded());
    assert_eq!(outcome.files_modified(), 1);
    assert!(outcome.pull_request_error.is_some());
    assert_eq!(outcome.pull_request_url, None);
}

#[tokio::test]
async fn test_pipeline_skips_pull_request_without_changes() {
    let host = Arc::new(FakeHost::new().with_repo(
        "acme/svcA",
        "main",
        &[("deploy.yaml", "image: app:v1.1.0\n")],
    ));
    let target = RepositoryTarget::new("acme", "svcA");
    let request = bump_request(&[]).with_pull_request(None, None);

    let outcome = pipeline::run(host.as_ref(), &target, "b", &request).await;

    assert_eq!(outcome.files_touched[0].status, FileStatus::NoChanges);
    assert_eq!(host.count_calls("create_pull_request"), 0);
}

// --- Batch ---

#[tokio::test]
async fn test_batch_svc_a_scenario_and_rerun() {
    let host = svc_host();
    let editor = editor(&host);
    let request = || {
        bump_request(&["svcA"])
            .with_branch_name("bump-app")
            .unwrap()
            .with_pull_request(None, None)
    };

    let first = editor.execute_file_edit(request()).await;
    assert_eq!(first.total_repositories, 1);
    assert_eq!(first.successful_repositories, 1);
    assert_eq!(first.total_files_modified, 1);
    assert!(first.errors.is_empty());
    assert!(first.results[0].pull_request_url.is_some());

    let second = editor.execute_file_edit(request()).await;
    assert_eq!(second.successful_repositories, 1);
    assert_eq!(second.total_files_modified, 0);
    assert_eq!(second.results[0].files_touched[0].status, FileStatus::NoChanges);
    assert_eq!(second.results[0].pull_request_url, None);
    assert_eq!(host.pull_requests().len(), 1);
}

#[tokio::test]
async fn test_batch_rerun_after_merge_is_idempotent() {
    let host = svc_host();
    let editor = editor(&host).with_branch_prefix("bulk");

    let first = editor.execute_file_edit(bump_request(&["svcA"])).await;
    let branch = first.results[0].branch_name.clone().unwrap();
    assert!(branch.starts_with("bulk-"));
    host.merge("acme/svcA", &branch);

    let second = editor.execute_file_edit(bump_request(&["svcA"])).await;
    assert_eq!(second.total_files_modified, 0);
    assert_eq!(second.results[0].files_touched[0].status, FileStatus::NoChanges);
}

#[tokio::test]
async fn test_batch_without_repositories() {
    let host = Arc::new(FakeHost::new());
    let summary = editor(&host).execute_file_edit(bump_request(&[])).await;

    assert_eq!(summary.total_repositories, 0);
    assert!(summary.results.is_empty());
    assert_eq!(summary.errors.len(), 1);
    assert_eq!(summary.errors[0].kind, BatchMessageKind::NoRepositories);
    assert!(summary.has_failures());
}

#[tokio::test]
async fn test_batch_isolates_failing_repository() {
    let host = Arc::new(
        FakeHost::new()
            .with_login("acme")
            .with_repo("acme/svcA", "main", &[("deploy.yaml", DEPLOY)])
            .with_repo("acme/svcB", "main", &[("deploy.yaml", DEPLOY)])
            .with_repo("acme/svcC", "main", &[("deploy.yaml", DEPLOY)])
            .with_fault("acme/svcB", Fault::Repository),
    );

    let summary = editor(&host)
        .with_concurrency(2)
        .execute_file_edit(bump_request(&["svcA", "svcB", "svcC"]))
        .await;

    assert_eq!(summary.total_repositories, 3);
    assert_eq!(summary.successful_repositories, 2);
    assert_eq!(summary.failed_repositories, 1);
    assert_eq!(summary.total_files_modified, 2);
    let order: Vec<_> = summary.results.iter().map(|r| r.repository.as_str()).collect();
    assert_eq!(order, vec!["acme/svcA", "acme/svcB", "acme/svcC"]);
    assert_eq!(
        summary.outcome("acme/svcB").unwrap().failure_kind,
        Some(RepoFailureKind::RepositoryAccess)
    );
}

#[tokio::test]
async fn test_batch_bounds_concurrency() {
    let mut host = FakeHost::new().with_login("acme").with_latency(Duration::from_millis(20));
    for name in ["a", "b", "c", "d", "e"] {
        host = host.with_repo(&format!("acme/{name}"), "main", &[("deploy.yaml", DEPLOY)]);
    }
    let host = Arc::new(host);

    let summary = editor(&host)
        .with_concurrency(2)
        .execute_file_edit(bump_request(&["a", "b", "c", "d", "e"]))
        .await;

    assert_eq!(summary.successful_repositories, 5);
    assert_eq!(host.max_in_flight(), 2);
}

#[tokio::test]
async fn test_batch_catches_panicking_pipeline() {
    let host = Arc::new(
        FakeHost::new()
            .with_login("acme")
            .with_repo("acme/svcA", "main", &[("deploy.yaml", DEPLOY)])
            .with_repo("acme/svcB", "main", &[("deploy.yaml", DEPLOY)])
            .with_fault("acme/svcA", Fault::Panic),
    );

    let summary = editor(&host)
        .execute_file_edit(bump_request(&["svcA", "svcB"]))
        .await;

    assert_eq!(summary.failed_repositories, 1);
    assert_eq!(summary.successful_repositories, 1);
    assert_eq!(
        summary.results[0].failure_kind,
        Some(RepoFailureKind::Unexpected)
    );
    assert_eq!(summary.errors[0].kind, BatchMessageKind::RepositoryFailed);
}

#[tokio::test]
async fn test_batch_cancelled_before_start_skips_everything() {
    let host = svc_host();
    let token = CancellationToken::new();
    token.cancel();

    let summary = editor(&host)
        .with_cancel_token(token)
        .execute_file_edit(bump_request(&["svcA"]))
        .await;

    assert!(summary.cancelled);
    assert_eq!(summary.skipped_repositories, 1);
    assert_eq!(summary.total_repositories, 1);
    assert!(summary.results.is_empty());
    assert_eq!(summary.errors[0].kind, BatchMessageKind::Cancelled);
    assert_eq!(host.count_calls("create_ref"), 0);
}

#[tokio::test]
async fn test_batch_cancellation_lets_running_pipeline_finish() {
    let mut host = FakeHost::new().with_login("acme").with_latency(Duration::from_millis(20));
    for name in ["a", "b", "c"] {
        host = host.with_repo(&format!("acme/{name}"), "main", &[("deploy.yaml", DEPLOY)]);
    }
    let host = Arc::new(host);
    let (tx, rx) = flume::unbounded();
    let editor = editor(&host).with_concurrency(1).with_progress(tx);
    let token = editor.cancel_token();

    let canceller = tokio::spawn(async move {
        while let Ok(event) = rx.recv_async().await {
            if matches!(event, BatchEvent::Started { .. }) {
                token.cancel();
            }
        }
    });
    let summary = editor
        .execute_file_edit(bump_request(&["a", "b", "c"]))
        .await;
    drop(editor);
    canceller.await.unwrap();

    assert!(summary.cancelled);
    assert_eq!(summary.results.len(), 1);
    assert!(summary.results[0].succeeded());
    assert_eq!(summary.skipped_repositories, 2);
    assert_eq!(summary.total_repositories, 3);
}

#[tokio::test]
async fn test_batch_emits_progress_events() {
    let host = svc_host();
    let (tx, rx) = flume::unbounded();

    let summary = editor(&host)
        .with_progress(tx)
        .execute_file_edit(bump_request(&["svcA"]).with_branch_name("b").unwrap())
        .await;
    assert_eq!(summary.successful_repositories, 1);

    let events: Vec<_> = rx.drain().collect();
    assert_eq!(
        events,
        vec![
            BatchEvent::Resolved { total: 1 },
            BatchEvent::Started {
                repository: "acme/svcA".to_string()
            },
            BatchEvent::Finished {
                repository: "acme/svcA".to_string(),
                succeeded: true,
                files_modified: 1,
            },
        ]
    );
}

#[tokio::test]
async fn test_editor_from_config() {
    let config = Config::parse(
        "[github]\ndefault_owner = \"platform\"\n[batch]\nconcurrency = 3\nbranch_prefix = \"bulk\"\n",
    )
    .unwrap();
    let host = Arc::new(FakeHost::new());
    let editor = MassFileEditor::from_config(Arc::clone(&host) as Arc<dyn HostingApi>, &config);

    assert_eq!(editor.concurrency(), 3);
    assert!(editor.working_branch(&bump_request(&[])).starts_with("bulk-"));
    let resolution = editor
        .resolve(&RepositorySelectors::new(vec!["svcA".to_string()], vec![]))
        .await;
    assert_eq!(resolution.targets[0].full_name(), "platform/svcA");
}

#[test]
fn test_summary_serializes_camel_case() {
    let summary = crate::edit::model::BatchSummary::default();
    let value = serde_json::to_value(&summary).unwrap();
    let mut keys: Vec<_> = value.as_object().unwrap().keys().cloned().collect();
    keys.sort();
    insta::assert_debug_snapshot!(keys, @r#"
    [
        "cancelled",
        "discoveredRepositories",
        "errors",
        "failedRepositories",
        "results",
        "skippedRepositories",
        "successfulRepositories",
        "totalFilesModified",
        "totalRepositories",
    ]
    "#);
}
