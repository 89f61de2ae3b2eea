// SPDX-License-Identifier: MIT

//! Idempotent branch creation specs
//!
//! At-least-once delivery means the same branch job can arrive twice. The
//! second run must observe the existing bot-authored ref, create no new
//! objects, and schedule no duplicate follow-up.

use crate::prelude::*;

const MANIFEST: &str = r#"{ "dependencies": { "left-pad": "1.0.0" } }"#;

fn harness_with_pr_sink() -> Harness {
    let mut registry = HandlerRegistry::standard();
    // Swallow the PR follow-up so quiescence draining stays clean.
    registry.register(JobName::CreateVersionPr, Arc::new(NoopHandler));
    let harness = Harness::with_registry(registry);
    harness.host.seed_branch("main");
    harness.host.put_file("main", "package.json", MANIFEST);
    harness
}

fn version_job() -> Job {
    Job::new(JobName::CreateVersionBranch, version_branch_payload(7, "left-pad", "2.0.0"))
}

#[tokio::test]
async fn duplicate_delivery_creates_nothing_new() {
    let harness = harness_with_pr_sink();
    let job = version_job();

    harness.dispatch_job(job.clone()).await;
    harness.run_to_quiescence().await;

    let head = harness.host.branch_head("updot/left-pad-2.0.0").expect("branch created");
    let commits = harness.host.commit_count();
    let pr_jobs = published_pr_count(&harness);
    assert_eq!(pr_jobs, 1);
    assert_eq!(harness.events.count_branch_created(), 1);

    // The same job arrives again.
    harness.dispatch_job(job).await;
    harness.run_to_quiescence().await;

    assert_eq!(harness.host.branch_head("updot/left-pad-2.0.0").unwrap(), head);
    assert_eq!(harness.host.commit_count(), commits);
    assert_eq!(published_pr_count(&harness), 1);
    assert_eq!(harness.events.count_branch_created(), 1);
    assert!(harness.events.terminal_failures().is_empty());
}

#[tokio::test]
async fn foreign_branch_poisons_instead_of_clobbering() {
    let harness = harness_with_pr_sink();
    harness.host.seed_foreign_branch("updot/left-pad-2.0.0");
    let foreign_tip = harness.host.branch_head("updot/left-pad-2.0.0").unwrap();

    harness.dispatch_job(version_job()).await;
    harness.run_to_quiescence().await;

    // The foreign ref is untouched; after the retry the job is poisoned.
    assert_eq!(harness.host.branch_head("updot/left-pad-2.0.0").unwrap(), foreign_tip);
    assert_eq!(published_pr_count(&harness), 0);
    let terminal = harness.events.terminal_failures();
    assert_eq!(terminal.len(), 1);
    assert!(matches!(terminal[0], Event::JobPoisoned { .. }));
}

#[tokio::test]
async fn transient_auth_failure_heals_on_redelivery() {
    let harness = harness_with_pr_sink();
    harness.host.fail_next_writes_with_auth(1);

    harness.dispatch_job(version_job()).await;
    harness.run_to_quiescence().await;

    // First attempt hit the auth wall and requeued; the redelivery built
    // the branch.
    assert!(harness.host.branch_head("updot/left-pad-2.0.0").is_some());
    assert_eq!(published_pr_count(&harness), 1);
    assert!(harness.events.events().iter().any(|e| matches!(
        e,
        Event::JobFailed { classification: FailureKind::TransientAuth, requeued: true, .. }
    )));
    assert!(harness.events.terminal_failures().is_empty());
}

fn published_pr_count(harness: &Harness) -> usize {
    harness
        .broker
        .published()
        .iter()
        .filter(|(_, entry)| entry.job.name == JobName::CreateVersionPr)
        .count()
}
