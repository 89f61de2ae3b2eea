// SPDX-License-Identifier: MIT

//! Retry and poison specs
//!
//! A failed first delivery is requeued exactly once. A failed redelivery
//! is discarded with a poison event. Unroutable payloads never reach a
//! handler and are never requeued.

use crate::prelude::*;
use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Fails the first `failures` executions, then succeeds.
struct FlakyHandler {
    failures: usize,
    executions: Arc<AtomicUsize>,
}

#[async_trait]
impl JobHandler for FlakyHandler {
    async fn execute(&self, _ctx: &HandlerContext, _job: &Job) -> Result<Vec<Job>, HandlerError> {
        let run = self.executions.fetch_add(1, Ordering::SeqCst);
        if run < self.failures {
            return Err(HandlerError::Payload("not yet".to_string()));
        }
        Ok(vec![])
    }
}

#[tokio::test]
async fn first_failure_retries_and_the_retry_succeeds() {
    let executions = Arc::new(AtomicUsize::new(0));
    let mut registry = HandlerRegistry::new();
    registry.register(
        JobName::CreateVersionBranch,
        Arc::new(FlakyHandler { failures: 1, executions: Arc::clone(&executions) }),
    );
    let harness = Harness::with_registry(registry);

    harness
        .dispatch_job(Job::new(JobName::CreateVersionBranch, serde_json::json!({ "accountId": 7 })))
        .await;
    harness.run_to_quiescence().await;

    assert_eq!(executions.load(Ordering::SeqCst), 2);
    assert_eq!(harness.broker.acked_count(), 1);
    assert!(harness.broker.discarded().is_empty());
    let events = harness.events.events();
    assert!(events.iter().any(|e| matches!(
        e,
        Event::JobFailed { classification: FailureKind::HandlerFailed, requeued: true, .. }
    )));
    assert!(events.iter().any(|e| matches!(e, Event::JobSucceeded { .. })));
    assert!(harness.events.terminal_failures().is_empty());
}

#[tokio::test]
async fn persistent_failure_executes_exactly_twice_then_poisons() {
    let executions = Arc::new(AtomicUsize::new(0));
    let mut registry = HandlerRegistry::new();
    registry.register(
        JobName::CreateVersionBranch,
        Arc::new(FlakyHandler { failures: usize::MAX, executions: Arc::clone(&executions) }),
    );
    let harness = Harness::with_registry(registry);

    harness
        .dispatch_job(Job::new(JobName::CreateVersionBranch, serde_json::json!({ "accountId": 7 })))
        .await;
    harness.run_to_quiescence().await;

    assert_eq!(executions.load(Ordering::SeqCst), 2);
    assert_eq!(harness.broker.acked_count(), 0);
    assert_eq!(harness.broker.discarded().len(), 1);
    let terminal = harness.events.terminal_failures();
    assert_eq!(terminal.len(), 1);
    assert!(matches!(terminal[0], Event::JobPoisoned { .. }));
}

#[tokio::test]
async fn unroutable_payload_is_rejected_without_requeue() {
    let mut registry = HandlerRegistry::new();
    registry.register(JobName::CreateVersionBranch, Arc::new(FailingHandler));
    let harness = Harness::with_registry(registry);

    harness
        .dispatch_job(Job::new(JobName::CreateVersionBranch, serde_json::json!({ "noise": 1 })))
        .await;
    harness.run_to_quiescence().await;

    // Discarded at routing: the (failing) handler never ran, nothing was
    // published or requeued.
    assert_eq!(harness.broker.discarded().len(), 1);
    assert!(harness.broker.published().is_empty());
    let events = harness.events.events();
    assert_eq!(events.len(), 1);
    assert!(matches!(
        &events[0],
        Event::JobFailed { classification: FailureKind::NoRoutingKey, requeued: false, .. }
    ));
}

#[tokio::test]
async fn handler_gap_discards_without_retry() {
    let harness = Harness::with_registry(HandlerRegistry::new());

    harness
        .dispatch_job(Job::new(JobName::UpdatePayments, serde_json::json!({ "accountId": 7 })))
        .await;
    harness.run_to_quiescence().await;

    assert_eq!(harness.broker.discarded().len(), 1);
    let terminal = harness.events.terminal_failures();
    assert_eq!(terminal.len(), 1);
    assert!(matches!(
        terminal[0],
        Event::JobFailed { classification: FailureKind::HandlerNotFound, requeued: false, .. }
    ));
}
