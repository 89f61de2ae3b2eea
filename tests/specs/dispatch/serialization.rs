// SPDX-License-Identifier: MIT

//! Per-key ordering specs
//!
//! Jobs for one account execute strictly one at a time in arrival order;
//! jobs for different accounts and for the global keys proceed
//! independently.

use crate::prelude::*;
use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

#[derive(Default)]
struct Tracker {
    active: AtomicUsize,
    max_active: AtomicUsize,
    order: Mutex<Vec<String>>,
}

/// Handler that records interleaving while holding the queue slot.
struct SlowHandler(Arc<Tracker>);

#[async_trait]
impl JobHandler for SlowHandler {
    async fn execute(&self, _ctx: &HandlerContext, job: &Job) -> Result<Vec<Job>, HandlerError> {
        let label = job.payload["label"].as_str().unwrap_or("?").to_string();
        let now = self.0.active.fetch_add(1, Ordering::SeqCst) + 1;
        self.0.max_active.fetch_max(now, Ordering::SeqCst);
        tokio::time::sleep(Duration::from_millis(20)).await;
        self.0.order.lock().unwrap().push(label);
        self.0.active.fetch_sub(1, Ordering::SeqCst);
        Ok(vec![])
    }
}

fn tracked_harness() -> (Harness, Arc<Tracker>) {
    let tracker = Arc::new(Tracker::default());
    let mut registry = HandlerRegistry::new();
    registry.register(JobName::CreateVersionBranch, Arc::new(SlowHandler(Arc::clone(&tracker))));
    (Harness::with_registry(registry), tracker)
}

fn labeled_job(account: u64, label: &str) -> Job {
    Job::new(
        JobName::CreateVersionBranch,
        serde_json::json!({ "accountId": account, "label": label }),
    )
}

#[tokio::test(start_paused = true)]
async fn same_account_jobs_run_one_at_a_time_in_order() {
    let (harness, tracker) = tracked_harness();

    for label in ["first", "second", "third"] {
        harness.dispatch_job(labeled_job(7, label)).await;
    }
    harness.dispatcher.queues().wait_idle().await;

    assert_eq!(tracker.max_active.load(Ordering::SeqCst), 1);
    assert_eq!(
        *tracker.order.lock().unwrap(),
        vec!["first".to_string(), "second".to_string(), "third".to_string()]
    );
    assert_eq!(harness.broker.acked_count(), 3);
}

#[tokio::test(start_paused = true)]
async fn different_accounts_overlap() {
    let (harness, tracker) = tracked_harness();

    for account in [1u64, 2, 3] {
        harness.dispatch_job(labeled_job(account, "only")).await;
    }
    harness.dispatcher.queues().wait_idle().await;

    // All three sleep through the same window, so they must have been in
    // flight simultaneously.
    assert_eq!(tracker.max_active.load(Ordering::SeqCst), 3);
    assert_eq!(harness.dispatcher.queues().key_count(), 3);
}

#[tokio::test(start_paused = true)]
async fn an_account_backlog_does_not_block_others() {
    let (harness, tracker) = tracked_harness();

    // Five queued behind one key, one on another key.
    for label in ["a", "b", "c", "d", "e"] {
        harness.dispatch_job(labeled_job(1, label)).await;
    }
    harness.dispatch_job(labeled_job(2, "bystander")).await;
    harness.dispatcher.queues().wait_idle().await;

    let order = tracker.order.lock().unwrap().clone();
    // The bystander finished alongside the first slot of the busy key, not
    // after its whole backlog.
    let bystander = order.iter().position(|l| l == "bystander").unwrap();
    assert!(bystander <= 1, "bystander ran at position {bystander} of {order:?}");
}
