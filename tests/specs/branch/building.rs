// SPDX-License-Identifier: MIT

//! Commit-chain shape specs
//!
//! Only transforms that change content produce commits, later transforms
//! observe earlier outputs, and every tree/commit/ref write respects the
//! gate's minimum spacing.

use crate::prelude::*;
use updot_core::NullSink;

fn transform(path: &str, f: impl Fn(&str) -> Option<String> + Send + Sync + 'static) -> Transform {
    Transform::new(path, format!("update {path}"), f)
}

#[tokio::test]
async fn only_changing_transforms_commit() {
    let host = InMemoryHost::new();
    let base = host.seed_branch("main");
    host.put_file("main", "a.json", "{}");
    host.put_file("main", "b.json", "old");
    host.put_file("main", "c.json", "{}");
    let gate = WriteGate::new(Duration::ZERO);

    let outcome = build_branch(
        &host,
        &gate,
        &BotIdentity::default(),
        &NullSink,
        BranchSpec {
            base: "main".to_string(),
            name: "updot/mixed".to_string(),
            transforms: vec![
                transform("a.json", |_old: &str| -> Option<String> { None }),
                transform("b.json", |_old: &str| Some("new".to_string())),
                // Identical output counts as declining.
                transform("c.json", |old: &str| Some(old.to_string())),
            ],
        },
    )
    .await
    .unwrap();

    let BranchOutcome::Created { sha, outcomes } = outcome else {
        panic!("expected a created branch");
    };
    let applied: Vec<bool> = outcomes.iter().map(|o| o.applied).collect();
    assert_eq!(applied, vec![false, true, false]);
    // One commit in the chain back to base.
    assert_eq!(chain_from(&host, &sha, &base).len(), 1);
}

#[tokio::test]
async fn later_transforms_see_earlier_outputs_on_the_same_path() {
    let host = InMemoryHost::new();
    let base = host.seed_branch("main");
    host.put_file("main", "file.txt", "v0");
    let gate = WriteGate::new(Duration::ZERO);

    let outcome = build_branch(
        &host,
        &gate,
        &BotIdentity::default(),
        &NullSink,
        BranchSpec {
            base: "main".to_string(),
            name: "updot/chained".to_string(),
            transforms: vec![
                transform("file.txt", |old: &str| Some(format!("{old}+a"))),
                transform("file.txt", |old: &str| Some(format!("{old}+b"))),
            ],
        },
    )
    .await
    .unwrap();

    let sha = outcome.sha().unwrap().clone();
    assert_eq!(chain_from(&host, &sha, &base).len(), 2);
    let final_content = host
        .write_log()
        .into_iter()
        .filter_map(|(_, op)| match op {
            WriteOp::CreateTree { content, .. } => Some(content),
            _ => None,
        })
        .last()
        .unwrap();
    // The second transform composed on the first's output, not on v0.
    assert_eq!(final_content, "v0+a+b");
}

#[tokio::test]
async fn no_changes_means_no_ref_and_no_writes() {
    let host = InMemoryHost::new();
    host.seed_branch("main");
    host.put_file("main", "file.txt", "v0");
    let gate = WriteGate::new(Duration::ZERO);

    let outcome = build_branch(
        &host,
        &gate,
        &BotIdentity::default(),
        &NullSink,
        BranchSpec {
            base: "main".to_string(),
            name: "updot/noop".to_string(),
            transforms: vec![transform("file.txt", |_old: &str| -> Option<String> { None })],
        },
    )
    .await
    .unwrap();

    assert_eq!(outcome, BranchOutcome::Unchanged);
    assert!(host.branch_head("updot/noop").is_none());
    assert_eq!(host.write_count(), 0);
}

#[tokio::test(start_paused = true)]
async fn every_write_in_a_chain_respects_gate_spacing() {
    let host = InMemoryHost::new();
    host.seed_branch("main");
    host.put_file("main", "a.json", "1");
    host.put_file("main", "b.json", "1");
    let spacing = Duration::from_millis(1_000);
    let gate = WriteGate::new(spacing);

    build_branch(
        &host,
        &gate,
        &BotIdentity::default(),
        &NullSink,
        BranchSpec {
            base: "main".to_string(),
            name: "updot/spaced".to_string(),
            transforms: vec![
                transform("a.json", |_old: &str| Some("2".to_string())),
                transform("b.json", |_old: &str| Some("2".to_string())),
            ],
        },
    )
    .await
    .unwrap();

    // Two trees, two commits, one ref: five gated writes.
    let log = host.write_log();
    assert_eq!(log.len(), 5);
    for pair in log.windows(2) {
        assert!(pair[1].0 - pair[0].0 >= spacing);
    }
}
