// SPDX-License-Identifier: MIT

//! Branch builder: turns an ordered list of content transforms into a
//! chain of tree/commit objects and a new branch ref.
//!
//! One commit per logically distinct file change, chained sequentially,
//! rather than a single multi-file commit: generated history stays
//! readable and each transform declares its own commit message. The cost
//! is that every tree/commit creation threads through the shared write
//! gate.

use crate::client::HostClient;
use crate::error::HostError;
use crate::gate::WriteGate;
use crate::ops::{FilePath, Sha, WriteOp, WriteResult};
use async_trait::async_trait;
use std::collections::HashMap;
use thiserror::Error;
use updot_core::{BotIdentity, Event, EventSink};

#[derive(Debug, Error)]
pub enum BuildError {
    #[error(transparent)]
    Host(#[from] HostError),

    #[error("lockfile regeneration failed: {0}")]
    Lockfile(String),
}

/// Read-only view a transform gets of the invocation so far.
pub struct TransformContext<'a> {
    /// Resolved concrete path of the file being transformed.
    pub path: &'a str,
    /// Content produced by earlier applied transforms in this invocation,
    /// keyed by resolved path. Later transforms observe earlier outputs
    /// through this overlay; the lockfile transform reads the
    /// already-updated manifests from it.
    pub updated: &'a HashMap<String, String>,
}

/// A content transformation for one file.
#[async_trait]
pub trait ContentTransform: Send + Sync {
    /// Return the new content, or `None` to skip this entry.
    async fn apply(
        &self,
        old: &str,
        ctx: &TransformContext<'_>,
    ) -> Result<Option<String>, BuildError>;
}

#[async_trait]
impl<F> ContentTransform for F
where
    F: Fn(&str) -> Option<String> + Send + Sync,
{
    async fn apply(
        &self,
        old: &str,
        _ctx: &TransformContext<'_>,
    ) -> Result<Option<String>, BuildError> {
        Ok(self(old))
    }
}

/// One (path, transform, commit message) entry.
pub struct Transform {
    pub path: FilePath,
    pub message: String,
    op: Box<dyn ContentTransform>,
}

impl Transform {
    pub fn new(
        path: impl Into<FilePath>,
        message: impl Into<String>,
        op: impl ContentTransform + 'static,
    ) -> Self {
        Self { path: path.into(), message: message.into(), op: Box::new(op) }
    }

    /// Transform the repository README, wherever it lives.
    pub fn readme(message: impl Into<String>, op: impl ContentTransform + 'static) -> Self {
        Self { path: FilePath::Readme, message: message.into(), op: Box::new(op) }
    }
}

/// Input to [`build_branch`].
pub struct BranchSpec {
    pub base: String,
    pub name: String,
    /// Applied strictly in order; later entries may depend on earlier
    /// outputs.
    pub transforms: Vec<Transform>,
}

/// Which file changes actually landed in the published commit chain.
///
/// `applied` is true iff the entry produced a commit. Returned explicitly
/// instead of mutating caller-owned descriptors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransformOutcome {
    pub path: String,
    pub applied: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BranchOutcome {
    /// Ref published, pointing at the final commit of the chain.
    Created { sha: Sha, outcomes: Vec<TransformOutcome> },
    /// The ref already existed with a tip committed by this bot: an
    /// at-least-once redelivery of work that already landed.
    AlreadyExists { sha: Sha, outcomes: Vec<TransformOutcome> },
    /// No transform produced a change; no ref was created.
    Unchanged,
}

impl BranchOutcome {
    pub fn sha(&self) -> Option<&Sha> {
        match self {
            BranchOutcome::Created { sha, .. } | BranchOutcome::AlreadyExists { sha, .. } => {
                Some(sha)
            }
            BranchOutcome::Unchanged => None,
        }
    }

    pub fn is_created(&self) -> bool {
        matches!(self, BranchOutcome::Created { .. })
    }
}

/// Build and publish a branch from a base branch and an ordered transform
/// list.
///
/// A not-found file is not an error: there is nothing to transform, the
/// entry is skipped. A transform returning `None` or content identical to
/// the input is likewise skipped. Each applied entry produces exactly one
/// tree and one single-parent commit on top of the previous step's commit.
/// An empty chain returns [`BranchOutcome::Unchanged`] without touching
/// any ref.
pub async fn build_branch(
    client: &dyn HostClient,
    gate: &WriteGate,
    bot: &BotIdentity,
    events: &dyn EventSink,
    spec: BranchSpec,
) -> Result<BranchOutcome, BuildError> {
    let base_tip = client.ref_head(&spec.base).await?;
    let mut head = base_tip.clone();
    let mut updated: HashMap<String, String> = HashMap::new();
    let mut outcomes = Vec::with_capacity(spec.transforms.len());

    for transform in &spec.transforms {
        let (path, fetched) = match client.file_content(&spec.base, &transform.path).await {
            Ok((path, body)) => (path, body),
            Err(err) if err.is_not_found() => {
                tracing::debug!(
                    branch = %spec.name,
                    path = transform.path.requested(),
                    "file absent on base branch, skipping transform"
                );
                outcomes
                    .push(TransformOutcome { path: transform.path.requested().to_string(), applied: false });
                continue;
            }
            Err(err) => return Err(err.into()),
        };

        // Earlier steps in this invocation win over the base branch.
        let old = updated.get(&path).cloned().unwrap_or(fetched);

        let ctx = TransformContext { path: &path, updated: &updated };
        let new = match transform.op.apply(&old, &ctx).await? {
            Some(new) if new != old => new,
            _ => {
                outcomes.push(TransformOutcome { path, applied: false });
                continue;
            }
        };

        let tree = expect_sha(
            gate.submit(
                client,
                WriteOp::CreateTree {
                    base_commit: head.clone(),
                    path: path.clone(),
                    content: new.clone(),
                },
            )
            .await?,
        )?;
        let commit = expect_sha(
            gate.submit(
                client,
                WriteOp::CreateCommit {
                    message: transform.message.clone(),
                    tree,
                    parent: head.clone(),
                },
            )
            .await?,
        )?;

        head = commit;
        updated.insert(path.clone(), new);
        outcomes.push(TransformOutcome { path, applied: true });
    }

    if head == base_tip {
        return Ok(BranchOutcome::Unchanged);
    }

    match gate
        .submit(client, WriteOp::CreateRef { name: spec.name.clone(), sha: head.clone() })
        .await
    {
        Ok(_) => {
            tracing::info!(branch = %spec.name, sha = %head, "branch created");
            events.emit(Event::BranchCreated {
                branch: spec.name.clone(),
                sha: head.as_str().to_string(),
            });
            Ok(BranchOutcome::Created { sha: head, outcomes })
        }
        Err(err) if err.is_conflict() => {
            // The ref exists. If its tip was committed by this bot, an
            // earlier delivery of the same job already landed this work.
            // Name alone is spoofable; the email must match too.
            let existing = client.ref_head(&spec.name).await?;
            let tip = client.commit(&existing).await?;
            if tip.committer.name == bot.name && tip.committer.email == bot.email {
                tracing::debug!(branch = %spec.name, sha = %existing, "branch already created by us");
                Ok(BranchOutcome::AlreadyExists { sha: existing, outcomes })
            } else {
                tracing::warn!(
                    branch = %spec.name,
                    committer = %tip.committer.name,
                    "branch exists with a foreign tip, surfacing conflict"
                );
                Err(err.into())
            }
        }
        Err(err) => Err(err.into()),
    }
}

fn expect_sha(result: WriteResult) -> Result<Sha, BuildError> {
    match result {
        WriteResult::Sha(sha) => Ok(sha),
        WriteResult::RefCreated => {
            Err(HostError::Transport("expected an object sha from write".to_string()).into())
        }
    }
}

#[cfg(test)]
#[path = "branch_tests.rs"]
mod tests;
