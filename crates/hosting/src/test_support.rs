// SPDX-License-Identifier: MIT

//! In-memory hosting API for tests.
//!
//! Content-addressed like the real object store: identical tree/commit
//! creations yield identical shas, so idempotence tests observe "no
//! duplicate objects" for free. Supports failure injection for the auth
//! and conflict paths, and records every write with its dispatch instant
//! for gate-ordering assertions.

use crate::client::HostClient;
use crate::error::HostError;
use crate::ops::{Author, CommitInfo, FilePath, ReadOp, ReadResult, Sha, WriteOp, WriteResult};
use async_trait::async_trait;
use parking_lot::Mutex;
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use tokio::time::Instant;

#[derive(Debug, Clone)]
struct StoredCommit {
    #[allow(dead_code)]
    message: String,
    #[allow(dead_code)]
    tree: Sha,
    parent: Sha,
    committer: Author,
}

#[derive(Default)]
struct HostState {
    branches: HashMap<String, Sha>,
    /// Files as of each branch tip, keyed by (branch, path).
    files: HashMap<(String, String), String>,
    commits: HashMap<String, StoredCommit>,
    trees: HashMap<String, (Sha, String, String)>,
    readme_path: String,
    committer: Author,
    /// Remaining write calls that fail with an auth error.
    auth_failures: u32,
    write_log: Vec<(Instant, WriteOp)>,
}

/// In-memory [`HostClient`] implementation.
pub struct InMemoryHost {
    state: Mutex<HostState>,
}

impl Default for InMemoryHost {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryHost {
    pub fn new() -> Self {
        let state = HostState {
            readme_path: "README.md".to_string(),
            committer: Author::new("updot[bot]", "bot@updot.dev"),
            ..HostState::default()
        };
        Self { state: Mutex::new(state) }
    }

    /// Seed a branch with a synthetic root commit.
    pub fn seed_branch(&self, branch: &str) -> Sha {
        let sha = object_sha(&["root", branch]);
        let mut state = self.state.lock();
        state.commits.insert(
            sha.0.clone(),
            StoredCommit {
                message: format!("seed {branch}"),
                tree: object_sha(&["root-tree", branch]),
                parent: Sha::new(""),
                committer: Author::new("seed", "seed@example.com"),
            },
        );
        state.branches.insert(branch.to_string(), sha.clone());
        sha
    }

    /// Seed a branch whose tip was committed by someone other than the bot.
    pub fn seed_foreign_branch(&self, branch: &str) -> Sha {
        self.seed_branch_by(branch, Author::new("a-human", "human@example.com"))
    }

    /// Seed a branch whose tip carries the given committer identity.
    pub fn seed_branch_by(&self, branch: &str, committer: Author) -> Sha {
        let sha = object_sha(&["foreign", branch, &committer.name, &committer.email]);
        let mut state = self.state.lock();
        state.commits.insert(
            sha.0.clone(),
            StoredCommit {
                message: format!("outside work on {branch}"),
                tree: object_sha(&["foreign-tree", branch]),
                parent: Sha::new(""),
                committer,
            },
        );
        state.branches.insert(branch.to_string(), sha.clone());
        sha
    }

    pub fn put_file(&self, branch: &str, path: &str, body: &str) {
        self.state
            .lock()
            .files
            .insert((branch.to_string(), path.to_string()), body.to_string());
    }

    /// Where the README sentinel resolves to (default `README.md`).
    pub fn set_readme_path(&self, path: &str) {
        self.state.lock().readme_path = path.to_string();
    }

    /// Identity stamped on commits this host creates.
    pub fn set_committer(&self, author: Author) {
        self.state.lock().committer = author;
    }

    /// Fail the next `n` write calls with an auth error.
    pub fn fail_next_writes_with_auth(&self, n: u32) {
        self.state.lock().auth_failures = n;
    }

    pub fn branch_head(&self, branch: &str) -> Option<Sha> {
        self.state.lock().branches.get(branch).cloned()
    }

    pub fn commit_count(&self) -> usize {
        self.state.lock().commits.len()
    }

    /// Every write in dispatch order, with its dispatch instant.
    pub fn write_log(&self) -> Vec<(Instant, WriteOp)> {
        self.state.lock().write_log.clone()
    }

    pub fn write_count(&self) -> usize {
        self.state.lock().write_log.len()
    }
}

#[async_trait]
impl HostClient for InMemoryHost {
    async fn read(&self, op: ReadOp) -> Result<ReadResult, HostError> {
        let state = self.state.lock();
        match op {
            ReadOp::RefHead { branch } => state
                .branches
                .get(&branch)
                .cloned()
                .map(ReadResult::RefHead)
                .ok_or_else(|| HostError::NotFound(format!("ref {branch}"))),
            ReadOp::FileContent { branch, path } => {
                let resolved = match path {
                    FilePath::Exact(p) => p,
                    FilePath::Readme => state.readme_path.clone(),
                };
                state
                    .files
                    .get(&(branch.clone(), resolved.clone()))
                    .map(|body| ReadResult::FileContent { path: resolved.clone(), body: body.clone() })
                    .ok_or_else(|| HostError::NotFound(format!("{branch}:{resolved}")))
            }
            ReadOp::Commit { sha } => state
                .commits
                .get(sha.as_str())
                .map(|commit| {
                    ReadResult::Commit(CommitInfo { sha: sha.clone(), committer: commit.committer.clone() })
                })
                .ok_or_else(|| HostError::NotFound(format!("commit {sha}"))),
        }
    }

    async fn write(&self, op: WriteOp) -> Result<WriteResult, HostError> {
        let mut state = self.state.lock();
        state.write_log.push((Instant::now(), op.clone()));
        if state.auth_failures > 0 {
            state.auth_failures -= 1;
            return Err(HostError::Auth("installation token not yet valid".to_string()));
        }
        match op {
            WriteOp::CreateTree { base_commit, path, content } => {
                let sha = object_sha(&["tree", base_commit.as_str(), &path, &content]);
                state.trees.insert(sha.0.clone(), (base_commit, path, content));
                Ok(WriteResult::Sha(sha))
            }
            WriteOp::CreateCommit { message, tree, parent } => {
                let committer = state.committer.clone();
                let sha =
                    object_sha(&["commit", &message, tree.as_str(), parent.as_str(), &committer.name]);
                state
                    .commits
                    .insert(sha.0.clone(), StoredCommit { message, tree, parent, committer });
                Ok(WriteResult::Sha(sha))
            }
            WriteOp::CreateRef { name, sha } => {
                if state.branches.contains_key(&name) {
                    return Err(HostError::Conflict(format!("ref {name} already exists")));
                }
                if !state.commits.contains_key(sha.as_str()) {
                    return Err(HostError::NotFound(format!("commit {sha}")));
                }
                state.branches.insert(name, sha);
                Ok(WriteResult::RefCreated)
            }
        }
    }
}

/// Deterministic content-addressed sha over the given parts.
fn object_sha(parts: &[&str]) -> Sha {
    let mut hasher = Sha256::new();
    for part in parts {
        hasher.update(part.as_bytes());
        hasher.update([0u8]);
    }
    Sha::new(format!("{:x}", hasher.finalize()))
}

/// Walk a commit chain back to (but not including) `base`, newest first.
pub fn chain_from(host: &InMemoryHost, tip: &Sha, base: &Sha) -> Vec<Sha> {
    let state = host.state.lock();
    let mut chain = Vec::new();
    let mut cursor = tip.clone();
    while cursor != *base {
        let Some(commit) = state.commits.get(cursor.as_str()) else { break };
        chain.push(cursor.clone());
        cursor = commit.parent.clone();
    }
    chain
}
