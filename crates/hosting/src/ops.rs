// SPDX-License-Identifier: MIT

//! Typed hosting-API operations and their results.
//!
//! The split into [`ReadOp`] and [`WriteOp`] is load-bearing: every
//! `WriteOp` must be funneled through the write gate, while reads run with
//! whatever concurrency the caller chooses.

use serde::{Deserialize, Serialize};

/// Content-addressed object identifier (commit, tree, blob).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Sha(pub String);

impl Sha {
    pub fn new(sha: impl Into<String>) -> Self {
        Self(sha.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for Sha {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Sha {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<String> for Sha {
    fn from(s: String) -> Self {
        Self(s)
    }
}

/// A file location in the repository.
///
/// `Readme` is a sentinel asking for the repository README wherever it
/// actually lives (`README.md`, `Readme.rst`, ...); the read result carries
/// the resolved concrete path.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FilePath {
    Exact(String),
    Readme,
}

impl FilePath {
    /// Requested path for logs and transform outcomes, before resolution.
    pub fn requested(&self) -> &str {
        match self {
            FilePath::Exact(path) => path,
            FilePath::Readme => "README",
        }
    }
}

impl From<&str> for FilePath {
    fn from(path: &str) -> Self {
        FilePath::Exact(path.to_string())
    }
}

impl From<String> for FilePath {
    fn from(path: String) -> Self {
        FilePath::Exact(path)
    }
}

/// Commit author/committer identity.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Author {
    pub name: String,
    pub email: String,
}

impl Author {
    pub fn new(name: impl Into<String>, email: impl Into<String>) -> Self {
        Self { name: name.into(), email: email.into() }
    }
}

/// The slice of a commit object conflict resolution needs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommitInfo {
    pub sha: Sha,
    pub committer: Author,
}

/// Read-only operations. Never gated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReadOp {
    /// Current tip commit of a branch.
    RefHead { branch: String },
    /// File content as of a branch tip.
    FileContent { branch: String, path: FilePath },
    /// Commit metadata by sha.
    Commit { sha: Sha },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReadResult {
    RefHead(Sha),
    /// Resolved concrete path plus body (the path differs from the request
    /// for the README sentinel).
    FileContent { path: String, body: String },
    Commit(CommitInfo),
}

/// Mutating operations. Always submitted through the write gate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WriteOp {
    /// Tree extending the tree of `base_commit` with one updated blob.
    CreateTree { base_commit: Sha, path: String, content: String },
    /// Commit with exactly one parent.
    CreateCommit { message: String, tree: Sha, parent: Sha },
    /// New branch ref. Fails with a conflict if the ref exists; refs
    /// created by this system are never force-updated.
    CreateRef { name: String, sha: Sha },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WriteResult {
    Sha(Sha),
    RefCreated,
}

#[cfg(test)]
#[path = "ops_tests.rs"]
mod tests;
