// SPDX-License-Identifier: MIT

//! The hosting-API client seam.
//!
//! Implementations own transport concerns (per-call timeouts, retry with
//! backoff for retriable errors); callers only see classified [`HostError`]
//! values. Mutating calls must go through [`crate::gate::WriteGate`], never
//! directly to `write`.

use crate::error::HostError;
use crate::ops::{CommitInfo, FilePath, ReadOp, ReadResult, Sha, WriteOp, WriteResult};
use async_trait::async_trait;

#[async_trait]
pub trait HostClient: Send + Sync {
    async fn read(&self, op: ReadOp) -> Result<ReadResult, HostError>;
    async fn write(&self, op: WriteOp) -> Result<WriteResult, HostError>;

    /// Tip commit sha of a branch.
    async fn ref_head(&self, branch: &str) -> Result<Sha, HostError> {
        match self.read(ReadOp::RefHead { branch: branch.to_string() }).await? {
            ReadResult::RefHead(sha) => Ok(sha),
            other => Err(unexpected(&other)),
        }
    }

    /// File content at a branch tip, with the resolved concrete path.
    async fn file_content(
        &self,
        branch: &str,
        path: &FilePath,
    ) -> Result<(String, String), HostError> {
        let op = ReadOp::FileContent { branch: branch.to_string(), path: path.clone() };
        match self.read(op).await? {
            ReadResult::FileContent { path, body } => Ok((path, body)),
            other => Err(unexpected(&other)),
        }
    }

    /// Commit metadata by sha.
    async fn commit(&self, sha: &Sha) -> Result<CommitInfo, HostError> {
        match self.read(ReadOp::Commit { sha: sha.clone() }).await? {
            ReadResult::Commit(info) => Ok(info),
            other => Err(unexpected(&other)),
        }
    }
}

fn unexpected(result: &ReadResult) -> HostError {
    HostError::Transport(format!("unexpected read result shape: {result:?}"))
}
