// SPDX-License-Identifier: MIT

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! updot-hosting: the version-control hosting boundary.
//!
//! Typed read/write operations, classified errors, the global rate-limited
//! write gate, and the branch builder that turns content transforms into a
//! chain of tree/commit objects behind a new ref.

pub mod branch;
pub mod client;
pub mod error;
pub mod gate;
pub mod lockfile;
pub mod ops;

#[cfg(any(test, feature = "test-support"))]
pub mod test_support;

pub use branch::{
    build_branch, BranchOutcome, BranchSpec, BuildError, ContentTransform, Transform,
    TransformContext, TransformOutcome,
};
pub use client::HostClient;
pub use error::HostError;
pub use gate::WriteGate;
pub use lockfile::{LockfileService, LockfileTransform};
pub use ops::{Author, CommitInfo, FilePath, ReadOp, ReadResult, Sha, WriteOp, WriteResult};
