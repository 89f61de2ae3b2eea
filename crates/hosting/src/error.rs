// SPDX-License-Identifier: MIT

//! Classified hosting-API errors.
//!
//! The classification drives retry decisions upstream: the worker treats
//! auth failures as transient (installation tokens propagate with a lag)
//! while conflicts and not-found results are semantic, not transport,
//! conditions the callers inspect directly.

use thiserror::Error;

/// Error returned by hosting-API reads and writes.
#[derive(Debug, Clone, Error)]
pub enum HostError {
    /// Object (ref, file, commit) does not exist.
    #[error("not found: {0}")]
    NotFound(String),

    /// Write raced with an existing object (e.g. the ref already exists).
    #[error("conflict: {0}")]
    Conflict(String),

    /// Authentication or authorization failure.
    #[error("authentication failed: {0}")]
    Auth(String),

    /// The API asked us to back off.
    #[error("rate limited: {0}")]
    RateLimited(String),

    /// Network-level failure, timeout, or malformed response.
    #[error("transport error: {0}")]
    Transport(String),
}

impl HostError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, HostError::NotFound(_))
    }

    pub fn is_conflict(&self) -> bool {
        matches!(self, HostError::Conflict(_))
    }

    pub fn is_auth(&self) -> bool {
        matches!(self, HostError::Auth(_))
    }

    /// Whether the underlying HTTP client may retry this call in place.
    ///
    /// Conflict and not-found are semantic outcomes, never retried.
    pub fn is_retriable(&self) -> bool {
        matches!(self, HostError::RateLimited(_) | HostError::Transport(_))
    }
}

#[cfg(test)]
#[path = "error_tests.rs"]
mod tests;
