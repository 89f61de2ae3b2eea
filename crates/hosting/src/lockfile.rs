// SPDX-License-Identifier: MIT

//! Lockfile regeneration as a branch-builder transform.
//!
//! Regeneration is an external service call. It runs as an ordinary extra
//! transform appended after all manifest transforms, so it is fed the
//! already-updated manifest contents from the invocation overlay, not the
//! originals.

use crate::branch::{BuildError, ContentTransform, Transform, TransformContext};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;

/// External lockfile regeneration service.
#[async_trait]
pub trait LockfileService: Send + Sync {
    /// Produce a new lockfile body from updated manifests and the current
    /// lockfile.
    async fn regenerate(
        &self,
        manifests: &HashMap<String, String>,
        lockfile: &str,
    ) -> Result<String, BuildError>;
}

/// Transform that regenerates a lockfile from this invocation's updated
/// manifests.
pub struct LockfileTransform {
    service: Arc<dyn LockfileService>,
    manifest_paths: Vec<String>,
}

impl LockfileTransform {
    pub fn new(service: Arc<dyn LockfileService>, manifest_paths: Vec<String>) -> Self {
        Self { service, manifest_paths }
    }

    /// Convenience wrapper producing a full [`Transform`] entry.
    pub fn into_transform(self, lockfile_path: impl Into<String>, message: impl Into<String>) -> Transform {
        Transform::new(lockfile_path.into(), message, self)
    }
}

#[async_trait]
impl ContentTransform for LockfileTransform {
    async fn apply(
        &self,
        old: &str,
        ctx: &TransformContext<'_>,
    ) -> Result<Option<String>, BuildError> {
        let mut manifests = HashMap::new();
        for path in &self.manifest_paths {
            if let Some(body) = ctx.updated.get(path) {
                manifests.insert(path.clone(), body.clone());
            }
        }
        // No manifest changed earlier in the chain: nothing to regenerate.
        if manifests.is_empty() {
            return Ok(None);
        }
        let new = self.service.regenerate(&manifests, old).await?;
        Ok(Some(new))
    }
}

#[cfg(test)]
#[path = "lockfile_tests.rs"]
mod tests;
