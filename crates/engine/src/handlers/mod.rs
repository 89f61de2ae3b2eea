// SPDX-License-Identifier: MIT

//! Job handlers and their registry.
//!
//! Handlers are pure-ish: they receive one deserialized payload, call the
//! branch builder and hosting API through the shared context, and return
//! zero or more follow-up job descriptors. They raise typed errors upward
//! and never decide broker semantics; retry/discard classification lives
//! in the worker alone.

pub mod initial_branch;
pub mod version_branch;

use crate::accounts::{AccountStore, StoreError};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use thiserror::Error;
use updot_core::{EventSink, Job, JobName, UpdotConfig};
use updot_hosting::{BuildError, HostClient, HostError, LockfileService, WriteGate};

pub use initial_branch::InitialBranchHandler;
pub use version_branch::VersionBranchHandler;

#[derive(Debug, Error)]
pub enum HandlerError {
    #[error(transparent)]
    Host(#[from] HostError),

    #[error(transparent)]
    Build(#[from] BuildError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("bad payload: {0}")]
    Payload(String),
}

impl HandlerError {
    /// Auth failures against the hosting API resolve themselves once the
    /// installation token propagates, so the worker retries them.
    pub fn is_transient_auth(&self) -> bool {
        match self {
            HandlerError::Host(err) => err.is_auth(),
            HandlerError::Build(BuildError::Host(err)) => err.is_auth(),
            _ => false,
        }
    }
}

impl From<serde_json::Error> for HandlerError {
    fn from(err: serde_json::Error) -> Self {
        HandlerError::Payload(err.to_string())
    }
}

/// Collaborators a handler may call.
pub struct HandlerContext {
    pub host: Arc<dyn HostClient>,
    pub gate: Arc<WriteGate>,
    pub accounts: Arc<dyn AccountStore>,
    pub lockfiles: Arc<dyn LockfileService>,
    pub config: Arc<UpdotConfig>,
    pub events: Arc<dyn EventSink>,
}

/// A named job handler.
#[async_trait]
pub trait JobHandler: Send + Sync {
    async fn execute(&self, ctx: &HandlerContext, job: &Job) -> Result<Vec<Job>, HandlerError>;
}

/// Compile-time handler registry, populated at startup.
///
/// Lookup misses are a typed condition the worker classifies as permanent;
/// nothing here panics on unknown names.
#[derive(Default)]
pub struct HandlerRegistry {
    handlers: HashMap<JobName, Arc<dyn JobHandler>>,
}

impl HandlerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with the handlers this crate ships.
    pub fn standard() -> Self {
        let mut registry = Self::new();
        registry.register(JobName::CreateVersionBranch, Arc::new(VersionBranchHandler));
        registry.register(JobName::CreateInitialBranch, Arc::new(InitialBranchHandler));
        registry
    }

    pub fn register(&mut self, name: JobName, handler: Arc<dyn JobHandler>) {
        self.handlers.insert(name, handler);
    }

    pub fn get(&self, name: &JobName) -> Option<Arc<dyn JobHandler>> {
        self.handlers.get(name).cloned()
    }

    pub fn contains(&self, name: &JobName) -> bool {
        self.handlers.contains_key(name)
    }
}

#[cfg(test)]
#[path = "mod_tests.rs"]
mod tests;
