// SPDX-License-Identifier: MIT

//! Shared test helpers: collecting event sink and payload builders.

use crate::event::{Event, EventSink};
use parking_lot::Mutex;
use std::sync::Arc;

/// Event sink that records everything emitted, for assertions.
#[derive(Clone, Default)]
pub struct CollectingSink {
    events: Arc<Mutex<Vec<Event>>>,
}

impl CollectingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<Event> {
        self.events.lock().clone()
    }

    pub fn terminal_failures(&self) -> Vec<Event> {
        self.events.lock().iter().filter(|e| e.is_terminal_failure()).cloned().collect()
    }

    pub fn count_branch_created(&self) -> usize {
        self.events
            .lock()
            .iter()
            .filter(|e| matches!(e, Event::BranchCreated { .. }))
            .count()
    }
}

impl EventSink for CollectingSink {
    fn emit(&self, event: Event) {
        self.events.lock().push(event);
    }
}

/// Payload for a version-branch job, in the shape handlers deserialize.
pub fn version_branch_payload(account_id: u64, dependency: &str, version: &str) -> serde_json::Value {
    serde_json::json!({
        "accountId": account_id,
        "repositoryFullName": "owner/repo",
        "base": "main",
        "dependency": dependency,
        "version": version,
        "manifests": ["package.json"],
    })
}
