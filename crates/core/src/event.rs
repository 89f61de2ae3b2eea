// SPDX-License-Identifier: MIT

//! Observability events emitted by the dispatch pipeline.
//!
//! A discarded job has no synchronous caller to report to; this event
//! stream is the only user-visible trace of it. Every terminal branch in
//! the worker emits exactly one of these.

use crate::job::{JobId, JobName};
use crate::priority::Priority;
use serde::{Deserialize, Serialize};

/// Failure classification attached to terminal failure events.
///
/// Classification happens only in the worker; handlers and the branch
/// builder raise typed errors upward and never decide broker semantics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    /// Payload carried no resolvable account identity (malformed job).
    NoRoutingKey,
    /// No handler registered for the job name (deployment mismatch).
    HandlerNotFound,
    /// Authentication failure against the hosting API; resolves on retry.
    TransientAuth,
    /// Any other handler failure.
    HandlerFailed,
}

crate::simple_display! {
    FailureKind {
        NoRoutingKey => "no-routing-key",
        HandlerNotFound => "handler-not-found",
        TransientAuth => "transient-auth",
        HandlerFailed => "handler-failed",
    }
}

/// Events published on the observability stream.
///
/// Serializes with `{"type": "event:name", ...fields}` format.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Event {
    #[serde(rename = "job:started")]
    JobStarted { job: JobId, name: JobName },

    #[serde(rename = "job:succeeded")]
    JobSucceeded { job: JobId, name: JobName, runtime_ms: u64, follow_ups: usize },

    #[serde(rename = "job:failed")]
    JobFailed {
        job: JobId,
        name: JobName,
        classification: FailureKind,
        /// Whether the message went back to the broker for another attempt.
        requeued: bool,
        /// Handler runtime for this attempt; zero when the job never ran.
        runtime_ms: u64,
        error: String,
    },

    /// A redelivered message failed again and was discarded.
    #[serde(rename = "job:poisoned")]
    JobPoisoned { job: JobId, name: JobName, runtime_ms: u64, error: String },

    #[serde(rename = "job:follow-up")]
    FollowUpScheduled { job: JobId, name: JobName, priority: Priority },

    /// Counter event: the branch builder published a new ref.
    #[serde(rename = "branch:created")]
    BranchCreated { branch: String, sha: String },
}

impl Event {
    /// Job ID the event refers to.
    pub fn job_id(&self) -> Option<&JobId> {
        match self {
            Event::JobStarted { job, .. }
            | Event::JobSucceeded { job, .. }
            | Event::JobFailed { job, .. }
            | Event::JobPoisoned { job, .. }
            | Event::FollowUpScheduled { job, .. } => Some(job),
            Event::BranchCreated { .. } => None,
        }
    }

    pub fn is_terminal_failure(&self) -> bool {
        matches!(self, Event::JobPoisoned { .. })
            || matches!(self, Event::JobFailed { requeued: false, .. })
    }
}

/// Consumer of the observability stream.
///
/// Production wires this to a channel feeding the monitoring exporter;
/// tests collect events in memory and assert on terminal classification.
pub trait EventSink: Send + Sync {
    fn emit(&self, event: Event);
}

/// Sink that drops everything. Placeholder for callers that opt out.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullSink;

impl EventSink for NullSink {
    fn emit(&self, _event: Event) {}
}

#[cfg(test)]
#[path = "event_tests.rs"]
mod tests;
