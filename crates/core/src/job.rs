// SPDX-License-Identifier: MIT

//! Job descriptors and broker queue entries.

use serde::{Deserialize, Serialize};

crate::define_id! {
    /// Unique identifier for a published job descriptor.
    ///
    /// IDs only serve logging and broker bookkeeping; dedup and ordering
    /// are driven by the routing key, never by the job ID.
    pub struct JobId("job-");
}

/// The closed set of job kinds this system schedules.
///
/// Unknown names deserialize to [`JobName::Custom`] and fail handler lookup
/// with a typed error rather than a panic, so a deployment mismatch between
/// publisher and worker surfaces as a classified permanent failure.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum JobName {
    /// Periodic, globally-ordered scan of the package registry.
    RegistryChange,
    /// Periodic, globally-ordered billing reconciliation.
    BillingEvent,
    /// Onboarding: create the pin/badge branch for a fresh repository.
    CreateInitialBranch,
    /// Onboarding: enable a subgroup of a monorepo.
    InitialSubgroup,
    /// Create a branch updating one dependency to a new version.
    CreateVersionBranch,
    /// Create a branch updating a dependency group in a monorepo.
    CreateGroupVersionBranch,
    /// Open the pull request for a previously created version branch.
    CreateVersionPr,
    /// Sync payment state after a plan change.
    UpdatePayments,
    /// Any name not in the closed set.
    Custom(String),
}

impl JobName {
    pub fn as_str(&self) -> &str {
        match self {
            JobName::RegistryChange => "registry-change",
            JobName::BillingEvent => "billing-event",
            JobName::CreateInitialBranch => "create-initial-branch",
            JobName::InitialSubgroup => "create-initial-subgroup-branch",
            JobName::CreateVersionBranch => "create-version-branch",
            JobName::CreateGroupVersionBranch => "create-group-version-branch",
            JobName::CreateVersionPr => "create-version-pr",
            JobName::UpdatePayments => "update-payments",
            JobName::Custom(name) => name,
        }
    }

    pub fn parse(name: &str) -> Self {
        match name {
            "registry-change" => JobName::RegistryChange,
            "billing-event" => JobName::BillingEvent,
            "create-initial-branch" => JobName::CreateInitialBranch,
            "create-initial-subgroup-branch" => JobName::InitialSubgroup,
            "create-version-branch" => JobName::CreateVersionBranch,
            "create-group-version-branch" => JobName::CreateGroupVersionBranch,
            "create-version-pr" => JobName::CreateVersionPr,
            "update-payments" => JobName::UpdatePayments,
            other => JobName::Custom(other.to_string()),
        }
    }

    /// Dedicated routing key for globally-scoped job kinds.
    ///
    /// Registry scans and billing events must execute in global arrival
    /// order, so they route to a fixed key instead of an account.
    pub fn global_key(&self) -> Option<&'static str> {
        match self {
            JobName::RegistryChange => Some("registry-change"),
            JobName::BillingEvent => Some("billing-event"),
            _ => None,
        }
    }

    /// Onboarding kinds schedule their follow-ups at medium priority.
    pub fn is_onboarding(&self) -> bool {
        matches!(self, JobName::CreateInitialBranch | JobName::InitialSubgroup)
    }
}

impl From<String> for JobName {
    fn from(s: String) -> Self {
        JobName::parse(&s)
    }
}

impl From<JobName> for String {
    fn from(name: JobName) -> Self {
        name.as_str().to_string()
    }
}

impl std::fmt::Display for JobName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An immutable unit of work published to the broker.
///
/// The payload is opaque to the dispatch layer; handlers deserialize what
/// they need. Handlers never mutate their own input, they only return new
/// descriptors.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Job {
    pub id: JobId,
    pub name: JobName,
    pub payload: serde_json::Value,
    /// Delivery attempt count, stamped by the worker on requeue so brokers
    /// without a native redelivery flag still expose retry state.
    #[serde(default)]
    pub attempt: u32,
    /// Optional scheduling delay hint for debounced jobs, in milliseconds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub delay_ms: Option<u64>,
}

impl Job {
    pub fn new(name: JobName, payload: serde_json::Value) -> Self {
        Self { id: JobId::new(), name, payload, attempt: 0, delay_ms: None }
    }

    /// Attach a scheduling delay hint.
    pub fn with_delay_ms(mut self, delay_ms: u64) -> Self {
        self.delay_ms = Some(delay_ms);
        self
    }

    /// Copy of this job stamped for redelivery.
    pub fn next_attempt(&self) -> Self {
        let mut job = self.clone();
        job.attempt += 1;
        job
    }

    /// Numeric account ID carried directly on the payload, if any.
    ///
    /// This only probes the flat `accountId` field; the dispatcher's full
    /// shape-chain resolution lives in the engine crate.
    pub fn account_id(&self) -> Option<u64> {
        self.payload.get("accountId").and_then(serde_json::Value::as_u64)
    }
}

crate::builder! {
    pub struct JobTestBuilder => Job {
        into {
            id: JobId = "job-test0000000000000000",
        }
        set {
            name: JobName = JobName::CreateVersionBranch,
            payload: serde_json::Value = serde_json::Value::Null,
            attempt: u32 = 0,
            delay_ms: Option<u64> = None,
        }
    }
}

/// Named broker queues consumed by the dispatcher.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QueueName {
    /// Webhook-derived events.
    Events,
    /// Scheduled and follow-up jobs.
    Jobs,
}

crate::simple_display! {
    QueueName {
        Events => "events",
        Jobs => "jobs",
    }
}

/// A job plus the scheduling metadata computed at publish time.
///
/// Priority is always recomputed from the account plan and job kind when an
/// entry is built, never inherited from the triggering job.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueueEntry {
    pub job: Job,
    pub priority: crate::priority::Priority,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub delay_ms: Option<u64>,
}

impl QueueEntry {
    pub fn new(job: Job, priority: crate::priority::Priority) -> Self {
        let delay_ms = job.delay_ms;
        Self { job, priority, delay_ms }
    }
}

#[cfg(test)]
#[path = "job_tests.rs"]
mod tests;
