// SPDX-License-Identifier: MIT

//! Routing keys for sharding dispatch concurrency.

/// Key a job is serialized under.
///
/// Keys shard concurrency only: jobs under the same key execute strictly in
/// arrival order, while keys have no ordering relationship to each other.
/// Account keys carry the numeric account/installation ID; global keys
/// exist for job kinds that need process-wide ordering (registry scans,
/// billing events). Keys are process-local and never persisted.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum RoutingKey {
    Account(u64),
    Global(&'static str),
}

impl RoutingKey {
    pub fn account(id: u64) -> Self {
        RoutingKey::Account(id)
    }

    pub fn is_global(&self) -> bool {
        matches!(self, RoutingKey::Global(_))
    }
}

impl std::fmt::Display for RoutingKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RoutingKey::Account(id) => write!(f, "account:{}", id),
            RoutingKey::Global(name) => write!(f, "global:{}", name),
        }
    }
}

#[cfg(test)]
#[path = "routing_tests.rs"]
mod tests;
