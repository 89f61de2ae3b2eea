// SPDX-License-Identifier: MIT

//! Broker priority computation.

use crate::account::Plan;
use crate::job::JobName;
use serde::{Deserialize, Serialize};

/// Broker message priority.
///
/// Numeric values match the broker's priority range so entries can be
/// published without translation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Priority {
    Low,
    Medium,
    High,
}

impl Priority {
    pub fn as_u8(self) -> u8 {
        match self {
            Priority::Low => 1,
            Priority::Medium => 5,
            Priority::High => 9,
        }
    }
}

crate::simple_display! {
    Priority {
        Low => "low",
        Medium => "medium",
        High => "high",
    }
}

/// Priority for a follow-up job, recomputed at schedule time.
///
/// Paying accounts go first, onboarding work next, everything else last.
/// The triggering job's priority is deliberately not consulted.
pub fn schedule_priority(plan: Option<Plan>, name: &JobName) -> Priority {
    if plan.is_some_and(|p| p.is_paying()) {
        Priority::High
    } else if name.is_onboarding() {
        Priority::Medium
    } else {
        Priority::Low
    }
}

#[cfg(test)]
#[path = "priority_tests.rs"]
mod tests;
