// SPDX-License-Identifier: MIT

//! Account and billing-plan surface needed for scheduling.
//!
//! Billing itself (invoicing, seat counting, coupon rules) lives outside
//! this core; the only thing dispatch needs is whether an account's plan
//! buys it priority.

use serde::{Deserialize, Serialize};

/// Billing plan attached to an account.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Plan {
    Free,
    Supporter,
    Org,
}

impl Plan {
    /// Paying plans get high scheduling priority.
    pub fn is_paying(self) -> bool {
        matches!(self, Plan::Supporter | Plan::Org)
    }
}

crate::simple_display! {
    Plan {
        Free => "free",
        Supporter => "supporter",
        Org => "org",
    }
}

/// The slice of an account document this core reads.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    pub id: u64,
    pub login: String,
    pub plan: Plan,
}

impl Account {
    pub fn new(id: u64, login: impl Into<String>, plan: Plan) -> Self {
        Self { id, login: login.into(), plan }
    }
}

#[cfg(test)]
#[path = "account_tests.rs"]
mod tests;
