// SPDX-License-Identifier: MIT

use super::*;
use yare::parameterized;

#[parameterized(
    paying_org = { Some(Plan::Org), JobName::CreateVersionBranch, Priority::High },
    paying_supporter = { Some(Plan::Supporter), JobName::RegistryChange, Priority::High },
    paying_beats_onboarding = { Some(Plan::Org), JobName::CreateInitialBranch, Priority::High },
    free_onboarding = { Some(Plan::Free), JobName::CreateInitialBranch, Priority::Medium },
    no_account_onboarding = { None, JobName::InitialSubgroup, Priority::Medium },
    free_update = { Some(Plan::Free), JobName::CreateVersionBranch, Priority::Low },
    no_account_update = { None, JobName::CreateVersionBranch, Priority::Low },
)]
fn schedule_priority_table(plan: Option<Plan>, name: JobName, expected: Priority) {
    assert_eq!(schedule_priority(plan, &name), expected);
}

#[test]
fn priority_numeric_values_are_ordered() {
    assert!(Priority::Low.as_u8() < Priority::Medium.as_u8());
    assert!(Priority::Medium.as_u8() < Priority::High.as_u8());
    assert!(Priority::Low < Priority::High);
}

#[test]
fn priority_serde_snake_case() {
    assert_eq!(serde_json::to_string(&Priority::High).unwrap(), "\"high\"");
}
