// SPDX-License-Identifier: MIT

use super::*;

#[test]
fn paying_plans() {
    assert!(!Plan::Free.is_paying());
    assert!(Plan::Supporter.is_paying());
    assert!(Plan::Org.is_paying());
}

#[test]
fn plan_serde_snake_case() {
    assert_eq!(serde_json::to_string(&Plan::Org).unwrap(), "\"org\"");
    let parsed: Plan = serde_json::from_str("\"supporter\"").unwrap();
    assert_eq!(parsed, Plan::Supporter);
}

#[test]
fn account_construction() {
    let account = Account::new(77, "octocat", Plan::Free);
    assert_eq!(account.id, 77);
    assert_eq!(account.login, "octocat");
    assert_eq!(account.plan.to_string(), "free");
}
