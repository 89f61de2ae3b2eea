// SPDX-License-Identifier: MIT

use super::*;
use crate::test_support::NoopHandler;
use updot_hosting::BuildError;

#[test]
fn standard_registry_covers_the_branch_building_kinds() {
    let registry = HandlerRegistry::standard();
    assert!(registry.contains(&JobName::CreateVersionBranch));
    assert!(registry.contains(&JobName::CreateInitialBranch));
    assert!(!registry.contains(&JobName::CreateVersionPr));
}

#[test]
fn lookup_miss_is_a_value_not_a_panic() {
    let registry = HandlerRegistry::new();
    assert!(registry.get(&JobName::Custom("unheard-of".to_string())).is_none());
}

#[test]
fn registering_overrides_a_previous_handler() {
    let mut registry = HandlerRegistry::standard();
    registry.register(JobName::CreateVersionBranch, Arc::new(NoopHandler));
    assert!(registry.contains(&JobName::CreateVersionBranch));
}

#[test]
fn auth_errors_classify_as_transient() {
    let direct = HandlerError::Host(HostError::Auth("expired".to_string()));
    assert!(direct.is_transient_auth());

    let via_build = HandlerError::Build(BuildError::Host(HostError::Auth("expired".to_string())));
    assert!(via_build.is_transient_auth());
}

#[test]
fn other_errors_are_not_transient() {
    let payload = HandlerError::Payload("missing field".to_string());
    assert!(!payload.is_transient_auth());

    let conflict = HandlerError::Host(HostError::Conflict("ref exists".to_string()));
    assert!(!conflict.is_transient_auth());

    let lockfile = HandlerError::Build(BuildError::Lockfile("service down".to_string()));
    assert!(!lockfile.is_transient_auth());
}

#[test]
fn serde_errors_map_to_payload() {
    let err = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
    let handler_err: HandlerError = err.into();
    assert!(matches!(handler_err, HandlerError::Payload(_)));
}
