// SPDX-License-Identifier: MIT

//! Routing-key resolution.
//!
//! A key is resolved from, in order: the dedicated global key for
//! globally-ordered job kinds, an explicit numeric account id probed
//! across the known payload shapes, and finally a login lookup against the
//! account store. A payload that resolves to none of these is a poison
//! message.

use crate::accounts::AccountStore;
use crate::error::DispatchError;
use updot_core::{Job, RoutingKey};

/// Payload shapes that carry a numeric account/installation id.
const ID_PATHS: &[&[&str]] = &[
    &["accountId"],
    &["installation", "account", "id"],
    &["repository", "owner", "id"],
    &["organization", "id"],
    &["sender", "id"],
];

/// Payload shapes that carry a login usable for the secondary lookup.
const LOGIN_PATHS: &[&[&str]] = &[
    &["accountLogin"],
    &["installation", "account", "login"],
    &["repository", "owner", "login"],
    &["organization", "login"],
    &["sender", "login"],
];

pub async fn resolve_routing_key(
    job: &Job,
    accounts: &dyn AccountStore,
) -> Result<RoutingKey, DispatchError> {
    if let Some(global) = job.name.global_key() {
        return Ok(RoutingKey::Global(global));
    }
    if let Some(id) = probe_account_id(&job.payload) {
        return Ok(RoutingKey::account(id));
    }
    if let Some(login) = probe_login(&job.payload) {
        if let Some(id) = accounts.get_account_id_by_login(login).await? {
            return Ok(RoutingKey::account(id));
        }
    }
    Err(DispatchError::NoRoutingKey { job: job.id.clone(), name: job.name.clone() })
}

pub(crate) fn probe_account_id(payload: &serde_json::Value) -> Option<u64> {
    ID_PATHS.iter().find_map(|path| walk(payload, path).and_then(serde_json::Value::as_u64))
}

fn probe_login(payload: &serde_json::Value) -> Option<&str> {
    LOGIN_PATHS.iter().find_map(|path| walk(payload, path).and_then(serde_json::Value::as_str))
}

fn walk<'a>(value: &'a serde_json::Value, path: &[&str]) -> Option<&'a serde_json::Value> {
    path.iter().try_fold(value, |cursor, field| cursor.get(field))
}

#[cfg(test)]
#[path = "routing_tests.rs"]
mod tests;
