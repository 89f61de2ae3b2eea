// SPDX-License-Identifier: MIT

//! `create-version-branch`: branch updating one dependency.

use super::{HandlerContext, HandlerError, JobHandler};
use async_trait::async_trait;
use serde::Deserialize;
use std::sync::Arc;
use updot_core::{Job, JobName};
use updot_hosting::{build_branch, BranchOutcome, BranchSpec, LockfileTransform, Transform};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct VersionBranchPayload {
    account_id: u64,
    #[serde(default)]
    repository_full_name: Option<String>,
    #[serde(default = "default_base")]
    base: String,
    dependency: String,
    version: String,
    /// Manifest files to update, in order.
    #[serde(default = "default_manifests")]
    manifests: Vec<String>,
    /// Lockfile to regenerate after the manifests, if the repo has one.
    #[serde(default)]
    lockfile: Option<String>,
}

fn default_base() -> String {
    "main".to_string()
}

fn default_manifests() -> Vec<String> {
    vec!["package.json".to_string()]
}

pub struct VersionBranchHandler;

#[async_trait]
impl JobHandler for VersionBranchHandler {
    async fn execute(&self, ctx: &HandlerContext, job: &Job) -> Result<Vec<Job>, HandlerError> {
        let payload: VersionBranchPayload = serde_json::from_value(job.payload.clone())?;
        let branch = format!("updot/{}-{}", payload.dependency, payload.version);

        let mut transforms: Vec<Transform> = payload
            .manifests
            .iter()
            .map(|path| {
                let dependency = payload.dependency.clone();
                let version = payload.version.clone();
                Transform::new(
                    path.as_str(),
                    format!("chore(deps): update {} to {}", dependency, version),
                    move |old: &str| update_dependency(old, &dependency, &version),
                )
            })
            .collect();

        if let Some(lockfile) = &payload.lockfile {
            transforms.push(
                LockfileTransform::new(Arc::clone(&ctx.lockfiles), payload.manifests.clone())
                    .into_transform(
                        lockfile.as_str(),
                        format!("chore(deps): regenerate {lockfile}"),
                    ),
            );
        }

        let outcome = build_branch(
            ctx.host.as_ref(),
            &ctx.gate,
            &ctx.config.bot,
            ctx.events.as_ref(),
            BranchSpec { base: payload.base.clone(), name: branch.clone(), transforms },
        )
        .await?;

        // A follow-up PR job only when a branch actually appeared in this
        // run. AlreadyExists means an earlier delivery already produced the
        // follow-up; Unchanged means there is nothing to open a PR for.
        match outcome {
            BranchOutcome::Created { sha, .. } => {
                tracing::info!(
                    account = payload.account_id,
                    dependency = %payload.dependency,
                    version = %payload.version,
                    branch = %branch,
                    "version branch created"
                );
                Ok(vec![Job::new(
                    JobName::CreateVersionPr,
                    serde_json::json!({
                        "accountId": payload.account_id,
                        "repositoryFullName": payload.repository_full_name,
                        "branch": branch,
                        "sha": sha.as_str(),
                        "dependency": payload.dependency,
                        "version": payload.version,
                    }),
                )])
            }
            BranchOutcome::AlreadyExists { .. } | BranchOutcome::Unchanged => Ok(vec![]),
        }
    }
}

/// Set `dependency` to `version` in every dependency section that lists
/// it. Returns `None` when no section lists the dependency or every
/// listing already pins the target version.
fn update_dependency(manifest: &str, dependency: &str, version: &str) -> Option<String> {
    let mut doc: serde_json::Value = serde_json::from_str(manifest).ok()?;
    let mut touched = false;
    for section in ["dependencies", "devDependencies", "optionalDependencies"] {
        if let Some(deps) = doc.get_mut(section).and_then(serde_json::Value::as_object_mut) {
            if let Some(entry) = deps.get_mut(dependency) {
                if entry.as_str() != Some(version) {
                    *entry = serde_json::Value::String(version.to_string());
                    touched = true;
                }
            }
        }
    }
    if !touched {
        return None;
    }
    serde_json::to_string_pretty(&doc).ok().map(|body| body + "\n")
}

#[cfg(test)]
#[path = "version_branch_tests.rs"]
mod tests;
