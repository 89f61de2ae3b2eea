// SPDX-License-Identifier: MIT

//! `create-initial-branch`: onboarding branch adding the status badge.

use super::{HandlerContext, HandlerError, JobHandler};
use async_trait::async_trait;
use serde::Deserialize;
use updot_core::{Job, JobName};
use updot_hosting::{build_branch, BranchSpec, Transform};

const INITIAL_BRANCH: &str = "updot/initial";

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct InitialBranchPayload {
    account_id: u64,
    repository_full_name: String,
    #[serde(default = "default_base")]
    base: String,
    /// Monorepo groups to onboard separately once the badge branch exists.
    #[serde(default)]
    groups: Vec<String>,
}

fn default_base() -> String {
    "main".to_string()
}

pub struct InitialBranchHandler;

#[async_trait]
impl JobHandler for InitialBranchHandler {
    async fn execute(&self, ctx: &HandlerContext, job: &Job) -> Result<Vec<Job>, HandlerError> {
        let payload: InitialBranchPayload = serde_json::from_value(job.payload.clone())?;
        let badge = badge_line(&payload.repository_full_name);

        let transforms = vec![Transform::readme("docs(readme): add updot badge", {
            let badge = badge.clone();
            move |old: &str| {
                if old.contains(&badge) {
                    return None;
                }
                Some(format!("{badge}\n\n{old}"))
            }
        })];

        let outcome = build_branch(
            ctx.host.as_ref(),
            &ctx.gate,
            &ctx.config.bot,
            ctx.events.as_ref(),
            BranchSpec {
                base: payload.base.clone(),
                name: INITIAL_BRANCH.to_string(),
                transforms,
            },
        )
        .await?;

        if !outcome.is_created() {
            return Ok(vec![]);
        }
        tracing::info!(
            account = payload.account_id,
            repository = %payload.repository_full_name,
            "initial branch created"
        );

        // Subgroup onboarding fans out only once the badge branch exists.
        Ok(payload
            .groups
            .iter()
            .map(|group| {
                Job::new(
                    JobName::InitialSubgroup,
                    serde_json::json!({
                        "accountId": payload.account_id,
                        "repositoryFullName": payload.repository_full_name,
                        "base": payload.base,
                        "group": group,
                    }),
                )
            })
            .collect())
    }
}

fn badge_line(repository_full_name: &str) -> String {
    format!(
        "[![updot badge](https://badges.updot.dev/{repository_full_name}.svg)](https://updot.dev/)"
    )
}

#[cfg(test)]
#[path = "initial_branch_tests.rs"]
mod tests;
