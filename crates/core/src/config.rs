// SPDX-License-Identifier: MIT

//! Tunables for the dispatch pipeline and branch builder.

use serde::Deserialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid config: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Committer identity the bot writes commits with.
///
/// Ref-conflict resolution compares an existing branch tip against this
/// identity to distinguish our own earlier run from a foreign branch.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct BotIdentity {
    pub name: String,
    pub email: String,
}

impl Default for BotIdentity {
    fn default() -> Self {
        Self { name: "updot[bot]".to_string(), email: "bot@updot.dev".to_string() }
    }
}

/// Workspace-wide configuration, loadable from TOML.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct UpdotConfig {
    /// Minimum spacing between mutating hosting-API calls, in milliseconds.
    pub write_spacing_ms: u64,
    pub bot: BotIdentity,
}

impl Default for UpdotConfig {
    fn default() -> Self {
        Self { write_spacing_ms: 1_000, bot: BotIdentity::default() }
    }
}

impl UpdotConfig {
    pub fn from_toml_str(raw: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(raw)?)
    }
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
