//! Configuration schema for `.ctf/config.toml`.

use anyhow::Context;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::registry::Registry;

/// Root configuration structure.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProjectConfig {
    /// Project-wide settings
    #[serde(default)]
    pub config: ProjectSettings,

    /// Challenge registry
    #[serde(default)]
    pub challenges: Registry,

    /// Deployment handler commands keyed by host scheme (`ssh`, `registry`, ...)
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub deploy: IndexMap<String, String>,
}

/// The `[config]` table.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectSettings {
    /// Use the external git-subrepo helper instead of git subtree
    #[serde(default)]
    pub use_subrepo: bool,

    /// Base URL of the remote challenge platform
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,

    /// Pre-issued API token for the remote platform
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub access_token: Option<String>,
}

impl ProjectConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        if let Some(url) = &self.config.url {
            url::Url::parse(url).with_context(|| format!("Invalid platform url: '{}'", url))?;
        }

        self.challenges
            .validate()
            .context("Invalid [challenges] table")?;

        for (scheme, command) in &self.deploy {
            if scheme.trim().is_empty() || command.trim().is_empty() {
                anyhow::bail!("Invalid deploy handler entry: '{}' = '{}'", scheme, command);
            }
        }

        Ok(())
    }
}
