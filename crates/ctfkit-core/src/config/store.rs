//! Config store for loading and saving `.ctf/config.toml`.

use std::path::{Path, PathBuf};

use anyhow::Context;

use super::{ProjectConfig, parser, paths::config_path};
use crate::fs::atomic_write;

#[derive(Debug, Clone)]
pub struct ConfigStore {
    config_path: PathBuf,
    project_root: PathBuf,
}

impl ConfigStore {
    pub fn new(project_root: PathBuf) -> Self {
        Self {
            config_path: config_path(&project_root),
            project_root,
        }
    }

    pub fn config_path(&self) -> &Path {
        &self.config_path
    }

    pub fn project_root(&self) -> &Path {
        &self.project_root
    }

    pub fn load(&self) -> anyhow::Result<ProjectConfig> {
        if !self.config_path.exists() {
            anyhow::bail!(
                "No project configuration found at {}",
                self.config_path.display()
            );
        }
        parser::parse_project_toml(&self.config_path)
    }

    /// Rewrite the whole file through a temporary sibling renamed into place.
    pub fn save(&self, config: &ProjectConfig) -> anyhow::Result<()> {
        let content = parser::to_toml(config).context("Failed to serialize config to TOML")?;
        atomic_write(&self.config_path, content.as_bytes()).with_context(|| {
            format!(
                "Failed to write config file: {}",
                self.config_path.display()
            )
        })
    }
}
