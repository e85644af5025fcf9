//! Per-invocation project context.
//!
//! ProjectContext owns everything a command needs: the project root, the
//! loaded configuration (registry included), the process runner, and the
//! remote platform. Configuration is loaded once and written back explicitly.

use std::path::{Component, Path, PathBuf};
use std::sync::Arc;

use anyhow::Context;

use crate::challenge::{CtfdClient, RemotePlatform};
use crate::config::{ConfigStore, ProjectConfig, find_project_root};
use crate::error::{Error, Result};
use crate::git::{Transport, WorkTree, select_transport};
use crate::process::{ProcessRunner, SystemRunner};
use crate::registry::Registry;
use crate::selector::{self, ChallengeSelector, Resolution};

pub struct ProjectContext {
    store: ConfigStore,
    config: ProjectConfig,
    cwd: PathBuf,
    runner: Arc<dyn ProcessRunner>,
    platform: Option<Arc<dyn RemotePlatform>>,
}

impl ProjectContext {
    /// Open the project at `project_root` with an explicit runner.
    pub fn open(
        project_root: PathBuf,
        cwd: PathBuf,
        runner: Arc<dyn ProcessRunner>,
    ) -> anyhow::Result<Self> {
        let store = ConfigStore::new(project_root);
        let config = store.load()?;
        Ok(Self {
            store,
            config,
            cwd,
            runner,
            platform: None,
        })
    }

    /// Find the project above `cwd` (or at `project_root` when given) and
    /// connect to the configured platform, if any.
    pub fn discover(cwd: &Path, project_root: Option<&Path>) -> anyhow::Result<Self> {
        let root = match project_root {
            Some(root) => root.to_path_buf(),
            None => find_project_root(cwd).ok_or_else(|| {
                anyhow::anyhow!(
                    "No .ctf/config.toml found in {} or any parent directory",
                    cwd.display()
                )
            })?,
        };
        tracing::debug!(root = %root.display(), "using project");

        let mut context = Self::open(root, cwd.to_path_buf(), Arc::new(SystemRunner))?;
        let settings = &context.config.config;
        if let (Some(url), Some(token)) = (&settings.url, &settings.access_token) {
            let client = CtfdClient::new(url, token).context("Failed to set up platform client")?;
            context.platform = Some(Arc::new(client));
        }
        Ok(context)
    }

    pub fn with_platform(mut self, platform: Arc<dyn RemotePlatform>) -> Self {
        self.platform = Some(platform);
        self
    }

    pub fn project_root(&self) -> &Path {
        self.store.project_root()
    }

    pub fn cwd(&self) -> &Path {
        &self.cwd
    }

    pub fn config(&self) -> &ProjectConfig {
        &self.config
    }

    pub fn registry(&self) -> &Registry {
        &self.config.challenges
    }

    pub fn registry_mut(&mut self) -> &mut Registry {
        &mut self.config.challenges
    }

    pub fn runner(&self) -> &dyn ProcessRunner {
        self.runner.as_ref()
    }

    pub fn shared_runner(&self) -> Arc<dyn ProcessRunner> {
        self.runner.clone()
    }

    pub fn worktree(&self) -> WorkTree<'_> {
        WorkTree::new(self.runner.as_ref(), self.project_root())
    }

    /// The remote platform; commands that need it fail without one.
    pub fn platform(&self) -> Result<Arc<dyn RemotePlatform>> {
        self.platform.clone().ok_or_else(|| {
            Error::Project(
                "No remote platform configured; set url and access_token in the [config] table of .ctf/config.toml"
                    .to_string(),
            )
        })
    }

    /// The transport backend for this invocation.
    pub fn transport(&self) -> Result<Box<dyn Transport>> {
        select_transport(
            self.config.config.use_subrepo,
            self.runner.clone(),
            self.project_root().to_path_buf(),
        )
    }

    pub fn resolve(&self, selector: &ChallengeSelector) -> Result<Resolution> {
        selector::resolve(selector, self.registry(), self.project_root(), &self.cwd)
    }

    /// `path` relative to the project root when it lies below it, with `.`
    /// segments dropped.
    pub fn relative(&self, path: &Path) -> PathBuf {
        path.strip_prefix(self.project_root())
            .unwrap_or(path)
            .components()
            .filter(|c| !matches!(c, Component::CurDir))
            .collect()
    }

    /// Write the configuration back.
    pub fn save_config(&self) -> anyhow::Result<()> {
        self.store.save(&self.config)
    }
}
