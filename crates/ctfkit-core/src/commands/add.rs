//! Add command implementation.
//!
//! Registers a challenge with the project. A `.git` URL is imported through
//! the active transport and the registry change is committed; an existing
//! directory is registered as a local challenge.

use std::path::{Path, PathBuf};

use crate::config::paths::config_path;
use crate::error::{Error, Result};
use crate::registry::{ChallengeKey, SourceLocator};

use super::ProjectContext;

/// Options for the add command
#[derive(Debug, Clone, Default)]
pub struct AddOptions {
    /// A `.git` URL or a challenge directory
    pub repo: String,
    /// Subdirectory (below the working directory) to import into
    pub directory: Option<String>,
    /// Upstream branch (subrepo only)
    pub branch: Option<String>,
    /// Overwrite an existing import (subrepo only)
    pub force: bool,
    /// Definition file inside the challenge, when not `challenge.yml`
    pub yaml_path: Option<String>,
}

/// The registry entry created by an add.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AddReport {
    pub key: ChallengeKey,
    pub locator: SourceLocator,
}

pub struct AddCommand<'a> {
    ctx: &'a mut ProjectContext,
}

impl<'a> AddCommand<'a> {
    pub fn new(ctx: &'a mut ProjectContext) -> Self {
        Self { ctx }
    }

    pub fn execute(&mut self, options: &AddOptions) -> Result<AddReport> {
        tracing::debug!(?options, "add");
        let locator = SourceLocator::parse(&options.repo);
        if let Some(name) = locator.repository_name() {
            let name = name.to_string();
            return self.add_repository(options, &name);
        }

        let directory = self.ctx.cwd().join(&options.repo);
        if directory.is_dir() {
            return self.add_directory(options, &directory);
        }

        Err(Error::Project(format!(
            "Could not process the challenge path: '{}'",
            options.repo
        )))
    }

    fn add_repository(&mut self, options: &AddOptions, repository_name: &str) -> Result<AddReport> {
        let transport = self.ctx.transport()?;

        let cwd = self.ctx.cwd().strip_prefix(self.ctx.project_root()).map_err(|_| {
            Error::Project(format!(
                "Working directory {} is outside the project",
                self.ctx.cwd().display()
            ))
        })?;
        let mut challenge_path = cwd.to_path_buf();
        if let Some(directory) = &options.directory {
            challenge_path.push(directory);
        }
        challenge_path.push(repository_name);
        let challenge_path = self.ctx.relative(&challenge_path);

        let key = challenge_key(&challenge_path, options.yaml_path.as_deref());
        if self.ctx.registry().contains(key.as_str()) {
            return Err(Error::Project(format!(
                "Challenge '{}' is already added",
                key
            )));
        }

        transport.add(
            &options.repo,
            &challenge_path,
            options.branch.as_deref(),
            options.force,
        )?;

        self.ctx.registry_mut().insert(key.as_str(), options.repo.as_str());
        self.ctx.save_config()?;

        let config = config_path(Path::new(""));
        self.ctx.worktree().commit_paths(
            &[config.as_path()],
            &format!("Added {}", challenge_path.display()),
        )?;

        Ok(AddReport {
            key,
            locator: SourceLocator::parse(&options.repo),
        })
    }

    fn add_directory(&mut self, options: &AddOptions, directory: &Path) -> Result<AddReport> {
        let relative = directory
            .canonicalize()
            .ok()
            .and_then(|dir| {
                let root = self.ctx.project_root().canonicalize().ok()?;
                dir.strip_prefix(&root).ok().map(PathBuf::from)
            })
            .unwrap_or_else(|| self.ctx.relative(directory));

        let key = challenge_key(&relative, options.yaml_path.as_deref());
        let locator = ChallengeKey::from_path(&relative).to_string();
        if self.ctx.registry().contains(key.as_str()) {
            return Err(Error::Project(format!(
                "Challenge '{}' is already added",
                key
            )));
        }

        self.ctx.registry_mut().insert(key.as_str(), locator.as_str());
        self.ctx.save_config()?;

        Ok(AddReport {
            key,
            locator: SourceLocator::parse(&locator),
        })
    }
}

fn challenge_key(challenge_path: &Path, yaml_path: Option<&str>) -> ChallengeKey {
    let key = ChallengeKey::from_path(challenge_path);
    match yaml_path {
        Some(file) => key.join(file),
        None => key,
    }
}
