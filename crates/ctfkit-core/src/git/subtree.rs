//! Built-in `git subtree` backend.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::error::{Error, Result};
use crate::process::{Invocation, ProcessRunner};

use super::transport::{PullStrategy, Transport, TransportKind};
use super::{WorkTree, default_branch};

/// Squash-imports upstream history with `git subtree`.
///
/// The upstream default branch is resolved from the remote before every
/// operation; callers never choose a branch.
#[derive(Debug, Clone)]
pub struct SubtreeTransport {
    runner: Arc<dyn ProcessRunner>,
    project_root: PathBuf,
}

impl SubtreeTransport {
    pub fn new(runner: Arc<dyn ProcessRunner>, project_root: PathBuf) -> Self {
        Self {
            runner,
            project_root,
        }
    }

    fn subtree(&self, action: &str, prefix: &Path, url: &str, branch: &str) -> Invocation {
        Invocation::git(&self.project_root)
            .args(["subtree", action, "--prefix"])
            .path_arg(prefix)
            .args([url, branch])
    }

    fn run(&self, invocation: Invocation, prefix: &Path) -> Result<()> {
        let output = self.runner.run(&invocation)?;
        if !output.success() {
            return Err(Error::command_failed(prefix, invocation.display(), output.code));
        }
        Ok(())
    }

    fn worktree(&self) -> WorkTree<'_> {
        WorkTree::new(self.runner.as_ref(), &self.project_root)
    }
}

impl Transport for SubtreeTransport {
    fn kind(&self) -> TransportKind {
        TransportKind::Subtree
    }

    fn project_root(&self) -> &Path {
        &self.project_root
    }

    fn add(
        &self,
        source_url: &str,
        prefix: &Path,
        branch: Option<&str>,
        _force: bool,
    ) -> Result<()> {
        if let Some(branch) = branch {
            tracing::debug!(branch, "subtree backend ignores the requested branch");
        }
        let head = default_branch(self.runner.as_ref(), &self.project_root, source_url)?;
        self.run(
            self.subtree("add", prefix, source_url, &head).arg("--squash"),
            prefix,
        )
    }

    fn push(&self, prefix: &Path, upstream_url: &str) -> Result<()> {
        let head = default_branch(self.runner.as_ref(), &self.project_root, upstream_url)?;
        self.run(self.subtree("push", prefix, upstream_url, &head), prefix)
    }

    fn pull(&self, prefix: &Path, upstream_url: &str, strategy: &PullStrategy) -> Result<()> {
        if !matches!(strategy, PullStrategy::FastForward | PullStrategy::Squash) {
            tracing::warn!(%strategy, "subtree backend always squash-merges; strategy ignored");
        }

        let head = default_branch(self.runner.as_ref(), &self.project_root, upstream_url)?;
        self.run(
            self.subtree("pull", prefix, upstream_url, &head)
                .arg("--squash")
                .env("GIT_MERGE_AUTOEDIT", "no"),
            prefix,
        )?;

        let worktree = self.worktree();
        let conflicts = worktree.conflicted_files(prefix)?;
        if !conflicts.is_empty() {
            tracing::debug!(?conflicts, "pull left merge conflicts");
            worktree.resolve_conflicts(prefix)?;
        }
        if !worktree.commit_no_edit(prefix)? {
            tracing::debug!(prefix = %prefix.display(), "nothing to commit after pull");
        }
        worktree.clean(prefix)
    }

    fn restore(&self, prefix: &Path, upstream_url: &str) -> Result<()> {
        if self.project_root.join(prefix).exists() {
            return Err(Error::UnsupportedRestoreTarget {
                key: prefix.to_string_lossy().into_owned(),
                reason: "the target directory exists; remove it and retry restore".to_string(),
            });
        }
        self.add(upstream_url, prefix, None, false)
    }
}
