//! Working-tree operations on the project repository.

use std::path::{Path, PathBuf};

use crate::error::{Error, Result};
use crate::process::{Invocation, ProcessRunner};

/// Git operations scoped to the project working tree.
#[derive(Debug, Clone, Copy)]
pub struct WorkTree<'a> {
    runner: &'a dyn ProcessRunner,
    project_root: &'a Path,
}

impl<'a> WorkTree<'a> {
    pub fn new(runner: &'a dyn ProcessRunner, project_root: &'a Path) -> Self {
        Self {
            runner,
            project_root,
        }
    }

    fn dir(&self, prefix: &Path) -> PathBuf {
        self.project_root.join(prefix)
    }

    fn run_checked(&self, invocation: Invocation, prefix: &Path) -> Result<String> {
        let output = self.runner.run(&invocation)?;
        if !output.success() {
            return Err(Error::command_failed(prefix, invocation.display(), output.code));
        }
        Ok(output.stdout)
    }

    /// Whether the subdirectory has uncommitted modifications.
    pub fn has_changes(&self, prefix: &Path) -> Result<bool> {
        let stdout = self.run_checked(
            Invocation::git(self.dir(prefix))
                .args(["status", "--porcelain"])
                .captured(),
            prefix,
        )?;
        Ok(!stdout.trim().is_empty())
    }

    /// Stage everything below `prefix` and commit it.
    pub fn commit_all(&self, prefix: &Path, message: &str) -> Result<()> {
        let dir = self.dir(prefix);
        self.run_checked(Invocation::git(&dir).args(["add", "."]), prefix)?;
        self.run_checked(Invocation::git(&dir).args(["commit", "-m", message]), prefix)?;
        Ok(())
    }

    /// Stage specific project-relative paths and commit them from the root.
    pub fn commit_paths(&self, paths: &[&Path], message: &str) -> Result<()> {
        let root = Path::new("");
        let mut add = Invocation::git(self.project_root).arg("add");
        for path in paths {
            add = add.path_arg(path);
        }
        self.run_checked(add, root)?;
        self.run_checked(
            Invocation::git(self.project_root).args(["commit", "-m", message]),
            root,
        )?;
        Ok(())
    }

    /// Files left unmerged below `prefix`.
    pub fn conflicted_files(&self, prefix: &Path) -> Result<Vec<String>> {
        let stdout = self.run_checked(
            Invocation::git(self.dir(prefix))
                .args(["diff", "--name-only", "--diff-filter=U"])
                .captured(),
            prefix,
        )?;
        Ok(stdout
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .map(str::to_string)
            .collect())
    }

    /// Hand unmerged files to the user's configured merge tool.
    pub fn resolve_conflicts(&self, prefix: &Path) -> Result<()> {
        self.run_checked(Invocation::git(self.dir(prefix)).arg("mergetool"), prefix)?;
        Ok(())
    }

    /// Conclude a merge with the prepared message.
    ///
    /// Returns `false` when git had nothing to commit, which is not an error.
    pub fn commit_no_edit(&self, prefix: &Path) -> Result<bool> {
        let output = self
            .runner
            .run(&Invocation::git(self.dir(prefix)).args(["commit", "--no-edit"]))?;
        Ok(output.success())
    }

    /// Remove untracked leftovers (merge backups and the like).
    pub fn clean(&self, prefix: &Path) -> Result<()> {
        self.run_checked(Invocation::git(self.dir(prefix)).args(["clean", "-f"]), prefix)?;
        Ok(())
    }
}
