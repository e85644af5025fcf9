//! External `git subrepo` backend.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::error::{Error, Result};
use crate::process::{Invocation, ProcessRunner};

use super::transport::{PullStrategy, Transport, TransportKind};

/// Delegates to the git-subrepo helper, which tracks the upstream URL and
/// branch in the subdirectory's `.gitrepo` file.
#[derive(Debug, Clone)]
pub struct SubrepoTransport {
    runner: Arc<dyn ProcessRunner>,
    project_root: PathBuf,
}

impl SubrepoTransport {
    pub fn new(runner: Arc<dyn ProcessRunner>, project_root: PathBuf) -> Self {
        Self {
            runner,
            project_root,
        }
    }

    fn subrepo(&self, action: &str) -> Invocation {
        Invocation::git(&self.project_root).args(["subrepo", action])
    }

    fn run(&self, invocation: Invocation, prefix: &Path) -> Result<()> {
        let output = self.runner.run(&invocation)?;
        if !output.success() {
            return Err(Error::command_failed(prefix, invocation.display(), output.code));
        }
        Ok(())
    }
}

impl Transport for SubrepoTransport {
    fn kind(&self) -> TransportKind {
        TransportKind::Subrepo
    }

    fn project_root(&self) -> &Path {
        &self.project_root
    }

    fn add(&self, source_url: &str, prefix: &Path, branch: Option<&str>, force: bool) -> Result<()> {
        let mut invocation = self.subrepo("clone").arg(source_url).path_arg(prefix);
        if let Some(branch) = branch {
            invocation = invocation.args(["-b", branch]);
        }
        if force {
            invocation = invocation.arg("-f");
        }
        self.run(invocation, prefix)
    }

    fn push(&self, prefix: &Path, _upstream_url: &str) -> Result<()> {
        self.run(self.subrepo("push").path_arg(prefix), prefix)
    }

    fn pull(&self, prefix: &Path, _upstream_url: &str, strategy: &PullStrategy) -> Result<()> {
        let flag = match strategy {
            PullStrategy::FastForward => None,
            PullStrategy::Rebase => Some("--rebase"),
            PullStrategy::Merge => Some("--merge"),
            PullStrategy::Force => Some("--force"),
            PullStrategy::Squash | PullStrategy::Unrecognized(_) => {
                return Err(Error::InvalidPullStrategy {
                    strategy: strategy.to_string(),
                });
            }
        };

        let mut invocation = self.subrepo("pull").path_arg(prefix);
        if let Some(flag) = flag {
            invocation = invocation.arg(flag);
        }
        self.run(invocation, prefix)
    }

    fn restore(&self, prefix: &Path, upstream_url: &str) -> Result<()> {
        self.pull(prefix, upstream_url, &PullStrategy::Force)
    }
}
