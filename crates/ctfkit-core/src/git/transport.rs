//! Transport capability and backend selection.

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::Arc;

use crate::error::{Error, Result};
use crate::process::{Invocation, ProcessRunner};

use super::{SubrepoTransport, SubtreeTransport};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportKind {
    Subtree,
    Subrepo,
}

/// How upstream changes are integrated on pull.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum PullStrategy {
    #[default]
    FastForward,
    Rebase,
    Merge,
    /// Discard local history in favor of upstream (subrepo only).
    Force,
    /// Git's automatic squash-merge pull.
    Squash,
    /// Anything else the user typed; rejected by backends that care.
    Unrecognized(String),
}

impl FromStr for PullStrategy {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Ok(match s {
            "fast-forward" => Self::FastForward,
            "rebase" => Self::Rebase,
            "merge" => Self::Merge,
            "force" => Self::Force,
            "squash" => Self::Squash,
            other => Self::Unrecognized(other.to_string()),
        })
    }
}

impl fmt::Display for PullStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::FastForward => f.write_str("fast-forward"),
            Self::Rebase => f.write_str("rebase"),
            Self::Merge => f.write_str("merge"),
            Self::Force => f.write_str("force"),
            Self::Squash => f.write_str("squash"),
            Self::Unrecognized(other) => f.write_str(other),
        }
    }
}

/// Moves a project subdirectory to and from an upstream repository.
///
/// Paths are relative to the project root; every command runs from there.
pub trait Transport: fmt::Debug {
    fn kind(&self) -> TransportKind;

    fn project_root(&self) -> &Path;

    /// Import an upstream repository into `prefix`.
    fn add(&self, source_url: &str, prefix: &Path, branch: Option<&str>, force: bool)
    -> Result<()>;

    /// Publish the committed history of `prefix` upstream.
    fn push(&self, prefix: &Path, upstream_url: &str) -> Result<()>;

    /// Integrate upstream changes into `prefix`.
    fn pull(&self, prefix: &Path, upstream_url: &str, strategy: &PullStrategy) -> Result<()>;

    /// Re-establish the link for a challenge missing from the working tree.
    fn restore(&self, prefix: &Path, upstream_url: &str) -> Result<()>;
}

/// Probe for the external git-subrepo helper.
pub fn subrepo_available(runner: &dyn ProcessRunner, cwd: &Path) -> bool {
    runner
        .run(&Invocation::git(cwd).args(["subrepo", "--version"]).captured())
        .map(|output| output.success())
        .unwrap_or(false)
}

/// Pick the backend for this invocation.
///
/// Fails with [`Error::BackendUnavailable`] before anything is touched when
/// subrepo is configured but not installed.
pub fn select_transport(
    use_subrepo: bool,
    runner: Arc<dyn ProcessRunner>,
    project_root: PathBuf,
) -> Result<Box<dyn Transport>> {
    if use_subrepo {
        if !subrepo_available(runner.as_ref(), &project_root) {
            return Err(Error::BackendUnavailable);
        }
        return Ok(Box::new(SubrepoTransport::new(runner, project_root)));
    }
    Ok(Box::new(SubtreeTransport::new(runner, project_root)))
}
