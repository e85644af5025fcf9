//! Error types for per-challenge operations.

use std::path::PathBuf;

use thiserror::Error;

/// Errors raised while operating on a single challenge.
///
/// Batch commands never propagate these out of the loop: every one is turned
/// into a failed entry of the [`crate::batch::BatchReport`].
#[derive(Debug, Error)]
pub enum Error {
    /// The selector does not point at a loadable challenge definition.
    #[error("could not resolve challenge '{selector}': {reason}")]
    SelectorUnresolved { selector: String, reason: String },

    /// The project is configured for git subrepo but the helper is missing.
    #[error("this project is configured to use git subrepo, but it's not installed")]
    BackendUnavailable,

    /// A git invocation exited non-zero.
    #[error("'{command}' failed for '{}' (exit code {code})", path.display())]
    TransportCommandFailed {
        path: PathBuf,
        command: String,
        code: i32,
    },

    /// The pull strategy is not understood by the active backend.
    #[error("cannot pull challenge - '{strategy}' is not a valid pull strategy")]
    InvalidPullStrategy { strategy: String },

    /// A transport operation was attempted on a filesystem-sourced challenge.
    #[error("'{key}' is not a git-based challenge")]
    NotGitSourced { key: String },

    /// The challenge is not present in the project registry.
    #[error("could not find added challenge '{}'; check that it is listed in .ctf/config.toml", path.display())]
    NotRegistered { path: PathBuf },

    /// Restore cannot act on this key without manual intervention.
    #[error("cannot restore '{key}': {reason}")]
    UnsupportedRestoreTarget { key: String, reason: String },

    /// Install found an existing remote challenge with the same identity.
    #[error("found already existing challenge with the same name ({name}); perhaps you meant sync instead of install?")]
    RemoteConflict { name: String },

    /// Sync (or a lookup) found no remote counterpart.
    #[error("could not find existing challenge '{name}'; perhaps you meant install instead of sync?")]
    RemoteMissing { name: String },

    /// Project configuration or command usage problem.
    #[error("{0}")]
    Project(String),

    /// Entity-level create/sync/verify/mirror/save failure.
    #[error("{0}")]
    Reconciliation(String),
}

impl Error {
    pub(crate) fn reconciliation(err: anyhow::Error) -> Self {
        Self::Reconciliation(format!("{err:#}"))
    }

    pub(crate) fn command_failed(path: impl Into<PathBuf>, command: impl Into<String>, code: i32) -> Self {
        Self::TransportCommandFailed {
            path: path.into(),
            command: command.into(),
            code,
        }
    }
}

impl From<anyhow::Error> for Error {
    fn from(err: anyhow::Error) -> Self {
        Self::reconciliation(err)
    }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
