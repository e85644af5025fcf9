//! High-level commands for ctfkit operations.
//!
//! Every batch command resolves its selector through the [`ProjectContext`],
//! runs a [`crate::batch::Batch`] over the result, and returns the report;
//! the caller turns the report into an exit code.

pub mod add;
pub mod context;
pub mod deploy;
pub mod format;
pub mod healthcheck;
pub mod install;
pub mod mirror;
pub mod pull;
pub mod push;
pub mod restore;
pub mod sync;
pub mod verify;

pub use add::{AddCommand, AddOptions, AddReport};
pub use context::ProjectContext;
pub use deploy::{
    DeployAction, DeployCommand, DeployOptions, DeployReport, DeploymentHandler,
    DeploymentHandlers, DeploymentResult,
};
pub use format::{FormatCommand, FormatOptions};
pub use healthcheck::{HealthcheckCommand, HealthcheckOptions};
pub use install::{InstallAction, InstallCommand, InstallOptions};
pub use mirror::{MirrorAction, MirrorCommand, MirrorOptions, MirrorReport};
pub use pull::{PullCommand, PullOptions};
pub use push::{PushAction, PushCommand, PushOptions};
pub use restore::{RestoreCommand, RestoreOptions};
pub use sync::{SyncCommand, SyncOptions};
pub use verify::{VerifyCommand, VerifyOptions, VerifyOutcome, VerifyReport};

use crate::batch::{Batch, BatchReport};
use crate::challenge::Challenge;
use crate::error::{Error, Result};
use crate::registry::ChallengeKey;
use crate::selector::Resolution;

/// Start a report with the registry keys that failed to load.
pub(crate) fn seed_report<T>(batch: &Batch<'_>, resolution: &mut Resolution) -> BatchReport<T> {
    let mut report = BatchReport::new();
    for (key, err) in resolution.unresolved.drain(..) {
        batch.reporter().error(&err.to_string());
        report.push(key.to_string(), Err(err));
    }
    report
}

/// `Name (relative/definition.yml)` for status lines.
pub(crate) fn describe(ctx: &ProjectContext, challenge: &Challenge) -> String {
    format!(
        "'{}' ({})",
        challenge,
        ctx.relative(challenge.definition_path()).display()
    )
}

/// Upstream URL of a challenge.
///
/// The registry key the challenge was resolved from wins. A challenge
/// loaded by path is looked up by its definition file, then its directory.
pub(crate) fn git_source(ctx: &ProjectContext, challenge: &Challenge) -> Result<String> {
    let definition_key = ChallengeKey::from_path(&ctx.relative(challenge.definition_path()));
    let registered = challenge
        .key()
        .into_iter()
        .chain(std::iter::once(&definition_key))
        .find_map(|key| {
            ctx.registry()
                .get(key.as_str())
                .map(|locator| (key.clone(), locator))
        });
    let (key, locator) = match registered {
        Some(entry) => entry,
        None => {
            let challenge_dir = ctx.relative(challenge.directory());
            ctx.registry()
                .locate(&challenge_dir)
                .ok_or(Error::NotRegistered {
                    path: challenge_dir,
                })?
        }
    };
    locator
        .git_url()
        .map(str::to_string)
        .ok_or_else(|| Error::NotGitSourced {
            key: key.to_string(),
        })
}
