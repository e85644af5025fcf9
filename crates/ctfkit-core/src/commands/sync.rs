//! Sync command implementation.

use crate::batch::{Batch, BatchReport, BatchReporter};
use crate::challenge::{IgnoreSet, RemoteState};
use crate::error::{Error, Result};
use crate::selector::ChallengeSelector;

use super::{ProjectContext, describe, seed_report};

/// Options for the sync command
#[derive(Debug, Clone, Default)]
pub struct SyncOptions {
    pub selector: ChallengeSelector,
    /// Fields left untouched on the remote
    pub ignore: IgnoreSet,
    pub quiet: bool,
}

/// Pushes local definitions over their installed counterparts.
pub struct SyncCommand<'a> {
    ctx: &'a ProjectContext,
    reporter: &'a dyn BatchReporter,
}

impl<'a> SyncCommand<'a> {
    pub fn new(ctx: &'a ProjectContext, reporter: &'a dyn BatchReporter) -> Self {
        Self { ctx, reporter }
    }

    pub fn execute(&self, options: &SyncOptions) -> Result<BatchReport<()>> {
        tracing::debug!(?options, "sync");
        let platform = self.ctx.platform()?;
        let mut resolution = self.ctx.resolve(&options.selector)?;

        let batch = Batch::new("Syncing challenges", self.reporter).quiet(options.quiet);
        let mut report = seed_report(&batch, &mut resolution);
        let reporter = self.reporter;

        batch.run(
            &mut resolution.challenges,
            &mut report,
            |challenge| challenge.to_string(),
            |challenge| {
                let listing = platform.list_challenges()?;
                if challenge.remote_state(&listing) == RemoteState::Absent {
                    return Err(Error::RemoteMissing {
                        name: challenge.name().to_string(),
                    });
                }

                reporter.info(&format!("Syncing {} ...", describe(self.ctx, challenge)));
                challenge.sync(platform.as_ref(), &options.ignore)
            },
        );

        batch.announce(&report, "Sync", "synced");
        Ok(report)
    }
}
