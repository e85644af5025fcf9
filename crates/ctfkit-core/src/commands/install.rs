//! Install command implementation.
//!
//! Creates challenges that are absent on the remote. A challenge that is
//! already installed is a conflict unless `force` turns the install into a
//! sync.

use crate::batch::{Batch, BatchReport, BatchReporter};
use crate::challenge::{IgnoreSet, RemoteState};
use crate::error::{Error, Result};
use crate::selector::ChallengeSelector;

use super::{ProjectContext, describe, seed_report};

/// Options for the install command
#[derive(Debug, Clone, Default)]
pub struct InstallOptions {
    pub selector: ChallengeSelector,
    /// Sync challenges that already exist instead of failing
    pub force: bool,
    /// Install with state `hidden`
    pub hidden: bool,
    pub ignore: IgnoreSet,
    pub quiet: bool,
}

/// What happened to an installed challenge.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InstallAction {
    Created(u64),
    Synced,
}

pub struct InstallCommand<'a> {
    ctx: &'a ProjectContext,
    reporter: &'a dyn BatchReporter,
}

impl<'a> InstallCommand<'a> {
    pub fn new(ctx: &'a ProjectContext, reporter: &'a dyn BatchReporter) -> Self {
        Self { ctx, reporter }
    }

    pub fn execute(&self, options: &InstallOptions) -> Result<BatchReport<InstallAction>> {
        tracing::debug!(?options, "install");
        let platform = self.ctx.platform()?;
        let mut resolution = self.ctx.resolve(&options.selector)?;

        let batch = Batch::new("Installing challenges", self.reporter).quiet(options.quiet);
        let mut report = seed_report(&batch, &mut resolution);
        let reporter = self.reporter;

        batch.run(
            &mut resolution.challenges,
            &mut report,
            |challenge| challenge.to_string(),
            |challenge| {
                if options.hidden {
                    challenge.definition_mut().state = Some("hidden".to_string());
                }
                reporter.info(&format!("Installing {} ...", describe(self.ctx, challenge)));

                let listing = platform.list_challenges()?;
                match challenge.remote_state(&listing) {
                    RemoteState::Present(_) if !options.force => Err(Error::RemoteConflict {
                        name: challenge.name().to_string(),
                    }),
                    RemoteState::Present(_) => {
                        reporter.warn("Syncing existing challenge instead (because of --force)");
                        challenge.sync(platform.as_ref(), &options.ignore)?;
                        Ok(InstallAction::Synced)
                    }
                    RemoteState::Absent => {
                        let id = challenge.create(platform.as_ref(), &options.ignore)?;
                        Ok(InstallAction::Created(id))
                    }
                }
            },
        );

        batch.announce(&report, "Install", "installed");
        Ok(report)
    }
}
