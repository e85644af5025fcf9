//! Push command implementation.
//!
//! Commits pending modifications below each git-sourced challenge and
//! publishes them upstream, then pulls the challenge back unless disabled.

use crate::batch::{Batch, BatchReport, BatchReporter};
use crate::error::Result;
use crate::git::PullStrategy;
use crate::selector::ChallengeSelector;

use super::pull::pull_challenge;
use super::{ProjectContext, git_source, seed_report};

/// Options for the push command
#[derive(Debug, Clone, Default)]
pub struct PushOptions {
    pub selector: ChallengeSelector,
    /// Skip the pull that normally follows a successful push
    pub no_auto_pull: bool,
    pub quiet: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PushAction {
    Pushed,
    /// The working tree was clean; nothing was published.
    NothingToPush,
}

pub struct PushCommand<'a> {
    ctx: &'a ProjectContext,
    reporter: &'a dyn BatchReporter,
}

impl<'a> PushCommand<'a> {
    pub fn new(ctx: &'a ProjectContext, reporter: &'a dyn BatchReporter) -> Self {
        Self { ctx, reporter }
    }

    pub fn execute(&self, options: &PushOptions) -> Result<BatchReport<PushAction>> {
        tracing::debug!(?options, "push");
        let mut resolution = self.ctx.resolve(&options.selector)?;
        let transport = self.ctx.transport()?;
        let worktree = self.ctx.worktree();

        let batch = Batch::new("Pushing challenges", self.reporter).quiet(options.quiet);
        let mut report = seed_report(&batch, &mut resolution);
        let reporter = self.reporter;

        batch.run(
            &mut resolution.challenges,
            &mut report,
            |challenge| challenge.to_string(),
            |challenge| {
                let prefix = self.ctx.relative(challenge.directory());
                let url = git_source(self.ctx, challenge)?;
                reporter.info(&format!("Pushing '{}' to '{}'", prefix.display(), url));

                if !worktree.has_changes(&prefix)? {
                    reporter.success(&format!("No changes to be pushed for {}", prefix.display()));
                    return Ok(PushAction::NothingToPush);
                }

                worktree.commit_all(&prefix, &format!("Pushing changes to {}", prefix.display()))?;
                transport.push(&prefix, &url)?;

                if !options.no_auto_pull {
                    let pulled = pull_challenge(
                        self.ctx,
                        transport.as_ref(),
                        challenge,
                        &PullStrategy::FastForward,
                        None,
                    );
                    if let Err(err) = pulled {
                        tracing::warn!(challenge = %challenge, error = %err, "auto-pull after push failed");
                        reporter.warn(&format!("Could not pull '{}' after pushing: {}", prefix.display(), err));
                    }
                }
                Ok(PushAction::Pushed)
            },
        );

        batch.announce(&report, "Push", "pushed");
        Ok(report)
    }
}
