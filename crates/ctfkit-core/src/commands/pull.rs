//! Pull command implementation.

use crate::batch::{Batch, BatchReport, BatchReporter};
use crate::challenge::Challenge;
use crate::error::Result;
use crate::git::{PullStrategy, Transport};
use crate::selector::ChallengeSelector;

use super::{ProjectContext, git_source, seed_report};

/// Options for the pull command
#[derive(Debug, Clone, Default)]
pub struct PullOptions {
    pub selector: ChallengeSelector,
    pub strategy: PullStrategy,
    pub quiet: bool,
}

/// Integrates upstream changes into git-sourced challenges.
pub struct PullCommand<'a> {
    ctx: &'a ProjectContext,
    reporter: &'a dyn BatchReporter,
}

impl<'a> PullCommand<'a> {
    pub fn new(ctx: &'a ProjectContext, reporter: &'a dyn BatchReporter) -> Self {
        Self { ctx, reporter }
    }

    pub fn execute(&self, options: &PullOptions) -> Result<BatchReport<()>> {
        tracing::debug!(?options, "pull");
        let mut resolution = self.ctx.resolve(&options.selector)?;
        let transport = self.ctx.transport()?;

        let batch = Batch::new("Pulling challenges", self.reporter).quiet(options.quiet);
        let mut report = seed_report(&batch, &mut resolution);
        let reporter = self.reporter;

        batch.run(
            &mut resolution.challenges,
            &mut report,
            |challenge| challenge.to_string(),
            |challenge| {
                pull_challenge(
                    self.ctx,
                    transport.as_ref(),
                    challenge,
                    &options.strategy,
                    (!options.quiet).then_some(reporter),
                )
            },
        );

        batch.announce(&report, "Pull", "pulled");
        Ok(report)
    }
}

/// Pull one challenge through `transport`.
pub(crate) fn pull_challenge(
    ctx: &ProjectContext,
    transport: &dyn Transport,
    challenge: &Challenge,
    strategy: &PullStrategy,
    reporter: Option<&dyn BatchReporter>,
) -> Result<()> {
    let prefix = ctx.relative(challenge.directory());
    let url = git_source(ctx, challenge)?;
    if let Some(reporter) = reporter {
        reporter.info(&format!("Pulling latest '{}' to '{}'", url, prefix.display()));
    }
    transport.pull(&prefix, &url, strategy)
}
