//! Format command implementation.
//!
//! Rewrites each selected definition in canonical form without changing its
//! content.

use crate::batch::{Batch, BatchReport, BatchReporter};
use crate::error::Result;
use crate::selector::ChallengeSelector;

use super::{ProjectContext, seed_report};

/// Options for the format command
#[derive(Debug, Clone, Default)]
pub struct FormatOptions {
    pub selector: ChallengeSelector,
    pub quiet: bool,
}

pub struct FormatCommand<'a> {
    ctx: &'a ProjectContext,
    reporter: &'a dyn BatchReporter,
}

impl<'a> FormatCommand<'a> {
    pub fn new(ctx: &'a ProjectContext, reporter: &'a dyn BatchReporter) -> Self {
        Self { ctx, reporter }
    }

    pub fn execute(&self, options: &FormatOptions) -> Result<BatchReport<()>> {
        tracing::debug!(?options, "format");
        let mut resolution = self.ctx.resolve(&options.selector)?;

        let batch = Batch::new("Formatting challenges", self.reporter).quiet(options.quiet);
        let mut report = seed_report(&batch, &mut resolution);
        batch.run(
            &mut resolution.challenges,
            &mut report,
            |challenge| challenge.to_string(),
            |challenge| challenge.save(),
        );

        batch.announce(&report, "Format", "formatted");
        Ok(report)
    }
}
