//! Verify command implementation.
//!
//! Read-only: compares every selected challenge with its remote counterpart.
//! An out-of-sync challenge is a result, not an error.

use std::collections::HashSet;

use crate::batch::{Batch, BatchReport, BatchReporter};
use crate::challenge::IgnoreSet;
use crate::error::Result;
use crate::selector::ChallengeSelector;

use super::{ProjectContext, seed_report};

/// Options for the verify command
#[derive(Debug, Clone, Default)]
pub struct VerifyOptions {
    pub selector: ChallengeSelector,
    pub ignore: IgnoreSet,
    pub quiet: bool,
}

/// Aggregate result of a verify pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VerifyOutcome {
    AllInSync,
    /// At least one challenge could not be verified at all.
    VerificationFailed,
    /// Number of challenges that differ from the remote.
    OutOfSync(usize),
}

impl VerifyOutcome {
    /// 0 all in sync, 2 several out of sync, 1 otherwise.
    ///
    /// A single out-of-sync challenge shares code 1 with a failed
    /// verification; callers that need to tell them apart use the outcome.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::AllInSync => 0,
            Self::VerificationFailed => 1,
            Self::OutOfSync(count) if *count > 1 => 2,
            Self::OutOfSync(_) => 1,
        }
    }
}

#[derive(Debug)]
pub struct VerifyReport {
    /// `true` for challenges in sync
    pub report: BatchReport<bool>,
    /// Remote challenges with no local definition (checked for multi-challenge runs)
    pub remote_only: Vec<String>,
}

impl VerifyReport {
    pub fn in_sync(&self) -> Vec<&str> {
        self.report
            .succeeded()
            .filter(|(_, in_sync)| **in_sync)
            .map(|(name, _)| name)
            .collect()
    }

    pub fn out_of_sync(&self) -> Vec<&str> {
        self.report
            .succeeded()
            .filter(|(_, in_sync)| !**in_sync)
            .map(|(name, _)| name)
            .collect()
    }

    pub fn outcome(&self) -> VerifyOutcome {
        if !self.report.is_success() {
            return VerifyOutcome::VerificationFailed;
        }
        match self.out_of_sync().len() {
            0 => VerifyOutcome::AllInSync,
            count => VerifyOutcome::OutOfSync(count),
        }
    }

    pub fn exit_code(&self) -> i32 {
        self.outcome().exit_code()
    }
}

pub struct VerifyCommand<'a> {
    ctx: &'a ProjectContext,
    reporter: &'a dyn BatchReporter,
}

impl<'a> VerifyCommand<'a> {
    pub fn new(ctx: &'a ProjectContext, reporter: &'a dyn BatchReporter) -> Self {
        Self { ctx, reporter }
    }

    pub fn execute(&self, options: &VerifyOptions) -> Result<VerifyReport> {
        tracing::debug!(?options, "verify");
        let platform = self.ctx.platform()?;
        let mut resolution = self.ctx.resolve(&options.selector)?;

        let mut remote_only = Vec::new();
        if resolution.challenges.len() > 1 {
            let local: HashSet<&str> = resolution.challenges.iter().map(|c| c.name()).collect();
            match platform.list_challenges() {
                Ok(listing) => {
                    for summary in listing.into_iter().filter(|s| !local.contains(s.name.as_str())) {
                        self.reporter.warn(&format!(
                            "Found challenge '{}' on the remote, but not in .ctf/config.toml. \
                             Please add the local challenge if you wish to manage it with ctfkit",
                            summary.name
                        ));
                        remote_only.push(summary.name);
                    }
                }
                Err(err) => tracing::warn!(error = %format!("{err:#}"), "could not list remote challenges"),
            }
        }

        let batch = Batch::new("Verifying challenges", self.reporter).quiet(options.quiet);
        let mut report = seed_report(&batch, &mut resolution);
        batch.run(
            &mut resolution.challenges,
            &mut report,
            |challenge| challenge.to_string(),
            |challenge| challenge.verify(platform.as_ref(), &options.ignore),
        );

        let verify = VerifyReport {
            report,
            remote_only,
        };
        if !options.quiet {
            self.announce(&verify, &batch);
        }
        Ok(verify)
    }

    fn announce(&self, verify: &VerifyReport, batch: &Batch<'_>) {
        if !verify.report.is_success() {
            batch.announce(&verify.report, "Verification", "verified");
            return;
        }

        self.reporter.success("Success! All challenges verified!");
        let in_sync = verify.in_sync();
        if !in_sync.is_empty() {
            self.reporter.success("Challenges in sync:");
            for name in in_sync {
                self.reporter.item(&format!(" - {}", name));
            }
        }
        let out_of_sync = verify.out_of_sync();
        if !out_of_sync.is_empty() {
            self.reporter.warn("Challenges out of sync:");
            for name in out_of_sync {
                self.reporter.item(&format!(" - {}", name));
            }
        }
    }
}
