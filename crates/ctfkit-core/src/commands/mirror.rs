//! Mirror command implementation.
//!
//! Pulls remote state into local definitions. Remote challenges without a
//! local definition are reported, and with `create` cloned into the project
//! and registered before the local pass.

use std::collections::HashSet;

use crate::batch::{Batch, BatchReport, BatchReporter};
use crate::challenge::{Challenge, IgnoreSet, RemoteSummary};
use crate::error::Result;
use crate::selector::{self, ChallengeSelector};

use super::{ProjectContext, describe, seed_report};

/// Options for the mirror command
#[derive(Debug, Clone)]
pub struct MirrorOptions {
    pub selector: ChallengeSelector,
    /// Attachment directory inside each challenge directory
    pub files_directory: String,
    /// Mirror even challenges that verify as in sync
    pub skip_verify: bool,
    pub ignore: IgnoreSet,
    /// Materialize remote-only challenges locally
    pub create: bool,
    pub quiet: bool,
}

impl Default for MirrorOptions {
    fn default() -> Self {
        Self {
            selector: ChallengeSelector::All,
            files_directory: "dist".to_string(),
            skip_verify: false,
            ignore: IgnoreSet::new(),
            create: false,
            quiet: false,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MirrorAction {
    AlreadyInSync,
    Mirrored,
    /// Cloned from a remote-only challenge, then mirrored.
    Created,
}

#[derive(Debug)]
pub struct MirrorReport {
    pub report: BatchReport<MirrorAction>,
    /// Remote challenges that had no local definition
    pub remote_only: Vec<String>,
}

impl MirrorReport {
    pub fn exit_code(&self) -> i32 {
        self.report.exit_code()
    }
}

pub struct MirrorCommand<'a> {
    ctx: &'a mut ProjectContext,
    reporter: &'a dyn BatchReporter,
}

impl<'a> MirrorCommand<'a> {
    pub fn new(ctx: &'a mut ProjectContext, reporter: &'a dyn BatchReporter) -> Self {
        Self { ctx, reporter }
    }

    pub fn execute(&mut self, options: &MirrorOptions) -> Result<MirrorReport> {
        tracing::debug!(?options, "mirror");
        let platform = self.ctx.platform()?;
        let mut resolution = self.ctx.resolve(&options.selector)?;

        // Remote-only means absent from the whole registry, not just the selection.
        let listing = platform.list_challenges()?;
        let registered = selector::resolve_all(self.ctx.registry(), self.ctx.project_root());
        let local: HashSet<&str> = registered
            .challenges
            .iter()
            .chain(&resolution.challenges)
            .map(|c| c.name())
            .collect();
        let remote_only: Vec<RemoteSummary> = listing
            .into_iter()
            .filter(|summary| !local.contains(summary.name.as_str()))
            .collect();

        let batch = Batch::new("Mirroring challenges", self.reporter).quiet(options.quiet);
        let mut report = seed_report(&batch, &mut resolution);

        for summary in &remote_only {
            self.reporter.warn(&format!(
                "Found challenge '{}' on the remote, but not in .ctf/config.toml",
                summary.name
            ));
            if options.create {
                self.reporter.warn(&format!(
                    "Mirroring '{}' to local due to --create",
                    summary.name
                ));
                let outcome = self.create_local(summary, options);
                if let Err(err) = &outcome {
                    self.reporter.error(&err.to_string());
                }
                report.push(summary.name.clone(), outcome);
            }
        }

        let reporter = self.reporter;
        let ctx: &ProjectContext = &*self.ctx;
        batch.run(
            &mut resolution.challenges,
            &mut report,
            |challenge| challenge.to_string(),
            |challenge| {
                if !options.skip_verify {
                    match challenge.verify(platform.as_ref(), &options.ignore) {
                        Ok(true) => {
                            reporter.info(&format!(
                                "Challenge {} is already in sync. Skipping mirroring.",
                                describe(ctx, challenge)
                            ));
                            return Ok(MirrorAction::AlreadyInSync);
                        }
                        Ok(false) => {}
                        Err(err) => {
                            tracing::warn!(challenge = %challenge, error = %err, "verify failed, mirroring anyway");
                        }
                    }
                }
                challenge.mirror(platform.as_ref(), &options.files_directory, &options.ignore)?;
                Ok(MirrorAction::Mirrored)
            },
        );

        batch.announce(&report, "Mirror", "mirrored");
        Ok(MirrorReport {
            report,
            remote_only: remote_only.into_iter().map(|summary| summary.name).collect(),
        })
    }

    /// Clone a remote-only challenge, register it, and mirror it.
    fn create_local(&mut self, summary: &RemoteSummary, options: &MirrorOptions) -> Result<MirrorAction> {
        let platform = self.ctx.platform()?;
        let mut challenge = Challenge::clone_remote(self.ctx.project_root(), summary)?;
        if let Some(key) = challenge.key().cloned() {
            self.ctx.registry_mut().insert(key.as_str(), key.as_str());
            self.ctx.save_config()?;
            tracing::debug!(key = %key, "registered mirrored challenge");
        }
        challenge.mirror(platform.as_ref(), &options.files_directory, &options.ignore)?;
        Ok(MirrorAction::Created)
    }
}
