//! Healthcheck command implementation.

use crate::batch::BatchReporter;
use crate::challenge::{Challenge, RemoteState};
use crate::error::{Error, Result};
use crate::process::Invocation;
use crate::selector::ChallengeSelector;

use super::{ProjectContext, describe};

/// Options for the healthcheck command
#[derive(Debug, Clone)]
pub struct HealthcheckOptions {
    /// Challenge to check; the current directory by default
    pub challenge: String,
}

impl Default for HealthcheckOptions {
    fn default() -> Self {
        Self {
            challenge: ".".to_string(),
        }
    }
}

/// Runs a challenge's healthcheck against its deployed service.
pub struct HealthcheckCommand<'a> {
    ctx: &'a ProjectContext,
    reporter: &'a dyn BatchReporter,
}

impl<'a> HealthcheckCommand<'a> {
    pub fn new(ctx: &'a ProjectContext, reporter: &'a dyn BatchReporter) -> Self {
        Self { ctx, reporter }
    }

    pub fn execute(&self, options: &HealthcheckOptions) -> Result<()> {
        tracing::debug!(?options, "healthcheck");
        let selector = ChallengeSelector::One(options.challenge.clone());
        let mut resolution = self.ctx.resolve(&selector)?;
        let challenge = resolution.challenges.pop().ok_or_else(|| Error::SelectorUnresolved {
            selector: options.challenge.clone(),
            reason: "no challenge found".to_string(),
        })?;
        self.reporter.info(&format!("Loaded {}", describe(self.ctx, &challenge)));

        let healthcheck = challenge
            .definition()
            .healthcheck
            .clone()
            .filter(|hc| !hc.is_empty())
            .ok_or_else(|| {
                Error::Project(format!(
                    "Challenge '{}' does not define a healthcheck",
                    challenge
                ))
            })?;

        let platform = self.ctx.platform()?;
        let listing = platform.list_challenges()?;
        let summary = match challenge.remote_state(&listing) {
            RemoteState::Present(summary) => summary,
            RemoteState::Absent => {
                return Err(Error::RemoteMissing {
                    name: challenge.name().to_string(),
                });
            }
        };
        let remote = platform.fetch_challenge(summary.id)?;
        let connection_info = remote
            .connection_info
            .filter(|info| !info.is_empty())
            .ok_or_else(|| {
                Error::Reconciliation(format!(
                    "Challenge '{}' does not provide connection info. Perhaps it needs to be deployed first?",
                    challenge
                ))
            })?;

        let invocation = Invocation::new(healthcheck_program(&challenge, &healthcheck), challenge.directory())
            .args(["--connection-info", connection_info.as_str()]);
        let output = self.ctx.runner().run(&invocation)?;
        if !output.success() {
            return Err(Error::Reconciliation(format!(
                "Healthcheck failed for '{}' (exit code {})",
                challenge, output.code
            )));
        }

        self.reporter
            .success("Success! Challenge passed the healthcheck.");
        Ok(())
    }
}

/// Healthcheck scripts named relative to the challenge run from there.
fn healthcheck_program(challenge: &Challenge, healthcheck: &str) -> String {
    let local = challenge.directory().join(healthcheck);
    if local.is_file() {
        local.to_string_lossy().into_owned()
    } else {
        healthcheck.to_string()
    }
}
