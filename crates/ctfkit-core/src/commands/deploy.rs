//! Deploy command implementation.
//!
//! Provisions challenge services through a [`DeploymentHandler`] picked by
//! the scheme of the target host, records the resulting connection info, and
//! then installs or syncs the challenge on the remote.

use std::fmt;

use indexmap::IndexMap;

use crate::batch::{Batch, BatchReport, BatchReporter};
use crate::challenge::{Challenge, IgnoreSet, RemoteState};
use crate::error::{Error, Result};
use crate::selector::ChallengeSelector;

use super::{ProjectContext, describe, seed_report};

/// Scheme used when a challenge names no host.
pub const DEFAULT_DEPLOY_SCHEME: &str = "cloud";

/// Outcome of provisioning one challenge service.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeploymentResult {
    pub success: bool,
    pub connection_info: Option<String>,
}

/// Provisions the infrastructure for a challenge.
pub trait DeploymentHandler: fmt::Debug {
    /// Deploy `challenge` to `host` (`None` for the default target).
    ///
    /// `Err` means the handler could not run at all; an unsuccessful
    /// deployment is reported through [`DeploymentResult::success`].
    fn deploy(&self, challenge: &Challenge, host: Option<&str>) -> anyhow::Result<DeploymentResult>;
}

/// Handlers keyed by host scheme.
#[derive(Debug, Default)]
pub struct DeploymentHandlers {
    handlers: IndexMap<String, Box<dyn DeploymentHandler>>,
}

impl DeploymentHandlers {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, scheme: impl Into<String>, handler: Box<dyn DeploymentHandler>) {
        self.handlers.insert(scheme.into(), handler);
    }

    pub fn get(&self, scheme: &str) -> Option<&dyn DeploymentHandler> {
        self.handlers.get(scheme).map(Box::as_ref)
    }

    pub fn schemes(&self) -> impl Iterator<Item = &str> {
        self.handlers.keys().map(String::as_str)
    }
}

/// Options for the deploy command
#[derive(Debug, Clone, Default)]
pub struct DeployOptions {
    pub selector: ChallengeSelector,
    /// Overrides each challenge's own `host`
    pub host: Option<String>,
    pub quiet: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeployAction {
    Created(u64),
    Synced,
}

/// Deployments and the install/sync that follows each successful one.
#[derive(Debug)]
pub struct DeployReport {
    /// Connection info per deployed challenge
    pub deployments: BatchReport<Option<String>>,
    pub installs: BatchReport<DeployAction>,
}

impl DeployReport {
    pub fn is_success(&self) -> bool {
        self.deployments.is_success() && self.installs.is_success()
    }

    pub fn exit_code(&self) -> i32 {
        if self.is_success() { 0 } else { 1 }
    }
}

pub struct DeployCommand<'a> {
    ctx: &'a ProjectContext,
    handlers: &'a DeploymentHandlers,
    reporter: &'a dyn BatchReporter,
}

impl<'a> DeployCommand<'a> {
    pub fn new(
        ctx: &'a ProjectContext,
        handlers: &'a DeploymentHandlers,
        reporter: &'a dyn BatchReporter,
    ) -> Self {
        Self {
            ctx,
            handlers,
            reporter,
        }
    }

    pub fn execute(&self, options: &DeployOptions) -> Result<DeployReport> {
        tracing::debug!(?options, "deploy");
        let platform = self.ctx.platform()?;
        let mut resolution = self.ctx.resolve(&options.selector)?;

        let batch = Batch::new("Deploying challenges", self.reporter).quiet(options.quiet);
        let mut deployments = seed_report(&batch, &mut resolution);
        let mut installs = BatchReport::new();
        let reporter = self.reporter;

        batch.run(
            &mut resolution.challenges,
            &mut deployments,
            |challenge| challenge.to_string(),
            |challenge| {
                let connection_info = self.deploy_one(challenge, options.host.as_deref())?;

                let listing = platform.list_challenges()?;
                let installed = match challenge.remote_state(&listing) {
                    RemoteState::Present(_) => {
                        reporter.info(&format!("Updating challenge '{}'", challenge));
                        challenge
                            .sync(platform.as_ref(), &IgnoreSet::deploy())
                            .map(|_| DeployAction::Synced)
                    }
                    RemoteState::Absent => {
                        reporter.info(&format!("Creating challenge '{}'", challenge));
                        challenge
                            .create(platform.as_ref(), &IgnoreSet::new())
                            .map(DeployAction::Created)
                    }
                };
                if let Err(err) = &installed {
                    reporter.error(&format!(
                        "Challenge service has been deployed, however the challenge could not be installed: {}",
                        err
                    ));
                }
                installs.push(challenge.to_string(), installed);
                Ok(connection_info)
            },
        );

        let report = DeployReport {
            deployments,
            installs,
        };
        if !options.quiet {
            self.announce(&report);
        }
        Ok(report)
    }

    /// Provision one service and settle its connection info.
    fn deploy_one(&self, challenge: &mut Challenge, host: Option<&str>) -> Result<Option<String>> {
        if challenge.definition().image.is_none() {
            return Err(Error::Project(format!(
                "Challenge '{}' has no image to deploy",
                challenge
            )));
        }

        let target = host
            .map(str::to_string)
            .or_else(|| challenge.definition().host.clone())
            .filter(|target| !target.is_empty());
        let scheme = match &target {
            Some(target) => host_scheme(target).ok_or_else(|| {
                Error::Project(format!(
                    "Host for challenge service '{}' has no URI scheme - {}. \
                     Provide a URI scheme like ssh:// or registry://",
                    challenge, target
                ))
            })?,
            None => DEFAULT_DEPLOY_SCHEME.to_string(),
        };
        let handler = self.handlers.get(&scheme).ok_or_else(|| {
            Error::Project(format!("No deployment handler for scheme '{}'", scheme))
        })?;

        self.reporter.info(&format!(
            "Deploying challenge service {} with the '{}' handler ...",
            describe(self.ctx, challenge),
            scheme
        ));
        let result = handler.deploy(challenge, target.as_deref())?;

        let existing = challenge
            .definition()
            .connection_info
            .clone()
            .filter(|info| !info.is_empty());
        let connection_info = match existing {
            Some(info) => {
                self.reporter.warn("Using connection_info from challenge.yml");
                Some(info)
            }
            None => result.connection_info.filter(|info| !info.is_empty()),
        };
        challenge.definition_mut().connection_info = connection_info.clone();

        if !result.success {
            return Err(Error::Reconciliation(
                "An error occurred during service deployment".to_string(),
            ));
        }

        match &connection_info {
            Some(info) => {
                self.reporter
                    .success(&format!("Challenge service deployed at: {}", info));
                challenge.save()?;
            }
            None => self.reporter.warn(
                "Could not resolve a connection_info for the deployed service. \
                 If the deployment handler does not return one, provide it in challenge.yml",
            ),
        }
        Ok(connection_info)
    }

    fn announce(&self, report: &DeployReport) {
        if report.is_success() {
            self.reporter
                .success("Success! All challenges deployed and installed or synced.");
            return;
        }
        if !report.deployments.is_success() {
            self.reporter.error("Deployment failed for:");
            for name in report.deployments.failed_names() {
                self.reporter.item(&format!(" - {}", name));
            }
        }
        if !report.installs.is_success() {
            self.reporter.error("Install / Sync failed for:");
            for name in report.installs.failed_names() {
                self.reporter.item(&format!(" - {}", name));
            }
        }
    }
}

/// Scheme of a deployment target; `None` unless it is a URI with a host.
fn host_scheme(target: &str) -> Option<String> {
    let url = url::Url::parse(target).ok()?;
    url.host_str().filter(|host| !host.is_empty())?;
    Some(url.scheme().to_string())
}
