//! Deployment handlers backed by external commands.
//!
//! Each `[deploy]` entry of `.ctf/config.toml` maps a host scheme to a
//! command. The command runs as `<command> <challenge dir> [host]`; a zero
//! exit is a successful deployment and the last non-empty stdout line, if
//! any, is the connection info.

use std::sync::Arc;

use ctfkit_core::challenge::Challenge;
use ctfkit_core::commands::{DeploymentHandler, DeploymentHandlers, DeploymentResult};
use ctfkit_core::config::ProjectConfig;
use ctfkit_core::process::{Invocation, ProcessRunner};

#[derive(Debug)]
pub struct CommandDeploymentHandler {
    command: String,
    runner: Arc<dyn ProcessRunner>,
}

impl CommandDeploymentHandler {
    pub fn new(command: impl Into<String>, runner: Arc<dyn ProcessRunner>) -> Self {
        Self {
            command: command.into(),
            runner,
        }
    }
}

impl DeploymentHandler for CommandDeploymentHandler {
    fn deploy(&self, challenge: &Challenge, host: Option<&str>) -> anyhow::Result<DeploymentResult> {
        let mut invocation = Invocation::new(&self.command, challenge.directory())
            .path_arg(challenge.directory())
            .captured();
        if let Some(host) = host {
            invocation = invocation.arg(host);
        }
        if let Some(protocol) = &challenge.definition().protocol {
            invocation = invocation.env("CTFKIT_PROTOCOL", protocol.as_str());
        }

        let output = self.runner.run(&invocation)?;
        if !output.stderr.trim().is_empty() {
            tracing::debug!(handler = %self.command, stderr = %output.stderr.trim(), "handler stderr");
        }
        let connection_info = output
            .stdout
            .lines()
            .map(str::trim)
            .rfind(|line| !line.is_empty())
            .map(str::to_string);

        Ok(DeploymentResult {
            success: output.success(),
            connection_info,
        })
    }
}

/// One handler per `[deploy]` entry.
pub fn from_config(config: &ProjectConfig, runner: Arc<dyn ProcessRunner>) -> DeploymentHandlers {
    let mut handlers = DeploymentHandlers::new();
    for (scheme, command) in &config.deploy {
        handlers.register(
            scheme.as_str(),
            Box::new(CommandDeploymentHandler::new(command.as_str(), runner.clone())),
        );
    }
    handlers
}
