//! Subprocess boundary.
//!
//! Every external program (git, git-subrepo, healthchecks, deployment
//! handlers) is started through a [`ProcessRunner`], so command logic can be
//! exercised with a scripted runner instead of real binaries.

use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use anyhow::Context;

/// A single program invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    pub program: String,
    pub args: Vec<String>,
    pub cwd: PathBuf,
    /// Variables set on top of the inherited environment.
    pub env: Vec<(String, String)>,
    /// Capture stdout/stderr instead of inheriting the terminal.
    pub capture: bool,
}

impl Invocation {
    pub fn new(program: impl Into<String>, cwd: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            cwd: cwd.into(),
            env: Vec::new(),
            capture: false,
        }
    }

    pub fn git(cwd: impl Into<PathBuf>) -> Self {
        Self::new("git", cwd)
    }

    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn path_arg(self, path: &Path) -> Self {
        self.arg(path.to_string_lossy())
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    pub fn env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.push((key.into(), value.into()));
        self
    }

    pub fn captured(mut self) -> Self {
        self.capture = true;
        self
    }

    /// Render as a shell-like command line for logs and error messages.
    pub fn display(&self) -> String {
        std::iter::once(self.program.as_str())
            .chain(self.args.iter().map(String::as_str))
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// Exit status plus whatever output was captured.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProcessOutput {
    /// Exit code; `-1` when the process was terminated by a signal.
    pub code: i32,
    pub stdout: String,
    pub stderr: String,
}

impl ProcessOutput {
    pub fn success(&self) -> bool {
        self.code == 0
    }
}

/// Runs external programs to completion.
pub trait ProcessRunner: std::fmt::Debug {
    /// Start the program and block until it exits.
    ///
    /// Returns `Err` only when the program could not be started at all; a
    /// non-zero exit is reported through [`ProcessOutput::code`].
    fn run(&self, invocation: &Invocation) -> anyhow::Result<ProcessOutput>;
}

/// Runner backed by [`std::process::Command`].
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemRunner;

impl ProcessRunner for SystemRunner {
    fn run(&self, invocation: &Invocation) -> anyhow::Result<ProcessOutput> {
        tracing::debug!(cwd = %invocation.cwd.display(), "call({})", invocation.display());

        let mut cmd = Command::new(&invocation.program);
        cmd.args(&invocation.args).current_dir(&invocation.cwd);
        for (key, value) in &invocation.env {
            cmd.env(key, value);
        }

        if invocation.capture {
            let output = cmd
                .stdin(Stdio::null())
                .output()
                .with_context(|| format!("Failed to run {}", invocation.display()))?;
            Ok(ProcessOutput {
                code: output.status.code().unwrap_or(-1),
                stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
                stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
            })
        } else {
            let status = cmd
                .status()
                .with_context(|| format!("Failed to run {}", invocation.display()))?;
            Ok(ProcessOutput {
                code: status.code().unwrap_or(-1),
                ..ProcessOutput::default()
            })
        }
    }
}
