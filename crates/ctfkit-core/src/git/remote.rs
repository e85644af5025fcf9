//! Upstream repository queries.

use std::path::Path;

use crate::error::{Error, Result};
use crate::process::{Invocation, ProcessRunner};

/// Resolve the default branch of an upstream repository from its `HEAD`.
///
/// Queried on every call: the upstream default branch may change between
/// operations.
pub fn default_branch(runner: &dyn ProcessRunner, cwd: &Path, url: &str) -> Result<String> {
    let invocation = Invocation::git(cwd)
        .args(["ls-remote", "--symref", url, "HEAD"])
        .captured();
    let output = runner.run(&invocation)?;
    if !output.success() {
        tracing::warn!(url, stderr = %output.stderr.trim(), "git ls-remote failed");
        return Err(Error::command_failed(url, invocation.display(), output.code));
    }

    parse_symref_head(&output.stdout).ok_or_else(|| {
        Error::Reconciliation(format!("Could not determine the default branch of '{}'", url))
    })
}

/// Extract the branch from `git ls-remote --symref <url> HEAD` output.
///
/// ```text
/// ref: refs/heads/main	HEAD
/// 3f1c...	HEAD
/// ```
pub fn parse_symref_head(output: &str) -> Option<String> {
    output.lines().find_map(|line| {
        let target = line.strip_prefix("ref:")?.split_whitespace().next()?;
        let branch = target.strip_prefix("refs/heads/").unwrap_or(target);
        (!branch.is_empty()).then(|| branch.to_string())
    })
}
