//! Restore command implementation.
//!
//! Re-links registered git challenges whose directories are missing from
//! the working tree. Works on registry entries directly, so a challenge
//! whose definition is gone can still be restored.

use std::path::Path;

use crate::batch::{Batch, BatchReport, BatchReporter};
use crate::error::{Error, Result};
use crate::registry::{ChallengeKey, SourceLocator};

use super::ProjectContext;

/// Options for the restore command
#[derive(Debug, Clone, Default)]
pub struct RestoreOptions {
    /// Restrict the pass to this registry key
    pub key: Option<String>,
    pub quiet: bool,
}

pub struct RestoreCommand<'a> {
    ctx: &'a ProjectContext,
    reporter: &'a dyn BatchReporter,
}

impl<'a> RestoreCommand<'a> {
    pub fn new(ctx: &'a ProjectContext, reporter: &'a dyn BatchReporter) -> Self {
        Self { ctx, reporter }
    }

    pub fn execute(&self, options: &RestoreOptions) -> Result<BatchReport<()>> {
        tracing::debug!(?options, "restore");
        if self.ctx.registry().is_empty() {
            return Err(Error::Project(
                "Could not find any added challenges to restore".to_string(),
            ));
        }

        let mut entries: Vec<(ChallengeKey, SourceLocator)> = self
            .ctx
            .registry()
            .iter()
            .filter(|(key, _)| match &options.key {
                Some(wanted) => key.as_str() == wanted,
                None => true,
            })
            .collect();
        if let (Some(wanted), true) = (&options.key, entries.is_empty()) {
            return Err(Error::SelectorUnresolved {
                selector: wanted.clone(),
                reason: "no added challenge with this key".to_string(),
            });
        }

        let transport = self.ctx.transport()?;
        let batch = Batch::new("Restoring challenges", self.reporter).quiet(options.quiet);
        let mut report = BatchReport::new();
        let reporter = self.reporter;

        batch.run(
            &mut entries,
            &mut report,
            |(key, _)| key.to_string(),
            |(key, locator)| {
                let url = locator.git_url().ok_or_else(|| Error::NotGitSourced {
                    key: key.to_string(),
                })?;
                if key.has_explicit_file() {
                    return Err(Error::UnsupportedRestoreTarget {
                        key: key.to_string(),
                        reason: "it was added with a custom definition file; restore it manually"
                            .to_string(),
                    });
                }
                reporter.info(&format!("Restoring git repo '{}' to '{}'", url, key));
                transport.restore(Path::new(key.as_str()), url)
            },
        );

        batch.announce(&report, "Restore", "restored");
        Ok(report)
    }
}
