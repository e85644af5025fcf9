//! One challenge: its definition on disk and its remote counterpart.

use std::fmt;
use std::path::{Path, PathBuf};

use anyhow::Context;

use super::definition::ChallengeDefinition;
use super::field::{ChallengeField, IgnoreSet};
use super::fields::{apply_remote, build_payload, local_value, remote_value};
use super::remote::{RemotePlatform, RemoteSummary, attachment_name, find_by_name};
use crate::error::{Error, Result};
use crate::fs::{atomic_write, write_if_changed};
use crate::registry::{ChallengeKey, DEFAULT_DEFINITION_FILE};

/// Presence of a challenge on the remote, by name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RemoteState {
    Absent,
    Present(RemoteSummary),
}

/// A loaded challenge definition.
///
/// Nothing is cached across invocations; remote truth is fetched by each
/// operation that needs it.
#[derive(Debug, Clone)]
pub struct Challenge {
    key: Option<ChallengeKey>,
    definition_path: PathBuf,
    definition: ChallengeDefinition,
}

impl Challenge {
    /// Load a definition file.
    pub fn load(definition_path: impl Into<PathBuf>) -> anyhow::Result<Self> {
        let definition_path = definition_path.into();
        let content = std::fs::read_to_string(&definition_path).with_context(|| {
            format!(
                "Could not read challenge definition: {}",
                definition_path.display()
            )
        })?;
        let definition = ChallengeDefinition::from_yaml_str(&content)
            .with_context(|| format!("Invalid challenge definition: {}", definition_path.display()))?;
        Ok(Self {
            key: None,
            definition_path,
            definition,
        })
    }

    /// Load the challenge a registry key points at.
    pub fn load_key(project_root: &Path, key: &ChallengeKey) -> anyhow::Result<Self> {
        Ok(Self::load(key.definition_path(project_root))?.with_key(key.clone()))
    }

    pub fn with_key(mut self, key: ChallengeKey) -> Self {
        self.key = Some(key);
        self
    }

    pub fn name(&self) -> &str {
        &self.definition.name
    }

    pub fn key(&self) -> Option<&ChallengeKey> {
        self.key.as_ref()
    }

    pub fn definition_path(&self) -> &Path {
        &self.definition_path
    }

    pub fn directory(&self) -> &Path {
        self.definition_path.parent().unwrap_or(Path::new("."))
    }

    pub fn definition(&self) -> &ChallengeDefinition {
        &self.definition
    }

    pub fn definition_mut(&mut self) -> &mut ChallengeDefinition {
        &mut self.definition
    }

    /// Rewrite the definition file in canonical form.
    pub fn save(&self) -> Result<()> {
        let content = self.definition.to_yaml()?;
        atomic_write(&self.definition_path, content.as_bytes())
            .with_context(|| format!("Failed to save {}", self.definition_path.display()))?;
        Ok(())
    }

    pub fn remote_state(&self, listing: &[RemoteSummary]) -> RemoteState {
        match find_by_name(listing, self.name()) {
            Some(summary) => RemoteState::Present(summary.clone()),
            None => RemoteState::Absent,
        }
    }

    fn require_remote(&self, listing: &[RemoteSummary]) -> Result<RemoteSummary> {
        match self.remote_state(listing) {
            RemoteState::Present(summary) => Ok(summary),
            RemoteState::Absent => Err(Error::RemoteMissing {
                name: self.name().to_string(),
            }),
        }
    }

    /// Install on the remote. Returns the new id.
    pub fn create(&self, platform: &dyn RemotePlatform, ignore: &IgnoreSet) -> Result<u64> {
        let listing = platform.list_challenges()?;
        let payload = build_payload(&self.definition, self.directory(), &listing, ignore)?;
        let id = platform
            .create_challenge(&payload)
            .with_context(|| format!("Failed to create challenge '{}'", self.name()))?;
        tracing::debug!(id, name = %self.name(), "created remote challenge");
        Ok(id)
    }

    /// Push every field outside `ignore` to the existing remote challenge.
    pub fn sync(&self, platform: &dyn RemotePlatform, ignore: &IgnoreSet) -> Result<()> {
        let listing = platform.list_challenges()?;
        let remote = self.require_remote(&listing)?;
        let payload = build_payload(&self.definition, self.directory(), &listing, ignore)?;
        platform
            .update_challenge(remote.id, &payload)
            .with_context(|| format!("Failed to sync challenge '{}'", self.name()))?;
        Ok(())
    }

    /// Compare every field outside `ignore` with the remote. Read-only.
    pub fn verify(&self, platform: &dyn RemotePlatform, ignore: &IgnoreSet) -> Result<bool> {
        let listing = platform.list_challenges()?;
        let summary = self.require_remote(&listing)?;
        let remote = platform.fetch_challenge(summary.id)?;

        let mut in_sync = true;
        for field in ignore.remaining() {
            let local = local_value(field, &self.definition, self.directory(), &listing)?;
            let theirs = remote_value(field, &remote, platform)?;
            if local != theirs {
                tracing::debug!(name = %self.name(), %field, %local, remote = %theirs, "field differs");
                in_sync = false;
            }
        }
        Ok(in_sync)
    }

    /// Pull remote state and attachments into the local definition and save it.
    ///
    /// Attachments land in `<challenge dir>/<files_directory>/`; files whose
    /// content is unchanged are left alone.
    pub fn mirror(
        &mut self,
        platform: &dyn RemotePlatform,
        files_directory: &str,
        ignore: &IgnoreSet,
    ) -> Result<()> {
        let listing = platform.list_challenges()?;
        let summary = self.require_remote(&listing)?;
        let remote = platform.fetch_challenge(summary.id)?;

        for field in ignore.remaining() {
            apply_remote(field, &mut self.definition, &remote, &listing);
        }

        if !ignore.contains(ChallengeField::Files) {
            let mut files = Vec::with_capacity(remote.files.len());
            for location in &remote.files {
                let name = attachment_name(location);
                let relative = format!("{}/{}", files_directory.trim_end_matches('/'), name);
                let content = platform
                    .download_file(location)
                    .with_context(|| format!("Failed to download '{}'", location))?;
                if write_if_changed(&self.directory().join(&relative), &content)? {
                    tracing::debug!(file = %relative, "updated attachment");
                }
                files.push(relative);
            }
            self.definition.files = files;
        }

        self.save()
    }

    /// Materialize a minimal local definition for a remote-only challenge.
    ///
    /// The challenge lands in `<project_root>/<slug of its name>/`; filling
    /// it in is left to [`Challenge::mirror`].
    pub fn clone_remote(project_root: &Path, remote: &RemoteSummary) -> Result<Self> {
        let directory = challenge_slug(&remote.name);
        if directory.is_empty() {
            return Err(Error::Reconciliation(format!(
                "Cannot derive a directory name for challenge '{}'",
                remote.name
            )));
        }

        let key = ChallengeKey::new(directory);
        let definition_path = project_root.join(key.as_str()).join(DEFAULT_DEFINITION_FILE);
        if definition_path.exists() {
            return Err(Error::Reconciliation(format!(
                "Cannot clone '{}': {} already exists",
                remote.name,
                definition_path.display()
            )));
        }

        let challenge = Self {
            key: Some(key),
            definition_path,
            definition: ChallengeDefinition::new(&remote.name, &remote.category),
        };
        challenge.save()?;
        Ok(challenge)
    }
}

impl fmt::Display for Challenge {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Directory name for a challenge name: lowercase, runs of other
/// characters collapsed into `-`.
pub fn challenge_slug(name: &str) -> String {
    let mut slug = String::with_capacity(name.len());
    for c in name.chars() {
        if c.is_ascii_alphanumeric() || c == '_' {
            slug.push(c.to_ascii_lowercase());
        } else if !slug.ends_with('-') && !slug.is_empty() {
            slug.push('-');
        }
    }
    slug.trim_end_matches('-').to_string()
}
