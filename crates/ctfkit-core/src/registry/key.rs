//! Challenge keys.

use std::fmt;
use std::path::{Component, Path, PathBuf};

/// Conventional definition file name inside a challenge directory.
pub const DEFAULT_DEFINITION_FILE: &str = "challenge.yml";

/// Whether a path or key names a definition file rather than a directory.
pub fn is_definition_file(value: &str) -> bool {
    value.ends_with(".yml") || value.ends_with(".yaml")
}

/// A registry key: a project-relative challenge directory, or a directory
/// plus an explicit definition file.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ChallengeKey(String);

impl ChallengeKey {
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    /// Build a key from a project-relative path, using `/` separators.
    pub fn from_path(path: &Path) -> Self {
        let parts: Vec<String> = path
            .components()
            .filter_map(|c| match c {
                Component::Normal(part) => Some(part.to_string_lossy().into_owned()),
                _ => None,
            })
            .collect();
        Self(parts.join("/"))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn join(&self, segment: &str) -> Self {
        if self.0.is_empty() {
            Self(segment.to_string())
        } else {
            Self(format!("{}/{}", self.0, segment))
        }
    }

    /// The key carries an explicit definition file name.
    pub fn has_explicit_file(&self) -> bool {
        is_definition_file(&self.0)
    }

    /// Absolute path of the challenge definition file.
    pub fn definition_path(&self, project_root: &Path) -> PathBuf {
        let path = project_root.join(&self.0);
        if self.has_explicit_file() {
            path
        } else {
            path.join(DEFAULT_DEFINITION_FILE)
        }
    }

    /// Absolute path the key points at (the directory for plain keys).
    pub fn target_path(&self, project_root: &Path) -> PathBuf {
        project_root.join(&self.0)
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        if self.0.trim().is_empty() {
            anyhow::bail!("Challenge key must not be empty");
        }
        let path = Path::new(&self.0);
        if path.is_absolute() {
            anyhow::bail!("Challenge key '{}' must be relative to the project root", self.0);
        }
        if path.components().any(|c| matches!(c, Component::ParentDir)) {
            anyhow::bail!("Challenge key '{}' must not leave the project root", self.0);
        }
        Ok(())
    }
}

impl fmt::Display for ChallengeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
