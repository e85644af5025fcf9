//! Challenge registry.
//!
//! Maps challenge keys (paths relative to the project root, optionally ending
//! in an explicit definition file) to the source each challenge came from.
//! The registry lives in the `[challenges]` table of `.ctf/config.toml` and
//! keeps the order in which entries are stored.

mod key;
mod locator;

use std::path::Path;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

pub use key::{ChallengeKey, DEFAULT_DEFINITION_FILE, is_definition_file};
pub use locator::SourceLocator;

/// Ordered mapping of challenge key to source locator.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Registry {
    entries: IndexMap<String, String>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn contains(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    pub fn get(&self, key: &str) -> Option<SourceLocator> {
        self.entries.get(key).map(|raw| SourceLocator::parse(raw))
    }

    /// Insert or replace an entry. Returns `true` when the registry changed.
    pub fn insert(&mut self, key: impl Into<String>, locator: impl Into<String>) -> bool {
        let key = key.into();
        let locator = locator.into();
        if self.entries.get(&key) == Some(&locator) {
            return false;
        }
        self.entries.insert(key, locator);
        true
    }

    /// Keys in stored order.
    pub fn keys(&self) -> impl Iterator<Item = ChallengeKey> + '_ {
        self.entries.keys().map(|k| ChallengeKey::new(k.as_str()))
    }

    /// Entries in stored order.
    pub fn iter(&self) -> impl Iterator<Item = (ChallengeKey, SourceLocator)> + '_ {
        self.entries
            .iter()
            .map(|(k, v)| (ChallengeKey::new(k.as_str()), SourceLocator::parse(v)))
    }

    /// Find the entry for a challenge directory (relative to the project root).
    ///
    /// A challenge may be registered under its directory or under the
    /// directory joined with its conventional definition file name.
    pub fn locate(&self, challenge_dir: &Path) -> Option<(ChallengeKey, SourceLocator)> {
        let dir_key = ChallengeKey::from_path(challenge_dir);
        let candidates = [
            dir_key.as_str().to_string(),
            dir_key.join(DEFAULT_DEFINITION_FILE).as_str().to_string(),
            dir_key.join("challenge.yaml").as_str().to_string(),
        ];
        candidates.into_iter().find_map(|candidate| {
            self.entries
                .get(&candidate)
                .map(|raw| (ChallengeKey::new(candidate.as_str()), SourceLocator::parse(raw)))
        })
    }

    /// Validate keys after parsing.
    pub fn validate(&self) -> anyhow::Result<()> {
        for key in self.keys() {
            key.validate()?;
        }
        Ok(())
    }
}
