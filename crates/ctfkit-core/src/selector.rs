//! Turning a command's challenge argument into loaded challenges.

use std::path::{Path, PathBuf};

use crate::challenge::Challenge;
use crate::error::{Error, Result};
use crate::registry::{ChallengeKey, DEFAULT_DEFINITION_FILE, Registry, is_definition_file};

/// Which challenges a batch command operates on.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum ChallengeSelector {
    /// Every registry entry, in stored order.
    #[default]
    All,
    /// A single challenge: a definition path, `.`, or a registry key.
    One(String),
}

impl ChallengeSelector {
    pub fn from_arg(arg: Option<String>) -> Self {
        match arg {
            Some(arg) => Self::One(arg),
            None => Self::All,
        }
    }

    pub fn is_all(&self) -> bool {
        matches!(self, Self::All)
    }
}

/// Outcome of resolving a selector.
#[derive(Debug, Default)]
pub struct Resolution {
    pub challenges: Vec<Challenge>,
    /// Registry keys that could not be loaded, with the reason.
    pub unresolved: Vec<(ChallengeKey, Error)>,
}

/// Definition file a single selector points at.
///
/// A selector ending in `.yml`/`.yaml`, or `.`, is a filesystem path relative
/// to `cwd`; anything else is a key relative to the project root.
pub fn selector_path(selector: &str, project_root: &Path, cwd: &Path) -> PathBuf {
    let path = if is_definition_file(selector) || selector == "." {
        cwd.join(selector)
    } else {
        project_root.join(selector)
    };

    if is_definition_file(selector) {
        path
    } else {
        path.join(DEFAULT_DEFINITION_FILE)
    }
}

/// Load the one challenge a selector names.
pub fn resolve_one(selector: &str, project_root: &Path, cwd: &Path) -> Result<Challenge> {
    let path = selector_path(selector, project_root, cwd);
    let challenge = Challenge::load(&path).map_err(|err| Error::SelectorUnresolved {
        selector: selector.to_string(),
        reason: format!("{err:#}"),
    })?;

    match path
        .parent()
        .and_then(|dir| dir.strip_prefix(project_root).ok())
    {
        Some(relative) => Ok(challenge.with_key(ChallengeKey::from_path(relative))),
        None => Ok(challenge),
    }
}

/// Load every registered challenge. Failures are collected, not fatal.
pub fn resolve_all(registry: &Registry, project_root: &Path) -> Resolution {
    let mut resolution = Resolution::default();
    for key in registry.keys() {
        match Challenge::load_key(project_root, &key) {
            Ok(challenge) => resolution.challenges.push(challenge),
            Err(err) => {
                tracing::debug!(key = %key, error = %format!("{err:#}"), "skipping unloadable challenge");
                resolution.unresolved.push((
                    key.clone(),
                    Error::SelectorUnresolved {
                        selector: key.to_string(),
                        reason: format!("{err:#}"),
                    },
                ));
            }
        }
    }
    resolution
}

/// Resolve a selector. An explicit selector that cannot be loaded is fatal.
pub fn resolve(
    selector: &ChallengeSelector,
    registry: &Registry,
    project_root: &Path,
    cwd: &Path,
) -> Result<Resolution> {
    match selector {
        ChallengeSelector::All => Ok(resolve_all(registry, project_root)),
        ChallengeSelector::One(arg) => Ok(Resolution {
            challenges: vec![resolve_one(arg, project_root, cwd)?],
            unresolved: Vec::new(),
        }),
    }
}
