//! Source locators.

use std::path::PathBuf;

/// Where a challenge's source lives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourceLocator {
    /// A directory on disk; no transport involved.
    Local(PathBuf),
    /// An upstream git repository the challenge tree is linked to.
    Git(String),
}

impl SourceLocator {
    /// Classify a stored locator. Anything ending in `.git` is a repository.
    pub fn parse(raw: &str) -> Self {
        let trimmed = raw.trim();
        if trimmed.ends_with(".git") {
            Self::Git(trimmed.to_string())
        } else {
            Self::Local(PathBuf::from(trimmed))
        }
    }

    pub fn is_git(&self) -> bool {
        matches!(self, Self::Git(_))
    }

    pub fn git_url(&self) -> Option<&str> {
        match self {
            Self::Git(url) => Some(url),
            Self::Local(_) => None,
        }
    }

    /// Repository name derived from the URL (`.../chal-b.git` -> `chal-b`).
    pub fn repository_name(&self) -> Option<&str> {
        let url = self.git_url()?;
        let tail = url.trim_end_matches('/').rsplit(['/', ':']).next()?;
        tail.strip_suffix(".git").filter(|name| !name.is_empty())
    }
}
