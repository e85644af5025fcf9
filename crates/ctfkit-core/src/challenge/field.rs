//! Reconcilable challenge fields and ignore-sets.

use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

/// A field that sync/verify/mirror reconcile against the remote platform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ChallengeField {
    Name,
    Category,
    Description,
    Attribution,
    Value,
    Type,
    State,
    ConnectionInfo,
    MaxAttempts,
    Extra,
    Flags,
    Topics,
    Tags,
    Files,
    Hints,
    Requirements,
}

impl ChallengeField {
    pub const ALL: [ChallengeField; 16] = [
        Self::Name,
        Self::Category,
        Self::Description,
        Self::Attribution,
        Self::Value,
        Self::Type,
        Self::State,
        Self::ConnectionInfo,
        Self::MaxAttempts,
        Self::Extra,
        Self::Flags,
        Self::Topics,
        Self::Tags,
        Self::Files,
        Self::Hints,
        Self::Requirements,
    ];

    /// Key used in the definition file.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Name => "name",
            Self::Category => "category",
            Self::Description => "description",
            Self::Attribution => "attribution",
            Self::Value => "value",
            Self::Type => "type",
            Self::State => "state",
            Self::ConnectionInfo => "connection_info",
            Self::MaxAttempts => "attempts",
            Self::Extra => "extra",
            Self::Flags => "flags",
            Self::Topics => "topics",
            Self::Tags => "tags",
            Self::Files => "files",
            Self::Hints => "hints",
            Self::Requirements => "requirements",
        }
    }

    /// Collection fields live behind their own endpoints and are replaced whole.
    pub fn is_collection(&self) -> bool {
        matches!(
            self,
            Self::Flags | Self::Topics | Self::Tags | Self::Files | Self::Hints | Self::Requirements
        )
    }
}

impl fmt::Display for ChallengeField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ChallengeField {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase();
        if normalized == "max_attempts" {
            return Ok(Self::MaxAttempts);
        }
        Self::ALL
            .into_iter()
            .find(|field| field.as_str() == normalized)
            .ok_or_else(|| anyhow::anyhow!("Unknown challenge field: '{}'", s))
    }
}

/// Fields left untouched by a sync/verify/mirror pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IgnoreSet {
    fields: BTreeSet<ChallengeField>,
}

impl IgnoreSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fields a deployment never overwrites remotely.
    pub fn deploy() -> Self {
        [
            ChallengeField::Flags,
            ChallengeField::Topics,
            ChallengeField::Tags,
            ChallengeField::Files,
            ChallengeField::Hints,
            ChallengeField::Requirements,
            ChallengeField::State,
        ]
        .into_iter()
        .collect()
    }

    /// Parse user-supplied field names.
    pub fn parse<I, S>(names: I) -> anyhow::Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        names
            .into_iter()
            .map(|name| name.as_ref().parse::<ChallengeField>())
            .collect()
    }

    pub fn insert(&mut self, field: ChallengeField) {
        self.fields.insert(field);
    }

    pub fn contains(&self, field: ChallengeField) -> bool {
        self.fields.contains(&field)
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Reconciled fields, in declaration order.
    pub fn remaining(&self) -> impl Iterator<Item = ChallengeField> + '_ {
        ChallengeField::ALL
            .into_iter()
            .filter(|field| !self.contains(*field))
    }
}

impl FromIterator<ChallengeField> for IgnoreSet {
    fn from_iter<T: IntoIterator<Item = ChallengeField>>(iter: T) -> Self {
        Self {
            fields: iter.into_iter().collect(),
        }
    }
}
