//! Remote platform boundary.
//!
//! The platform holds the installed state of every challenge. Everything the
//! engine needs from it goes through [`RemotePlatform`]; the listing is
//! re-fetched before each decision that depends on it.

use std::fmt;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use super::field::ChallengeField;

/// One entry of the remote challenge listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteSummary {
    pub id: u64,
    pub name: String,
    #[serde(default)]
    pub category: String,
}

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct RemoteFlag {
    #[serde(rename = "type")]
    pub kind: String,
    pub content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct RemoteHint {
    pub content: String,
    #[serde(default)]
    pub cost: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
}

/// Full snapshot of an installed challenge.
#[derive(Debug, Clone, PartialEq)]
pub struct RemoteChallenge {
    pub id: u64,
    pub name: String,
    pub category: String,
    pub description: String,
    pub attribution: Option<String>,
    pub value: Option<u64>,
    pub challenge_type: String,
    pub state: String,
    pub connection_info: Option<String>,
    pub max_attempts: u64,
    pub extra: IndexMap<String, serde_json::Value>,
    pub flags: Vec<RemoteFlag>,
    pub topics: Vec<String>,
    pub tags: Vec<String>,
    pub hints: Vec<RemoteHint>,
    /// Attachment locations, downloadable through [`RemotePlatform::download_file`]
    pub files: Vec<String>,
    /// Prerequisite challenge ids
    pub requirements: Vec<u64>,
}

impl RemoteChallenge {
    pub fn summary(&self) -> RemoteSummary {
        RemoteSummary {
            id: self.id,
            name: self.name.clone(),
            category: self.category.clone(),
        }
    }
}

/// An attachment to upload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attachment {
    pub name: String,
    pub content: Vec<u8>,
}

/// Field-level write. Only the supplied parts are written; supplied
/// collections replace what the remote holds.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ChallengePayload {
    /// Scalar attributes keyed by their API name
    pub attributes: serde_json::Map<String, serde_json::Value>,
    /// Type-specific settings, sent alongside the attributes
    pub extra: Option<IndexMap<String, serde_json::Value>>,
    pub flags: Option<Vec<RemoteFlag>>,
    pub topics: Option<Vec<String>>,
    pub tags: Option<Vec<String>>,
    pub hints: Option<Vec<RemoteHint>>,
    pub files: Option<Vec<Attachment>>,
    pub requirements: Option<Vec<u64>>,
}

impl ChallengePayload {
    /// Whether this payload writes the given field.
    pub fn touches(&self, field: ChallengeField) -> bool {
        match field {
            ChallengeField::Flags => self.flags.is_some(),
            ChallengeField::Topics => self.topics.is_some(),
            ChallengeField::Tags => self.tags.is_some(),
            ChallengeField::Hints => self.hints.is_some(),
            ChallengeField::Files => self.files.is_some(),
            ChallengeField::Requirements => self.requirements.is_some(),
            ChallengeField::Extra => self.extra.is_some(),
            scalar => self.attributes.contains_key(api_name(scalar)),
        }
    }
}

/// Attribute name the platform API uses for a scalar field.
pub fn api_name(field: ChallengeField) -> &'static str {
    match field {
        ChallengeField::MaxAttempts => "max_attempts",
        other => other.as_str(),
    }
}

/// File name part of an attachment location (`<hash>/<name>`).
pub fn attachment_name(location: &str) -> &str {
    let path = location.split('?').next().unwrap_or(location);
    path.rsplit('/').next().unwrap_or(path)
}

/// Find a listing entry by challenge name.
pub fn find_by_name<'a>(listing: &'a [RemoteSummary], name: &str) -> Option<&'a RemoteSummary> {
    listing.iter().find(|summary| summary.name == name)
}

/// The remote challenge-management platform.
pub trait RemotePlatform: fmt::Debug {
    /// Every installed challenge, freshly fetched.
    fn list_challenges(&self) -> anyhow::Result<Vec<RemoteSummary>>;

    fn fetch_challenge(&self, id: u64) -> anyhow::Result<RemoteChallenge>;

    /// Install a new challenge and return its id.
    fn create_challenge(&self, payload: &ChallengePayload) -> anyhow::Result<u64>;

    fn update_challenge(&self, id: u64, payload: &ChallengePayload) -> anyhow::Result<()>;

    fn download_file(&self, location: &str) -> anyhow::Result<Vec<u8>>;
}
