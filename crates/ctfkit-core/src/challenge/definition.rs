//! The on-disk challenge definition (`challenge.yml`).

use anyhow::Context;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

pub const DEFAULT_CHALLENGE_TYPE: &str = "standard";
pub const DEFAULT_FLAG_TYPE: &str = "static";

fn default_challenge_type() -> String {
    DEFAULT_CHALLENGE_TYPE.to_string()
}

fn default_flag_type() -> String {
    DEFAULT_FLAG_TYPE.to_string()
}

/// A challenge definition as written by challenge authors.
///
/// Field order here is the canonical order a saved definition is written in.
/// Keys this type does not know are carried through untouched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChallengeDefinition {
    #[serde(default)]
    pub name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,

    #[serde(default)]
    pub category: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attribution: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<u64>,

    #[serde(rename = "type", default = "default_challenge_type")]
    pub challenge_type: String,

    /// Type-specific settings (e.g. dynamic scoring parameters)
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub extra: IndexMap<String, serde_json::Value>,

    /// Container image to deploy; challenges without one are not deployable
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub protocol: Option<String>,

    /// Deployment target URI (`ssh://...`, `registry://...`)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub host: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub connection_info: Option<String>,

    /// Healthcheck executable, relative to the challenge directory
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub healthcheck: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attempts: Option<u64>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub flags: Vec<FlagSpec>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub topics: Vec<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,

    /// Attachment paths relative to the challenge directory
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub files: Vec<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub hints: Vec<HintSpec>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub requirements: Vec<Requirement>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,

    #[serde(flatten)]
    pub other: IndexMap<String, serde_yaml::Value>,
}

impl Default for ChallengeDefinition {
    fn default() -> Self {
        Self {
            name: String::new(),
            author: None,
            category: String::new(),
            description: None,
            attribution: None,
            value: None,
            challenge_type: default_challenge_type(),
            extra: IndexMap::new(),
            image: None,
            protocol: None,
            host: None,
            connection_info: None,
            healthcheck: None,
            attempts: None,
            flags: Vec::new(),
            topics: Vec::new(),
            tags: Vec::new(),
            files: Vec::new(),
            hints: Vec::new(),
            requirements: Vec::new(),
            state: None,
            version: None,
            other: IndexMap::new(),
        }
    }
}

impl ChallengeDefinition {
    pub fn new(name: impl Into<String>, category: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            category: category.into(),
            ..Self::default()
        }
    }

    pub fn from_yaml_str(content: &str) -> anyhow::Result<Self> {
        let definition: Self =
            serde_yaml::from_str(content).context("Failed to parse challenge definition")?;
        if definition.name.trim().is_empty() {
            anyhow::bail!("Challenge definition has no name");
        }
        Ok(definition)
    }

    /// Serialize in canonical form.
    pub fn to_yaml(&self) -> anyhow::Result<String> {
        serde_yaml::to_string(self).context("Failed to serialize challenge definition")
    }
}

/// A flag, either bare content or a typed entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FlagSpec {
    Plain(String),
    Detailed {
        #[serde(rename = "type", default = "default_flag_type")]
        kind: String,
        content: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        data: Option<String>,
    },
}

impl FlagSpec {
    pub fn kind(&self) -> &str {
        match self {
            Self::Plain(_) => DEFAULT_FLAG_TYPE,
            Self::Detailed { kind, .. } => kind,
        }
    }

    pub fn content(&self) -> &str {
        match self {
            Self::Plain(content) | Self::Detailed { content, .. } => content,
        }
    }

    pub fn data(&self) -> Option<&str> {
        match self {
            Self::Plain(_) => None,
            Self::Detailed { data, .. } => data.as_deref().filter(|d| !d.is_empty()),
        }
    }
}

/// A hint, either free text or with a cost and title.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum HintSpec {
    Plain(String),
    Detailed {
        content: String,
        #[serde(default)]
        cost: u64,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        title: Option<String>,
    },
}

impl HintSpec {
    pub fn content(&self) -> &str {
        match self {
            Self::Plain(content) | Self::Detailed { content, .. } => content,
        }
    }

    pub fn cost(&self) -> u64 {
        match self {
            Self::Plain(_) => 0,
            Self::Detailed { cost, .. } => *cost,
        }
    }

    pub fn title(&self) -> Option<&str> {
        match self {
            Self::Plain(_) => None,
            Self::Detailed { title, .. } => title.as_deref(),
        }
    }
}

/// A prerequisite challenge, by remote id or by name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Requirement {
    Id(u64),
    Name(String),
}
