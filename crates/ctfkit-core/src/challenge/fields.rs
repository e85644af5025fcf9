//! Field-level views of local and remote challenge state.
//!
//! Both sides are projected onto comparable JSON values per
//! [`ChallengeField`]: collections are sorted, requirement names become ids,
//! and attachments are compared by file name and content digest.

use std::path::Path;

use anyhow::Context;
use serde_json::{Value, json};

use super::definition::{ChallengeDefinition, FlagSpec, HintSpec, Requirement};
use super::field::{ChallengeField, IgnoreSet};
use super::remote::{
    Attachment, ChallengePayload, RemoteChallenge, RemoteFlag, RemoteHint, RemotePlatform,
    RemoteSummary, api_name, attachment_name, find_by_name,
};
use crate::fs::{digest_bytes, digest_file};

pub const DEFAULT_STATE: &str = "visible";

/// Local flags in the platform's shape.
pub fn local_flags(definition: &ChallengeDefinition) -> Vec<RemoteFlag> {
    definition
        .flags
        .iter()
        .map(|flag| RemoteFlag {
            kind: flag.kind().to_string(),
            content: flag.content().to_string(),
            data: flag.data().map(str::to_string),
        })
        .collect()
}

pub fn local_hints(definition: &ChallengeDefinition) -> Vec<RemoteHint> {
    definition
        .hints
        .iter()
        .map(|hint| RemoteHint {
            content: hint.content().to_string(),
            cost: hint.cost(),
            title: hint.title().map(str::to_string),
        })
        .collect()
}

/// Translate requirement names to remote ids using a fresh listing.
pub fn requirement_ids(
    definition: &ChallengeDefinition,
    listing: &[RemoteSummary],
) -> anyhow::Result<Vec<u64>> {
    definition
        .requirements
        .iter()
        .map(|requirement| match requirement {
            Requirement::Id(id) => Ok(*id),
            Requirement::Name(name) => find_by_name(listing, name)
                .map(|summary| summary.id)
                .ok_or_else(|| {
                    anyhow::anyhow!("Required challenge '{}' is not installed on the remote", name)
                }),
        })
        .collect()
}

/// Read attachments from the challenge directory.
pub fn local_attachments(
    definition: &ChallengeDefinition,
    directory: &Path,
) -> anyhow::Result<Vec<Attachment>> {
    definition
        .files
        .iter()
        .map(|file| {
            let path = directory.join(file);
            let content = std::fs::read(&path)
                .with_context(|| format!("Failed to read challenge file: {}", path.display()))?;
            Ok(Attachment {
                name: attachment_name(file).to_string(),
                content,
            })
        })
        .collect()
}

fn sorted<T: Ord + Clone>(items: &[T]) -> Vec<T> {
    let mut items = items.to_vec();
    items.sort();
    items
}

fn files_value(mut entries: Vec<(String, String)>) -> Value {
    entries.sort();
    Value::Array(
        entries
            .into_iter()
            .map(|(name, digest)| json!({ "name": name, "digest": digest }))
            .collect(),
    )
}

/// Comparable value of a field on the local side.
pub fn local_value(
    field: ChallengeField,
    definition: &ChallengeDefinition,
    directory: &Path,
    listing: &[RemoteSummary],
) -> anyhow::Result<Value> {
    Ok(match field {
        ChallengeField::Name => json!(definition.name),
        ChallengeField::Category => json!(definition.category),
        ChallengeField::Description => json!(definition.description.as_deref().unwrap_or("")),
        ChallengeField::Attribution => json!(definition.attribution),
        ChallengeField::Value => json!(definition.value),
        ChallengeField::Type => json!(definition.challenge_type),
        ChallengeField::State => json!(definition.state.as_deref().unwrap_or(DEFAULT_STATE)),
        ChallengeField::ConnectionInfo => json!(definition.connection_info),
        ChallengeField::MaxAttempts => json!(definition.attempts.unwrap_or(0)),
        ChallengeField::Extra => json!(definition.extra),
        ChallengeField::Flags => json!(sorted(&local_flags(definition))),
        ChallengeField::Topics => json!(sorted(&definition.topics)),
        ChallengeField::Tags => json!(sorted(&definition.tags)),
        ChallengeField::Hints => json!(sorted(&local_hints(definition))),
        ChallengeField::Requirements => json!(sorted(&requirement_ids(definition, listing)?)),
        ChallengeField::Files => {
            let mut entries = Vec::with_capacity(definition.files.len());
            for file in &definition.files {
                let digest = digest_file(&directory.join(file))?;
                entries.push((attachment_name(file).to_string(), digest));
            }
            files_value(entries)
        }
    })
}

/// Comparable value of a field on the remote side.
pub fn remote_value(
    field: ChallengeField,
    remote: &RemoteChallenge,
    platform: &dyn RemotePlatform,
) -> anyhow::Result<Value> {
    Ok(match field {
        ChallengeField::Name => json!(remote.name),
        ChallengeField::Category => json!(remote.category),
        ChallengeField::Description => json!(remote.description),
        ChallengeField::Attribution => json!(remote.attribution),
        ChallengeField::Value => json!(remote.value),
        ChallengeField::Type => json!(remote.challenge_type),
        ChallengeField::State => json!(remote.state),
        ChallengeField::ConnectionInfo => json!(remote.connection_info),
        ChallengeField::MaxAttempts => json!(remote.max_attempts),
        ChallengeField::Extra => json!(remote.extra),
        ChallengeField::Flags => json!(sorted(&remote.flags)),
        ChallengeField::Topics => json!(sorted(&remote.topics)),
        ChallengeField::Tags => json!(sorted(&remote.tags)),
        ChallengeField::Hints => json!(sorted(&remote.hints)),
        ChallengeField::Requirements => json!(sorted(&remote.requirements)),
        ChallengeField::Files => {
            let mut entries = Vec::with_capacity(remote.files.len());
            for location in &remote.files {
                let content = platform
                    .download_file(location)
                    .with_context(|| format!("Failed to download '{}'", location))?;
                entries.push((attachment_name(location).to_string(), digest_bytes(&content)));
            }
            files_value(entries)
        }
    })
}

/// Build the write for every field outside `ignore`.
pub fn build_payload(
    definition: &ChallengeDefinition,
    directory: &Path,
    listing: &[RemoteSummary],
    ignore: &IgnoreSet,
) -> anyhow::Result<ChallengePayload> {
    let mut payload = ChallengePayload::default();
    for field in ignore.remaining() {
        match field {
            ChallengeField::Extra => payload.extra = Some(definition.extra.clone()),
            ChallengeField::Flags => payload.flags = Some(local_flags(definition)),
            ChallengeField::Topics => payload.topics = Some(definition.topics.clone()),
            ChallengeField::Tags => payload.tags = Some(definition.tags.clone()),
            ChallengeField::Hints => payload.hints = Some(local_hints(definition)),
            ChallengeField::Files => {
                payload.files = Some(local_attachments(definition, directory)?);
            }
            ChallengeField::Requirements => {
                payload.requirements = Some(requirement_ids(definition, listing)?);
            }
            scalar => {
                let value = local_value(scalar, definition, directory, listing)?;
                payload.attributes.insert(api_name(scalar).to_string(), value);
            }
        }
    }
    Ok(payload)
}

/// Copy a remote scalar or collection into the local definition.
///
/// Attachments are handled by the caller since they touch the filesystem.
pub fn apply_remote(
    field: ChallengeField,
    definition: &mut ChallengeDefinition,
    remote: &RemoteChallenge,
    listing: &[RemoteSummary],
) {
    match field {
        ChallengeField::Name => definition.name = remote.name.clone(),
        ChallengeField::Category => definition.category = remote.category.clone(),
        ChallengeField::Description => {
            definition.description =
                (!remote.description.is_empty()).then(|| remote.description.clone());
        }
        ChallengeField::Attribution => definition.attribution = remote.attribution.clone(),
        ChallengeField::Value => definition.value = remote.value,
        ChallengeField::Type => definition.challenge_type = remote.challenge_type.clone(),
        ChallengeField::State => definition.state = Some(remote.state.clone()),
        ChallengeField::ConnectionInfo => {
            definition.connection_info = remote.connection_info.clone();
        }
        ChallengeField::MaxAttempts => {
            definition.attempts = (remote.max_attempts > 0).then_some(remote.max_attempts);
        }
        ChallengeField::Extra => definition.extra = remote.extra.clone(),
        ChallengeField::Flags => {
            definition.flags = remote
                .flags
                .iter()
                .map(|flag| {
                    if flag.kind == super::definition::DEFAULT_FLAG_TYPE && flag.data.is_none() {
                        FlagSpec::Plain(flag.content.clone())
                    } else {
                        FlagSpec::Detailed {
                            kind: flag.kind.clone(),
                            content: flag.content.clone(),
                            data: flag.data.clone(),
                        }
                    }
                })
                .collect();
        }
        ChallengeField::Topics => definition.topics = remote.topics.clone(),
        ChallengeField::Tags => definition.tags = remote.tags.clone(),
        ChallengeField::Hints => {
            definition.hints = remote
                .hints
                .iter()
                .map(|hint| {
                    if hint.cost == 0 && hint.title.is_none() {
                        HintSpec::Plain(hint.content.clone())
                    } else {
                        HintSpec::Detailed {
                            content: hint.content.clone(),
                            cost: hint.cost,
                            title: hint.title.clone(),
                        }
                    }
                })
                .collect();
        }
        ChallengeField::Requirements => {
            definition.requirements = remote
                .requirements
                .iter()
                .map(|id| {
                    listing
                        .iter()
                        .find(|summary| summary.id == *id)
                        .map(|summary| Requirement::Name(summary.name.clone()))
                        .unwrap_or(Requirement::Id(*id))
                })
                .collect();
        }
        ChallengeField::Files => {}
    }
}
