//! CTFd v1 REST client.
//!
//! Requests are issued with `reqwest` and driven to completion on a private
//! current-thread runtime, so callers see a blocking API.

use std::future::Future;

use anyhow::Context;
use indexmap::IndexMap;
use reqwest::header::{AUTHORIZATION, HeaderMap, HeaderValue};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::{Value, json};

use super::remote::{
    Attachment, ChallengePayload, RemoteChallenge, RemoteFlag, RemoteHint, RemotePlatform,
    RemoteSummary,
};

/// Attributes that are type-specific settings rather than core fields.
const EXTRA_KEYS: [&str; 4] = ["initial", "decay", "minimum", "function"];

#[derive(Debug, Deserialize)]
struct Envelope<T> {
    #[serde(default = "default_success")]
    success: bool,
    #[serde(default)]
    errors: Option<Value>,
    data: Option<T>,
}

fn default_success() -> bool {
    true
}

#[derive(Debug, Deserialize)]
struct Created {
    id: u64,
}

#[derive(Debug, Deserialize)]
struct FlagRecord {
    id: u64,
    #[serde(rename = "type", default)]
    kind: String,
    content: String,
    #[serde(default)]
    data: Option<String>,
}

#[derive(Debug, Deserialize)]
struct TopicRecord {
    id: u64,
    value: String,
}

#[derive(Debug, Deserialize)]
struct TagRecord {
    id: u64,
    value: String,
}

#[derive(Debug, Deserialize)]
struct HintRecord {
    id: u64,
    #[serde(default)]
    content: String,
    #[serde(default)]
    cost: u64,
    #[serde(default)]
    title: Option<String>,
}

#[derive(Debug, Deserialize)]
struct FileRecord {
    id: u64,
    location: String,
}

#[derive(Debug, Default, Deserialize)]
struct RequirementsRecord {
    #[serde(default)]
    prerequisites: Vec<u64>,
}

/// Client for a CTFd instance, authenticated with a pre-issued admin token.
#[derive(Debug)]
pub struct CtfdClient {
    base_url: url::Url,
    http: reqwest::Client,
    runtime: tokio::runtime::Runtime,
}

impl CtfdClient {
    pub fn new(base_url: &str, access_token: &str) -> anyhow::Result<Self> {
        let mut base_url = url::Url::parse(base_url)
            .with_context(|| format!("Invalid platform url: '{}'", base_url))?;
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }

        let mut headers = HeaderMap::new();
        let token = HeaderValue::from_str(&format!("Token {}", access_token))
            .context("Access token contains invalid characters")?;
        headers.insert(AUTHORIZATION, token);

        let http = reqwest::Client::builder()
            .user_agent(concat!("ctfkit/", env!("CARGO_PKG_VERSION")))
            .default_headers(headers)
            .build()
            .context("Failed to build HTTP client")?;

        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .context("Failed to create tokio runtime")?;

        Ok(Self {
            base_url,
            http,
            runtime,
        })
    }

    fn block_on<F: Future>(&self, future: F) -> F::Output {
        self.runtime.block_on(future)
    }

    fn endpoint(&self, path: &str) -> anyhow::Result<url::Url> {
        self.base_url
            .join(path.trim_start_matches('/'))
            .with_context(|| format!("Invalid endpoint: {}", path))
    }

    fn api(&self, path: &str) -> anyhow::Result<url::Url> {
        self.endpoint(&format!("api/v1/{}", path.trim_start_matches('/')))
    }

    async fn send<T: DeserializeOwned>(
        &self,
        request: reqwest::RequestBuilder,
        what: &str,
    ) -> anyhow::Result<Option<T>> {
        let response = request
            .send()
            .await
            .with_context(|| format!("Request failed: {}", what))?;
        let status = response.status();
        let body = response
            .text()
            .await
            .with_context(|| format!("Failed to read response: {}", what))?;
        if !status.is_success() {
            anyhow::bail!("{} returned HTTP {}: {}", what, status, body.trim());
        }
        if body.trim().is_empty() {
            return Ok(None);
        }

        let envelope: Envelope<T> = serde_json::from_str(&body)
            .with_context(|| format!("Unexpected response from {}", what))?;
        if !envelope.success {
            anyhow::bail!(
                "{} was rejected: {}",
                what,
                envelope.errors.unwrap_or(Value::Null)
            );
        }
        Ok(envelope.data)
    }

    async fn get<T: DeserializeOwned + Default>(&self, path: &str) -> anyhow::Result<T> {
        let url = self.api(path)?;
        tracing::debug!(%url, "GET");
        Ok(self
            .send(self.http.get(url), &format!("GET {}", path))
            .await?
            .unwrap_or_default())
    }

    async fn post_json<T: DeserializeOwned>(&self, path: &str, body: &Value) -> anyhow::Result<Option<T>> {
        let url = self.api(path)?;
        tracing::debug!(%url, "POST");
        self.send(self.http.post(url).json(body), &format!("POST {}", path))
            .await
    }

    async fn patch_json(&self, path: &str, body: &Value) -> anyhow::Result<()> {
        let url = self.api(path)?;
        tracing::debug!(%url, "PATCH");
        self.send::<Value>(self.http.patch(url).json(body), &format!("PATCH {}", path))
            .await?;
        Ok(())
    }

    async fn delete(&self, path: &str) -> anyhow::Result<()> {
        let url = self.api(path)?;
        tracing::debug!(%url, "DELETE");
        self.send::<Value>(self.http.delete(url), &format!("DELETE {}", path))
            .await?;
        Ok(())
    }

    async fn challenge_attributes(&self, id: u64) -> anyhow::Result<serde_json::Map<String, Value>> {
        self.get(&format!("challenges/{}?view=admin", id)).await
    }

    async fn replace_flags(&self, id: u64, flags: &[RemoteFlag]) -> anyhow::Result<()> {
        let existing: Vec<FlagRecord> = self.get(&format!("challenges/{}/flags", id)).await?;
        for flag in existing {
            self.delete(&format!("flags/{}", flag.id)).await?;
        }
        for flag in flags {
            let body = json!({
                "challenge_id": id,
                "type": flag.kind,
                "content": flag.content,
                "data": flag.data.clone().unwrap_or_default(),
            });
            self.post_json::<Value>("flags", &body).await?;
        }
        Ok(())
    }

    async fn replace_topics(&self, id: u64, topics: &[String]) -> anyhow::Result<()> {
        let existing: Vec<TopicRecord> = self.get(&format!("challenges/{}/topics", id)).await?;
        for topic in existing {
            self.delete(&format!("topics?type=challenge&target_id={}", topic.id))
                .await?;
        }
        for topic in topics {
            let body = json!({ "challenge_id": id, "type": "challenge", "value": topic });
            self.post_json::<Value>("topics", &body).await?;
        }
        Ok(())
    }

    async fn replace_tags(&self, id: u64, tags: &[String]) -> anyhow::Result<()> {
        let existing: Vec<TagRecord> = self.get(&format!("challenges/{}/tags", id)).await?;
        for tag in existing {
            self.delete(&format!("tags/{}", tag.id)).await?;
        }
        for tag in tags {
            let body = json!({ "challenge": id, "value": tag });
            self.post_json::<Value>("tags", &body).await?;
        }
        Ok(())
    }

    async fn replace_hints(&self, id: u64, hints: &[RemoteHint]) -> anyhow::Result<()> {
        let existing: Vec<HintRecord> = self.get(&format!("challenges/{}/hints", id)).await?;
        for hint in existing {
            self.delete(&format!("hints/{}", hint.id)).await?;
        }
        for hint in hints {
            let mut body = json!({ "challenge_id": id, "content": hint.content, "cost": hint.cost });
            if let Some(title) = &hint.title {
                body["title"] = json!(title);
            }
            self.post_json::<Value>("hints", &body).await?;
        }
        Ok(())
    }

    async fn replace_files(&self, id: u64, files: &[Attachment]) -> anyhow::Result<()> {
        let existing: Vec<FileRecord> = self.get(&format!("challenges/{}/files", id)).await?;
        for file in existing {
            self.delete(&format!("files/{}", file.id)).await?;
        }
        if files.is_empty() {
            return Ok(());
        }

        let mut form = reqwest::multipart::Form::new()
            .text("challenge_id", id.to_string())
            .text("type", "challenge");
        for file in files {
            let part = reqwest::multipart::Part::bytes(file.content.clone())
                .file_name(file.name.clone());
            form = form.part("file", part);
        }
        let url = self.api("files")?;
        tracing::debug!(%url, count = files.len(), "POST multipart");
        self.send::<Value>(self.http.post(url).multipart(form), "POST files")
            .await?;
        Ok(())
    }

    async fn apply(&self, id: u64, payload: &ChallengePayload) -> anyhow::Result<()> {
        let mut attributes = payload.attributes.clone();
        // State goes last so a challenge is never visible half-written.
        let state = attributes.remove("state");
        if let Some(extra) = &payload.extra {
            for (key, value) in extra {
                attributes.insert(key.clone(), value.clone());
            }
        }
        if !attributes.is_empty() {
            self.patch_json(&format!("challenges/{}", id), &Value::Object(attributes))
                .await?;
        }

        if let Some(flags) = &payload.flags {
            self.replace_flags(id, flags).await?;
        }
        if let Some(topics) = &payload.topics {
            self.replace_topics(id, topics).await?;
        }
        if let Some(tags) = &payload.tags {
            self.replace_tags(id, tags).await?;
        }
        if let Some(files) = &payload.files {
            self.replace_files(id, files).await?;
        }
        if let Some(hints) = &payload.hints {
            self.replace_hints(id, hints).await?;
        }
        if let Some(requirements) = &payload.requirements {
            let body = json!({ "requirements": { "prerequisites": requirements } });
            self.patch_json(&format!("challenges/{}", id), &body).await?;
        }
        if let Some(state) = state {
            self.patch_json(&format!("challenges/{}", id), &json!({ "state": state }))
                .await?;
        }
        Ok(())
    }
}

impl RemotePlatform for CtfdClient {
    fn list_challenges(&self) -> anyhow::Result<Vec<RemoteSummary>> {
        self.block_on(self.get("challenges?view=admin"))
    }

    fn fetch_challenge(&self, id: u64) -> anyhow::Result<RemoteChallenge> {
        self.block_on(async {
            let attributes = self.challenge_attributes(id).await?;
            let flags: Vec<FlagRecord> = self.get(&format!("challenges/{}/flags", id)).await?;
            let topics: Vec<TopicRecord> = self.get(&format!("challenges/{}/topics", id)).await?;
            let tags: Vec<TagRecord> = self.get(&format!("challenges/{}/tags", id)).await?;
            let hints: Vec<HintRecord> = self.get(&format!("challenges/{}/hints", id)).await?;
            let files: Vec<FileRecord> = self.get(&format!("challenges/{}/files", id)).await?;
            let requirements: RequirementsRecord =
                self.get(&format!("challenges/{}/requirements", id)).await?;

            Ok(snapshot(
                id,
                &attributes,
                flags
                    .into_iter()
                    .map(|f| RemoteFlag {
                        kind: f.kind,
                        content: f.content,
                        data: f.data.filter(|d| !d.is_empty()),
                    })
                    .collect(),
                topics.into_iter().map(|t| t.value).collect(),
                tags.into_iter().map(|t| t.value).collect(),
                hints
                    .into_iter()
                    .map(|h| RemoteHint {
                        content: h.content,
                        cost: h.cost,
                        title: h.title.filter(|t| !t.is_empty()),
                    })
                    .collect(),
                files.into_iter().map(|f| f.location).collect(),
                requirements.prerequisites,
            ))
        })
    }

    fn create_challenge(&self, payload: &ChallengePayload) -> anyhow::Result<u64> {
        self.block_on(async {
            let mut body = payload.attributes.clone();
            body.insert("state".into(), json!("hidden"));
            if let Some(extra) = &payload.extra {
                for (key, value) in extra {
                    body.insert(key.clone(), value.clone());
                }
            }
            let created: Created = self
                .post_json("challenges", &Value::Object(body))
                .await?
                .ok_or_else(|| anyhow::anyhow!("Challenge creation returned no id"))?;

            let state = payload
                .attributes
                .get("state")
                .cloned()
                .unwrap_or_else(|| json!("visible"));
            let rest = ChallengePayload {
                attributes: [("state".to_string(), state)].into_iter().collect(),
                extra: None,
                ..payload.clone()
            };
            self.apply(created.id, &rest).await?;
            Ok(created.id)
        })
    }

    fn update_challenge(&self, id: u64, payload: &ChallengePayload) -> anyhow::Result<()> {
        self.block_on(self.apply(id, payload))
    }

    fn download_file(&self, location: &str) -> anyhow::Result<Vec<u8>> {
        let url = self.endpoint(&format!("files/{}", location.trim_start_matches('/')))?;
        self.block_on(async {
            tracing::debug!(%url, "GET file");
            let response = self
                .http
                .get(url.clone())
                .send()
                .await
                .with_context(|| format!("Failed to download {}", url))?;
            if !response.status().is_success() {
                anyhow::bail!("Failed to download {}: HTTP {}", url, response.status());
            }
            let bytes = response
                .bytes()
                .await
                .with_context(|| format!("Failed to read {}", url))?;
            Ok(bytes.to_vec())
        })
    }
}

fn string_attr(attributes: &serde_json::Map<String, Value>, key: &str) -> Option<String> {
    attributes
        .get(key)
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

#[allow(clippy::too_many_arguments)]
fn snapshot(
    id: u64,
    attributes: &serde_json::Map<String, Value>,
    flags: Vec<RemoteFlag>,
    topics: Vec<String>,
    tags: Vec<String>,
    hints: Vec<RemoteHint>,
    files: Vec<String>,
    requirements: Vec<u64>,
) -> RemoteChallenge {
    let challenge_type = string_attr(attributes, "type").unwrap_or_else(|| "standard".into());
    let extra: IndexMap<String, Value> = if challenge_type == "standard" {
        IndexMap::new()
    } else {
        EXTRA_KEYS
            .iter()
            .filter_map(|key| {
                attributes
                    .get(*key)
                    .filter(|v| !v.is_null())
                    .map(|v| (key.to_string(), v.clone()))
            })
            .collect()
    };

    RemoteChallenge {
        id,
        name: string_attr(attributes, "name").unwrap_or_default(),
        category: string_attr(attributes, "category").unwrap_or_default(),
        description: string_attr(attributes, "description").unwrap_or_default(),
        attribution: string_attr(attributes, "attribution"),
        value: attributes.get("value").and_then(Value::as_u64),
        challenge_type,
        state: string_attr(attributes, "state").unwrap_or_else(|| "visible".into()),
        connection_info: string_attr(attributes, "connection_info"),
        max_attempts: attributes
            .get("max_attempts")
            .and_then(Value::as_u64)
            .unwrap_or(0),
        extra,
        flags,
        topics,
        tags,
        hints,
        files,
        requirements,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn base_url_gains_trailing_slash() {
        let client = CtfdClient::new("https://ctf.example.com/ctfd", "tok").unwrap();
        assert_eq!(
            client.api("challenges?view=admin").unwrap().as_str(),
            "https://ctf.example.com/ctfd/api/v1/challenges?view=admin"
        );
        assert_eq!(
            client.endpoint("files/abc/handout.zip").unwrap().as_str(),
            "https://ctf.example.com/ctfd/files/abc/handout.zip"
        );
    }

    #[test]
    fn rejects_invalid_url() {
        assert!(CtfdClient::new("not a url", "tok").is_err());
    }

    #[test]
    fn snapshot_reads_dynamic_settings() {
        let attributes = json!({
            "name": "Baby ROP",
            "category": "pwn",
            "description": "",
            "value": 480,
            "type": "dynamic",
            "state": "hidden",
            "connection_info": "nc chals 1337",
            "max_attempts": 3,
            "initial": 500,
            "decay": 20,
            "minimum": 100,
            "function": null,
        });
        let attributes = attributes.as_object().unwrap();
        let snap = snapshot(9, attributes, vec![], vec![], vec![], vec![], vec![], vec![1]);

        assert_eq!(snap.name, "Baby ROP");
        assert_eq!(snap.value, Some(480));
        assert_eq!(snap.state, "hidden");
        assert_eq!(snap.max_attempts, 3);
        assert_eq!(snap.description, "");
        assert_eq!(snap.extra.len(), 3);
        assert_eq!(snap.extra["decay"], json!(20));
        assert_eq!(snap.requirements, vec![1]);
    }

    #[test]
    fn snapshot_ignores_extra_for_standard_challenges() {
        let attributes = json!({ "name": "Warmup", "type": "standard", "initial": 1 });
        let snap = snapshot(
            1,
            attributes.as_object().unwrap(),
            vec![],
            vec![],
            vec![],
            vec![],
            vec![],
            vec![],
        );
        assert!(snap.extra.is_empty());
        assert_eq!(snap.state, "visible");
        assert_eq!(snap.connection_info, None);
    }

    #[test]
    fn envelope_tolerates_missing_data() {
        let envelope: Envelope<Vec<RemoteSummary>> =
            serde_json::from_str(r#"{"success": true}"#).unwrap();
        assert!(envelope.success);
        assert!(envelope.data.is_none());

        let envelope: Envelope<Vec<RemoteSummary>> = serde_json::from_str(
            r#"{"success": true, "data": [{"id": 1, "name": "Alpha", "category": "web", "value": 100}]}"#,
        )
        .unwrap();
        assert_eq!(envelope.data.unwrap()[0].name, "Alpha");
    }
}
