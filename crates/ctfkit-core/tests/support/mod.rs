//! Shared fixtures for the integration tests.

#![allow(dead_code)]

use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tempfile::TempDir;

use ctfkit_core::challenge::{
    ChallengeDefinition, ChallengePayload, RemoteChallenge, RemotePlatform, RemoteSummary,
};
use ctfkit_core::commands::ProjectContext;
use ctfkit_core::config::{ConfigStore, ProjectConfig};
use ctfkit_core::process::{Invocation, ProcessOutput, ProcessRunner};

/// Records invocations and answers with canned outputs.
///
/// The most recently added rule whose needle occurs in the command line
/// wins; anything unmatched exits 0 with no output.
#[derive(Debug, Default)]
pub struct ScriptedRunner {
    rules: RefCell<Vec<(String, ProcessOutput)>>,
    calls: RefCell<Vec<Invocation>>,
}

impl ScriptedRunner {
    pub fn new() -> Arc<Self> {
        let runner = Self::default();
        runner.on("ls-remote", 0, "ref: refs/heads/main\tHEAD\nabc123\tHEAD\n");
        Arc::new(runner)
    }

    pub fn on(&self, needle: &str, code: i32, stdout: &str) {
        self.rules.borrow_mut().insert(
            0,
            (
                needle.to_string(),
                ProcessOutput {
                    code,
                    stdout: stdout.to_string(),
                    stderr: String::new(),
                },
            ),
        );
    }

    pub fn calls(&self) -> Vec<Invocation> {
        self.calls.borrow().clone()
    }

    pub fn commands(&self) -> Vec<String> {
        self.calls.borrow().iter().map(Invocation::display).collect()
    }

    pub fn ran(&self, needle: &str) -> bool {
        self.commands().iter().any(|line| line.contains(needle))
    }
}

impl ProcessRunner for ScriptedRunner {
    fn run(&self, invocation: &Invocation) -> anyhow::Result<ProcessOutput> {
        self.calls.borrow_mut().push(invocation.clone());
        let line = invocation.display();
        Ok(self
            .rules
            .borrow()
            .iter()
            .find(|(needle, _)| line.contains(needle.as_str()))
            .map(|(_, output)| output.clone())
            .unwrap_or_default())
    }
}

/// In-memory platform that applies payloads the way the real one does:
/// supplied scalars overwrite, supplied collections replace.
#[derive(Debug, Default)]
pub struct FakePlatform {
    challenges: RefCell<Vec<RemoteChallenge>>,
    files: RefCell<HashMap<String, Vec<u8>>>,
    writes: Cell<usize>,
    next_id: Cell<u64>,
}

impl FakePlatform {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    fn allocate_id(&self) -> u64 {
        let id = self.next_id.get() + 1;
        self.next_id.set(id);
        id
    }

    /// Seed an installed challenge directly, bypassing the write counter.
    pub fn seed(&self, name: &str, category: &str) -> u64 {
        let id = self.allocate_id();
        self.challenges.borrow_mut().push(blank(id, name, category));
        id
    }

    pub fn seed_file(&self, name: &str, file_name: &str, content: &[u8]) {
        let mut challenges = self.challenges.borrow_mut();
        if let Some(remote) = challenges.iter_mut().find(|c| c.name == name) {
            let location = format!("{}/{}", remote.id, file_name);
            self.files.borrow_mut().insert(location.clone(), content.to_vec());
            remote.files.push(location);
        }
    }

    pub fn modify(&self, name: &str, change: impl FnOnce(&mut RemoteChallenge)) {
        if let Some(remote) = self.challenges.borrow_mut().iter_mut().find(|c| c.name == name) {
            change(remote);
        }
    }

    pub fn get(&self, name: &str) -> Option<RemoteChallenge> {
        self.challenges.borrow().iter().find(|c| c.name == name).cloned()
    }

    pub fn names(&self) -> Vec<String> {
        self.challenges.borrow().iter().map(|c| c.name.clone()).collect()
    }

    /// Number of create and update calls received.
    pub fn writes(&self) -> usize {
        self.writes.get()
    }

    fn apply(&self, remote: &mut RemoteChallenge, payload: &ChallengePayload) {
        for (key, value) in &payload.attributes {
            match key.as_str() {
                "name" => remote.name = value.as_str().unwrap_or_default().to_string(),
                "category" => remote.category = value.as_str().unwrap_or_default().to_string(),
                "description" => {
                    remote.description = value.as_str().unwrap_or_default().to_string()
                }
                "attribution" => remote.attribution = value.as_str().map(str::to_string),
                "value" => remote.value = value.as_u64(),
                "type" => remote.challenge_type = value.as_str().unwrap_or_default().to_string(),
                "state" => remote.state = value.as_str().unwrap_or_default().to_string(),
                "connection_info" => remote.connection_info = value.as_str().map(str::to_string),
                "max_attempts" => remote.max_attempts = value.as_u64().unwrap_or(0),
                other => panic!("unexpected attribute {other}"),
            }
        }
        if let Some(extra) = &payload.extra {
            remote.extra = extra.clone();
        }
        if let Some(flags) = &payload.flags {
            remote.flags = flags.clone();
        }
        if let Some(topics) = &payload.topics {
            remote.topics = topics.clone();
        }
        if let Some(tags) = &payload.tags {
            remote.tags = tags.clone();
        }
        if let Some(hints) = &payload.hints {
            remote.hints = hints.clone();
        }
        if let Some(requirements) = &payload.requirements {
            remote.requirements = requirements.clone();
        }
        if let Some(files) = &payload.files {
            let mut store = self.files.borrow_mut();
            remote.files = files
                .iter()
                .map(|attachment| {
                    let location = format!("{}/{}", remote.id, attachment.name);
                    store.insert(location.clone(), attachment.content.clone());
                    location
                })
                .collect();
        }
    }
}

fn blank(id: u64, name: &str, category: &str) -> RemoteChallenge {
    RemoteChallenge {
        id,
        name: name.to_string(),
        category: category.to_string(),
        description: String::new(),
        attribution: None,
        value: None,
        challenge_type: "standard".to_string(),
        state: "visible".to_string(),
        connection_info: None,
        max_attempts: 0,
        extra: Default::default(),
        flags: Vec::new(),
        topics: Vec::new(),
        tags: Vec::new(),
        hints: Vec::new(),
        files: Vec::new(),
        requirements: Vec::new(),
    }
}

impl RemotePlatform for FakePlatform {
    fn list_challenges(&self) -> anyhow::Result<Vec<RemoteSummary>> {
        Ok(self.challenges.borrow().iter().map(RemoteChallenge::summary).collect())
    }

    fn fetch_challenge(&self, id: u64) -> anyhow::Result<RemoteChallenge> {
        self.challenges
            .borrow()
            .iter()
            .find(|c| c.id == id)
            .cloned()
            .ok_or_else(|| anyhow::anyhow!("challenge {id} not found"))
    }

    fn create_challenge(&self, payload: &ChallengePayload) -> anyhow::Result<u64> {
        self.writes.set(self.writes.get() + 1);
        let id = self.allocate_id();
        let mut remote = blank(id, "", "");
        self.apply(&mut remote, payload);
        self.challenges.borrow_mut().push(remote);
        Ok(id)
    }

    fn update_challenge(&self, id: u64, payload: &ChallengePayload) -> anyhow::Result<()> {
        self.writes.set(self.writes.get() + 1);
        let mut remote = self.fetch_challenge(id)?;
        self.apply(&mut remote, payload);
        let mut challenges = self.challenges.borrow_mut();
        if let Some(slot) = challenges.iter_mut().find(|c| c.id == id) {
            *slot = remote;
        }
        Ok(())
    }

    fn download_file(&self, location: &str) -> anyhow::Result<Vec<u8>> {
        self.files
            .borrow()
            .get(location)
            .cloned()
            .ok_or_else(|| anyhow::anyhow!("no file at {location}"))
    }
}

/// A project directory with `.ctf/config.toml` and challenge definitions.
pub struct Project {
    _temp: TempDir,
    root: PathBuf,
    config: ProjectConfig,
}

impl Project {
    pub fn new() -> Self {
        let temp = TempDir::new().expect("Failed to create temp dir");
        let root = temp.path().join("event");
        std::fs::create_dir_all(&root).expect("Failed to create project dir");
        let project = Self {
            _temp: temp,
            root,
            config: ProjectConfig::new(),
        };
        project.save();
        project
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn path(&self, relative: &str) -> PathBuf {
        self.root.join(relative)
    }

    pub fn use_subrepo(mut self) -> Self {
        self.config.config.use_subrepo = true;
        self.save();
        self
    }

    /// Write a definition below `key` and register it as a local challenge.
    pub fn local(self, key: &str, name: &str) -> Self {
        self.write_definition(key, ChallengeDefinition::new(name, "misc"));
        self.register(key, key)
    }

    /// Write a definition below `key` and register it with a git upstream.
    pub fn git(self, key: &str, name: &str, url: &str) -> Self {
        self.write_definition(key, ChallengeDefinition::new(name, "misc"));
        self.register(key, url)
    }

    pub fn register(mut self, key: &str, locator: &str) -> Self {
        self.config.challenges.insert(key, locator);
        self.save();
        self
    }

    pub fn write_definition(&self, key: &str, definition: ChallengeDefinition) {
        let path = self.root.join(key).join("challenge.yml");
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(&path, definition.to_yaml().unwrap()).unwrap();
    }

    pub fn definition(&self, key: &str) -> ChallengeDefinition {
        let content = std::fs::read_to_string(self.root.join(key).join("challenge.yml")).unwrap();
        ChallengeDefinition::from_yaml_str(&content).unwrap()
    }

    pub fn edit(&self, key: &str, change: impl FnOnce(&mut ChallengeDefinition)) {
        let mut definition = self.definition(key);
        change(&mut definition);
        self.write_definition(key, definition);
    }

    pub fn config_text(&self) -> String {
        std::fs::read_to_string(self.root.join(".ctf").join("config.toml")).unwrap()
    }

    fn save(&self) {
        ConfigStore::new(self.root.clone())
            .save(&self.config)
            .expect("Failed to write config");
    }

    pub fn context(&self, runner: &Arc<ScriptedRunner>, platform: &Arc<FakePlatform>) -> ProjectContext {
        ProjectContext::open(self.root.clone(), self.root.clone(), runner.clone())
            .expect("Failed to open project")
            .with_platform(platform.clone())
    }
}
