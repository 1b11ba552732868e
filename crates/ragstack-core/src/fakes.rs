//! In-memory fake for the backend traits (testing only)
//!
//! `FakeDocker` implements every backend trait without a container runtime.
//! Built images get a content-derived identity (SHA-256 of the recipe bytes and
//! the image reference), so rebuilding an untouched recipe yields the same
//! identity. Archives are real files holding a small JSON manifest.

use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::backend::{ImageArchiver, ImageBuilder, ImageProber, ServiceLauncher, ToolCheck};
use crate::domain::{ImageIdentity, ImageRef, LaunchSelector, Result, StackError};

/// A backend call observed by the fake, in order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    EnsureTools,
    Probe(String),
    Build(String),
    Save(String),
    Restore(PathBuf),
    Launch(LaunchSelector),
}

#[derive(Debug, Serialize, Deserialize)]
struct ArchiveManifest {
    image: String,
    id: String,
}

#[derive(Debug, Default)]
struct FakeState {
    images: HashMap<String, String>,
    calls: Vec<Call>,
    tools_missing: bool,
    unreachable: bool,
    failing_builds: HashSet<String>,
    vanishing_builds: HashSet<String>,
    failing_saves: HashSet<String>,
    failing_restore: bool,
    failing_launch: bool,
}

/// In-memory container runtime.
#[derive(Debug, Default)]
pub struct FakeDocker {
    state: Mutex<FakeState>,
}

impl FakeDocker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pre-populate an image.
    pub fn with_image(self, image: &str, id: &str) -> Self {
        self.state
            .lock()
            .unwrap()
            .images
            .insert(image.to_string(), id.to_string());
        self
    }

    /// `ensure_tools` fails with `ToolUnavailable`.
    pub fn without_tools(self) -> Self {
        self.state.lock().unwrap().tools_missing = true;
        self
    }

    /// `probe` fails as if the daemon were down.
    pub fn unreachable(self) -> Self {
        self.state.lock().unwrap().unreachable = true;
        self
    }

    /// Builds of `image` report a backend failure.
    pub fn failing_build(self, image: &str) -> Self {
        self.state
            .lock()
            .unwrap()
            .failing_builds
            .insert(image.to_string());
        self
    }

    /// Builds of `image` report success but leave no image behind.
    pub fn vanishing_build(self, image: &str) -> Self {
        self.state
            .lock()
            .unwrap()
            .vanishing_builds
            .insert(image.to_string());
        self
    }

    /// Saves of `image` fail as if the disk filled up.
    pub fn failing_save(self, image: &str) -> Self {
        self.state
            .lock()
            .unwrap()
            .failing_saves
            .insert(image.to_string());
        self
    }

    /// Every `restore` fails, whatever the archive holds.
    pub fn failing_restore(self) -> Self {
        self.state.lock().unwrap().failing_restore = true;
        self
    }

    /// `launch` reports a non-zero supervisor status.
    pub fn failing_launch(self) -> Self {
        self.state.lock().unwrap().failing_launch = true;
        self
    }

    /// Every call observed so far.
    pub fn calls(&self) -> Vec<Call> {
        self.state.lock().unwrap().calls.clone()
    }

    /// Clear the call log (images are kept).
    pub fn reset_calls(&self) {
        self.state.lock().unwrap().calls.clear();
    }

    pub fn identity(&self, image: &str) -> Option<String> {
        self.state.lock().unwrap().images.get(image).cloned()
    }

    /// Remove an image, as `docker rmi` would.
    pub fn remove_image(&self, image: &str) {
        self.state.lock().unwrap().images.remove(image);
    }

    pub fn builds(&self) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                Call::Build(image) => Some(image),
                _ => None,
            })
            .collect()
    }

    pub fn saves(&self) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                Call::Save(image) => Some(image),
                _ => None,
            })
            .collect()
    }

    pub fn launches(&self) -> Vec<LaunchSelector> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                Call::Launch(selector) => Some(selector),
                _ => None,
            })
            .collect()
    }

    fn record(&self, call: Call) {
        self.state.lock().unwrap().calls.push(call);
    }
}

/// Content-derived identity of a build.
fn content_identity(recipe: &[u8], image: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(recipe);
    hasher.update(b"\0");
    hasher.update(image.as_bytes());
    format!("sha256:{}", hex::encode(hasher.finalize()))
}

#[async_trait]
impl ToolCheck for FakeDocker {
    async fn ensure_tools(&self) -> Result<()> {
        self.record(Call::EnsureTools);
        if self.state.lock().unwrap().tools_missing {
            return Err(StackError::ToolUnavailable {
                tool: "docker".to_string(),
                reason: "not found in PATH".to_string(),
            });
        }
        Ok(())
    }
}

#[async_trait]
impl ImageProber for FakeDocker {
    async fn probe(&self, image: &ImageRef) -> Result<ImageIdentity> {
        self.record(Call::Probe(image.to_string()));
        let state = self.state.lock().unwrap();
        if state.unreachable {
            return Err(StackError::ToolUnavailable {
                tool: "docker daemon".to_string(),
                reason: "cannot connect to the docker daemon".to_string(),
            });
        }
        Ok(match state.images.get(image.as_str()) {
            Some(id) => ImageIdentity::Present(id.clone()),
            None => ImageIdentity::Absent,
        })
    }
}

#[async_trait]
impl ImageBuilder for FakeDocker {
    async fn build(&self, recipe: &Path, image: &ImageRef) -> Result<()> {
        self.record(Call::Build(image.to_string()));
        let mut state = self.state.lock().unwrap();
        if state.failing_builds.contains(image.as_str()) {
            return Err(StackError::backend("build", image.as_str(), "exit code 1"));
        }
        if state.vanishing_builds.contains(image.as_str()) {
            state.images.remove(image.as_str());
            return Ok(());
        }
        let recipe_bytes = std::fs::read(recipe)?;
        state.images.insert(
            image.to_string(),
            content_identity(&recipe_bytes, image.as_str()),
        );
        Ok(())
    }
}

#[async_trait]
impl ImageArchiver for FakeDocker {
    async fn save(&self, image: &ImageRef, archive: &Path) -> Result<()> {
        self.record(Call::Save(image.to_string()));
        if self
            .state
            .lock()
            .unwrap()
            .failing_saves
            .contains(image.as_str())
        {
            return Err(StackError::backend(
                "save",
                image.as_str(),
                "write /var/lib/docker/tmp: no space left on device",
            ));
        }
        let id = self
            .identity(image.as_str())
            .ok_or_else(|| StackError::backend("save", image.as_str(), "no such image"))?;
        let manifest = ArchiveManifest {
            image: image.to_string(),
            id,
        };
        if let Some(parent) = archive.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(archive, serde_json::to_vec(&manifest)?)?;
        Ok(())
    }

    async fn restore(&self, archive: &Path) -> Result<()> {
        self.record(Call::Restore(archive.to_path_buf()));
        if self.state.lock().unwrap().failing_restore {
            return Err(StackError::backend(
                "load",
                archive.display().to_string(),
                "archive/tar: invalid tar header",
            ));
        }
        let content = std::fs::read(archive)?;
        let manifest: ArchiveManifest = serde_json::from_slice(&content).map_err(|e| {
            StackError::backend("load", archive.display().to_string(), e.to_string())
        })?;
        self.state
            .lock()
            .unwrap()
            .images
            .insert(manifest.image, manifest.id);
        Ok(())
    }
}

#[async_trait]
impl ServiceLauncher for FakeDocker {
    async fn launch(&self, selector: &LaunchSelector) -> Result<()> {
        self.record(Call::Launch(selector.clone()));
        if self.state.lock().unwrap().failing_launch {
            return Err(StackError::backend(
                "launch",
                selector.to_string(),
                "compose exited with status 1",
            ));
        }
        Ok(())
    }
}
