//! Backend trait definitions for stack orchestration
//!
//! These traits define the collaborators the orchestrator drives:
//! - `ToolCheck`: verifies the container tooling is installed and reachable
//! - `ImageProber`: resolves an image reference to its content identity
//! - `ImageBuilder`: turns a build recipe into a tagged image
//! - `ImageArchiver`: saves images to archive files and restores them
//! - `ServiceLauncher`: brings compose services up
//!
//! All traits are async and backend-agnostic. An in-memory fake is provided
//! for testing via the `fakes` module.

use async_trait::async_trait;
use std::path::Path;
use std::sync::Arc;

use crate::domain::{ImageIdentity, ImageRef, LaunchSelector, Result};

/// Presence check for the container tooling.
#[async_trait]
pub trait ToolCheck: Send + Sync {
    /// Fails with `StackError::ToolUnavailable` when a required tool is missing.
    async fn ensure_tools(&self) -> Result<()>;
}

/// Image identity lookup.
///
/// Guarantees:
/// - A reference with no image yields `Ok(ImageIdentity::Absent)`, never an error.
/// - An unreachable backend yields `Err(StackError::ToolUnavailable)`.
#[async_trait]
pub trait ImageProber: Send + Sync {
    async fn probe(&self, image: &ImageRef) -> Result<ImageIdentity>;
}

/// Image build backend.
#[async_trait]
pub trait ImageBuilder: Send + Sync {
    /// Build `recipe` and tag the result as `image`.
    ///
    /// The caller has already verified that `recipe` exists.
    async fn build(&self, recipe: &Path, image: &ImageRef) -> Result<()>;
}

/// Image archive transport.
#[async_trait]
pub trait ImageArchiver: Send + Sync {
    /// Write a complete snapshot of `image` to `archive`, replacing any
    /// previous file.
    async fn save(&self, image: &ImageRef, archive: &Path) -> Result<()>;

    /// Load the image contained in `archive` into the local runtime.
    ///
    /// The caller has already verified that `archive` exists.
    async fn restore(&self, archive: &Path) -> Result<()>;
}

/// Multi-service supervisor.
#[async_trait]
pub trait ServiceLauncher: Send + Sync {
    async fn launch(&self, selector: &LaunchSelector) -> Result<()>;
}

/// Handles to every backend the orchestrator needs.
#[derive(Clone)]
pub struct Backends {
    pub tools: Arc<dyn ToolCheck>,
    pub prober: Arc<dyn ImageProber>,
    pub builder: Arc<dyn ImageBuilder>,
    pub archiver: Arc<dyn ImageArchiver>,
    pub launcher: Arc<dyn ServiceLauncher>,
}

impl Backends {
    /// Wire a single object implementing every backend trait.
    pub fn shared<B>(backend: Arc<B>) -> Self
    where
        B: ToolCheck + ImageProber + ImageBuilder + ImageArchiver + ServiceLauncher + 'static,
    {
        Self {
            tools: backend.clone(),
            prober: backend.clone(),
            builder: backend.clone(),
            archiver: backend.clone(),
            launcher: backend,
        }
    }
}
