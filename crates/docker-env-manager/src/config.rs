//! Docker backend configuration

use ragstack_core::StackConfig;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Docker backend configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DockerConfig {
    /// Docker binary (name on PATH or absolute path)
    pub binary: String,
    /// Build context passed to `docker build`
    pub context_dir: PathBuf,
    /// Compose file passed to `docker compose --file`
    pub compose_file: PathBuf,
    /// Compose project name
    pub project_name: Option<String>,
    /// Start services with `--detach`
    pub detach: bool,
}

impl Default for DockerConfig {
    fn default() -> Self {
        DockerConfig {
            binary: std::env::var("DOCKER_BIN").unwrap_or_else(|_| "docker".to_string()),
            context_dir: PathBuf::from("."),
            compose_file: PathBuf::from("docker-compose.yml"),
            project_name: None,
            detach: true,
        }
    }
}

impl DockerConfig {
    /// Derive the backend configuration from the stack layout.
    pub fn from_stack(stack: &StackConfig) -> Self {
        DockerConfig {
            context_dir: stack.root.clone(),
            compose_file: stack.compose_path(),
            project_name: stack.project_name.clone(),
            detach: stack.detach,
            ..Self::default()
        }
    }

    /// Use a specific docker binary
    pub fn with_binary(mut self, binary: &str) -> Self {
        self.binary = binary.to_string();
        self
    }
}
