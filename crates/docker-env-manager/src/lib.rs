//! Docker-Env-Manager: Docker build, archive and compose backends for ragstack
//!
//! This crate implements the `ragstack-core` backend traits on top of the
//! docker CLI. Each operation is a single docker invocation; nothing is
//! retried and no timeouts are imposed.
//!
//! - `docker image inspect` for identity probes
//! - `docker build` for image builds
//! - `docker save` / `docker load` for offline archives
//! - `docker compose up` for service launch

pub mod archive;
pub mod build;
pub mod command;
pub mod compose;
pub mod config;
pub mod error;
pub mod inspect;

#[cfg(all(test, unix))]
mod test_support;

pub use command::{CommandOutput, DockerCli};
pub use config::DockerConfig;
pub use error::DockerError;
pub use inspect::ImageInspect;

use async_trait::async_trait;
use ragstack_core::{StackConfig, StackError, ToolCheck};
use std::process::Command;
use tracing::{debug, info};

/// Result type for docker operations
pub type Result<T> = std::result::Result<T, DockerError>;

/// Docker-backed implementation of every orchestration backend trait.
#[derive(Debug, Clone)]
pub struct DockerBackend {
    pub(crate) config: DockerConfig,
    pub(crate) cli: DockerCli,
}

impl DockerBackend {
    pub fn new(config: DockerConfig) -> Self {
        let cli = DockerCli::new(config.binary.clone());
        Self { config, cli }
    }

    /// Backend for the given stack layout.
    pub fn from_stack(stack: &StackConfig) -> Self {
        Self::new(DockerConfig::from_stack(stack))
    }

    pub fn config(&self) -> &DockerConfig {
        &self.config
    }
}

#[async_trait]
impl ToolCheck for DockerBackend {
    async fn ensure_tools(&self) -> ragstack_core::Result<()> {
        let version = self
            .cli
            .run(&version_args())
            .await
            .map_err(|e| e.into_stack("version", "docker"))?;
        if !version.success() {
            // Daemon down or its socket not accessible.
            return Err(StackError::ToolUnavailable {
                tool: "docker daemon".to_string(),
                reason: version.failure_reason(),
            });
        }
        info!("Docker daemon {}", version.stdout.trim());

        let compose = self
            .cli
            .run(&["compose".to_string(), "version".to_string()])
            .await
            .map_err(|e| e.into_stack("version", "docker compose"))?;
        if !compose.success() {
            return Err(StackError::ToolUnavailable {
                tool: "docker compose".to_string(),
                reason: compose.failure_reason(),
            });
        }
        debug!("{}", compose.stdout.trim());
        Ok(())
    }
}

fn version_args() -> Vec<String> {
    vec![
        "version".to_string(),
        "--format".to_string(),
        "{{.Server.Version}}".to_string(),
    ]
}

/// Check if docker is available on the system
pub fn is_docker_available() -> bool {
    Command::new(docker_binary())
        .arg("--version")
        .output()
        .map(|o| o.status.success())
        .unwrap_or(false)
}

/// Check if the compose plugin is available
pub fn is_compose_available() -> bool {
    Command::new(docker_binary())
        .args(["compose", "version"])
        .output()
        .map(|o| o.status.success())
        .unwrap_or(false)
}

fn docker_binary() -> String {
    DockerConfig::default().binary
}

#[cfg(test)]
mod tests {
    use super::*;
    #[cfg(unix)]
    use crate::test_support::stub_docker;

    #[test]
    fn test_is_docker_available() {
        // Just check it doesn't panic
        let _ = is_docker_available();
        let _ = is_compose_available();
    }

    #[test]
    fn test_backend_uses_configured_binary() {
        let backend = DockerBackend::new(DockerConfig::default().with_binary("podman"));
        assert_eq!(backend.cli.binary(), "podman");
        assert_eq!(backend.config().binary, "podman");
    }

    #[tokio::test]
    async fn test_missing_binary_is_tool_unavailable() {
        let backend =
            DockerBackend::new(DockerConfig::default().with_binary("/nonexistent/bin/docker"));
        let err = backend.ensure_tools().await.unwrap_err();
        match err {
            StackError::ToolUnavailable { tool, .. } => assert_eq!(tool, "docker"),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_daemon_socket_permission_denied_is_tool_unavailable() {
        let dir = tempfile::tempdir().unwrap();
        let binary = stub_docker(
            dir.path(),
            "echo 'permission denied while trying to connect to the Docker daemon socket at unix:///var/run/docker.sock' >&2\nexit 1",
        );

        let backend = DockerBackend::new(DockerConfig::default().with_binary(&binary));
        match backend.ensure_tools().await.unwrap_err() {
            StackError::ToolUnavailable { tool, reason } => {
                assert_eq!(tool, "docker daemon");
                assert!(reason.contains("permission denied"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_missing_compose_plugin_is_tool_unavailable() {
        let dir = tempfile::tempdir().unwrap();
        let binary = stub_docker(
            dir.path(),
            "if [ \"$1\" = compose ]; then echo \"docker: 'compose' is not a docker command.\" >&2; exit 1; fi\necho 27.3.1",
        );

        let backend = DockerBackend::new(DockerConfig::default().with_binary(&binary));
        match backend.ensure_tools().await.unwrap_err() {
            StackError::ToolUnavailable { tool, .. } => assert_eq!(tool, "docker compose"),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_ensure_tools_passes_with_daemon_and_compose() {
        let dir = tempfile::tempdir().unwrap();
        let binary = stub_docker(dir.path(), "echo ok");

        let backend = DockerBackend::new(DockerConfig::default().with_binary(&binary));
        backend.ensure_tools().await.unwrap();
    }
}
