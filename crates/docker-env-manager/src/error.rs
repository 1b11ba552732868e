//! Error types for docker-env-manager

use ragstack_core::StackError;
use thiserror::Error;

/// Errors that can occur while driving the docker CLI
#[derive(Error, Debug)]
pub enum DockerError {
    /// Docker binary not found
    #[error("docker is not installed or not in PATH")]
    DockerNotFound,

    /// The docker daemon could not be reached
    #[error("docker daemon is unreachable: {0}")]
    DaemonUnreachable(String),

    /// A docker command exited non-zero
    #[error("`docker {command}` exited with code {exit_code}: {reason}")]
    CommandFailed {
        command: String,
        exit_code: i32,
        reason: String,
    },

    /// Docker printed something we could not interpret
    #[error("unexpected docker output: {0}")]
    UnexpectedOutput(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON parsing error
    #[error("JSON parsing error: {0}")]
    Json(#[from] serde_json::Error),
}

impl DockerError {
    /// Convert into the orchestration taxonomy, attaching the failed
    /// operation and its target (image reference, archive path, selector).
    pub fn into_stack(self, operation: &'static str, target: impl Into<String>) -> StackError {
        match self {
            DockerError::DockerNotFound => StackError::ToolUnavailable {
                tool: "docker".to_string(),
                reason: "not installed or not in PATH".to_string(),
            },
            DockerError::DaemonUnreachable(reason) => StackError::ToolUnavailable {
                tool: "docker daemon".to_string(),
                reason,
            },
            other => StackError::backend(operation, target, other.to_string()),
        }
    }
}
