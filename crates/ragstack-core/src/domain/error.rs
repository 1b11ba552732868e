//! Error taxonomy for stack orchestration.

use std::path::PathBuf;

/// Orchestration errors. Every variant is fatal for the run.
#[derive(Debug, thiserror::Error)]
pub enum StackError {
    /// A required file (build recipe, image archive, config) is absent.
    #[error("{kind} not found at {}", path.display())]
    PreconditionMissing { kind: &'static str, path: PathBuf },

    /// A backend tool is not installed or its daemon is unreachable.
    #[error("{tool} is unavailable: {reason}")]
    ToolUnavailable { tool: String, reason: String },

    /// A backend call (build/save/load/launch) reported non-success.
    #[error("{operation} failed for {target}: {reason}")]
    BackendFailure {
        operation: &'static str,
        target: String,
        reason: String,
    },

    /// The post-build identity of an image could not be determined.
    #[error("identity of {image} is unresolvable: {reason}")]
    IdentityUnresolvable { image: String, reason: String },

    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl StackError {
    /// Stable label used in structured log fields and JSON summaries.
    pub fn category(&self) -> &'static str {
        match self {
            StackError::PreconditionMissing { .. } => "precondition_missing",
            StackError::ToolUnavailable { .. } => "tool_unavailable",
            StackError::BackendFailure { .. } => "backend_failure",
            StackError::IdentityUnresolvable { .. } => "identity_unresolvable",
            StackError::InvalidInput(_) => "invalid_input",
            StackError::Config(_) => "config",
            StackError::Io(_) => "io",
            StackError::Serialization(_) => "serialization",
        }
    }

    pub fn backend(
        operation: &'static str,
        target: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        StackError::BackendFailure {
            operation,
            target: target.into(),
            reason: reason.into(),
        }
    }
}

/// Result type for orchestration operations.
pub type Result<T> = std::result::Result<T, StackError>;
