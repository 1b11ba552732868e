//! Run requests: which services to deploy, and how.

use serde::{Deserialize, Serialize};
use std::str::FromStr;

use super::error::StackError;

/// A managed service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ServiceName {
    Fastapi,
    Ollama,
}

impl ServiceName {
    /// Every managed service, in declaration order.
    pub const DECLARED: [ServiceName; 2] = [ServiceName::Fastapi, ServiceName::Ollama];

    pub fn as_str(&self) -> &'static str {
        match self {
            ServiceName::Fastapi => "fastapi",
            ServiceName::Ollama => "ollama",
        }
    }

    /// Position in declaration order.
    pub(crate) fn ordinal(&self) -> usize {
        match self {
            ServiceName::Fastapi => 0,
            ServiceName::Ollama => 1,
        }
    }
}

impl std::fmt::Display for ServiceName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ServiceName {
    type Err = StackError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "fastapi" => Ok(ServiceName::Fastapi),
            "ollama" => Ok(ServiceName::Ollama),
            other => Err(StackError::InvalidInput(format!(
                "unknown service '{other}' (expected fastapi, ollama or all)"
            ))),
        }
    }
}

/// Which services a run targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ServiceSelector {
    One(ServiceName),
    All,
}

impl std::fmt::Display for ServiceSelector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ServiceSelector::One(name) => write!(f, "{name}"),
            ServiceSelector::All => f.write_str("all"),
        }
    }
}

impl FromStr for ServiceSelector {
    type Err = StackError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.trim().eq_ignore_ascii_case("all") {
            return Ok(ServiceSelector::All);
        }
        s.parse().map(ServiceSelector::One)
    }
}

/// Connectivity mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Mode {
    /// Build images fresh and archive the ones that changed.
    Online,
    /// Restore images from local archives; never build.
    Offline,
}

impl std::fmt::Display for Mode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Mode::Online => f.write_str("online"),
            Mode::Offline => f.write_str("offline"),
        }
    }
}

impl FromStr for Mode {
    type Err = StackError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "online" => Ok(Mode::Online),
            "offline" => Ok(Mode::Offline),
            other => Err(StackError::InvalidInput(format!(
                "invalid mode '{other}' (expected online or offline)"
            ))),
        }
    }
}

/// Input of a single orchestration run. Immutable once parsed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunRequest {
    pub service_selector: ServiceSelector,
    pub mode: Mode,
}

impl RunRequest {
    pub fn new(service_selector: ServiceSelector, mode: Mode) -> Self {
        Self {
            service_selector,
            mode,
        }
    }

    /// Parse raw CLI values. The mode is validated before the selector.
    pub fn parse(service: &str, mode: &str) -> Result<Self, StackError> {
        let mode: Mode = mode.parse()?;
        let service_selector: ServiceSelector = service.parse()?;
        Ok(Self::new(service_selector, mode))
    }
}

/// Selector handed to the compose supervisor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LaunchSelector {
    /// Named compose services.
    Services(Vec<String>),
    /// Every service declared in the compose file.
    All,
}

impl std::fmt::Display for LaunchSelector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LaunchSelector::Services(names) => f.write_str(&names.join(",")),
            LaunchSelector::All => f.write_str("all"),
        }
    }
}
