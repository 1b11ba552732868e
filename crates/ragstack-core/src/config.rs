//! Stack configuration
//!
//! Loaded from an optional JSON file, then overridden by `RAGSTACK_*`
//! environment variables. Every field has a default, so an empty file (or no
//! file at all) describes the standard layout.

use serde::{Deserialize, Deserializer, Serialize};
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::domain::{Result, ServiceName, StackError};

/// Per-service build, archive and compose settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceSettings {
    /// Build recipe, relative to the stack root
    pub recipe: PathBuf,
    /// Tagged image reference
    pub image: String,
    /// Archive file name, relative to the artifacts directory
    pub archive: PathBuf,
    /// Service name in the compose file
    pub compose_name: String,
}

impl ServiceSettings {
    fn defaults_for(name: ServiceName) -> Self {
        ServiceSettings {
            recipe: PathBuf::from(format!("docker/{name}/Dockerfile")),
            image: format!("ragstack-{name}:latest"),
            archive: PathBuf::from(format!("{name}-image.tar")),
            compose_name: format!("{name}-server"),
        }
    }
}

/// Service settings as written in a file: any field may be left out.
#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct PartialSettings {
    recipe: Option<PathBuf>,
    image: Option<String>,
    archive: Option<PathBuf>,
    compose_name: Option<String>,
}

impl PartialSettings {
    fn merge(self, name: ServiceName) -> ServiceSettings {
        let defaults = ServiceSettings::defaults_for(name);
        ServiceSettings {
            recipe: self.recipe.unwrap_or(defaults.recipe),
            image: self.image.unwrap_or(defaults.image),
            archive: self.archive.unwrap_or(defaults.archive),
            compose_name: self.compose_name.unwrap_or(defaults.compose_name),
        }
    }
}

fn default_fastapi() -> ServiceSettings {
    ServiceSettings::defaults_for(ServiceName::Fastapi)
}

fn default_ollama() -> ServiceSettings {
    ServiceSettings::defaults_for(ServiceName::Ollama)
}

fn fastapi_settings<'de, D>(deserializer: D) -> std::result::Result<ServiceSettings, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(PartialSettings::deserialize(deserializer)?.merge(ServiceName::Fastapi))
}

fn ollama_settings<'de, D>(deserializer: D) -> std::result::Result<ServiceSettings, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(PartialSettings::deserialize(deserializer)?.merge(ServiceName::Ollama))
}

/// Stack-wide configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StackConfig {
    /// Working directory all relative paths resolve against
    pub root: PathBuf,
    /// Build-artifacts directory holding the image archives
    pub artifacts_dir: PathBuf,
    /// Data directory mounted into the services
    pub data_dir: PathBuf,
    /// Compose file declaring the services
    pub compose_file: PathBuf,
    /// Compose project name (compose derives one from the directory if unset)
    pub project_name: Option<String>,
    /// Start services in the background
    pub detach: bool,
    /// Per-service settings; omitted fields keep the service's defaults
    #[serde(deserialize_with = "fastapi_settings")]
    pub fastapi: ServiceSettings,
    #[serde(deserialize_with = "ollama_settings")]
    pub ollama: ServiceSettings,
}

impl Default for StackConfig {
    fn default() -> Self {
        StackConfig {
            root: PathBuf::from("."),
            artifacts_dir: PathBuf::from("build"),
            data_dir: PathBuf::from("data"),
            compose_file: PathBuf::from("docker-compose.yml"),
            project_name: None,
            detach: true,
            fastapi: default_fastapi(),
            ollama: default_ollama(),
        }
    }
}

impl StackConfig {
    /// Load configuration from `path` (if given) and the process environment.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let config = match path {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };
        Ok(config.with_overrides(|key| std::env::var(key).ok()))
    }

    /// Parse a JSON configuration file.
    pub fn from_file(path: &Path) -> Result<Self> {
        if !path.is_file() {
            return Err(StackError::PreconditionMissing {
                kind: "configuration file",
                path: path.to_path_buf(),
            });
        }
        debug!("Loading stack configuration from {:?}", path);
        let content = std::fs::read(path)?;
        let config: StackConfig = serde_json::from_slice(&content)?;
        Ok(config)
    }

    /// Apply `RAGSTACK_*` overrides from the given lookup.
    pub fn with_overrides<F>(mut self, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(root) = lookup("RAGSTACK_ROOT") {
            self.root = PathBuf::from(root);
        }
        if let Some(dir) = lookup("RAGSTACK_ARTIFACTS_DIR") {
            self.artifacts_dir = PathBuf::from(dir);
        }
        if let Some(dir) = lookup("RAGSTACK_DATA_DIR") {
            self.data_dir = PathBuf::from(dir);
        }
        if let Some(file) = lookup("RAGSTACK_COMPOSE_FILE") {
            self.compose_file = PathBuf::from(file);
        }
        if let Some(project) = lookup("RAGSTACK_PROJECT") {
            self.project_name = Some(project).filter(|p| !p.is_empty());
        }
        self
    }

    /// Set the stack root
    pub fn with_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.root = root.into();
        self
    }

    pub fn settings(&self, name: ServiceName) -> &ServiceSettings {
        match name {
            ServiceName::Fastapi => &self.fastapi,
            ServiceName::Ollama => &self.ollama,
        }
    }

    pub fn artifacts_path(&self) -> PathBuf {
        self.root.join(&self.artifacts_dir)
    }

    pub fn data_path(&self) -> PathBuf {
        self.root.join(&self.data_dir)
    }

    pub fn compose_path(&self) -> PathBuf {
        self.root.join(&self.compose_file)
    }

    /// Reject settings that can never produce a working run.
    pub fn validate(&self) -> Result<()> {
        for name in ServiceName::DECLARED {
            let settings = self.settings(name);
            if settings.image.trim().is_empty() {
                return Err(StackError::Config(format!("{name}: image must not be empty")));
            }
            if settings.compose_name.trim().is_empty() {
                return Err(StackError::Config(format!(
                    "{name}: compose_name must not be empty"
                )));
            }
            if settings.archive.as_os_str().is_empty() {
                return Err(StackError::Config(format!("{name}: archive must not be empty")));
            }
        }
        Ok(())
    }
}
