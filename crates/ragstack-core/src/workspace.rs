//! Working-directory layout: artifacts and data directories, file preconditions.

use std::path::{Path, PathBuf};
use tracing::{debug, info};

use crate::config::StackConfig;
use crate::domain::{Result, StackError};

/// Directories the stack reads from and writes to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Workspace {
    pub root: PathBuf,
    pub artifacts_dir: PathBuf,
    pub data_dir: PathBuf,
}

impl Workspace {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        let root = root.into();
        Self {
            artifacts_dir: root.join("build"),
            data_dir: root.join("data"),
            root,
        }
    }

    pub fn from_config(config: &StackConfig) -> Self {
        Self {
            root: config.root.clone(),
            artifacts_dir: config.artifacts_path(),
            data_dir: config.data_path(),
        }
    }

    /// Create the artifacts and data directories if absent.
    pub fn prepare(&self) -> Result<()> {
        for dir in [&self.artifacts_dir, &self.data_dir] {
            if dir.is_dir() {
                debug!("Directory {:?} already exists", dir);
                continue;
            }
            std::fs::create_dir_all(dir)?;
            info!("Created directory {:?}", dir);
        }
        Ok(())
    }
}

/// Fail with `PreconditionMissing` unless `path` is a regular file.
pub fn ensure_file(kind: &'static str, path: &Path) -> Result<()> {
    if path.is_file() {
        Ok(())
    } else {
        Err(StackError::PreconditionMissing {
            kind,
            path: path.to_path_buf(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_prepare_creates_directories() {
        let dir = tempdir().unwrap();
        let workspace = Workspace::new(dir.path());

        workspace.prepare().unwrap();
        assert!(dir.path().join("build").is_dir());
        assert!(dir.path().join("data").is_dir());

        // Second call is a no-op
        workspace.prepare().unwrap();
    }

    #[test]
    fn test_prepare_uses_configured_paths() {
        let dir = tempdir().unwrap();
        let mut config = StackConfig::default().with_root(dir.path());
        config.artifacts_dir = PathBuf::from("out/images");

        Workspace::from_config(&config).prepare().unwrap();
        assert!(dir.path().join("out/images").is_dir());
    }

    #[test]
    fn test_ensure_file() {
        let dir = tempdir().unwrap();
        let file = dir.path().join("Dockerfile");
        std::fs::write(&file, "FROM scratch\n").unwrap();

        assert!(ensure_file("build recipe", &file).is_ok());

        // A directory is not a recipe
        let err = ensure_file("build recipe", dir.path()).unwrap_err();
        assert!(matches!(
            err,
            StackError::PreconditionMissing {
                kind: "build recipe",
                ..
            }
        ));
    }
}
