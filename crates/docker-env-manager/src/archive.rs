//! Image archives via `docker save` / `docker load`.
//!
//! Saves go to a `.partial` sibling first and are renamed over the archive
//! only once docker reports success, so an archive on disk is always a
//! complete snapshot of one image.

use async_trait::async_trait;
use ragstack_core::{ImageArchiver, ImageRef};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

use crate::error::DockerError;
use crate::DockerBackend;

/// Temporary file a save writes to before it replaces `archive`.
pub fn partial_path(archive: &Path) -> PathBuf {
    let mut name = archive
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_default();
    name.push(".partial");
    archive.with_file_name(name)
}

pub fn save_args(image: &ImageRef, output: &Path) -> Vec<String> {
    vec![
        "save".to_string(),
        "--output".to_string(),
        output.to_string_lossy().to_string(),
        image.as_str().to_string(),
    ]
}

pub fn load_args(archive: &Path) -> Vec<String> {
    vec![
        "load".to_string(),
        "--input".to_string(),
        archive.to_string_lossy().to_string(),
    ]
}

/// Image references (or IDs, for untagged images) reported by `docker load`.
pub fn parse_loaded_images(stdout: &str) -> Vec<String> {
    stdout
        .lines()
        .filter_map(|line| {
            let line = line.trim();
            line.strip_prefix("Loaded image: ")
                .or_else(|| line.strip_prefix("Loaded image ID: "))
        })
        .map(|reference| reference.trim().to_string())
        .collect()
}

impl DockerBackend {
    async fn write_archive(
        &self,
        image: &ImageRef,
        partial: &Path,
        archive: &Path,
    ) -> Result<(), DockerError> {
        self.cli.run_checked(&save_args(image, partial)).await?;
        tokio::fs::rename(partial, archive).await?;
        Ok(())
    }
}

#[async_trait]
impl ImageArchiver for DockerBackend {
    async fn save(&self, image: &ImageRef, archive: &Path) -> ragstack_core::Result<()> {
        info!("Saving {} to {:?}", image, archive);
        if let Some(parent) = archive.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        let partial = partial_path(archive);
        if let Err(e) = self.write_archive(image, &partial, archive).await {
            if tokio::fs::remove_file(&partial).await.is_ok() {
                debug!("Removed incomplete archive {:?}", partial);
            }
            return Err(e.into_stack("save", image.as_str()));
        }
        Ok(())
    }

    async fn restore(&self, archive: &Path) -> ragstack_core::Result<()> {
        info!("Loading image archive {:?}", archive);
        let target = archive.display().to_string();

        let output = self
            .cli
            .run_checked(&load_args(archive))
            .await
            .map_err(|e| e.into_stack("load", target.as_str()))?;

        let loaded = parse_loaded_images(&output.stdout);
        if loaded.is_empty() {
            warn!("docker load reported no images for {:?}", archive);
        }
        for reference in loaded {
            info!("Loaded image {}", reference);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_path_is_sibling() {
        let partial = partial_path(Path::new("/srv/rag/build/ollama-image.tar"));
        assert_eq!(
            partial,
            PathBuf::from("/srv/rag/build/ollama-image.tar.partial")
        );
    }

    #[test]
    fn test_save_and_load_args() {
        let image = ImageRef::new("ragstack-ollama:latest");
        assert_eq!(
            save_args(&image, Path::new("build/ollama-image.tar.partial")),
            vec![
                "save",
                "--output",
                "build/ollama-image.tar.partial",
                "ragstack-ollama:latest"
            ]
        );
        assert_eq!(
            load_args(Path::new("build/ollama-image.tar")),
            vec!["load", "--input", "build/ollama-image.tar"]
        );
    }

    #[test]
    fn test_parse_loaded_images() {
        let stdout = "Loaded image: ragstack-fastapi:latest\n\
                      Loaded image ID: sha256:5d1f0c\n\
                      some progress line\n";
        assert_eq!(
            parse_loaded_images(stdout),
            vec!["ragstack-fastapi:latest", "sha256:5d1f0c"]
        );
        assert!(parse_loaded_images("").is_empty());
    }

    #[cfg(unix)]
    mod with_stub {
        use super::*;
        use crate::config::DockerConfig;
        use crate::test_support::stub_docker;

        // `docker save --output <path> <image>`: $3 is the output path.
        fn backend(dir: &Path, script: &str) -> DockerBackend {
            let binary = stub_docker(dir, script);
            DockerBackend::new(DockerConfig::default().with_binary(&binary))
        }

        #[tokio::test]
        async fn test_save_replaces_archive_atomically() {
            let dir = tempfile::tempdir().unwrap();
            let archive = dir.path().join("build/fastapi-image.tar");
            std::fs::create_dir_all(archive.parent().unwrap()).unwrap();
            std::fs::write(&archive, "old").unwrap();

            let docker = backend(dir.path(), r#"printf new > "$3""#);
            docker
                .save(&ImageRef::new("ragstack-fastapi:latest"), &archive)
                .await
                .unwrap();

            assert_eq!(std::fs::read_to_string(&archive).unwrap(), "new");
            assert!(!partial_path(&archive).exists());
        }

        #[tokio::test]
        async fn test_failed_save_keeps_previous_archive() {
            let dir = tempfile::tempdir().unwrap();
            let archive = dir.path().join("fastapi-image.tar");
            std::fs::write(&archive, "old").unwrap();

            let docker = backend(
                dir.path(),
                r#"printf half > "$3"; echo 'Error response from daemon: disk full' >&2; exit 1"#,
            );
            let err = docker
                .save(&ImageRef::new("ragstack-fastapi:latest"), &archive)
                .await
                .unwrap_err();

            assert_eq!(err.category(), "backend_failure");
            assert_eq!(std::fs::read_to_string(&archive).unwrap(), "old");
            assert!(!partial_path(&archive).exists());
        }

        #[tokio::test]
        async fn test_failed_rename_is_backend_failure_and_cleans_up() {
            let dir = tempfile::tempdir().unwrap();
            // A non-empty directory in the archive's place cannot be renamed over.
            let archive = dir.path().join("fastapi-image.tar");
            std::fs::create_dir_all(archive.join("occupied")).unwrap();

            let docker = backend(dir.path(), r#"printf new > "$3""#);
            let err = docker
                .save(&ImageRef::new("ragstack-fastapi:latest"), &archive)
                .await
                .unwrap_err();

            assert_eq!(err.category(), "backend_failure");
            assert!(!partial_path(&archive).exists());
        }

        #[tokio::test]
        async fn test_failed_load_is_backend_failure() {
            let dir = tempfile::tempdir().unwrap();
            let archive = dir.path().join("ollama-image.tar");
            std::fs::write(&archive, "garbage").unwrap();

            let docker = backend(
                dir.path(),
                "echo 'archive/tar: invalid tar header' >&2; exit 1",
            );
            let err = docker.restore(&archive).await.unwrap_err();
            assert_eq!(err.category(), "backend_failure");
        }
    }
}
