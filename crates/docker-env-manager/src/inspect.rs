//! Image identity probing via `docker image inspect`.

use async_trait::async_trait;
use ragstack_core::{ImageIdentity, ImageProber, ImageRef, StackError};
use serde::Deserialize;
use tracing::debug;

use crate::error::DockerError;
use crate::DockerBackend;

/// The subset of `docker image inspect` output we rely on.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ImageInspect {
    /// Content-derived image ID (`sha256:...`)
    pub id: String,
    /// Tags pointing at this image
    #[serde(default)]
    pub repo_tags: Vec<String>,
    /// Creation timestamp
    #[serde(default)]
    pub created: Option<String>,
}

pub fn inspect_args(image: &ImageRef) -> Vec<String> {
    vec![
        "image".to_string(),
        "inspect".to_string(),
        image.as_str().to_string(),
    ]
}

/// Parse the JSON array printed by `docker image inspect`.
pub fn parse_inspect(stdout: &str) -> Result<ImageIdentity, DockerError> {
    let images: Vec<ImageInspect> = serde_json::from_str(stdout)?;
    match images.into_iter().next() {
        Some(image) if !image.id.trim().is_empty() => Ok(ImageIdentity::Present(image.id)),
        Some(_) => Err(DockerError::UnexpectedOutput(
            "image inspect returned an empty Id".to_string(),
        )),
        None => Ok(ImageIdentity::Absent),
    }
}

/// Whether stderr reports that the reference has no image.
pub fn is_missing_image(stderr: &str) -> bool {
    let stderr = stderr.to_ascii_lowercase();
    stderr.contains("no such image") || stderr.contains("no such object")
}

#[async_trait]
impl ImageProber for DockerBackend {
    async fn probe(&self, image: &ImageRef) -> ragstack_core::Result<ImageIdentity> {
        let output = self
            .cli
            .run(&inspect_args(image))
            .await
            .map_err(|e| e.into_stack("probe", image.as_str()))?;

        if output.success() {
            let identity =
                parse_inspect(&output.stdout).map_err(|e| e.into_stack("probe", image.as_str()))?;
            debug!("Image {} has identity {}", image, identity.short());
            return Ok(identity);
        }

        if is_missing_image(&output.stderr) {
            debug!("Image {} is absent", image);
            return Ok(ImageIdentity::Absent);
        }

        Err(StackError::ToolUnavailable {
            tool: "docker daemon".to_string(),
            reason: output.failure_reason(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_inspect_present() {
        let stdout = r#"[
            {
                "Id": "sha256:9b2a4f5c1d7e",
                "RepoTags": ["ragstack-ollama:latest"],
                "Created": "2026-10-01T08:12:44.512Z",
                "Size": 1873401234
            }
        ]"#;
        let identity = parse_inspect(stdout).unwrap();
        assert_eq!(
            identity,
            ImageIdentity::Present("sha256:9b2a4f5c1d7e".to_string())
        );
    }

    #[test]
    fn test_parse_inspect_empty_array_is_absent() {
        assert_eq!(parse_inspect("[]").unwrap(), ImageIdentity::Absent);
    }

    #[test]
    fn test_parse_inspect_rejects_garbage() {
        assert!(matches!(
            parse_inspect("not json"),
            Err(DockerError::Json(_))
        ));
        assert!(matches!(
            parse_inspect(r#"[{"Id": ""}]"#),
            Err(DockerError::UnexpectedOutput(_))
        ));
    }

    #[test]
    fn test_missing_image_messages() {
        assert!(is_missing_image(
            "Error: No such image: ragstack-fastapi:latest"
        ));
        assert!(is_missing_image(
            "Error response from daemon: No such object: ragstack-fastapi:latest"
        ));
        assert!(!is_missing_image(
            "Cannot connect to the Docker daemon at unix:///var/run/docker.sock"
        ));
    }

    #[test]
    fn test_inspect_args() {
        let args = inspect_args(&ImageRef::new("ragstack-ollama:latest"));
        assert_eq!(args, vec!["image", "inspect", "ragstack-ollama:latest"]);
    }
}
