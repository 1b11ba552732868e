//! Image builds via `docker build`.

use async_trait::async_trait;
use ragstack_core::{ImageBuilder, ImageRef};
use std::path::Path;
use tracing::info;

use crate::DockerBackend;

pub fn build_args(recipe: &Path, image: &ImageRef, context: &Path) -> Vec<String> {
    vec![
        "build".to_string(),
        "--file".to_string(),
        recipe.to_string_lossy().to_string(),
        "--tag".to_string(),
        image.as_str().to_string(),
        context.to_string_lossy().to_string(),
    ]
}

#[async_trait]
impl ImageBuilder for DockerBackend {
    async fn build(&self, recipe: &Path, image: &ImageRef) -> ragstack_core::Result<()> {
        info!("Building {} from {:?}", image, recipe);

        let output = self
            .cli
            .run_checked(&build_args(recipe, image, &self.config.context_dir))
            .await
            .map_err(|e| e.into_stack("build", image.as_str()))?;

        info!("Built {} in {} ms", image, output.duration_ms);
        Ok(())
    }
}
