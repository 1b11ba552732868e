//! Service launch via `docker compose up`.

use async_trait::async_trait;
use ragstack_core::{ensure_file, LaunchSelector, ServiceLauncher};
use tracing::info;

use crate::config::DockerConfig;
use crate::DockerBackend;

/// Arguments for `docker compose ... up`.
///
/// `LaunchSelector::All` passes no service names, so compose starts every
/// declared service in its own dependency order.
pub fn up_args(config: &DockerConfig, selector: &LaunchSelector) -> Vec<String> {
    let mut args = vec![
        "compose".to_string(),
        "--file".to_string(),
        config.compose_file.to_string_lossy().to_string(),
    ];
    if let Some(project) = &config.project_name {
        args.push("--project-name".to_string());
        args.push(project.clone());
    }
    args.push("up".to_string());
    if config.detach {
        args.push("--detach".to_string());
    }
    if let LaunchSelector::Services(names) = selector {
        args.extend(names.iter().cloned());
    }
    args
}

#[async_trait]
impl ServiceLauncher for DockerBackend {
    async fn launch(&self, selector: &LaunchSelector) -> ragstack_core::Result<()> {
        ensure_file("compose file", &self.config.compose_file)?;
        info!(
            "Starting {} via {:?}",
            selector, self.config.compose_file
        );

        let output = self
            .cli
            .run_checked(&up_args(&self.config, selector))
            .await
            .map_err(|e| e.into_stack("launch", selector.to_string()))?;

        info!("Services up ({}) in {} ms", selector, output.duration_ms);
        Ok(())
    }
}
