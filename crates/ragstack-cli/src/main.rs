//! ragstack - build, archive and launch the RAG service stack
//!
//! ```text
//! ragstack [SERVICE] [MODE]
//! ```
//!
//! - `SERVICE`: `fastapi`, `ollama` or `all` (default `all`)
//! - `MODE`: `online` builds images and archives changed ones, `offline`
//!   restores images from their archives (default `online`)
//!
//! Exits 0 when every selected service was prepared and launched, 1 otherwise.

use anyhow::{Context, Result};
use clap::Parser;
use docker_env_manager::{is_compose_available, is_docker_available, DockerBackend};
use ragstack_core::{
    Backends, BuildOutcome, Orchestrator, RunReport, ServiceAction, StackConfig,
};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{debug, Level};

#[derive(Parser)]
#[command(name = "ragstack")]
#[command(author = "Stevedores Org")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Build, archive and launch the RAG service stack", long_about = None)]
struct Cli {
    /// Service to prepare: fastapi, ollama or all
    #[arg(default_value = "all")]
    service: String,

    /// online (build and archive) or offline (restore from archives)
    #[arg(default_value = "online")]
    mode: String,

    /// JSON configuration file
    #[arg(short, long, env = "RAGSTACK_CONFIG")]
    config: Option<PathBuf>,

    /// Stack root directory (overrides the configuration)
    #[arg(long, env = "RAGSTACK_ROOT")]
    root: Option<PathBuf>,

    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,

    /// Emit JSON log lines and a JSON run summary
    #[arg(long)]
    json: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let level = if cli.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };
    ragstack_core::init_tracing(cli.json, level);

    let mut config =
        StackConfig::load(cli.config.as_deref()).context("Failed to load stack configuration")?;
    if let Some(root) = cli.root {
        config = config.with_root(root);
    }
    debug!(?config, "Stack configuration");
    if cli.verbose {
        debug!(
            docker = is_docker_available(),
            compose = is_compose_available(),
            "Container tooling"
        );
    }

    let backends = Backends::shared(Arc::new(DockerBackend::from_stack(&config)));
    let orchestrator =
        Orchestrator::from_config(&config, backends).context("Invalid service catalog")?;

    let report = orchestrator.execute(&cli.service, &cli.mode).await;

    if cli.json {
        println!("{}", serde_json::to_string_pretty(&report.summary_json())?);
    } else {
        print_summary(&report);
    }

    if !report.succeeded() {
        std::process::exit(report.exit_code());
    }
    Ok(())
}

fn print_summary(report: &RunReport) {
    for service in &report.services {
        match &service.action {
            ServiceAction::Built {
                outcome,
                after,
                archived,
                ..
            } => {
                let archive = if *archived { "archived" } else { "archive kept" };
                match outcome {
                    BuildOutcome::Failed(reason) => {
                        println!("{:<8} build failed: {}", service.service, reason)
                    }
                    _ => println!(
                        "{:<8} {} ({}, {})",
                        service.service,
                        outcome.name(),
                        after.short(),
                        archive
                    ),
                }
            }
            ServiceAction::Restored => println!("{:<8} restored from archive", service.service),
        }
    }

    match (report.abort_info(), &report.launched) {
        (Some(abort), _) => eprintln!("Error: {}", abort),
        (None, Some(selector)) => println!("Launched {}", selector),
        (None, None) => {}
    }
}
