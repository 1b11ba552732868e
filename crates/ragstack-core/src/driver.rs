//! Orchestration driver.
//!
//! One run walks `Validate -> Preflight -> per-service pipeline -> Launch`,
//! resolving the selector into descriptors after preflight. The per-service
//! pipeline is
//!
//! - online: `probe -> build -> probe -> classify -> (save iff Updated)`
//! - offline: `restore`
//!
//! Services run strictly one after another, in declaration order. The first
//! failing step aborts the run: later services are not touched and the
//! launcher is never invoked. Nothing is retried.

use std::time::Instant;
use tracing::{info, info_span, Instrument};

use crate::backend::Backends;
use crate::change::classify;
use crate::config::StackConfig;
use crate::domain::{
    BuildOutcome, Mode, Result, RunReport, RunRequest, ServiceAction, ServiceCatalog,
    ServiceDescriptor, ServiceReport, StackError, Step,
};
use crate::obs;
use crate::workspace::{ensure_file, Workspace};

/// A failed step inside a service pipeline.
struct StepFailure {
    step: Step,
    error: StackError,
}

impl StepFailure {
    fn at(step: Step) -> impl FnOnce(StackError) -> StepFailure {
        move |error| StepFailure { step, error }
    }
}

/// Drives build/restore pipelines and the final launch.
pub struct Orchestrator {
    catalog: ServiceCatalog,
    workspace: Workspace,
    backends: Backends,
}

impl Orchestrator {
    pub fn new(catalog: ServiceCatalog, workspace: Workspace, backends: Backends) -> Self {
        Self {
            catalog,
            workspace,
            backends,
        }
    }

    pub fn from_config(config: &StackConfig, backends: Backends) -> Result<Self> {
        let catalog = ServiceCatalog::from_config(config)?;
        Ok(Self::new(catalog, Workspace::from_config(config), backends))
    }

    pub fn catalog(&self) -> &ServiceCatalog {
        &self.catalog
    }

    /// Run from raw CLI values. Invalid input aborts before any backend call.
    pub async fn execute(&self, service: &str, mode: &str) -> RunReport {
        let started = Instant::now();
        let report = RunReport::start();
        match RunRequest::parse(service, mode) {
            Ok(request) => self.drive(request, report, started).await,
            Err(error) => finish(report.abort(Step::Validate, None, error), started),
        }
    }

    /// Run an already validated request.
    pub async fn run(&self, request: RunRequest) -> RunReport {
        self.drive(request, RunReport::start(), Instant::now()).await
    }

    async fn drive(
        &self,
        request: RunRequest,
        mut report: RunReport,
        started: Instant,
    ) -> RunReport {
        report.request = Some(request);
        obs::emit_run_started(&report.run_id.to_string(), &request);

        if let Err(error) = self.preflight().await {
            return finish(report.abort(Step::Preflight, None, error), started);
        }

        let descriptors = self.catalog.resolve(request.service_selector);
        info!(
            services = ?descriptors.iter().map(|d| d.name.as_str()).collect::<Vec<_>>(),
            mode = %request.mode,
            "Resolved services"
        );

        for descriptor in descriptors {
            let span = info_span!("service", service = %descriptor.name);
            let result = match request.mode {
                Mode::Online => self.run_online(descriptor).instrument(span).await,
                Mode::Offline => self.run_offline(descriptor).instrument(span).await,
            };
            match result {
                Ok(service_report) => report.services.push(service_report),
                Err(failure) => {
                    return finish(
                        report.abort(failure.step, Some(descriptor.name), failure.error),
                        started,
                    );
                }
            }
        }

        let selector = self.catalog.launch_selector(request.service_selector);
        info!(selector = %selector, "Launching services");
        if let Err(error) = self.backends.launcher.launch(&selector).await {
            return finish(report.abort(Step::Launch, None, error), started);
        }
        report.launched = Some(selector);

        finish(report, started)
    }

    async fn preflight(&self) -> Result<()> {
        self.workspace.prepare()?;
        self.backends.tools.ensure_tools().await
    }

    async fn run_online(
        &self,
        descriptor: &ServiceDescriptor,
    ) -> std::result::Result<ServiceReport, StepFailure> {
        let name = descriptor.name;
        let image = &descriptor.image_reference;

        ensure_file("build recipe", &descriptor.build_recipe_path)
            .map_err(StepFailure::at(Step::Build))?;

        obs::emit_step(name, Step::Probe);
        let before = self
            .backends
            .prober
            .probe(image)
            .await
            .map_err(StepFailure::at(Step::Probe))?;

        obs::emit_step(name, Step::Build);
        self.backends
            .builder
            .build(&descriptor.build_recipe_path, image)
            .await
            .map_err(StepFailure::at(Step::Build))?;

        obs::emit_step(name, Step::Probe);
        let after = self
            .backends
            .prober
            .probe(image)
            .await
            .map_err(StepFailure::at(Step::Probe))?;

        let outcome = classify(&before, &after);
        obs::emit_build_outcome(name, &before, &after, &outcome);

        let archived = match &outcome {
            BuildOutcome::Failed(reason) => {
                return Err(StepFailure {
                    step: Step::Classify,
                    error: StackError::IdentityUnresolvable {
                        image: image.to_string(),
                        reason: reason.clone(),
                    },
                });
            }
            BuildOutcome::Unchanged => {
                obs::emit_archive_skipped(name);
                false
            }
            BuildOutcome::Updated => {
                obs::emit_step(name, Step::Save);
                self.backends
                    .archiver
                    .save(image, &descriptor.archive_path)
                    .await
                    .map_err(StepFailure::at(Step::Save))?;
                info!("Archived {} to {:?}", image, descriptor.archive_path);
                true
            }
        };

        Ok(ServiceReport {
            service: name,
            action: ServiceAction::Built {
                outcome,
                before,
                after,
                archived,
            },
        })
    }

    async fn run_offline(
        &self,
        descriptor: &ServiceDescriptor,
    ) -> std::result::Result<ServiceReport, StepFailure> {
        ensure_file("image archive", &descriptor.archive_path)
            .map_err(StepFailure::at(Step::Restore))?;

        obs::emit_step(descriptor.name, Step::Restore);
        self.backends
            .archiver
            .restore(&descriptor.archive_path)
            .await
            .map_err(StepFailure::at(Step::Restore))?;

        Ok(ServiceReport {
            service: descriptor.name,
            action: ServiceAction::Restored,
        })
    }
}

fn finish(report: RunReport, started: Instant) -> RunReport {
    let run_id = report.run_id.to_string();
    if let Some(abort) = report.abort_info() {
        obs::emit_run_aborted(&run_id, abort);
    }
    obs::emit_run_finished(
        &run_id,
        started.elapsed().as_millis() as u64,
        report.services.len(),
        report.succeeded(),
    );
    report
}
