//! Structured lifecycle events for orchestration runs.
//!
//! Every event carries an `event` field so log pipelines can filter on it,
//! independent of the human-readable message.

use tracing::{error, info};

use crate::domain::{Abort, BuildOutcome, ImageIdentity, RunRequest, ServiceName, Step};

/// Emit event: run started.
pub fn emit_run_started(run_id: &str, request: &RunRequest) {
    info!(
        event = "run.started",
        run_id = %run_id,
        service = %request.service_selector,
        mode = %request.mode,
    );
}

/// Emit event: a pipeline step is about to run for a service.
pub fn emit_step(service: ServiceName, step: Step) {
    info!(event = "service.step", service = %service, step = %step);
}

/// Emit event: a build was classified.
pub fn emit_build_outcome(
    service: ServiceName,
    before: &ImageIdentity,
    after: &ImageIdentity,
    outcome: &BuildOutcome,
) {
    info!(
        event = "service.build_outcome",
        service = %service,
        before = %before.short(),
        after = %after.short(),
        outcome = outcome.name(),
    );
}

/// Emit event: archive write skipped because the image did not change.
pub fn emit_archive_skipped(service: ServiceName) {
    info!(event = "service.archive_skipped", service = %service);
}

/// Emit event: run aborted at its first failing step.
pub fn emit_run_aborted(run_id: &str, abort: &Abort) {
    error!(
        event = "run.aborted",
        run_id = %run_id,
        step = %abort.step,
        service = ?abort.service.map(|s| s.as_str()),
        category = abort.error.category(),
        error = %abort.error,
    );
}

/// Emit event: run finished.
pub fn emit_run_finished(run_id: &str, duration_ms: u64, services: usize, success: bool) {
    info!(
        event = "run.finished",
        run_id = %run_id,
        duration_ms = duration_ms,
        services = services,
        success = success,
    );
}
