//! Aggregate result of an orchestration run.

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::json;
use uuid::Uuid;

use super::error::StackError;
use super::image::{BuildOutcome, ImageIdentity};
use super::request::{LaunchSelector, RunRequest, ServiceName};

/// A step of the orchestration state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Step {
    Validate,
    Preflight,
    Probe,
    Build,
    Classify,
    Save,
    Restore,
    Launch,
}

impl Step {
    pub fn name(&self) -> &'static str {
        match self {
            Step::Validate => "validate",
            Step::Preflight => "preflight",
            Step::Probe => "probe",
            Step::Build => "build",
            Step::Classify => "classify",
            Step::Save => "save",
            Step::Restore => "restore",
            Step::Launch => "launch",
        }
    }
}

impl std::fmt::Display for Step {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// What happened to one service during its pipeline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum ServiceAction {
    Built {
        outcome: BuildOutcome,
        before: ImageIdentity,
        after: ImageIdentity,
        archived: bool,
    },
    Restored,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ServiceReport {
    pub service: ServiceName,
    #[serde(flatten)]
    pub action: ServiceAction,
}

/// The first failing step of an aborted run.
#[derive(Debug)]
pub struct Abort {
    pub step: Step,
    pub service: Option<ServiceName>,
    pub error: StackError,
}

impl std::fmt::Display for Abort {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.service {
            Some(service) => write!(
                f,
                "{} step failed for {}: {}",
                self.step, service, self.error
            ),
            None => write!(f, "{} step failed: {}", self.step, self.error),
        }
    }
}

/// Terminal state of a run.
#[derive(Debug)]
pub enum RunState {
    Done,
    Aborted(Abort),
}

/// Result of one orchestration run.
#[derive(Debug)]
pub struct RunReport {
    pub run_id: Uuid,
    pub started_at: DateTime<Utc>,
    pub request: Option<RunRequest>,
    pub services: Vec<ServiceReport>,
    pub launched: Option<LaunchSelector>,
    pub state: RunState,
}

impl RunReport {
    pub(crate) fn start() -> Self {
        Self {
            run_id: Uuid::new_v4(),
            started_at: Utc::now(),
            request: None,
            services: Vec::new(),
            launched: None,
            state: RunState::Done,
        }
    }

    pub(crate) fn abort(
        mut self,
        step: Step,
        service: Option<ServiceName>,
        error: StackError,
    ) -> Self {
        self.state = RunState::Aborted(Abort {
            step,
            service,
            error,
        });
        self
    }

    pub fn succeeded(&self) -> bool {
        matches!(self.state, RunState::Done)
    }

    pub fn abort_info(&self) -> Option<&Abort> {
        match &self.state {
            RunState::Done => None,
            RunState::Aborted(abort) => Some(abort),
        }
    }

    /// Process exit status: 0 on full success, 1 on any failure.
    pub fn exit_code(&self) -> i32 {
        if self.succeeded() {
            0
        } else {
            1
        }
    }

    /// Number of archives written during this run.
    pub fn archives_written(&self) -> usize {
        self.services
            .iter()
            .filter(|s| matches!(s.action, ServiceAction::Built { archived: true, .. }))
            .count()
    }

    pub fn service(&self, name: ServiceName) -> Option<&ServiceReport> {
        self.services.iter().find(|s| s.service == name)
    }

    /// Machine-readable summary of the run.
    pub fn summary_json(&self) -> serde_json::Value {
        let abort = self.abort_info().map(|a| {
            json!({
                "step": a.step,
                "service": a.service,
                "category": a.error.category(),
                "error": a.error.to_string(),
            })
        });

        json!({
            "run_id": self.run_id.to_string(),
            "started_at": self.started_at.to_rfc3339(),
            "request": self.request,
            "services": self.services,
            "launched": self.launched,
            "success": self.succeeded(),
            "exit_code": self.exit_code(),
            "aborted": abort,
        })
    }
}
