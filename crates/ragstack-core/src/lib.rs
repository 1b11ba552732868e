//! RAG stack orchestration core
//!
//! Decides, per service, whether to build or restore an image, whether a
//! build changed anything, whether the result must be archived, and finally
//! brings the selected services up through the compose supervisor.
//!
//! Backends (build, probe, archive, launch) are injected through the traits
//! in [`backend`]; the docker implementations live in `docker-env-manager`.

pub mod backend;
pub mod change;
pub mod config;
pub mod domain;
pub mod driver;
pub mod fakes;
pub mod obs;
pub mod telemetry;
pub mod workspace;

pub use backend::{Backends, ImageArchiver, ImageBuilder, ImageProber, ServiceLauncher, ToolCheck};
pub use change::classify;
pub use config::{ServiceSettings, StackConfig};
pub use domain::{
    Abort, BuildOutcome, ImageIdentity, ImageRef, LaunchSelector, Mode, Result, RunReport,
    RunRequest, RunState, ServiceAction, ServiceCatalog, ServiceDescriptor, ServiceName,
    ServiceReport, ServiceSelector, StackError, Step,
};
pub use driver::Orchestrator;
pub use telemetry::init_tracing;
pub use workspace::{ensure_file, Workspace};
