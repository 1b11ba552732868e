//! Domain types for stack orchestration.

pub mod error;
pub mod image;
pub mod report;
pub mod request;
pub mod service;

pub use error::{Result, StackError};
pub use image::{BuildOutcome, ImageIdentity, ImageRef};
pub use report::{Abort, RunReport, RunState, ServiceAction, ServiceReport, Step};
pub use request::{LaunchSelector, Mode, RunRequest, ServiceName, ServiceSelector};
pub use service::{ServiceCatalog, ServiceDescriptor};
