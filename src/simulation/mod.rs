//! Simulated charging and certificate workflows.
//!
//! Everything in here is synchronous and clock-free: progress is pushed in
//! from the outside and every other piece of state is derived from it.

pub mod bundle;
pub mod driver;
pub mod log;
pub mod milestones;
pub mod status;
pub mod steps;
pub mod synthesizer;
pub mod workflow;

pub use bundle::{CertificateDescriptor, CertificateStatus, TransferStatus};
pub use driver::{Session, SessionSnapshot, TickOutcome};
pub use log::{EventLog, LogEntry, LogStatus};
pub use status::ControllerStatus;
pub use steps::{Step, StepStatus};
pub use workflow::{ChargingAction, WorkflowCatalog, WorkflowDefinition, WorkflowKind};
