//! Shared data model for the orchestration kernel workspace.
//!
//! Every `hippoforge-*` crate depends on this one for the types that cross
//! component boundaries: tasks, provenance, the project profile, AST nodes,
//! telemetry events, coverage spectra, deliberation results, and the
//! handoff/exit-report pair used by the git role dispatcher.

pub mod ast;
pub mod coverage;
pub mod deliberation;
pub mod error;
pub mod handoff;
pub mod intent;
pub mod profile;
pub mod provenance;
pub mod task;
pub mod telemetry;

pub use ast::{ApiEdgeKind, AstNode, NodeType};
pub use coverage::{CoverageSpectrum, TestOutcome};
pub use deliberation::{DeliberationResult, DeliberationStep};
pub use error::OrchestratorError;
pub use handoff::{ExitReport, HandoffProtocol, HandoffStatus};
pub use intent::Intent;
pub use profile::ProjectProfile;
pub use provenance::{AuthorSignature, Role};
pub use task::{flag_name, intent_for_flag_name, Task, TaskStatus, TaskTable};
pub use telemetry::{TelemetryEvent, TelemetryEventType};
