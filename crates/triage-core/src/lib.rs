//! Failure triage for conversational ordering agents.
//!
//! Traces of completed agent sessions flow in from a session feed; this
//! crate classifies what the caller wanted, verifies whether it actually
//! happened, and for the failures runs a category-expert investigation with
//! a replay harness to produce an explained, actionable diagnosis.
//!
//! Layout mirrors the flow: `domain` holds the records, `ports` the seams
//! to collaborators, the stage modules (`classify`, `verify`, `diagnose`,
//! `replay`) the pipeline itself, `monitor` the scheduler that drives it,
//! and `impls` in-memory adapters for tests and the demo binary.

pub mod classify;
pub mod config;
pub mod diagnose;
pub mod domain;
pub mod impls;
pub mod monitor;
pub mod ports;
pub mod replay;
pub mod service;
pub mod status;
pub mod verify;

pub use classify::{classify_intent, LlmIntentModel};
pub use config::{ConfigError, TriageConfig};
pub use diagnose::{CategoryExpert, DiagnosisEngine, ExpertRegistry};
pub use domain::{
    Category, DiagnosisResult, FulfillmentCheck, Intent, IntentClassification, MonitoringRun,
    SessionId, Trace, TraceId, TriageError, Verdict,
};
pub use monitor::{InFlightRegistry, MonitoringScheduler, SchedulerHandle};
pub use replay::{ErrorSignature, HttpTarget, MockTarget, ReplayHarness};
pub use service::{PipelineOutcome, TriagePipeline, TriageService};
pub use status::{DashboardSnapshot, StatusBoard, Trend};
pub use verify::Verifier;
