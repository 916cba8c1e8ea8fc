//! Domain model (IDs, traces, classifications, diagnosis records, errors).

pub mod diagnosis;
pub mod errors;
pub mod fulfillment;
pub mod ids;
pub mod intent;
pub mod monitoring;
pub mod replay;
pub mod trace;

pub use diagnosis::{
    Category, CheckStatus, DiagnosisResult, FixChange, FixProposal, FixTestResult,
    InvestigationCheck, ProblematicItem,
};
pub use errors::TriageError;
pub use fulfillment::{FulfillmentCheck, Verdict};
pub use ids::{DiagnosisId, RunId, SessionId, TraceId};
pub use intent::{Intent, IntentClassification};
pub use monitoring::MonitoringRun;
pub use replay::{ReplayResult, ReplayVerdict, TargetKind};
pub use trace::{RecordedRequest, Step, StepResponse, StepStatus, Trace};
