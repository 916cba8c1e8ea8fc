//! Error taxonomy.
//!
//! Only failures that prevent a stage from even starting become `TriageError`.
//! Failures inside an investigation check or a replay attempt are captured as
//! data (a check marked `error`, a `ReplayResult` with `performed=true,
//! success=false`) and never surface here.

use thiserror::Error;

use super::diagnosis::Category;
use super::ids::TraceId;

#[derive(Debug, Error)]
pub enum TriageError {
    /// The trace's terminal step is still pending; retry later.
    #[error("trace {0} is not terminal yet")]
    IncompleteTrace(TraceId),

    #[error("trace {0} not found")]
    TraceNotFound(TraceId),

    /// Dedup conflict: a diagnosis for this trace is already in flight.
    #[error("diagnosis already in progress for trace {0}")]
    AlreadyInProgress(TraceId),

    /// Two experts registered for the same category. Construction-time bug,
    /// surfaced at wiring rather than silently shadowing one expert.
    #[error("an expert for category {0:?} is already registered")]
    DuplicateExpert(Category),

    #[error("result store: {0}")]
    Store(String),

    #[error("session feed: {0}")]
    Feed(String),
}
