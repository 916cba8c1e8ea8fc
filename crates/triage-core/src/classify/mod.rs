//! Intent stage: trace in, `IntentClassification` out.
//!
//! Policy lives here, not in the model implementation:
//! - non-terminal traces are rejected with `IncompleteTrace`;
//! - any model failure degrades to `UNKNOWN` with confidence 0 so the rest
//!   of the pipeline can still run.

pub mod llm;

use tracing::warn;

use crate::domain::{IntentClassification, Trace, TriageError};
use crate::ports::{Clock, IntentModel};

pub use llm::LlmIntentModel;

/// Classify what the caller wanted. Pure read of the trace.
pub async fn classify_intent(
    model: &dyn IntentModel,
    clock: &dyn Clock,
    trace: &Trace,
) -> Result<IntentClassification, TriageError> {
    if !trace.is_terminal() {
        return Err(TriageError::IncompleteTrace(trace.trace_id.clone()));
    }

    match model.classify(trace).await {
        Ok((intent, confidence)) => Ok(IntentClassification {
            trace_id: trace.trace_id.clone(),
            intent,
            confidence: confidence.min(100),
            classified_at: clock.now(),
        }),
        Err(err) => {
            warn!(trace_id = %trace.trace_id, error = %err, "classification degraded to UNKNOWN");
            Ok(IntentClassification::unknown(
                trace.trace_id.clone(),
                clock.now(),
            ))
        }
    }
}
