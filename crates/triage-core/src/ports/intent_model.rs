//! IntentModel port - the LLM-backed classifier seam.

use async_trait::async_trait;
use thiserror::Error;

use crate::domain::{Intent, Trace};

/// Why a classification attempt could not produce a label.
///
/// The classify stage treats all of these the same way (degrade to UNKNOWN),
/// but the distinction matters for logs and for deciding whether a later
/// cycle is worth retrying.
#[derive(Debug, Error)]
pub enum ClassifyError {
    /// Provider did not answer within the per-call budget.
    #[error("provider timeout: {0}")]
    Timeout(String),

    /// Provider answered with an error status or was unreachable.
    #[error("provider unavailable: {0}")]
    Unavailable(String),

    /// Provider answered, but not with a label from the closed vocabulary.
    #[error("malformed response: {0}")]
    Malformed(String),
}

/// Classifies what the caller wanted, constrained to the closed intent
/// vocabulary. Pure read of the trace; implementations must not mutate
/// anything downstream.
#[async_trait]
pub trait IntentModel: Send + Sync {
    /// Returns the label and a confidence in 0..=100.
    async fn classify(&self, trace: &Trace) -> Result<(Intent, u8), ClassifyError>;
}
