//! Replay harness: re-execute one recorded request and classify the outcome.
//!
//! Exactly one attempt per replay, bounded by a wall-clock budget. Whether a
//! replay happens at all (and against which target) is the diagnosis engine's
//! call; the harness only executes and classifies.

pub mod signature;
pub mod targets;

use std::sync::Arc;
use std::time::{Duration, Instant};

use tracing::{debug, warn};

use crate::domain::{Category, RecordedRequest, ReplayResult, TargetKind};
use crate::ports::ReplayTarget;

pub use signature::ErrorSignature;
pub use targets::{HttpTarget, MockTarget};

pub struct ReplayHarness {
    target: Arc<dyn ReplayTarget>,
    budget: Duration,
}

impl ReplayHarness {
    pub fn new(target: Arc<dyn ReplayTarget>, budget: Duration) -> Self {
        Self { target, budget }
    }

    pub fn target_kind(&self) -> TargetKind {
        self.target.kind()
    }

    /// Send `request` once and compare what comes back against the original
    /// failure under the category's same-error rule.
    pub async fn replay(
        &self,
        request: &RecordedRequest,
        original: &ErrorSignature,
        category: Category,
    ) -> ReplayResult {
        let started = Instant::now();

        let outcome = tokio::time::timeout(self.budget, self.target.send(request)).await;
        let elapsed_ms = started.elapsed().as_millis() as u64;

        match outcome {
            Ok(Ok(response)) => {
                let success = (200..300).contains(&response.status_code);
                let replayed = ErrorSignature::of_response(response.status_code, &response.body);
                let same_error = !success && original.same_error(&replayed, category);
                debug!(
                    status = response.status_code,
                    success, same_error, elapsed_ms, "replay completed"
                );
                ReplayResult {
                    performed: true,
                    success,
                    same_error,
                    status_code: response.status_code,
                    response_time_ms: elapsed_ms,
                    error_message: None,
                }
            }
            Ok(Err(err)) => {
                warn!(error = %err, "replay target unreachable");
                let replayed = ErrorSignature {
                    status_code: 0,
                    error_code: None,
                };
                ReplayResult {
                    performed: true,
                    success: false,
                    same_error: original.same_error(&replayed, category),
                    status_code: 0,
                    response_time_ms: elapsed_ms,
                    error_message: Some(err.to_string()),
                }
            }
            Err(_) => {
                warn!(budget_ms = self.budget.as_millis() as u64, "replay timed out");
                let mut result = ReplayResult::timeout(elapsed_ms);
                // A replay that times out against a timeout-category failure
                // is the same failure happening again.
                result.same_error = category == Category::Timeout && original.timed_out();
                result
            }
        }
    }
}
