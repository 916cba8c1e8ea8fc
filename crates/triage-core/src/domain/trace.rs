//! Captured interaction traces.
//!
//! A trace is the ordered record of what one conversational session did:
//! each tool/API call the agent made, with its request, response, and status.
//! Traces are captured by the ingesting collaborator and are read-only here;
//! nothing in this crate mutates a trace after construction.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::ids::{SessionId, TraceId};

/// Status of one step within a trace.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StepStatus {
    Success,
    Fail,
    Skip,
    Pending,
}

impl StepStatus {
    /// A trace is terminal only when no step is still pending.
    pub fn is_settled(self) -> bool {
        !matches!(self, StepStatus::Pending)
    }
}

/// The replayable shape of a recorded call.
///
/// All three replay targets (mock, sandbox, direct) accept exactly this, so
/// call construction never changes with the target.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecordedRequest {
    pub method: String,
    pub path: String,
    pub payload: serde_json::Value,
}

/// What the downstream endpoint answered (or how it failed).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StepResponse {
    pub status_code: u16,
    pub body: serde_json::Value,
    pub latency_ms: u64,
}

/// One action within a trace.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Step {
    /// Tool or endpoint name (e.g. "create_order").
    pub name: String,
    pub status: StepStatus,
    pub request: RecordedRequest,
    /// Absent when the call never completed (pending / transport failure).
    pub response: Option<StepResponse>,
}

impl Step {
    pub fn is_failure(&self) -> bool {
        self.status == StepStatus::Fail
    }
}

/// Ordered sequence of steps for one session. Immutable once captured.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Trace {
    pub trace_id: TraceId,
    pub session_id: SessionId,
    pub captured_at: DateTime<Utc>,
    pub steps: Vec<Step>,
}

impl Trace {
    /// The last step, if the trace has any.
    pub fn terminal_step(&self) -> Option<&Step> {
        self.steps.last()
    }

    /// A trace is terminal when its last step is no longer pending.
    /// Empty traces are treated as non-terminal: there is nothing to diagnose yet.
    pub fn is_terminal(&self) -> bool {
        self.terminal_step()
            .map(|s| s.status.is_settled())
            .unwrap_or(false)
    }

    /// Last failing step, scanning from the end (the failure that stuck).
    pub fn last_failing_step(&self) -> Option<&Step> {
        self.steps.iter().rev().find(|s| s.is_failure())
    }

    /// Dedup key: trace id plus a signature of the latest step.
    ///
    /// Two diagnosis requests for the same unchanged trace collide on this;
    /// a trace that gained steps since the last run does not.
    pub fn fingerprint(&self) -> String {
        match self.terminal_step() {
            Some(step) => {
                let status = step
                    .response
                    .as_ref()
                    .map(|r| r.status_code)
                    .unwrap_or_default();
                format!(
                    "{}:{}:{}:{:?}",
                    self.trace_id,
                    self.steps.len(),
                    status,
                    step.status
                )
            }
            None => format!("{}:empty", self.trace_id),
        }
    }
}
