//! Monitoring-cycle audit records.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::ids::RunId;

/// One scheduler cycle. Append-only: a cycle that errors partway still
/// persists its partial counts along with the error.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonitoringRun {
    pub run_id: RunId,
    pub started_at: DateTime<Utc>,
    pub sessions_scanned: usize,
    pub failures_found: usize,
    pub diagnoses_triggered: usize,
    /// Set when the cycle itself failed (e.g. session feed unreachable).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl MonitoringRun {
    pub fn new(run_id: RunId, started_at: DateTime<Utc>) -> Self {
        Self {
            run_id,
            started_at,
            sessions_scanned: 0,
            failures_found: 0,
            diagnoses_triggered: 0,
            error: None,
        }
    }
}
